//! Distributed Cache Grid Diagnostics Library
//!
//! This library crate implements the grid's internal diagnostic subsystem:
//! a framework for dispatching a unit of work to a set of cluster nodes and
//! aggregating results, plus a concrete use of it for running ad-hoc
//! queries against the distributed cache and paging through results.
//!
//! ## Architecture Modules
//! The subsystem is composed of four loosely coupled modules:
//!
//! - **`grid`**: node-level primitives. Node identity, the node-local cache
//!   store the queries run against, and the `NodeContext` runtime injected
//!   into every job.
//! - **`compute`**: the generic dispatch-reduce framework. Splits a task
//!   into per-node jobs, runs them concurrently, and reduces the collected
//!   outcomes while containing per-node failures as data.
//! - **`query`**: ad-hoc SCAN/fields queries with remote cursors. First
//!   page plus one lookahead row in a single round trip, cursor registry,
//!   and sliding idle-timeout eviction with no background sweep.
//! - **`inspect`**: trivial per-node record collection, the smallest
//!   possible consumer of the compute framework.

pub mod compute;
pub mod grid;
pub mod inspect;
pub mod query;
