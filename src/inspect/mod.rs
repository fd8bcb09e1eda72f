//! Node Inspection Module
//!
//! Trivial diagnostic tasks built on the compute framework.
//!
//! - **`collect`**: gathers one `NodeRecord` per node, tolerating per-node
//!   failures.

pub mod collect;
