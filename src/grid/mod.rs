//! Grid Node Module
//!
//! Node-level building blocks shared by the whole diagnostics subsystem:
//!
//! - **`types`**: node identity (`NodeId`) and the per-node diagnostic record.
//! - **`store`**: the node-local named cache store queries run against.
//! - **`context`**: the `NodeContext` injected into every job, bundling the
//!   store, query engine, cursor registry and expiration scheduler.

pub mod context;
pub mod store;
pub mod types;

#[cfg(test)]
mod tests;
