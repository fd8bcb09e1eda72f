//! Dispatch-Reduce Compute Framework
//!
//! Generic machinery for running a unit of work on a set of grid nodes and
//! aggregating the per-node outcomes, tolerating individual node failures
//! without aborting the whole operation.
//!
//! ## Submodules
//! - **`task`**: the `Task`/`Job` capability traits, the `JobOutcome`
//!   two-case result and the `JobError` taxonomy.
//! - **`dispatcher`**: the coordinator that spawns one job per target node,
//!   catches per-job failures and joins everything for the reduce step.

pub mod dispatcher;
pub mod task;

#[cfg(test)]
mod tests;
