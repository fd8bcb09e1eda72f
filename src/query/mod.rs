//! Ad-Hoc Query Module
//!
//! Runs SCAN and field-projection queries against a node's caches and pages
//! through results without re-sending the whole result set.
//!
//! ## Architecture Overview
//! 1. **Dispatch**: `RunFieldsQueryTask` lands a `QueryDispatchJob` on the
//!    executing node, which opens the query via the engine adapter.
//! 2. **First page + lookahead**: the job reads `page_size` rows plus one
//!    extra; the extra row only drives `has_more` and is buffered, never
//!    returned.
//! 3. **Cursor lifecycle**: the open cursor is registered in the node's
//!    `CursorRegistry` and a per-cursor sliding-expiration timer reclaims
//!    it after two consecutive idle windows.
//!
//! ## Submodules
//! - **`types`**: rows, column metadata, query kinds, cursor ids, pages.
//! - **`engine`**: the external query engine seam plus the in-memory
//!   reference adapter.
//! - **`registry`**: node-local cursor id -> state mapping.
//! - **`expiry`**: per-cursor self-renewing idle timers.
//! - **`task`**: the query dispatch job/task and the page-fetch path.

pub mod engine;
pub mod expiry;
pub mod registry;
pub mod task;
pub mod types;
