use serde::{Deserialize, Serialize};

/// Unique identifier for a node in the grid.
///
/// Wrapper around a UUID string. Job outcomes are tagged with this ID so the
/// coordinator can attribute every result (or failure) to the node that
/// produced it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct NodeId(pub String);

impl NodeId {
    /// Generates a new random UUID v4-based NodeId.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-node diagnostic record collected by the trivial collection task.
///
/// This is the minimal "tell me about yourself" payload each node can report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeRecord {
    /// Identity of the reporting node.
    pub node_id: NodeId,
    /// Hostname the node process runs on.
    pub hostname: String,
    /// Milliseconds since the node context was created.
    pub uptime_ms: u64,
    /// Names of the caches hosted on this node.
    pub cache_names: Vec<String>,
    /// Crate version the node was built with.
    pub version: String,
}

/// Helper to get the current system time in milliseconds.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as u64
}
