//! Whiteboard (stroke synchronization) configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WhiteboardConfig {
    pub width: u32,
    pub height: u32,
    /// Minimum interval between outbound stroke batches.
    pub flush_interval_ms: u64,
    /// Number of surface snapshots kept for undo/redo.
    pub history_limit: usize,
    pub default_color: String,
    pub default_width: f32,
}

impl Default for WhiteboardConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 400,
            flush_interval_ms: 50,
            history_limit: 50,
            default_color: "#000000".into(),
            default_width: 2.0,
        }
    }
}
