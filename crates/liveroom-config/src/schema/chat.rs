use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Messages retained per room.
    pub history_limit: usize,
    /// A typing indicator with no refresh for this long is dropped.
    pub typing_timeout_ms: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_limit: 500,
            typing_timeout_ms: 1000,
        }
    }
}
