//! Session channel (broker connection) configuration.

use serde::{Deserialize, Serialize};

/// How the client reaches the message broker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// WebSocket endpoint of the STOMP broker.
    pub broker_url: String,
    /// Fixed delay between reconnect attempts.
    pub reconnect_delay_ms: u64,
    /// Give up on a single connect attempt after this long.
    pub connect_timeout_secs: u64,
    /// Outgoing heart-beat period. 0 disables heart-beats.
    pub heartbeat_ms: u64,
    /// Prefix of room-scoped subscription topics.
    pub topic_prefix: String,
    /// Prefix of application publish destinations.
    pub app_prefix: String,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            broker_url: "ws://localhost:8088/ws".into(),
            reconnect_delay_ms: 5000,
            connect_timeout_secs: 15,
            heartbeat_ms: 10_000,
            topic_prefix: "/topic/room".into(),
            app_prefix: "/app".into(),
        }
    }
}
