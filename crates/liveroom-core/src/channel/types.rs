//! Settings, status, and event/command enums for the channel client.

use std::time::Duration;

use liveroom_config::ChannelConfig;

use crate::protocol::Route;

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Connection settings for the STOMP broker.
#[derive(Clone)]
pub struct ChannelSettings {
    /// WebSocket endpoint of the broker (`ws://` or `wss://`).
    pub broker_url: String,
    /// Fixed delay between reconnect attempts.
    pub reconnect_delay: Duration,
    /// Upper bound for the socket open plus the CONNECTED handshake.
    pub connect_timeout: Duration,
    /// Client heart-beat interval. Zero disables heart-beats.
    pub heartbeat: Duration,
    /// Bearer token sent in the CONNECT frame.
    pub access_token: Option<String>,
}

impl std::fmt::Debug for ChannelSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelSettings")
            .field("broker_url", &self.broker_url)
            .field("reconnect_delay", &self.reconnect_delay)
            .field("connect_timeout", &self.connect_timeout)
            .field("heartbeat", &self.heartbeat)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl From<&ChannelConfig> for ChannelSettings {
    fn from(c: &ChannelConfig) -> Self {
        Self {
            broker_url: c.broker_url.clone(),
            reconnect_delay: Duration::from_millis(c.reconnect_delay_ms),
            connect_timeout: Duration::from_secs(c.connect_timeout_secs),
            heartbeat: Duration::from_millis(c.heartbeat_ms),
            access_token: None,
        }
    }
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self::from(&ChannelConfig::default())
    }
}

impl ChannelSettings {
    /// Value of the STOMP `host` header: the authority part of the URL.
    pub(crate) fn virtual_host(&self) -> &str {
        let rest = self
            .broker_url
            .split_once("://")
            .map(|(_, r)| r)
            .unwrap_or(&self.broker_url);
        let authority = rest.split('/').next().unwrap_or(rest);
        authority.split(':').next().unwrap_or(authority)
    }
}

// ---------------------------------------------------------------------------
// Room topics
// ---------------------------------------------------------------------------

/// Topic and destination names for one room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomTopics {
    pub room_id: String,
    topic_prefix: String,
    app_prefix: String,
}

impl RoomTopics {
    pub fn new(room_id: impl Into<String>, config: &ChannelConfig) -> Self {
        Self {
            room_id: room_id.into(),
            topic_prefix: config.topic_prefix.trim_end_matches('/').to_string(),
            app_prefix: config.app_prefix.trim_end_matches('/').to_string(),
        }
    }

    pub fn state(&self) -> String {
        format!("{}/{}", self.topic_prefix, self.room_id)
    }

    pub fn join(&self) -> String {
        format!("{}/{}/join", self.topic_prefix, self.room_id)
    }

    pub fn leave(&self) -> String {
        format!("{}/{}/leave", self.topic_prefix, self.room_id)
    }

    /// The three topics a room member subscribes to.
    pub fn all(&self) -> [String; 3] {
        [self.state(), self.join(), self.leave()]
    }

    pub fn destination(&self, route: Route) -> String {
        let verb = match route {
            Route::Join => "join",
            Route::Leave => "leave",
            Route::Signal => "signal",
        };
        format!("{}/{}/{}", self.app_prefix, verb, self.room_id)
    }
}

// ---------------------------------------------------------------------------
// Status / Events / Commands
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelStatus {
    Connecting,
    Connected,
    Error,
    Disconnected,
}

/// Events emitted by the channel client.
#[derive(Debug, Clone)]
pub enum ChannelEvent {
    StatusChanged(ChannelStatus),
    /// A MESSAGE frame on one of our subscriptions.
    Message { topic: String, body: String },
    /// Connect failure or broker ERROR frame.
    Error(String),
}

/// Commands sent from the client handle to the connection task.
#[derive(Debug)]
pub(crate) enum ChannelCommand {
    Subscribe { topic: String },
    Unsubscribe { topic: String },
    Send { destination: String, body: String },
    Disconnect,
}
