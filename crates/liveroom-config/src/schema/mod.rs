//! Configuration schema types.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod channel;
mod chat;
mod documents;
mod logging;
mod media;
mod room;
mod whiteboard;

pub use channel::*;
pub use chat::*;
pub use documents::*;
pub use logging::*;
pub use media::*;
pub use room::*;
pub use whiteboard::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration for a live classroom client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveroomConfig {
    pub channel: ChannelConfig,
    pub room: RoomConfig,
    pub whiteboard: WhiteboardConfig,
    pub documents: DocumentsConfig,
    pub negotiation: NegotiationConfig,
    pub entitlements: EntitlementDefaults,
    pub chat: ChatConfig,
    pub logging: LoggingConfig,
}
