//! Peer negotiation and entitlement defaults.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NegotiationConfig {
    pub stun_servers: Vec<String>,
}

impl Default for NegotiationConfig {
    fn default() -> Self {
        Self {
            stun_servers: vec![
                "stun:stun.l.google.com:19302".into(),
                "stun:stun1.l.google.com:19302".into(),
            ],
        }
    }
}

/// Entitlements granted to members who join later. The host can change
/// this at runtime; the file only seeds it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EntitlementDefaults {
    pub camera: bool,
    pub mic: bool,
    pub screen_share: bool,
    pub chat: bool,
    pub whiteboard: bool,
    pub file_upload: bool,
}

impl Default for EntitlementDefaults {
    fn default() -> Self {
        Self {
            camera: true,
            mic: true,
            screen_share: false,
            chat: true,
            whiteboard: false,
            file_upload: false,
        }
    }
}
