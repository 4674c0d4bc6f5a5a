//! Entitlement flags and per-participant entitlement state.

use serde::{Deserialize, Serialize};

use liveroom_config::EntitlementDefaults;

/// A capability a host can grant or revoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Entitlement {
    Camera,
    #[serde(rename = "microphone", alias = "mic")]
    Mic,
    ScreenShare,
    Chat,
    Whiteboard,
    FileUpload,
}

impl Entitlement {
    pub const ALL: [Entitlement; 6] = [
        Entitlement::Camera,
        Entitlement::Mic,
        Entitlement::ScreenShare,
        Entitlement::Chat,
        Entitlement::Whiteboard,
        Entitlement::FileUpload,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Entitlement::Camera => "camera",
            Entitlement::Mic => "microphone",
            Entitlement::ScreenShare => "screenShare",
            Entitlement::Chat => "chat",
            Entitlement::Whiteboard => "whiteboard",
            Entitlement::FileUpload => "fileUpload",
        }
    }
}

impl std::fmt::Display for Entitlement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Entitlement {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "camera" => Ok(Entitlement::Camera),
            "mic" | "microphone" => Ok(Entitlement::Mic),
            "screenShare" | "screen-share" | "screen_share" => Ok(Entitlement::ScreenShare),
            "chat" => Ok(Entitlement::Chat),
            "whiteboard" => Ok(Entitlement::Whiteboard),
            "fileUpload" | "file-upload" | "file_upload" => Ok(Entitlement::FileUpload),
            other => Err(format!("unknown entitlement: {other}")),
        }
    }
}

/// The six capability flags of one participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitlementState {
    pub camera: bool,
    #[serde(rename = "microphone")]
    pub mic: bool,
    pub screen_share: bool,
    pub chat: bool,
    pub whiteboard: bool,
    pub file_upload: bool,
}

impl EntitlementState {
    /// Everything granted. Hosts always hold this.
    pub fn all_granted() -> Self {
        Self {
            camera: true,
            mic: true,
            screen_share: true,
            chat: true,
            whiteboard: true,
            file_upload: true,
        }
    }

    pub fn get(&self, entitlement: Entitlement) -> bool {
        match entitlement {
            Entitlement::Camera => self.camera,
            Entitlement::Mic => self.mic,
            Entitlement::ScreenShare => self.screen_share,
            Entitlement::Chat => self.chat,
            Entitlement::Whiteboard => self.whiteboard,
            Entitlement::FileUpload => self.file_upload,
        }
    }

    /// Set one flag. Returns `true` when the value actually changed.
    pub fn set(&mut self, entitlement: Entitlement, value: bool) -> bool {
        let slot = match entitlement {
            Entitlement::Camera => &mut self.camera,
            Entitlement::Mic => &mut self.mic,
            Entitlement::ScreenShare => &mut self.screen_share,
            Entitlement::Chat => &mut self.chat,
            Entitlement::Whiteboard => &mut self.whiteboard,
            Entitlement::FileUpload => &mut self.file_upload,
        };
        let changed = *slot != value;
        *slot = value;
        changed
    }
}

impl From<&EntitlementDefaults> for EntitlementState {
    fn from(d: &EntitlementDefaults) -> Self {
        Self {
            camera: d.camera,
            mic: d.mic,
            screen_share: d.screen_share,
            chat: d.chat,
            whiteboard: d.whiteboard,
            file_upload: d.file_upload,
        }
    }
}

impl Default for EntitlementState {
    fn default() -> Self {
        Self::from(&EntitlementDefaults::default())
    }
}
