//! Events, snapshot and command enums for a live session.

use tokio::sync::oneshot;

use liveroom_common::{LiveError, Notice};

use crate::channel::ChannelStatus;
use crate::chat::ChatMessage;
use crate::documents::{DocumentSlot, NavigationAction, PresentationState, SlotUpload};
use crate::identity::ParticipantInfo;
use crate::negotiation::{LinkState, LocalMedia, MediaKind};
use crate::permissions::{Entitlement, EntitlementChange, EntitlementState};
use crate::whiteboard::Tool;

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Events emitted by a running session, in the order they happened.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    StatusChanged(ChannelStatus),
    ParticipantJoined(ParticipantInfo),
    ParticipantLeft(ParticipantInfo),
    /// The channel dropped and every remote participant was forgotten.
    RosterReset,
    LinkStateChanged {
        peer: String,
        state: LinkState,
    },
    RemoteMediaAdded {
        peer: String,
        kind: MediaKind,
    },
    RemoteMediaRemoved {
        peer: String,
    },
    /// The drawing surface changed; re-render from the snapshot or export.
    SurfaceChanged,
    PageChanged {
        slot: String,
        page: u32,
        by: Option<String>,
    },
    SlotsRefreshed,
    ActiveSlotCleared,
    EntitlementsChanged(EntitlementChange),
    /// We were removed by a host. The session has shut itself down.
    Kicked {
        reason: String,
        by: String,
    },
    ParticipantKicked {
        id: String,
    },
    ChatMessage(ChatMessage),
    /// Display names of everyone currently typing.
    TypingChanged(Vec<String>),
    Notice(Notice),
    Closed,
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Read-only projection of the session, refreshed after every step of the
/// session loop.
#[derive(Debug, Clone)]
pub struct RoomSnapshot {
    pub room_id: String,
    pub status: ChannelStatus,
    pub roster: Vec<ParticipantInfo>,
    pub own_entitlements: EntitlementState,
    pub entitlements: Vec<(String, EntitlementState)>,
    pub template: EntitlementState,
    pub slots: Vec<DocumentSlot>,
    pub active_slot: Option<String>,
    pub current_page: u32,
    pub links: Vec<(String, LinkState)>,
    pub local_media: LocalMedia,
    pub typing: Vec<String>,
    pub tool: Tool,
    pub can_undo: bool,
    pub can_redo: bool,
    /// Bumped on every change to the drawing surface.
    pub surface_version: u64,
}

impl RoomSnapshot {
    pub(crate) fn empty(room_id: &str) -> Self {
        Self {
            room_id: room_id.to_string(),
            status: ChannelStatus::Disconnected,
            roster: Vec::new(),
            own_entitlements: EntitlementState::default(),
            entitlements: Vec::new(),
            template: EntitlementState::default(),
            slots: Vec::new(),
            active_slot: None,
            current_page: 1,
            links: Vec::new(),
            local_media: LocalMedia::default(),
            typing: Vec::new(),
            tool: Tool::Pen,
            can_undo: false,
            can_redo: false,
            surface_version: 0,
        }
    }

    pub fn participant(&self, id: &str) -> Option<&ParticipantInfo> {
        self.roster.iter().find(|p| p.id == id)
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

pub(crate) type Reply<T> = oneshot::Sender<Result<T, LiveError>>;

/// Requests from [`LiveSessionHandle`](super::LiveSessionHandle) to the
/// session loop.
#[derive(Debug)]
pub(crate) enum SessionCommand {
    // whiteboard
    PointerDown { x: f32, y: f32, reply: Reply<()> },
    PointerMove { x: f32, y: f32, reply: Reply<()> },
    PointerUp { reply: Reply<()> },
    SetTool { tool: Tool, reply: Reply<()> },
    SetColor { color: String, reply: Reply<()> },
    SetWidth { width: f32, reply: Reply<()> },
    Undo { reply: Reply<bool> },
    Redo { reply: Reply<bool> },
    ClearSurface { reply: Reply<()> },
    ExportSurface { reply: Reply<Vec<u8>> },

    // documents
    Navigate {
        slot: String,
        page: u32,
        action: NavigationAction,
        reply: Reply<u32>,
    },
    SelectSlot { slot: String, reply: Reply<()> },
    RefreshSlots { reply: Reply<()> },
    UploadSlot { upload: SlotUpload, reply: Reply<DocumentSlot> },
    DeleteSlot { slot: String, reply: Reply<()> },
    PresentationState { slot: String, reply: Reply<PresentationState> },

    // moderation
    SetEntitlement {
        target: String,
        entitlement: Entitlement,
        value: bool,
        reply: Reply<()>,
    },
    SetGlobal {
        entitlement: Entitlement,
        value: bool,
        reply: Reply<()>,
    },
    MuteAll { reply: Reply<()> },
    AllowUnmuteAll { reply: Reply<()> },
    Kick { target: String, reason: String, reply: Reply<()> },

    // chat
    SendChat { content: String, reply: Reply<ChatMessage> },
    SetTyping { is_typing: bool, reply: Reply<()> },

    // local media
    SetCamera { enabled: bool, reply: Reply<()> },
    SetMic { enabled: bool, reply: Reply<()> },
    StartScreenShare { reply: Reply<()> },
    StopScreenShare { reply: Reply<()> },

    Leave { reply: Reply<()> },
}
