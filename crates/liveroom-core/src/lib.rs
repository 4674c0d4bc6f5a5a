pub mod channel;
pub mod chat;
pub mod documents;
pub mod identity;
pub mod membership;
pub mod negotiation;
pub mod permissions;
pub mod protocol;
pub mod room;
pub mod session;
pub mod whiteboard;

pub use channel::{ChannelClient, ChannelEvent, ChannelSettings, ChannelStatus, RoomTopics};
pub use chat::{ChatHistory, ChatMessage, TypingTracker};
pub use documents::{
    DocumentService, DocumentSlot, DocumentTracker, HttpDocumentService, NavigationAction,
    NoDocuments, PresentationState, SlotUpload,
};
pub use identity::{LocalIdentity, ParticipantInfo, Role};
pub use membership::Roster;
pub use negotiation::{
    IceCandidate, LinkState, LocalMedia, MediaEngine, MediaKind, MediaSignal, NegotiationRelay,
    NoMedia, SessionDescription,
};
pub use permissions::{Entitlement, EntitlementChange, EntitlementState, PermissionEngine};
pub use protocol::{Draft, Envelope, EnvelopeKind};
pub use room::{Effect, RoomState};
pub use session::{LiveSession, LiveSessionHandle, RoomSnapshot, SessionEvent};
pub use whiteboard::{StrokeBatch, StrokeSync, Surface, Tool};
