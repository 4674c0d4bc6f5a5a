//! Peer media negotiation.
//!
//! Links form a full mesh: one per remote participant, opened by whoever
//! observes the other's join. Offers, answers and candidates travel as
//! unicast envelopes on the room channel; the media itself is the
//! [`MediaEngine`]'s business.

mod engine;
mod relay;
mod types;

pub use engine::{MediaEngine, NoMedia};
pub use relay::{NegotiationRelay, PeerLink};
pub use types::{
    IceCandidate, LinkRole, LinkState, LocalMedia, MediaKind, MediaSignal, SdpKind,
    SessionDescription, Signal,
};
