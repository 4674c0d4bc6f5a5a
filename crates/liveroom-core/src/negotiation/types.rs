//! Types, signals and link states for peer negotiation.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Wire payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpKind {
    Offer,
    Answer,
}

/// Body of `offer` / `answer` envelopes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub kind: SdpKind,
    pub sdp: String,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Offer,
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Answer,
            sdp: sdp.into(),
        }
    }
}

/// Body of `ice-candidate` envelopes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    pub candidate: String,
    #[serde(default)]
    pub sdp_mid: Option<String>,
    #[serde(default)]
    pub sdp_m_line_index: Option<u32>,
}

/// A decoded signaling envelope body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    Offer(SessionDescription),
    Answer(SessionDescription),
    Candidate(IceCandidate),
}

// ---------------------------------------------------------------------------
// Links
// ---------------------------------------------------------------------------

/// `New -> Negotiating -> Connected -> Closed`. A fresh offer on a
/// connected link renegotiates in place and the link stays `Connected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    New,
    Negotiating,
    Connected,
    Closed,
}

/// Which side produced the offer on a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkRole {
    Offerer,
    Answerer,
}

// ---------------------------------------------------------------------------
// Media
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Audio,
    Video,
    Screen,
}

/// Local capture currently held by the media engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocalMedia {
    pub video: bool,
    pub audio: bool,
    pub screen: bool,
}

/// Callbacks from the media engine, delivered to the session loop.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaSignal {
    /// A network candidate gathered for the link to `peer`.
    LocalCandidate { peer: String, candidate: IceCandidate },
    LinkConnected { peer: String },
    LinkFailed { peer: String, reason: String },
    RemoteTrack { peer: String, kind: MediaKind },
    /// A capture source stopped on its own (device unplugged, share ended
    /// from the OS picker).
    CaptureEnded { kind: MediaKind },
}
