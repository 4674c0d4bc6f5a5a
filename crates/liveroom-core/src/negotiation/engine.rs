use async_trait::async_trait;
use tokio::sync::mpsc;

use liveroom_common::LiveError;

use super::types::{IceCandidate, LocalMedia, MediaKind, MediaSignal, SessionDescription};

/// The platform media stack: capture devices and per-peer links.
///
/// Implementations report asynchronous outcomes (gathered candidates,
/// link connected or failed, remote tracks) through the sender passed to
/// [`attach`](Self::attach). Local capture is shared read-only by every
/// link.
#[async_trait]
pub trait MediaEngine: Send + Sync {
    /// Called once by the session before anything else.
    fn attach(&self, signals: mpsc::Sender<MediaSignal>);

    /// Whether links can be negotiated at all. Sessions skip the relay
    /// entirely when this is false.
    fn is_available(&self) -> bool {
        true
    }

    /// Acquire camera and/or microphone. May grant less than requested.
    async fn acquire_local_media(&self, video: bool, audio: bool) -> Result<LocalMedia, LiveError>;

    async fn release_local_media(&self);

    /// Create a link to `peer` with the local tracks attached.
    async fn create_link(&self, peer: &str, ice_servers: &[String]) -> Result<(), LiveError>;

    async fn create_offer(&self, peer: &str) -> Result<SessionDescription, LiveError>;

    /// Apply a remote offer and produce the answer.
    async fn accept_offer(
        &self,
        peer: &str,
        offer: &SessionDescription,
    ) -> Result<SessionDescription, LiveError>;

    async fn accept_answer(&self, peer: &str, answer: &SessionDescription) -> Result<(), LiveError>;

    async fn add_candidate(&self, peer: &str, candidate: &IceCandidate) -> Result<(), LiveError>;

    async fn close_link(&self, peer: &str);

    /// Enable or disable an already captured track.
    async fn set_track_enabled(&self, kind: MediaKind, enabled: bool) -> Result<(), LiveError>;

    async fn start_screen_share(&self) -> Result<(), LiveError>;

    async fn stop_screen_share(&self) -> Result<(), LiveError>;
}

/// Engine for clients without a media stack. Every capture or link request
/// fails, so the session runs with media degraded.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoMedia;

fn unavailable() -> LiveError {
    LiveError::Media("no media backend".into())
}

#[async_trait]
impl MediaEngine for NoMedia {
    fn attach(&self, _signals: mpsc::Sender<MediaSignal>) {}

    fn is_available(&self) -> bool {
        false
    }

    async fn acquire_local_media(&self, _video: bool, _audio: bool) -> Result<LocalMedia, LiveError> {
        Err(unavailable())
    }

    async fn release_local_media(&self) {}

    async fn create_link(&self, peer: &str, _ice_servers: &[String]) -> Result<(), LiveError> {
        Err(LiveError::Negotiation {
            peer: peer.to_string(),
            reason: "no media backend".into(),
        })
    }

    async fn create_offer(&self, peer: &str) -> Result<SessionDescription, LiveError> {
        Err(LiveError::Negotiation {
            peer: peer.to_string(),
            reason: "no media backend".into(),
        })
    }

    async fn accept_offer(
        &self,
        peer: &str,
        _offer: &SessionDescription,
    ) -> Result<SessionDescription, LiveError> {
        Err(LiveError::Negotiation {
            peer: peer.to_string(),
            reason: "no media backend".into(),
        })
    }

    async fn accept_answer(&self, _peer: &str, _answer: &SessionDescription) -> Result<(), LiveError> {
        Err(unavailable())
    }

    async fn add_candidate(&self, _peer: &str, _candidate: &IceCandidate) -> Result<(), LiveError> {
        Err(unavailable())
    }

    async fn close_link(&self, _peer: &str) {}

    async fn set_track_enabled(&self, _kind: MediaKind, _enabled: bool) -> Result<(), LiveError> {
        Err(unavailable())
    }

    async fn start_screen_share(&self) -> Result<(), LiveError> {
        Err(unavailable())
    }

    async fn stop_screen_share(&self) -> Result<(), LiveError> {
        Ok(())
    }
}
