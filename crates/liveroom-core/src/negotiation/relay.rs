//! Per-peer link bookkeeping and offer/answer/candidate relay.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use liveroom_common::LiveError;

use super::engine::MediaEngine;
use super::types::{IceCandidate, LinkRole, LinkState, SessionDescription};
use crate::protocol::{Draft, EnvelopeKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerLink {
    pub state: LinkState,
    pub role: LinkRole,
    /// An offer went out and no answer has been applied yet.
    awaiting_answer: bool,
}

impl PeerLink {
    fn new(role: LinkRole) -> Self {
        Self {
            state: LinkState::New,
            role,
            awaiting_answer: false,
        }
    }
}

/// Drives one negotiation link per remote participant.
///
/// The side that observes a join makes the offer. When two offers cross,
/// the participant with the lower id yields: it drops its own link and
/// answers the remote offer, while the other side ignores the incoming one.
/// Failed links are closed and reported, never retried.
pub struct NegotiationRelay {
    local_id: String,
    ice_servers: Vec<String>,
    engine: Arc<dyn MediaEngine>,
    links: HashMap<String, PeerLink>,
    transitions: Vec<(String, LinkState)>,
}

impl NegotiationRelay {
    pub fn new(
        local_id: impl Into<String>,
        ice_servers: Vec<String>,
        engine: Arc<dyn MediaEngine>,
    ) -> Self {
        Self {
            local_id: local_id.into(),
            ice_servers,
            engine,
            links: HashMap::new(),
            transitions: Vec::new(),
        }
    }

    pub fn state(&self, peer: &str) -> Option<LinkState> {
        self.links.get(peer).map(|link| link.state)
    }

    pub fn links(&self) -> impl Iterator<Item = (&String, &PeerLink)> {
        self.links.iter()
    }

    /// State changes since the last call, in order.
    pub fn take_transitions(&mut self) -> Vec<(String, LinkState)> {
        std::mem::take(&mut self.transitions)
    }

    fn set_state(&mut self, peer: &str, state: LinkState) {
        if let Some(link) = self.links.get_mut(peer) {
            if link.state != state {
                link.state = state;
                self.transitions.push((peer.to_string(), state));
            }
        }
    }

    fn fail(peer: &str, err: LiveError) -> LiveError {
        match err {
            LiveError::Negotiation { .. } => err,
            other => LiveError::Negotiation {
                peer: peer.to_string(),
                reason: other.to_string(),
            },
        }
    }

    async fn open(&mut self, peer: &str, role: LinkRole) -> Result<(), LiveError> {
        self.engine
            .create_link(peer, &self.ice_servers)
            .await
            .map_err(|e| Self::fail(peer, e))?;
        self.links.insert(peer.to_string(), PeerLink::new(role));
        self.transitions.push((peer.to_string(), LinkState::New));
        Ok(())
    }

    // -- outbound -----------------------------------------------------------

    /// A participant appeared: open a link and offer to it. Returns the
    /// unicast offer, or nothing when a link already exists.
    pub async fn on_participant_joined(&mut self, peer: &str) -> Result<Option<Draft>, LiveError> {
        if peer == self.local_id || self.links.contains_key(peer) {
            return Ok(None);
        }

        self.open(peer, LinkRole::Offerer).await?;
        let offer = match self.engine.create_offer(peer).await {
            Ok(offer) => offer,
            Err(e) => {
                self.teardown(peer).await;
                return Err(Self::fail(peer, e));
            }
        };
        if let Some(link) = self.links.get_mut(peer) {
            link.awaiting_answer = true;
        }
        self.set_state(peer, LinkState::Negotiating);

        info!(peer = %peer, "Sending offer");
        Draft::unicast(EnvelopeKind::Offer, peer, &offer).map(Some)
    }

    /// A candidate gathered locally for the link to `peer`.
    pub fn on_local_candidate(
        &self,
        peer: &str,
        candidate: &IceCandidate,
    ) -> Result<Option<Draft>, LiveError> {
        if !self.links.contains_key(peer) {
            debug!(peer = %peer, "Local candidate for closed link dropped");
            return Ok(None);
        }
        Draft::unicast(EnvelopeKind::IceCandidate, peer, candidate).map(Some)
    }

    // -- inbound ------------------------------------------------------------

    /// Apply a remote offer and return the unicast answer.
    pub async fn on_offer(
        &mut self,
        peer: &str,
        offer: &SessionDescription,
    ) -> Result<Option<Draft>, LiveError> {
        if let Some(link) = self.links.get(peer) {
            if link.awaiting_answer {
                if self.local_id.as_str() < peer {
                    debug!(peer = %peer, "Offers crossed, yielding to remote offer");
                    self.teardown(peer).await;
                } else {
                    debug!(peer = %peer, "Offers crossed, keeping local offer");
                    return Ok(None);
                }
            }
        }

        if !self.links.contains_key(peer) {
            self.open(peer, LinkRole::Answerer).await?;
        }
        if self.state(peer) != Some(LinkState::Connected) {
            self.set_state(peer, LinkState::Negotiating);
        }

        let answer = match self.engine.accept_offer(peer, offer).await {
            Ok(answer) => answer,
            Err(e) => {
                self.teardown(peer).await;
                return Err(Self::fail(peer, e));
            }
        };

        info!(peer = %peer, "Sending answer");
        Draft::unicast(EnvelopeKind::Answer, peer, &answer).map(Some)
    }

    /// Apply a remote answer. Answers nobody asked for are dropped.
    pub async fn on_answer(
        &mut self,
        peer: &str,
        answer: &SessionDescription,
    ) -> Result<(), LiveError> {
        match self.links.get(peer) {
            Some(link) if link.awaiting_answer => {}
            _ => {
                debug!(peer = %peer, "Unsolicited answer dropped");
                return Ok(());
            }
        }

        if let Err(e) = self.engine.accept_answer(peer, answer).await {
            self.teardown(peer).await;
            return Err(Self::fail(peer, e));
        }
        if let Some(link) = self.links.get_mut(peer) {
            link.awaiting_answer = false;
        }
        Ok(())
    }

    /// Apply a remote candidate. Candidates for unknown links, and ones the
    /// engine rejects, are logged and dropped.
    pub async fn on_remote_candidate(&mut self, peer: &str, candidate: &IceCandidate) {
        if !self.links.contains_key(peer) {
            debug!(peer = %peer, "Candidate for unknown link dropped");
            return;
        }
        if let Err(e) = self.engine.add_candidate(peer, candidate).await {
            warn!(peer = %peer, error = %e, "Remote candidate rejected");
        }
    }

    pub fn on_link_connected(&mut self, peer: &str) {
        self.set_state(peer, LinkState::Connected);
    }

    /// The engine gave up on a link. Returns false for links we no longer
    /// hold.
    pub async fn on_link_failed(&mut self, peer: &str, reason: &str) -> bool {
        if !self.links.contains_key(peer) {
            return false;
        }
        warn!(peer = %peer, reason, "Link failed");
        self.teardown(peer).await;
        true
    }

    // -- teardown -----------------------------------------------------------

    pub async fn teardown(&mut self, peer: &str) {
        if self.links.remove(peer).is_some() {
            self.engine.close_link(peer).await;
            self.transitions.push((peer.to_string(), LinkState::Closed));
            debug!(peer = %peer, "Link closed");
        }
    }

    pub async fn teardown_all(&mut self) {
        let peers: Vec<String> = self.links.keys().cloned().collect();
        for peer in peers {
            self.teardown(&peer).await;
        }
    }
}
