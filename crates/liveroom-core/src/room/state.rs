//! The per-client room aggregate and its ordered apply function.

use tracing::{debug, info, warn};

use liveroom_common::{new_id, LiveError};
use liveroom_config::{AuthorityPolicy, LiveroomConfig};

use super::sequencer::Sequencer;
use crate::chat::{ChatHistory, ChatMessage};
use crate::documents::{DocumentTracker, NavigationPayload, SlotEventPayload};
use crate::identity::{LocalIdentity, ParticipantInfo};
use crate::membership::Roster;
use crate::negotiation::{IceCandidate, SessionDescription, Signal};
use crate::permissions::{EntitlementChange, EntitlementState, PermissionEngine};
use crate::protocol::{
    ChatPayload, Draft, Envelope, EnvelopeKind, KickPayload, LeavePayload, PermissionPayload,
    TypingPayload,
};
use crate::whiteboard::StrokeBatch;

/// What an applied envelope means for the rest of the session.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    PeerJoined(ParticipantInfo),
    PeerLeft(ParticipantInfo),
    Signal { from: String, signal: Signal },
    Strokes { from: String, batch: StrokeBatch },
    ClearSurface { from: String },
    PageChanged { slot: String, page: u32, by: Option<String> },
    /// The slot list changed upstream; fetch it again.
    RefreshSlots,
    ActiveSlotCleared,
    EntitlementsChanged(EntitlementChange),
    /// The local participant was asked to leave.
    Kicked { reason: String, by: String },
    ParticipantKicked { id: String },
    Chat(ChatMessage),
    Typing { id: String, name: String, is_typing: bool },
}

/// Everything one client believes about its room.
///
/// All inbound mutations go through [`RoomState::apply`], which runs the
/// same checks in the same order for every envelope: room, echo, target,
/// authority, freshness, payload.
#[derive(Debug)]
pub struct RoomState {
    identity: LocalIdentity,
    room_id: String,
    policy: AuthorityPolicy,
    host_id: Option<String>,
    roster: Roster,
    permissions: PermissionEngine,
    documents: DocumentTracker,
    chat: ChatHistory,
    sequencer: Sequencer,
}

impl RoomState {
    pub fn new(identity: LocalIdentity, room_id: impl Into<String>, config: &LiveroomConfig) -> Self {
        let template = EntitlementState::from(&config.entitlements);
        Self {
            permissions: PermissionEngine::new(&identity.info, template),
            sequencer: Sequencer::new(identity.instance.clone()),
            identity,
            room_id: room_id.into(),
            policy: config.room.authority,
            host_id: config.room.host_id.clone(),
            roster: Roster::new(),
            documents: DocumentTracker::new(),
            chat: ChatHistory::new(config.chat.history_limit),
        }
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn identity(&self) -> &LocalIdentity {
        &self.identity
    }

    pub fn local_id(&self) -> &str {
        self.identity.id()
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn permissions(&self) -> &PermissionEngine {
        &self.permissions
    }

    pub fn permissions_mut(&mut self) -> &mut PermissionEngine {
        &mut self.permissions
    }

    pub fn documents(&self) -> &DocumentTracker {
        &self.documents
    }

    pub fn documents_mut(&mut self) -> &mut DocumentTracker {
        &mut self.documents
    }

    pub fn chat(&self) -> &ChatHistory {
        &self.chat
    }

    /// Whether `sender` may originate privileged envelopes.
    ///
    /// A host in the roster always qualifies. With a configured host id,
    /// nobody else does. Without one, senders this client has not seen join
    /// are accepted (the host usually joined first) and announced members
    /// are refused.
    pub fn is_authority(&self, sender: &str) -> bool {
        if self.roster.is_host(sender) {
            return true;
        }
        match self.host_id.as_deref() {
            Some(host) => host == sender,
            None => !self.roster.contains(sender),
        }
    }

    pub fn ensure_host(&self, action: &str) -> Result<(), LiveError> {
        if self.identity.role().is_host() {
            Ok(())
        } else {
            Err(LiveError::NotAuthorized(action.to_string()))
        }
    }

    // -- outbound -----------------------------------------------------------

    /// Fill in room, sender, time and sequence.
    pub fn stamp(&mut self, draft: Draft, now_ms: u64) -> Envelope {
        Envelope {
            kind: draft.kind,
            room_id: self.room_id.clone(),
            sender_id: self.identity.id().to_string(),
            target_id: draft.target_id,
            payload: draft.payload,
            timestamp: now_ms,
            seq: Some(self.sequencer.stamp()),
        }
    }

    /// Put ourselves in the roster and build the join announcement.
    pub fn announce_join(&mut self, now_ms: u64) -> Result<Draft, LiveError> {
        self.roster.upsert(self.identity.info.clone(), now_ms);
        Draft::broadcast(EnvelopeKind::Join, &self.identity.info)
    }

    pub fn announce_leave(&self) -> Result<Draft, LiveError> {
        Draft::broadcast(
            EnvelopeKind::Leave,
            &LeavePayload {
                participant_id: self.identity.id().to_string(),
            },
        )
    }

    /// Record a locally sent chat message.
    pub fn record_local_chat(
        &mut self,
        content: &str,
        now_ms: u64,
    ) -> Result<(Draft, ChatMessage), LiveError> {
        let info = &self.identity.info;
        let message = ChatMessage {
            id: new_id(),
            sender_id: info.id.clone(),
            sender_name: info.name.clone(),
            sender_role: info.role,
            content: content.to_string(),
            timestamp: now_ms,
        };
        let draft = Draft::broadcast(
            EnvelopeKind::ChatMessage,
            &ChatPayload {
                id: Some(message.id.clone()),
                content: message.content.clone(),
                user_name: message.sender_name.clone(),
                user_role: message.sender_role,
            },
        )?;
        self.chat.push(message.clone());
        Ok((draft, message))
    }

    /// Update our own media flags; carried by the next join announcement.
    pub fn set_own_media(&mut self, video: bool, audio: bool) {
        self.identity.info.video_enabled = video;
        self.identity.info.audio_enabled = audio;
        let id = self.identity.info.id.clone();
        self.roster.set_media_flags(&id, video, audio);
    }

    /// Forget every remote participant. Used when the channel drops: the
    /// roster is rebuilt from re-announcements only.
    pub fn reset_roster(&mut self) -> Vec<ParticipantInfo> {
        let local = self.identity.id().to_string();
        let gone: Vec<ParticipantInfo> = self
            .roster
            .iter()
            .filter(|p| p.id != local)
            .cloned()
            .collect();
        for p in &gone {
            self.permissions.forget(&p.id);
        }
        self.roster.clear();
        gone
    }

    // -- inbound ------------------------------------------------------------

    /// Apply one received envelope.
    pub fn apply(&mut self, env: &Envelope) -> Vec<Effect> {
        if env.room_id != self.room_id {
            debug!(room = %env.room_id, "Envelope for another room ignored");
            return Vec::new();
        }
        if env.sender_id == self.identity.id() {
            return Vec::new();
        }
        if let Some(target) = env.target_id.as_deref() {
            if target != self.identity.id() && !env.kind.is_public_when_targeted() {
                return Vec::new();
            }
        }
        if env.kind.is_privileged()
            && self.policy == AuthorityPolicy::Verify
            && !self.is_authority(&env.sender_id)
        {
            warn!(kind = %env.kind, sender = %env.sender_id, "Privileged envelope from non-host ignored");
            return Vec::new();
        }
        if env.kind.is_mutating() && !self.sequencer.admit(&env.sender_id, env.seq.as_ref()) {
            debug!(kind = %env.kind, sender = %env.sender_id, "Stale envelope ignored");
            return Vec::new();
        }

        match self.dispatch(env) {
            Ok(effects) => effects,
            Err(e) => {
                warn!(kind = %env.kind, sender = %env.sender_id, error = %e, "Envelope dropped");
                Vec::new()
            }
        }
    }

    fn dispatch(&mut self, env: &Envelope) -> Result<Vec<Effect>, LiveError> {
        let from = env.sender_id.clone();
        let effects = match env.kind {
            EnvelopeKind::Join => {
                let mut info: ParticipantInfo = env.payload_as()?;
                info.id = from;
                self.on_join(info, env.timestamp)
            }
            EnvelopeKind::Leave => {
                let id = env
                    .payload_as::<LeavePayload>()
                    .map(|p| p.participant_id)
                    .unwrap_or(from);
                self.on_leave(&id)
            }
            EnvelopeKind::Offer => {
                let offer: SessionDescription = env.payload_as()?;
                vec![Effect::Signal {
                    from,
                    signal: Signal::Offer(offer),
                }]
            }
            EnvelopeKind::Answer => {
                let answer: SessionDescription = env.payload_as()?;
                vec![Effect::Signal {
                    from,
                    signal: Signal::Answer(answer),
                }]
            }
            EnvelopeKind::IceCandidate => {
                let candidate: IceCandidate = env.payload_as()?;
                vec![Effect::Signal {
                    from,
                    signal: Signal::Candidate(candidate),
                }]
            }
            EnvelopeKind::WhiteboardDraw => {
                let batch: StrokeBatch = env.payload_as()?;
                vec![Effect::Strokes { from, batch }]
            }
            EnvelopeKind::WhiteboardClear => vec![Effect::ClearSurface { from }],
            EnvelopeKind::DocumentNavigation => {
                let nav: NavigationPayload = env.payload_as()?;
                if self.documents.apply_navigation(&nav, env.timestamp) {
                    vec![Effect::PageChanged {
                        slot: nav.document_id,
                        page: nav.current_page,
                        by: nav.controlled_by.or(Some(from)),
                    }]
                } else {
                    Vec::new()
                }
            }
            EnvelopeKind::DocumentUploaded => vec![Effect::RefreshSlots],
            EnvelopeKind::DocumentDeleted => {
                let slot: SlotEventPayload = env.payload_as()?;
                let mut effects = Vec::new();
                if self.documents.remove_slot(&slot.document_id) {
                    effects.push(Effect::ActiveSlotCleared);
                }
                effects.push(Effect::RefreshSlots);
                effects
            }
            EnvelopeKind::PermissionUpdate => {
                let update: PermissionPayload = env.payload_as()?;
                let target = env
                    .target_id
                    .clone()
                    .ok_or_else(|| LiveError::Protocol("permission-update without target".into()))?;
                self.permissions
                    .apply_update(&target, update.permission, update.value)
                    .map(Effect::EntitlementsChanged)
                    .into_iter()
                    .collect()
            }
            EnvelopeKind::GlobalPermissionUpdate => {
                let update: PermissionPayload = env.payload_as()?;
                info!(permission = %update.permission, value = update.value, "Default entitlements changed");
                self.permissions
                    .apply_global(update.permission, update.value)
                    .into_iter()
                    .map(Effect::EntitlementsChanged)
                    .collect()
            }
            EnvelopeKind::MuteAll => self
                .permissions
                .apply_mic_all(false)
                .into_iter()
                .map(Effect::EntitlementsChanged)
                .collect(),
            EnvelopeKind::AllowUnmuteAll => self
                .permissions
                .apply_mic_all(true)
                .into_iter()
                .map(Effect::EntitlementsChanged)
                .collect(),
            EnvelopeKind::ParticipantKicked => {
                let kick: KickPayload = env.payload_as()?;
                let target = env
                    .target_id
                    .clone()
                    .or(kick.target_user_id)
                    .ok_or_else(|| LiveError::Protocol("participant-kicked without target".into()))?;
                if target == self.identity.id() {
                    info!(by = %from, "Kicked from room");
                    vec![Effect::Kicked {
                        reason: kick.reason,
                        by: from,
                    }]
                } else {
                    vec![Effect::ParticipantKicked { id: target }]
                }
            }
            EnvelopeKind::ChatMessage => {
                let chat: ChatPayload = env.payload_as()?;
                let name = if chat.user_name.is_empty() {
                    self.roster
                        .get(&from)
                        .map(|p| p.name.clone())
                        .unwrap_or_default()
                } else {
                    chat.user_name
                };
                let message = ChatMessage {
                    id: chat.id.unwrap_or_else(new_id),
                    sender_id: from,
                    sender_name: name,
                    sender_role: chat.user_role,
                    content: chat.content,
                    timestamp: env.timestamp,
                };
                if self.chat.push(message.clone()) {
                    vec![Effect::Chat(message)]
                } else {
                    Vec::new()
                }
            }
            EnvelopeKind::UserTyping => {
                let typing: TypingPayload = env.payload_as()?;
                vec![Effect::Typing {
                    id: from,
                    name: typing.user_name,
                    is_typing: typing.is_typing,
                }]
            }
            EnvelopeKind::Unknown => {
                debug!(sender = %from, "Unknown envelope type ignored");
                Vec::new()
            }
        };
        Ok(effects)
    }

    fn on_join(&mut self, info: ParticipantInfo, at: u64) -> Vec<Effect> {
        self.permissions.track(&info);
        if self.roster.upsert(info.clone(), at) {
            info!(participant = %info.id, name = %info.name, "Participant joined");
            vec![Effect::PeerJoined(info)]
        } else {
            Vec::new()
        }
    }

    fn on_leave(&mut self, id: &str) -> Vec<Effect> {
        if id == self.identity.id() {
            return Vec::new();
        }
        self.permissions.forget(id);
        self.sequencer.forget(id);
        match self.roster.remove(id) {
            Some(info) => {
                info!(participant = %id, "Participant left");
                vec![Effect::PeerLeft(info)]
            }
            None => {
                // Still tear down anything we may hold for an unseen peer.
                vec![Effect::PeerLeft(ParticipantInfo::new(id, "", Default::default()))]
            }
        }
    }
}
