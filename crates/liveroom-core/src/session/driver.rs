//! The session loop: a single task owning every piece of room state.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use liveroom_common::{now_millis, LiveError, Notice, NoticeTopic};
use liveroom_config::LiveroomConfig;

use super::types::{RoomSnapshot, SessionCommand, SessionEvent};
use crate::channel::{ChannelClient, ChannelEvent, ChannelStatus, RoomTopics};
use crate::chat::{ChatMessage, TypingTracker};
use crate::documents::{DocumentService, DocumentSlot, NavigationAction, SlotEventPayload, SlotUpload};
use crate::negotiation::{
    LinkState, LocalMedia, MediaEngine, MediaKind, MediaSignal, NegotiationRelay, Signal,
};
use crate::permissions::{Entitlement, EntitlementChange, EntitlementState};
use crate::protocol::{Draft, Envelope, EnvelopeKind, TypingPayload};
use crate::room::{Effect, RoomState};
use crate::whiteboard::{parse_color, StrokeBatch, StrokeSync, Tool};

/// Where the driver reports to.
pub(crate) struct Outputs {
    pub events: mpsc::Sender<SessionEvent>,
    pub snapshot: watch::Sender<RoomSnapshot>,
}

/// Time source for the stroke throttle. Follows tokio's clock so paused
/// test time applies.
fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

pub(crate) struct SessionDriver {
    room: RoomState,
    topics: RoomTopics,
    channel: ChannelClient,
    relay: NegotiationRelay,
    whiteboard: StrokeSync,
    typing: TypingTracker,
    media: Arc<dyn MediaEngine>,
    documents: Arc<dyn DocumentService>,
    local_media: LocalMedia,
    status: ChannelStatus,
    was_connected: bool,
    flush_interval: Duration,
    surface_version: u64,
    outputs: Outputs,
    closed: bool,
}

impl SessionDriver {
    pub(crate) fn new(
        config: &LiveroomConfig,
        room: RoomState,
        channel: ChannelClient,
        media: Arc<dyn MediaEngine>,
        documents: Arc<dyn DocumentService>,
        outputs: Outputs,
    ) -> Self {
        Self {
            topics: RoomTopics::new(room.room_id(), &config.channel),
            relay: NegotiationRelay::new(
                room.local_id(),
                config.negotiation.stun_servers.clone(),
                Arc::clone(&media),
            ),
            whiteboard: StrokeSync::new(&config.whiteboard),
            typing: TypingTracker::new(Duration::from_millis(config.chat.typing_timeout_ms)),
            flush_interval: Duration::from_millis(config.whiteboard.flush_interval_ms.max(1)),
            room,
            channel,
            media,
            documents,
            local_media: LocalMedia::default(),
            status: ChannelStatus::Disconnected,
            was_connected: false,
            surface_version: 0,
            outputs,
            closed: false,
        }
    }

    pub(crate) async fn run(
        mut self,
        mut channel_rx: mpsc::Receiver<ChannelEvent>,
        mut command_rx: mpsc::Receiver<SessionCommand>,
        mut media_rx: mpsc::Receiver<MediaSignal>,
    ) {
        self.start().await;
        self.publish_snapshot();

        let mut flush = tokio::time::interval(self.flush_interval);
        flush.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while !self.closed {
            let changed = tokio::select! {
                event = channel_rx.recv() => {
                    match event {
                        Some(event) => self.on_channel_event(event).await,
                        None => {
                            warn!(room = %self.room.room_id(), "Channel task ended");
                            self.shutdown().await;
                        }
                    }
                    true
                }
                command = command_rx.recv() => {
                    match command {
                        Some(command) => self.on_command(command).await,
                        None => {
                            debug!(room = %self.room.room_id(), "All handles dropped, leaving");
                            self.shutdown().await;
                        }
                    }
                    true
                }
                Some(signal) = media_rx.recv() => {
                    self.on_media_signal(signal).await;
                    true
                }
                _ = flush.tick() => self.on_tick().await,
            };
            if changed {
                self.publish_snapshot();
            }
        }

        info!(room = %self.room.room_id(), "Live session ended");
    }

    // -- lifecycle ----------------------------------------------------------

    async fn start(&mut self) {
        info!(
            room = %self.room.room_id(),
            participant = %self.room.local_id(),
            "Starting live session"
        );
        for topic in self.topics.all() {
            self.channel.subscribe(&topic).await;
        }
        self.acquire_media().await;
        if let Err(e) = self.refresh_slots().await {
            warn!(error = %e, "Initial slot list unavailable");
            self.notice(Notice::warning(
                NoticeTopic::Document,
                "Documents unavailable",
                e.to_string(),
            ))
            .await;
        }
    }

    async fn acquire_media(&mut self) {
        if !self.media.is_available() {
            debug!("No media backend, joining without capture");
            return;
        }
        let own = self.room.permissions().own();
        if !own.camera && !own.mic {
            return;
        }
        match self.media.acquire_local_media(own.camera, own.mic).await {
            Ok(media) => {
                self.local_media = media;
                if (own.camera && !media.video) || (own.mic && !media.audio) {
                    self.notice(Notice::warning(
                        NoticeTopic::Media,
                        "Some devices unavailable",
                        "Joined with partial media",
                    ))
                    .await;
                }
            }
            Err(e) => {
                warn!(error = %e, "Local media unavailable");
                self.local_media = LocalMedia::default();
                self.notice(Notice::warning(
                    NoticeTopic::Media,
                    "Camera and microphone unavailable",
                    e.to_string(),
                ))
                .await;
            }
        }
        self.room
            .set_own_media(self.local_media.video, self.local_media.audio);
    }

    /// Leave the room: announce, close every link, release capture,
    /// unsubscribe and disconnect. The only cancellation primitive.
    async fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        info!(room = %self.room.room_id(), "Leaving room");
        self.whiteboard.abort_stroke();
        match self.room.announce_leave() {
            Ok(draft) => {
                self.publish(draft).await;
            }
            Err(e) => warn!(error = %e, "Failed to build leave announcement"),
        }
        self.relay.teardown_all().await;
        self.flush_link_transitions().await;
        self.media.release_local_media().await;
        self.local_media = LocalMedia::default();
        for topic in self.topics.all() {
            self.channel.unsubscribe(&topic).await;
        }
        self.channel.disconnect().await;
        self.closed = true;
        self.emit(SessionEvent::Closed).await;
    }

    // -- output -------------------------------------------------------------

    async fn emit(&self, event: SessionEvent) {
        let _ = self.outputs.events.send(event).await;
    }

    async fn notice(&self, notice: Notice) {
        self.emit(SessionEvent::Notice(notice)).await;
    }

    /// Stamp and send. Returns `false` when the channel dropped it.
    async fn publish(&mut self, draft: Draft) -> bool {
        let kind = draft.kind;
        let envelope = self.room.stamp(draft, now_millis());
        let body = match envelope.encode() {
            Ok(body) => body,
            Err(e) => {
                warn!(kind = %kind, error = %e, "Failed to encode envelope");
                return false;
            }
        };
        let destination = self.topics.destination(kind.route());
        let sent = self.channel.send(&destination, body).await;
        if sent {
            debug!(kind = %kind, "Envelope sent");
        }
        sent
    }

    fn publish_snapshot(&self) {
        let room = &self.room;
        let mut links: Vec<(String, LinkState)> = self
            .relay
            .links()
            .map(|(peer, link)| (peer.clone(), link.state))
            .collect();
        links.sort_by(|a, b| a.0.cmp(&b.0));
        let snapshot = RoomSnapshot {
            room_id: room.room_id().to_string(),
            status: self.status,
            roster: room.roster().iter().cloned().collect(),
            own_entitlements: room.permissions().own(),
            entitlements: room
                .permissions()
                .entries()
                .map(|(id, state)| (id.clone(), *state))
                .collect(),
            template: room.permissions().template(),
            slots: room.documents().slots().to_vec(),
            active_slot: room.documents().active_id().map(str::to_string),
            current_page: room.documents().current_page(),
            links,
            local_media: self.local_media,
            typing: self.typing.names(),
            tool: self.whiteboard.tool(),
            can_undo: self.whiteboard.can_undo(),
            can_redo: self.whiteboard.can_redo(),
            surface_version: self.surface_version,
        };
        self.outputs.snapshot.send_replace(snapshot);
    }

    async fn surface_changed(&mut self) {
        self.surface_version += 1;
        self.emit(SessionEvent::SurfaceChanged).await;
    }

    async fn flush_link_transitions(&mut self) {
        for (peer, state) in self.relay.take_transitions() {
            self.emit(SessionEvent::LinkStateChanged {
                peer: peer.clone(),
                state,
            })
            .await;
            if state == LinkState::Closed {
                self.emit(SessionEvent::RemoteMediaRemoved { peer }).await;
            }
        }
    }

    async fn typing_changed(&self) {
        self.emit(SessionEvent::TypingChanged(self.typing.names()))
            .await;
    }

    // -- channel ------------------------------------------------------------

    async fn on_channel_event(&mut self, event: ChannelEvent) {
        match event {
            ChannelEvent::StatusChanged(status) => self.on_status(status).await,
            ChannelEvent::Message { topic, body } => {
                let envelope = match Envelope::decode(&body) {
                    Ok(envelope) => envelope,
                    Err(e) => {
                        warn!(topic = %topic, error = %e, "Undecodable message dropped");
                        return;
                    }
                };
                debug!(kind = %envelope.kind, sender = %envelope.sender_id, "Envelope received");
                for effect in self.room.apply(&envelope) {
                    self.on_effect(effect).await;
                    if self.closed {
                        break;
                    }
                }
            }
            ChannelEvent::Error(message) => {
                warn!(room = %self.room.room_id(), error = %message, "Channel error");
            }
        }
    }

    async fn on_status(&mut self, status: ChannelStatus) {
        let previous = std::mem::replace(&mut self.status, status);
        self.emit(SessionEvent::StatusChanged(status)).await;

        match status {
            ChannelStatus::Connected => {
                let reconnected = self.was_connected;
                if reconnected {
                    self.notice(Notice::info(NoticeTopic::Transport, "Reconnected", ""))
                        .await;
                }
                self.was_connected = true;
                match self.room.announce_join(now_millis()) {
                    Ok(draft) => {
                        self.publish(draft).await;
                    }
                    Err(e) => warn!(error = %e, "Failed to build join announcement"),
                }
                // Navigation sent during the outage is only in the service.
                if reconnected {
                    if let Err(e) = self.refresh_slots().await {
                        warn!(error = %e, "Slot refresh after reconnect failed");
                    }
                }
            }
            ChannelStatus::Disconnected | ChannelStatus::Error
                if previous == ChannelStatus::Connected =>
            {
                for gone in self.room.reset_roster() {
                    self.whiteboard.forget_sender(&gone.id);
                }
                self.typing.clear();
                self.emit(SessionEvent::RosterReset).await;
                self.notice(Notice::warning(
                    NoticeTopic::Transport,
                    "Connection lost",
                    "Reconnecting to the room",
                ))
                .await;
            }
            _ => {}
        }
    }

    async fn on_effect(&mut self, effect: Effect) {
        match effect {
            Effect::PeerJoined(info) => {
                let peer = info.id.clone();
                self.emit(SessionEvent::ParticipantJoined(info)).await;
                if self.media.is_available() {
                    match self.relay.on_participant_joined(&peer).await {
                        Ok(Some(offer)) => {
                            self.publish(offer).await;
                        }
                        Ok(None) => {}
                        Err(e) => self.negotiation_failed(&peer, e).await,
                    }
                    self.flush_link_transitions().await;
                }
            }
            Effect::PeerLeft(info) => {
                self.relay.teardown(&info.id).await;
                self.flush_link_transitions().await;
                self.whiteboard.forget_sender(&info.id);
                if self.typing.remove(&info.id) {
                    self.typing_changed().await;
                }
                self.emit(SessionEvent::ParticipantLeft(info)).await;
            }
            Effect::Signal { from, signal } => self.on_signal(&from, signal).await,
            Effect::Strokes { from, batch } => {
                self.whiteboard.apply_remote(&from, &batch);
                self.surface_changed().await;
            }
            Effect::ClearSurface { from } => {
                debug!(by = %from, "Surface cleared");
                self.whiteboard.clear();
                self.surface_changed().await;
            }
            Effect::PageChanged { slot, page, by } => {
                self.emit(SessionEvent::PageChanged { slot, page, by }).await;
            }
            Effect::RefreshSlots => {
                if let Err(e) = self.refresh_slots().await {
                    warn!(error = %e, "Slot refresh failed");
                    self.notice(Notice::warning(
                        NoticeTopic::Document,
                        "Could not refresh documents",
                        e.to_string(),
                    ))
                    .await;
                }
            }
            Effect::ActiveSlotCleared => self.emit(SessionEvent::ActiveSlotCleared).await,
            Effect::EntitlementsChanged(change) => {
                if change.participant == self.room.local_id() {
                    self.enforce_entitlements(change.state).await;
                    self.notice(Notice::info(
                        NoticeTopic::Permission,
                        "Permissions updated",
                        "The host changed what you can do in this room",
                    ))
                    .await;
                }
                self.emit(SessionEvent::EntitlementsChanged(change)).await;
            }
            Effect::Kicked { reason, by } => {
                self.notice(Notice::error(
                    NoticeTopic::Moderation,
                    "Removed from the room",
                    reason.clone(),
                ))
                .await;
                self.emit(SessionEvent::Kicked { reason, by }).await;
                self.shutdown().await;
            }
            Effect::ParticipantKicked { id } => {
                self.emit(SessionEvent::ParticipantKicked { id }).await;
            }
            Effect::Chat(message) => {
                if self.typing.remove(&message.sender_id) {
                    self.typing_changed().await;
                }
                self.emit(SessionEvent::ChatMessage(message)).await;
            }
            Effect::Typing {
                id,
                name,
                is_typing,
            } => {
                if self.typing.update(&id, &name, is_typing, now()) {
                    self.typing_changed().await;
                }
            }
        }
    }

    // -- negotiation --------------------------------------------------------

    async fn on_signal(&mut self, from: &str, signal: Signal) {
        if !self.media.is_available() {
            debug!(peer = %from, "Signal ignored without media backend");
            return;
        }
        let result = match signal {
            Signal::Offer(offer) => match self.relay.on_offer(from, &offer).await {
                Ok(Some(answer)) => {
                    self.publish(answer).await;
                    Ok(())
                }
                Ok(None) => Ok(()),
                Err(e) => Err(e),
            },
            Signal::Answer(answer) => self.relay.on_answer(from, &answer).await,
            Signal::Candidate(candidate) => {
                self.relay.on_remote_candidate(from, &candidate).await;
                Ok(())
            }
        };
        if let Err(e) = result {
            self.negotiation_failed(from, e).await;
        }
        self.flush_link_transitions().await;
    }

    async fn negotiation_failed(&self, peer: &str, err: LiveError) {
        warn!(peer = %peer, error = %err, "Negotiation failed");
        let name = self
            .room
            .roster()
            .get(peer)
            .map(|p| p.name.clone())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| peer.to_string());
        self.notice(Notice::error(
            NoticeTopic::Negotiation {
                peer: peer.to_string(),
            },
            format!("Could not connect to {name}"),
            err.to_string(),
        ))
        .await;
    }

    async fn on_media_signal(&mut self, signal: MediaSignal) {
        match signal {
            MediaSignal::LocalCandidate { peer, candidate } => {
                match self.relay.on_local_candidate(&peer, &candidate) {
                    Ok(Some(draft)) => {
                        self.publish(draft).await;
                    }
                    Ok(None) => {}
                    Err(e) => warn!(peer = %peer, error = %e, "Failed to encode candidate"),
                }
            }
            MediaSignal::LinkConnected { peer } => {
                info!(peer = %peer, "Link connected");
                self.relay.on_link_connected(&peer);
            }
            MediaSignal::LinkFailed { peer, reason } => {
                if self.relay.on_link_failed(&peer, &reason).await {
                    self.negotiation_failed(
                        &peer,
                        LiveError::Negotiation {
                            peer: peer.clone(),
                            reason,
                        },
                    )
                    .await;
                }
            }
            MediaSignal::RemoteTrack { peer, kind } => {
                self.emit(SessionEvent::RemoteMediaAdded { peer, kind }).await;
            }
            MediaSignal::CaptureEnded { kind } => {
                match kind {
                    MediaKind::Video => self.local_media.video = false,
                    MediaKind::Audio => self.local_media.audio = false,
                    MediaKind::Screen => self.local_media.screen = false,
                }
                self.room
                    .set_own_media(self.local_media.video, self.local_media.audio);
                let notice = match kind {
                    MediaKind::Screen => {
                        Notice::info(NoticeTopic::Media, "Screen sharing stopped", "")
                    }
                    _ => Notice::warning(
                        NoticeTopic::Media,
                        "Capture device stopped",
                        format!("{kind:?} is no longer available"),
                    ),
                };
                self.notice(notice).await;
            }
        }
        self.flush_link_transitions().await;
    }

    // -- local media --------------------------------------------------------

    async fn set_local_track(&mut self, kind: MediaKind, enabled: bool) -> Result<(), LiveError> {
        self.media.set_track_enabled(kind, enabled).await?;
        match kind {
            MediaKind::Video => self.local_media.video = enabled,
            MediaKind::Audio => self.local_media.audio = enabled,
            MediaKind::Screen => self.local_media.screen = enabled,
        }
        self.room
            .set_own_media(self.local_media.video, self.local_media.audio);
        Ok(())
    }

    /// Turn off anything the new entitlements no longer allow. Granting an
    /// entitlement never switches capture back on.
    async fn enforce_entitlements(&mut self, state: EntitlementState) {
        if !state.camera && self.local_media.video {
            if let Err(e) = self.set_local_track(MediaKind::Video, false).await {
                warn!(error = %e, "Failed to stop camera");
            }
        }
        if !state.mic && self.local_media.audio {
            if let Err(e) = self.set_local_track(MediaKind::Audio, false).await {
                warn!(error = %e, "Failed to stop microphone");
            }
        }
        if !state.screen_share && self.local_media.screen {
            if let Err(e) = self.media.stop_screen_share().await {
                warn!(error = %e, "Failed to stop screen share");
            }
            self.local_media.screen = false;
        }
        if !state.whiteboard && self.whiteboard.is_drawing() {
            self.whiteboard.abort_stroke();
        }
    }

    // -- timers -------------------------------------------------------------

    /// Returns whether anything visible changed.
    async fn on_tick(&mut self) -> bool {
        let now = now();
        let mut changed = false;
        if let Some(batch) = self.whiteboard.tick(now) {
            self.send_strokes(&batch).await;
        }
        if !self.typing.expire(now).is_empty() {
            self.typing_changed().await;
            changed = true;
        }
        changed
    }

    async fn send_strokes(&mut self, batch: &StrokeBatch) {
        match Draft::broadcast(EnvelopeKind::WhiteboardDraw, batch) {
            Ok(draft) => {
                self.publish(draft).await;
            }
            Err(e) => warn!(error = %e, "Failed to encode strokes"),
        }
    }

    // -- documents ----------------------------------------------------------

    async fn refresh_slots(&mut self) -> Result<(), LiveError> {
        let slots = self.documents.list_slots(self.room.room_id()).await?;
        debug!(count = slots.len(), "Slot list refreshed");
        let had_active = self.room.documents().active_id().is_some();
        self.room.documents_mut().replace_slots(slots);
        self.emit(SessionEvent::SlotsRefreshed).await;
        if had_active && self.room.documents().active_id().is_none() {
            self.emit(SessionEvent::ActiveSlotCleared).await;
        }
        Ok(())
    }

    async fn navigate(
        &mut self,
        slot: &str,
        page: u32,
        action: NavigationAction,
    ) -> Result<u32, LiveError> {
        self.room.ensure_host("document-navigation")?;
        let page = self.room.documents().target_page(slot, action, page)?;
        self.documents.navigate(slot, page, action).await?;

        let by = self.room.local_id().to_string();
        let payload = self
            .room
            .documents_mut()
            .navigate_local(slot, page, action, &by, now_millis())?;
        self.publish(Draft::broadcast(EnvelopeKind::DocumentNavigation, &payload)?)
            .await;
        self.emit(SessionEvent::PageChanged {
            slot: slot.to_string(),
            page,
            by: Some(by),
        })
        .await;
        Ok(page)
    }

    async fn upload_slot(&mut self, upload: SlotUpload) -> Result<DocumentSlot, LiveError> {
        self.room.permissions().require(Entitlement::FileUpload)?;
        let slot = self
            .documents
            .upload_slot(self.room.room_id(), upload)
            .await?;
        info!(slot = %slot.id, file = %slot.original_file_name, "Document uploaded");
        self.publish(Draft::broadcast(
            EnvelopeKind::DocumentUploaded,
            &SlotEventPayload {
                document_id: slot.id.clone(),
            },
        )?)
        .await;
        if let Err(e) = self.refresh_slots().await {
            warn!(error = %e, "Slot refresh after upload failed");
        }
        Ok(slot)
    }

    async fn delete_slot(&mut self, slot: &str) -> Result<(), LiveError> {
        self.room.permissions().require(Entitlement::FileUpload)?;
        self.documents.delete_slot(slot).await?;
        if self.room.documents_mut().remove_slot(slot) {
            self.emit(SessionEvent::ActiveSlotCleared).await;
        }
        self.publish(Draft::broadcast(
            EnvelopeKind::DocumentDeleted,
            &SlotEventPayload {
                document_id: slot.to_string(),
            },
        )?)
        .await;
        if let Err(e) = self.refresh_slots().await {
            warn!(error = %e, "Slot refresh after delete failed");
        }
        Ok(())
    }

    // -- commands -----------------------------------------------------------

    async fn on_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::PointerDown { x, y, reply } => {
                let _ = reply.send(self.pointer_down(x, y));
            }
            SessionCommand::PointerMove { x, y, reply } => {
                let drawing = self.whiteboard.is_drawing();
                if let Some(batch) = self.whiteboard.pointer_move(x, y, now()) {
                    self.send_strokes(&batch).await;
                }
                if drawing {
                    self.surface_version += 1;
                }
                let _ = reply.send(Ok(()));
            }
            SessionCommand::PointerUp { reply } => {
                if let Some(batch) = self.whiteboard.pointer_up(now()) {
                    self.send_strokes(&batch).await;
                }
                let _ = reply.send(Ok(()));
            }
            SessionCommand::SetTool { tool, reply } => {
                let result = if tool == Tool::Eraser {
                    self.room.ensure_host("eraser")
                } else {
                    Ok(())
                };
                if result.is_ok() {
                    self.whiteboard.set_tool(tool);
                }
                let _ = reply.send(result);
            }
            SessionCommand::SetColor { color, reply } => {
                let result = match parse_color(&color) {
                    Some(_) => {
                        self.whiteboard.set_color(color);
                        Ok(())
                    }
                    None => Err(LiveError::Other(format!("invalid color {color}"))),
                };
                let _ = reply.send(result);
            }
            SessionCommand::SetWidth { width, reply } => {
                let result = if width.is_finite() && width > 0.0 {
                    self.whiteboard.set_width(width);
                    Ok(())
                } else {
                    Err(LiveError::Other(format!("invalid stroke width {width}")))
                };
                let _ = reply.send(result);
            }
            SessionCommand::Undo { reply } => {
                let undone = self.whiteboard.undo();
                if undone {
                    self.surface_changed().await;
                }
                let _ = reply.send(Ok(undone));
            }
            SessionCommand::Redo { reply } => {
                let redone = self.whiteboard.redo();
                if redone {
                    self.surface_changed().await;
                }
                let _ = reply.send(Ok(redone));
            }
            SessionCommand::ClearSurface { reply } => {
                let result = self.clear_surface().await;
                let _ = reply.send(result);
            }
            SessionCommand::ExportSurface { reply } => {
                let _ = reply.send(Ok(self.whiteboard.export_ppm()));
            }

            SessionCommand::Navigate {
                slot,
                page,
                action,
                reply,
            } => {
                let result = self.navigate(&slot, page, action).await;
                let _ = reply.send(result);
            }
            SessionCommand::SelectSlot { slot, reply } => {
                let result = if self.room.documents_mut().select(&slot) {
                    Ok(())
                } else {
                    Err(LiveError::Document(format!("unknown slot {slot}")))
                };
                let _ = reply.send(result);
            }
            SessionCommand::RefreshSlots { reply } => {
                let result = self.refresh_slots().await;
                let _ = reply.send(result);
            }
            SessionCommand::UploadSlot { upload, reply } => {
                let result = self.upload_slot(upload).await;
                let _ = reply.send(result);
            }
            SessionCommand::DeleteSlot { slot, reply } => {
                let result = self.delete_slot(&slot).await;
                let _ = reply.send(result);
            }
            SessionCommand::PresentationState { slot, reply } => {
                let result = self.documents.presentation_state(&slot).await;
                let _ = reply.send(result);
            }

            SessionCommand::SetEntitlement {
                target,
                entitlement,
                value,
                reply,
            } => {
                let result = self.set_entitlement(&target, entitlement, value).await;
                let _ = reply.send(result);
            }
            SessionCommand::SetGlobal {
                entitlement,
                value,
                reply,
            } => {
                let result = match self.room.permissions_mut().set_global(entitlement, value) {
                    Ok(draft) => {
                        info!(permission = %entitlement, value, "Default entitlements changed");
                        self.publish(draft).await;
                        Ok(())
                    }
                    Err(e) => Err(e),
                };
                let _ = reply.send(result);
            }
            SessionCommand::MuteAll { reply } => {
                let result = match self.room.permissions_mut().mute_all() {
                    Ok(draft) => {
                        self.publish(draft).await;
                        Ok(())
                    }
                    Err(e) => Err(e),
                };
                let _ = reply.send(result);
            }
            SessionCommand::AllowUnmuteAll { reply } => {
                let result = match self.room.permissions_mut().allow_unmute_all() {
                    Ok(draft) => {
                        self.publish(draft).await;
                        Ok(())
                    }
                    Err(e) => Err(e),
                };
                let _ = reply.send(result);
            }
            SessionCommand::Kick {
                target,
                reason,
                reply,
            } => {
                let result = match self.room.permissions().kick(&target, &reason) {
                    Ok(draft) => {
                        info!(participant = %target, "Kicking participant");
                        self.publish(draft).await;
                        self.emit(SessionEvent::ParticipantKicked { id: target }).await;
                        Ok(())
                    }
                    Err(e) => Err(e),
                };
                let _ = reply.send(result);
            }

            SessionCommand::SendChat { content, reply } => {
                let result = self.send_chat(&content).await;
                let _ = reply.send(result);
            }
            SessionCommand::SetTyping { is_typing, reply } => {
                let payload = TypingPayload {
                    user_name: self.room.identity().info.name.clone(),
                    is_typing,
                };
                let result = match Draft::broadcast(EnvelopeKind::UserTyping, &payload) {
                    Ok(draft) => {
                        self.publish(draft).await;
                        Ok(())
                    }
                    Err(e) => Err(e),
                };
                let _ = reply.send(result);
            }

            SessionCommand::SetCamera { enabled, reply } => {
                let result = self.set_capture(MediaKind::Video, Entitlement::Camera, enabled).await;
                let _ = reply.send(result);
            }
            SessionCommand::SetMic { enabled, reply } => {
                let result = self.set_capture(MediaKind::Audio, Entitlement::Mic, enabled).await;
                let _ = reply.send(result);
            }
            SessionCommand::StartScreenShare { reply } => {
                let result = self.start_screen_share().await;
                let _ = reply.send(result);
            }
            SessionCommand::StopScreenShare { reply } => {
                let result = self.media.stop_screen_share().await;
                if result.is_ok() {
                    self.local_media.screen = false;
                }
                let _ = reply.send(result);
            }

            SessionCommand::Leave { reply } => {
                self.shutdown().await;
                let _ = reply.send(Ok(()));
            }
        }
    }

    fn pointer_down(&mut self, x: f32, y: f32) -> Result<(), LiveError> {
        self.room.permissions().require(Entitlement::Whiteboard)?;
        self.whiteboard.pointer_down(x, y);
        Ok(())
    }

    async fn clear_surface(&mut self) -> Result<(), LiveError> {
        self.room.ensure_host("whiteboard-clear")?;
        self.whiteboard.clear();
        self.publish(Draft::bare(EnvelopeKind::WhiteboardClear)).await;
        self.surface_changed().await;
        Ok(())
    }

    async fn set_entitlement(
        &mut self,
        target: &str,
        entitlement: Entitlement,
        value: bool,
    ) -> Result<(), LiveError> {
        let draft = self
            .room
            .permissions_mut()
            .set_entitlement(target, entitlement, value)?;
        self.publish(draft).await;
        if let Some(state) = self.room.permissions().get(target) {
            self.emit(SessionEvent::EntitlementsChanged(EntitlementChange {
                participant: target.to_string(),
                state,
            }))
            .await;
        }
        Ok(())
    }

    async fn send_chat(&mut self, content: &str) -> Result<ChatMessage, LiveError> {
        self.room.permissions().require(Entitlement::Chat)?;
        let content = content.trim();
        if content.is_empty() {
            return Err(LiveError::Other("empty chat message".into()));
        }
        let (draft, message) = self.room.record_local_chat(content, now_millis())?;
        self.publish(draft).await;
        self.emit(SessionEvent::ChatMessage(message.clone())).await;
        Ok(message)
    }

    async fn set_capture(
        &mut self,
        kind: MediaKind,
        entitlement: Entitlement,
        enabled: bool,
    ) -> Result<(), LiveError> {
        if enabled {
            self.room.permissions().require(entitlement)?;
        }
        self.set_local_track(kind, enabled).await
    }

    async fn start_screen_share(&mut self) -> Result<(), LiveError> {
        self.room.permissions().require(Entitlement::ScreenShare)?;
        self.media.start_screen_share().await?;
        self.local_media.screen = true;
        Ok(())
    }
}
