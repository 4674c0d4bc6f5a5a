//! Live session: one room membership from join to leave.
//!
//! A single task owns the room state, the negotiation relay and the
//! whiteboard, and serializes everything that touches them: inbound
//! envelopes, user commands, media callbacks and the stroke flush timer.
//! Callers talk to it through a [`LiveSessionHandle`] and observe it through
//! [`SessionEvent`]s plus a watched [`RoomSnapshot`].

mod driver;
mod handle;
mod types;

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::info;

use liveroom_config::LiveroomConfig;

use crate::channel::{ChannelClient, ChannelSettings};
use crate::documents::DocumentService;
use crate::identity::LocalIdentity;
use crate::negotiation::MediaEngine;
use crate::room::RoomState;

use driver::{Outputs, SessionDriver};

pub use handle::LiveSessionHandle;
pub use types::{RoomSnapshot, SessionEvent};

/// Entry point for joining a room.
pub struct LiveSession;

impl LiveSession {
    /// Connect to the broker and join `room_id`.
    ///
    /// Returns immediately; the join announcement goes out once the channel
    /// connects, and again after every reconnect.
    pub fn start(
        config: &LiveroomConfig,
        identity: LocalIdentity,
        room_id: impl Into<String>,
        media: Arc<dyn MediaEngine>,
        documents: Arc<dyn DocumentService>,
    ) -> (LiveSessionHandle, mpsc::Receiver<SessionEvent>) {
        let room_id = room_id.into();
        info!(
            room = %room_id,
            participant = %identity.id(),
            role = ?identity.role(),
            "Joining room"
        );

        let mut settings = ChannelSettings::from(&config.channel);
        settings.access_token = identity.access_token.clone();
        let (channel, channel_rx) = ChannelClient::connect(settings);

        let (event_tx, event_rx) = mpsc::channel(256);
        let (command_tx, command_rx) = mpsc::channel(64);
        let (media_tx, media_rx) = mpsc::channel(256);
        let (snapshot_tx, snapshot_rx) = watch::channel(RoomSnapshot::empty(&room_id));
        media.attach(media_tx);

        let room = RoomState::new(identity, room_id, config);
        let driver = SessionDriver::new(
            config,
            room,
            channel,
            media,
            documents,
            Outputs {
                events: event_tx,
                snapshot: snapshot_tx,
            },
        );
        tokio::spawn(driver.run(channel_rx, command_rx, media_rx));

        (LiveSessionHandle::new(command_tx, snapshot_rx), event_rx)
    }
}
