//! Public handle for interacting with the broker connection.

use tokio::sync::{mpsc, watch};
use tracing::debug;

use super::connection::connection_loop;
use super::types::{ChannelCommand, ChannelEvent, ChannelSettings, ChannelStatus};

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Handle for the room channel.
///
/// All methods are non-blocking and send commands to the background
/// connection task. There is no outbound queue: [`send`](Self::send) while
/// not connected drops the message.
pub struct ChannelClient {
    command_tx: mpsc::Sender<ChannelCommand>,
    status: watch::Receiver<ChannelStatus>,
}

impl ChannelClient {
    /// Create a new client and start the background connection.
    /// Returns `(client, event_receiver)`.
    pub fn connect(settings: ChannelSettings) -> (Self, mpsc::Receiver<ChannelEvent>) {
        let (event_tx, event_rx) = mpsc::channel(256);
        let (command_tx, command_rx) = mpsc::channel(64);
        let (status_tx, status_rx) = watch::channel(ChannelStatus::Disconnected);

        let client = Self {
            command_tx,
            status: status_rx,
        };

        tokio::spawn(connection_loop(settings, status_tx, event_tx, command_rx));

        (client, event_rx)
    }

    /// Clone the command sender to create a lightweight handle
    /// that talks to the same connection.
    pub fn clone_sender(&self) -> Self {
        Self {
            command_tx: self.command_tx.clone(),
            status: self.status.clone(),
        }
    }

    /// Subscribe to a topic now and after every reconnect.
    pub async fn subscribe(&self, topic: &str) {
        let _ = self
            .command_tx
            .send(ChannelCommand::Subscribe {
                topic: topic.to_string(),
            })
            .await;
    }

    pub async fn unsubscribe(&self, topic: &str) {
        let _ = self
            .command_tx
            .send(ChannelCommand::Unsubscribe {
                topic: topic.to_string(),
            })
            .await;
    }

    /// Publish a body to a destination. Returns `false` when the channel is
    /// not connected and the message was dropped.
    pub async fn send(&self, destination: &str, body: String) -> bool {
        if !self.is_connected() {
            debug!(destination = %destination, "Channel not connected, dropping message");
            return false;
        }
        self.command_tx
            .send(ChannelCommand::Send {
                destination: destination.to_string(),
                body,
            })
            .await
            .is_ok()
    }

    pub fn status(&self) -> ChannelStatus {
        *self.status.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.status() == ChannelStatus::Connected
    }

    /// Wait until the channel reaches `target`. Returns `false` if the
    /// connection task has stopped.
    pub async fn wait_for_status(&self, target: ChannelStatus) -> bool {
        let mut rx = self.status.clone();
        let reached = rx.wait_for(|s| *s == target).await.is_ok();
        reached
    }

    /// Stop the connection task. Subscriptions are not restored afterwards.
    pub async fn disconnect(&self) {
        let _ = self.command_tx.send(ChannelCommand::Disconnect).await;
    }
}
