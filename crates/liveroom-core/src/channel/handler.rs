//! Inbound STOMP frame handling.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::frame::{Command, Frame};
use super::types::ChannelEvent;

/// What the connection loop should do after a frame.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum FrameOutcome {
    Continue,
    /// The broker sent ERROR; it closes the socket right after.
    Rejected(String),
}

/// Dispatch one server frame. `subscriptions` maps subscription id to topic.
pub(crate) async fn handle_frame(
    frame: Frame,
    subscriptions: &HashMap<String, String>,
    event_tx: &mpsc::Sender<ChannelEvent>,
) -> FrameOutcome {
    match frame.command {
        Command::Message => {
            let topic = frame
                .get("subscription")
                .and_then(|id| subscriptions.get(id))
                .cloned()
                .or_else(|| frame.get("destination").map(str::to_string));
            match topic {
                Some(topic) => {
                    debug!(topic = %topic, bytes = frame.body.len(), "Message received");
                    let _ = event_tx
                        .send(ChannelEvent::Message {
                            topic,
                            body: frame.body,
                        })
                        .await;
                }
                None => warn!("MESSAGE frame without subscription or destination"),
            }
        }
        Command::Receipt => {
            debug!(receipt = ?frame.get("receipt-id"), "Receipt");
        }
        Command::Error => {
            let reason = frame
                .get("message")
                .map(str::to_string)
                .unwrap_or_else(|| "broker error".to_string());
            warn!(reason = %reason, body = %frame.body, "Broker sent ERROR");
            let _ = event_tx.send(ChannelEvent::Error(reason.clone())).await;
            return FrameOutcome::Rejected(reason);
        }
        Command::Connected => debug!("Duplicate CONNECTED ignored"),
        other => debug!(command = other.as_str(), "Ignoring client frame from broker"),
    }
    FrameOutcome::Continue
}
