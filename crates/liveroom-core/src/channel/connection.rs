//! Background WebSocket connection loop with fixed-interval reconnect.

use std::collections::HashMap;
use std::time::Duration;

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, Interval};
use tokio_tungstenite::tungstenite::{self, Message as WsMessage};
use tracing::{debug, error, info, warn};

use super::frame::{Command, Frame, HEARTBEAT};
use super::handler::{handle_frame, FrameOutcome};
use super::types::{ChannelCommand, ChannelEvent, ChannelSettings, ChannelStatus};

/// How one connection attempt ended.
enum SessionEnd {
    /// The handle asked to disconnect, or every handle was dropped.
    Shutdown,
    /// The socket closed after a successful handshake.
    Lost,
    /// Connect, handshake or broker ERROR.
    Failed,
}

// ---------------------------------------------------------------------------
// Connection Loop
// ---------------------------------------------------------------------------

/// Background task owning the broker connection.
///
/// Keeps the set of desired topics across reconnects and re-subscribes
/// after every successful handshake.
pub(crate) async fn connection_loop(
    settings: ChannelSettings,
    status_tx: watch::Sender<ChannelStatus>,
    event_tx: mpsc::Sender<ChannelEvent>,
    mut command_rx: mpsc::Receiver<ChannelCommand>,
) {
    let mut topics: Vec<String> = Vec::new();

    loop {
        set_status(&status_tx, &event_tx, ChannelStatus::Connecting).await;
        info!(url = %settings.broker_url, "Connecting to broker");

        let end = match tokio::time::timeout(
            settings.connect_timeout,
            tokio_tungstenite::connect_async(settings.broker_url.as_str()),
        )
        .await
        {
            Ok(Ok((ws_stream, _))) => {
                let (write, read) = ws_stream.split();
                run_connection(
                    write,
                    read,
                    &settings,
                    &mut topics,
                    &status_tx,
                    &event_tx,
                    &mut command_rx,
                )
                .await
            }
            Ok(Err(e)) => {
                error!(error = %e, "Failed to connect to broker");
                let _ = event_tx
                    .send(ChannelEvent::Error(format!("Connection failed: {e}")))
                    .await;
                SessionEnd::Failed
            }
            Err(_elapsed) => {
                error!(
                    timeout_secs = settings.connect_timeout.as_secs(),
                    "Broker connection timed out"
                );
                let _ = event_tx
                    .send(ChannelEvent::Error("Connection timed out".to_string()))
                    .await;
                SessionEnd::Failed
            }
        };

        match end {
            SessionEnd::Shutdown => {
                set_status(&status_tx, &event_tx, ChannelStatus::Disconnected).await;
                info!("Channel closed");
                return;
            }
            SessionEnd::Lost => {
                set_status(&status_tx, &event_tx, ChannelStatus::Disconnected).await;
            }
            SessionEnd::Failed => {
                set_status(&status_tx, &event_tx, ChannelStatus::Error).await;
            }
        }

        info!(
            delay_ms = settings.reconnect_delay.as_millis() as u64,
            "Reconnecting after delay"
        );
        if !wait_before_retry(settings.reconnect_delay, &mut topics, &mut command_rx).await {
            set_status(&status_tx, &event_tx, ChannelStatus::Disconnected).await;
            info!("Channel closed while waiting to reconnect");
            return;
        }
    }
}

async fn set_status(
    status_tx: &watch::Sender<ChannelStatus>,
    event_tx: &mpsc::Sender<ChannelEvent>,
    status: ChannelStatus,
) {
    let changed = status_tx.send_if_modified(|current| {
        if *current == status {
            false
        } else {
            *current = status;
            true
        }
    });
    if changed {
        let _ = event_tx.send(ChannelEvent::StatusChanged(status)).await;
    }
}

// ---------------------------------------------------------------------------
// One connection
// ---------------------------------------------------------------------------

async fn run_connection<W, R>(
    mut write: W,
    mut read: R,
    settings: &ChannelSettings,
    topics: &mut Vec<String>,
    status_tx: &watch::Sender<ChannelStatus>,
    event_tx: &mpsc::Sender<ChannelEvent>,
    command_rx: &mut mpsc::Receiver<ChannelCommand>,
) -> SessionEnd
where
    W: Sink<WsMessage> + Unpin,
    R: Stream<Item = Result<WsMessage, tungstenite::Error>> + Unpin,
{
    let mut connect = Frame::new(Command::Connect)
        .header("accept-version", "1.2")
        .header("host", settings.virtual_host())
        .header(
            "heart-beat",
            format!("{},0", settings.heartbeat.as_millis()),
        );
    if let Some(token) = &settings.access_token {
        connect = connect.header("Authorization", format!("Bearer {token}"));
    }
    if !send_frame(&mut write, &connect).await {
        return SessionEnd::Lost;
    }

    match tokio::time::timeout(settings.connect_timeout, await_connected(&mut read)).await {
        Ok(Ok(())) => {}
        Ok(Err(reason)) => {
            warn!(reason = %reason, "STOMP handshake failed");
            let _ = event_tx.send(ChannelEvent::Error(reason)).await;
            return SessionEnd::Failed;
        }
        Err(_elapsed) => {
            warn!("STOMP handshake timed out");
            let _ = event_tx
                .send(ChannelEvent::Error("Handshake timed out".to_string()))
                .await;
            return SessionEnd::Failed;
        }
    }

    // Subscription id -> topic.
    let mut subscriptions: HashMap<String, String> = HashMap::new();
    let mut next_sub: u64 = 0;
    for topic in topics.iter() {
        if !subscribe(&mut write, &mut subscriptions, &mut next_sub, topic).await {
            return SessionEnd::Lost;
        }
    }

    set_status(status_tx, event_tx, ChannelStatus::Connected).await;
    info!(subscriptions = subscriptions.len(), "Connected to broker");

    let mut heartbeat = (!settings.heartbeat.is_zero()).then(|| {
        tokio::time::interval_at(Instant::now() + settings.heartbeat, settings.heartbeat)
    });

    loop {
        tokio::select! {
            msg = read.next() => match msg {
                Some(Ok(WsMessage::Text(text))) => match Frame::parse(&text) {
                    Ok(Some(frame)) => {
                        if let FrameOutcome::Rejected(_) =
                            handle_frame(frame, &subscriptions, event_tx).await
                        {
                            return SessionEnd::Failed;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => warn!(error = %e, "Unparseable frame from broker"),
                },
                Some(Ok(WsMessage::Close(_))) | None => {
                    info!("Broker closed connection");
                    return SessionEnd::Lost;
                }
                Some(Err(e)) => {
                    warn!(error = %e, "WebSocket error");
                    return SessionEnd::Lost;
                }
                Some(Ok(_)) => {}
            },
            cmd = command_rx.recv() => match cmd {
                Some(ChannelCommand::Subscribe { topic }) => {
                    if !topics.contains(&topic) {
                        topics.push(topic.clone());
                        if !subscribe(&mut write, &mut subscriptions, &mut next_sub, &topic).await {
                            return SessionEnd::Lost;
                        }
                    }
                }
                Some(ChannelCommand::Unsubscribe { topic }) => {
                    topics.retain(|t| t != &topic);
                    let id = subscriptions
                        .iter()
                        .find(|(_, t)| **t == topic)
                        .map(|(id, _)| id.clone());
                    if let Some(id) = id {
                        subscriptions.remove(&id);
                        let frame = Frame::new(Command::Unsubscribe).header("id", id);
                        if !send_frame(&mut write, &frame).await {
                            return SessionEnd::Lost;
                        }
                    }
                }
                Some(ChannelCommand::Send { destination, body }) => {
                    debug!(destination = %destination, bytes = body.len(), "Publishing");
                    let frame = Frame::new(Command::Send)
                        .header("destination", destination)
                        .header("content-type", "application/json")
                        .body(body);
                    if !send_frame(&mut write, &frame).await {
                        return SessionEnd::Lost;
                    }
                }
                Some(ChannelCommand::Disconnect) | None => {
                    let _ = send_frame(&mut write, &Frame::new(Command::Disconnect)).await;
                    let _ = write.send(WsMessage::Close(None)).await;
                    return SessionEnd::Shutdown;
                }
            },
            _ = next_heartbeat(&mut heartbeat) => {
                if write.send(WsMessage::Text(HEARTBEAT.to_string().into())).await.is_err() {
                    return SessionEnd::Lost;
                }
            }
        }
    }
}

async fn await_connected<R>(read: &mut R) -> Result<(), String>
where
    R: Stream<Item = Result<WsMessage, tungstenite::Error>> + Unpin,
{
    while let Some(msg) = read.next().await {
        match msg {
            Ok(WsMessage::Text(text)) => match Frame::parse(&text) {
                Ok(Some(frame)) if frame.command == Command::Connected => return Ok(()),
                Ok(Some(frame)) if frame.command == Command::Error => {
                    return Err(frame
                        .get("message")
                        .unwrap_or("broker rejected CONNECT")
                        .to_string());
                }
                Ok(_) => {}
                Err(e) => return Err(format!("bad frame during handshake: {e}")),
            },
            Ok(WsMessage::Close(_)) => return Err("closed during handshake".to_string()),
            Ok(_) => {}
            Err(e) => return Err(e.to_string()),
        }
    }
    Err("stream ended during handshake".to_string())
}

async fn subscribe<W>(
    write: &mut W,
    subscriptions: &mut HashMap<String, String>,
    next_sub: &mut u64,
    topic: &str,
) -> bool
where
    W: Sink<WsMessage> + Unpin,
{
    let id = format!("sub-{next_sub}");
    *next_sub += 1;
    let frame = Frame::new(Command::Subscribe)
        .header("id", id.clone())
        .header("destination", topic)
        .header("ack", "auto");
    debug!(topic = %topic, id = %id, "Subscribing");
    subscriptions.insert(id, topic.to_string());
    send_frame(write, &frame).await
}

async fn send_frame<W>(write: &mut W, frame: &Frame) -> bool
where
    W: Sink<WsMessage> + Unpin,
{
    write
        .send(WsMessage::Text(frame.encode().into()))
        .await
        .is_ok()
}

async fn next_heartbeat(heartbeat: &mut Option<Interval>) {
    match heartbeat {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

// ---------------------------------------------------------------------------
// Offline
// ---------------------------------------------------------------------------

/// Sleep out the reconnect delay while keeping the topic set current and
/// discarding sends. Returns `false` when the client should shut down.
async fn wait_before_retry(
    delay: Duration,
    topics: &mut Vec<String>,
    command_rx: &mut mpsc::Receiver<ChannelCommand>,
) -> bool {
    let sleep = tokio::time::sleep(delay);
    tokio::pin!(sleep);

    loop {
        tokio::select! {
            _ = &mut sleep => break,
            cmd = command_rx.recv() => {
                if !track_offline(cmd, topics) {
                    return false;
                }
            }
        }
    }

    // Anything still queued was issued before the reconnect.
    loop {
        match command_rx.try_recv() {
            Ok(cmd) => {
                if !track_offline(Some(cmd), topics) {
                    return false;
                }
            }
            Err(TryRecvError::Empty) => return true,
            Err(TryRecvError::Disconnected) => return false,
        }
    }
}

fn track_offline(cmd: Option<ChannelCommand>, topics: &mut Vec<String>) -> bool {
    match cmd {
        Some(ChannelCommand::Subscribe { topic }) => {
            if !topics.contains(&topic) {
                topics.push(topic);
            }
            true
        }
        Some(ChannelCommand::Unsubscribe { topic }) => {
            topics.retain(|t| t != &topic);
            true
        }
        Some(ChannelCommand::Send { destination, .. }) => {
            debug!(destination = %destination, "Dropping send while disconnected");
            true
        }
        Some(ChannelCommand::Disconnect) | None => false,
    }
}
