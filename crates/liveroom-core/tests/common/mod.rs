//! In-process STOMP broker and shared fixtures for integration tests.
//!
//! The broker speaks just enough STOMP 1.2 over a WebSocket for the room
//! channel: CONNECT, SUBSCRIBE, UNSUBSCRIBE, SEND and DISCONNECT. SENDs to
//! `/app/{join|leave|signal}/{room}` are relayed to every subscriber of the
//! matching room topic, the sender included.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;

use liveroom_common::LiveError;
use liveroom_config::LiveroomConfig;
use liveroom_core::channel::{Command, Frame};
use liveroom_core::documents::{
    DocumentService, DocumentSlot, NavigationAction, PresentationState, SlotUpload,
};
use liveroom_core::{LiveSessionHandle, RoomSnapshot, SessionEvent};

// ---------------------------------------------------------------------------
// Broker
// ---------------------------------------------------------------------------

/// Outbound item for one client's writer task.
enum Outbound {
    Text(String),
    Close,
}

struct ClientConn {
    tx: mpsc::UnboundedSender<Outbound>,
    /// Subscription id -> topic.
    subscriptions: HashMap<String, String>,
    connect_headers: Vec<(String, String)>,
}

#[derive(Default)]
struct BrokerState {
    next_client: u64,
    next_message: u64,
    clients: HashMap<u64, ClientConn>,
    /// Every SEND as (destination, body), in arrival order.
    published: Vec<(String, String)>,
    connections: u64,
}

#[derive(Clone)]
pub struct FakeBroker {
    pub url: String,
    state: Arc<Mutex<BrokerState>>,
}

impl FakeBroker {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let broker = Self {
            url: format!("ws://{addr}/ws"),
            state: Arc::new(Mutex::new(BrokerState::default())),
        };
        let state = Arc::clone(&broker.state);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve(stream, Arc::clone(&state)));
            }
        });
        broker
    }

    /// Total successful CONNECT handshakes so far.
    pub fn connections(&self) -> u64 {
        self.state.lock().unwrap().connections
    }

    pub fn published(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().published.clone()
    }

    /// Topics currently subscribed across all clients, sorted.
    pub fn subscribed_topics(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        let mut topics: Vec<String> = state
            .clients
            .values()
            .flat_map(|c| c.subscriptions.values().cloned())
            .collect();
        topics.sort();
        topics
    }

    pub fn connect_header(&self, name: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        state.clients.values().find_map(|c| {
            c.connect_headers
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
        })
    }

    /// Close every open socket from the broker side.
    pub fn drop_all(&self) {
        let mut state = self.state.lock().unwrap();
        for (_, client) in state.clients.drain() {
            let _ = client.tx.send(Outbound::Close);
        }
    }

    /// Deliver `body` to every subscriber of `topic`.
    pub fn inject(&self, topic: &str, body: &str) {
        let mut state = self.state.lock().unwrap();
        deliver(&mut state, topic, body);
    }

    /// Wait until `pred` holds for the broker state, or panic.
    pub async fn wait_until(&self, what: &str, pred: impl Fn(&FakeBroker) -> bool) {
        for _ in 0..200 {
            if pred(self) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("timed out waiting for {what}");
    }
}

fn route(destination: &str) -> Option<String> {
    let rest = destination.strip_prefix("/app/")?;
    let (verb, room) = rest.split_once('/')?;
    match verb {
        "join" => Some(format!("/topic/room/{room}/join")),
        "leave" => Some(format!("/topic/room/{room}/leave")),
        "signal" => Some(format!("/topic/room/{room}")),
        _ => None,
    }
}

fn deliver(state: &mut BrokerState, topic: &str, body: &str) {
    let mut frames = Vec::new();
    for client in state.clients.values() {
        for (id, sub_topic) in &client.subscriptions {
            if sub_topic == topic {
                frames.push((client.tx.clone(), id.clone()));
            }
        }
    }
    for (tx, id) in frames {
        state.next_message += 1;
        let frame = Frame::new(Command::Message)
            .header("subscription", id)
            .header("destination", topic)
            .header("message-id", state.next_message.to_string())
            .header("content-type", "application/json")
            .body(body);
        let _ = tx.send(Outbound::Text(frame.encode()));
    }
}

async fn serve(stream: TcpStream, state: Arc<Mutex<BrokerState>>) {
    let Ok(ws) = tokio_tungstenite::accept_async(stream).await else {
        return;
    };
    let (mut write, mut read) = ws.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Outbound>();

    tokio::spawn(async move {
        while let Some(out) = rx.recv().await {
            match out {
                Outbound::Text(text) => {
                    if write.send(WsMessage::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Outbound::Close => {
                    let _ = write.send(WsMessage::Close(None)).await;
                    break;
                }
            }
        }
    });

    let client_id = {
        let mut s = state.lock().unwrap();
        s.next_client += 1;
        s.next_client
    };

    while let Some(Ok(msg)) = read.next().await {
        let text = match msg {
            WsMessage::Text(text) => text,
            WsMessage::Close(_) => break,
            _ => continue,
        };
        let Ok(Some(frame)) = Frame::parse(&text) else {
            continue;
        };
        let mut s = state.lock().unwrap();
        match frame.command {
            Command::Connect | Command::Stomp => {
                s.connections += 1;
                s.clients.insert(
                    client_id,
                    ClientConn {
                        tx: tx.clone(),
                        subscriptions: HashMap::new(),
                        connect_headers: frame.headers.clone(),
                    },
                );
                let connected = Frame::new(Command::Connected)
                    .header("version", "1.2")
                    .header("heart-beat", "0,0");
                let _ = tx.send(Outbound::Text(connected.encode()));
            }
            Command::Subscribe => {
                if let (Some(id), Some(dest)) = (frame.get("id"), frame.get("destination")) {
                    if let Some(client) = s.clients.get_mut(&client_id) {
                        client
                            .subscriptions
                            .insert(id.to_string(), dest.to_string());
                    }
                }
            }
            Command::Unsubscribe => {
                if let Some(id) = frame.get("id") {
                    if let Some(client) = s.clients.get_mut(&client_id) {
                        client.subscriptions.remove(id);
                    }
                }
            }
            Command::Send => {
                let Some(dest) = frame.get("destination").map(str::to_string) else {
                    continue;
                };
                s.published.push((dest.clone(), frame.body.clone()));
                if let Some(topic) = route(&dest) {
                    deliver(&mut s, &topic, &frame.body);
                }
            }
            Command::Disconnect => {
                s.clients.remove(&client_id);
                break;
            }
            _ => {}
        }
    }

    state.lock().unwrap().clients.remove(&client_id);
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Config pointed at `broker` with short timers.
pub fn test_config(broker: &FakeBroker) -> LiveroomConfig {
    let mut config = LiveroomConfig::default();
    config.channel.broker_url = broker.url.clone();
    config.channel.reconnect_delay_ms = 100;
    config.channel.connect_timeout_secs = 2;
    config.channel.heartbeat_ms = 0;
    config.whiteboard.width = 64;
    config.whiteboard.height = 64;
    config
}

/// Receive events until one matches `pred`, or panic after `timeout`.
pub async fn expect_event<F>(
    rx: &mut mpsc::Receiver<SessionEvent>,
    what: &str,
    mut pred: F,
) -> SessionEvent
where
    F: FnMut(&SessionEvent) -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        match tokio::time::timeout_at(deadline, rx.recv()).await {
            Ok(Some(event)) if pred(&event) => return event,
            Ok(Some(_)) => {}
            Ok(None) => panic!("event stream ended while waiting for {what}"),
            Err(_) => panic!("timed out waiting for {what}"),
        }
    }
}

/// Wait until the session's snapshot satisfies `pred`, or panic.
pub async fn wait_snapshot<F>(handle: &LiveSessionHandle, what: &str, pred: F) -> RoomSnapshot
where
    F: FnMut(&RoomSnapshot) -> bool,
{
    let mut rx = handle.watch();
    let snapshot = match tokio::time::timeout(Duration::from_secs(5), rx.wait_for(pred)).await {
        Ok(Ok(snapshot)) => snapshot.clone(),
        Ok(Err(_)) => panic!("session ended while waiting for {what}"),
        Err(_) => panic!("timed out waiting for {what}"),
    };
    snapshot
}

/// Document service shared by every session in a test.
#[derive(Clone, Default)]
pub struct MemoryDocuments {
    slots: Arc<Mutex<Vec<DocumentSlot>>>,
    navigations: Arc<Mutex<Vec<(String, u32)>>>,
}

impl MemoryDocuments {
    pub fn with_presentation(id: &str, total_pages: u32) -> Self {
        let slot: DocumentSlot = serde_json::from_value(serde_json::json!({
            "id": id,
            "originalFileName": format!("{id}.pdf"),
            "isPresentation": true,
            "currentPage": 1,
            "totalPages": total_pages,
            "lastPresentationControlAt": "2025-03-01T09:00:00",
        }))
        .unwrap();
        Self {
            slots: Arc::new(Mutex::new(vec![slot])),
            ..Default::default()
        }
    }

    pub fn navigations(&self) -> Vec<(String, u32)> {
        self.navigations.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentService for MemoryDocuments {
    async fn list_slots(&self, _room_id: &str) -> Result<Vec<DocumentSlot>, LiveError> {
        Ok(self.slots.lock().unwrap().clone())
    }

    async fn upload_slot(
        &self,
        _room_id: &str,
        upload: SlotUpload,
    ) -> Result<DocumentSlot, LiveError> {
        let mut slots = self.slots.lock().unwrap();
        let slot: DocumentSlot = serde_json::from_value(serde_json::json!({
            "id": format!("up-{}", slots.len() + 1),
            "originalFileName": upload.file_name,
            "isPresentation": upload.is_presentation,
            "fileSize": upload.bytes.len(),
        }))
        .map_err(|e| LiveError::Document(e.to_string()))?;
        slots.push(slot.clone());
        Ok(slot)
    }

    async fn delete_slot(&self, slot_id: &str) -> Result<(), LiveError> {
        self.slots.lock().unwrap().retain(|s| s.id != slot_id);
        Ok(())
    }

    async fn navigate(
        &self,
        slot_id: &str,
        page: u32,
        _action: NavigationAction,
    ) -> Result<(), LiveError> {
        let mut slots = self.slots.lock().unwrap();
        let slot = slots
            .iter_mut()
            .find(|s| s.id == slot_id)
            .ok_or_else(|| LiveError::Document(format!("unknown slot {slot_id}")))?;
        slot.current_page = page;
        self.navigations
            .lock()
            .unwrap()
            .push((slot_id.to_string(), page));
        Ok(())
    }

    async fn presentation_state(&self, slot_id: &str) -> Result<PresentationState, LiveError> {
        let slots = self.slots.lock().unwrap();
        let slot = slots
            .iter()
            .find(|s| s.id == slot_id)
            .ok_or_else(|| LiveError::Document(format!("unknown slot {slot_id}")))?;
        Ok(PresentationState {
            current_page: slot.current_page,
            total_pages: slot.total_pages,
            controlled_by: slot.last_presentation_control_by.clone(),
            last_control_at: slot.last_presentation_control_at.clone(),
        })
    }
}
