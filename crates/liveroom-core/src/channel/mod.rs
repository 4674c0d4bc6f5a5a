//! Room channel client: STOMP 1.2 over a WebSocket.
//!
//! Owns one persistent broker connection, re-subscribes room topics after
//! every reconnect, and retries at a fixed interval forever. Outbound
//! messages are never queued across an outage.

mod client;
mod connection;
pub mod frame;
mod handler;
mod types;

pub use client::ChannelClient;
pub use frame::{Command, Frame, FrameError};
pub use types::{ChannelEvent, ChannelSettings, ChannelStatus, RoomTopics};
