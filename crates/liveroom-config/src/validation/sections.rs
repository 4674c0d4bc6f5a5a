//! Per-section validators.

use regex::Regex;
use std::sync::LazyLock;

use crate::schema::LiveroomConfig;

use super::helpers::{validate_range, validate_range_f32};

static BROKER_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^wss?://[^\s/]+(/\S*)?$").unwrap());

static HTTP_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://[^\s/]+(/\S*)?$").unwrap());

static HEX_COLOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[0-9a-fA-F]{6}$").unwrap());

pub(crate) fn validate_channel(errors: &mut Vec<String>, config: &LiveroomConfig) {
    let channel = &config.channel;
    if !BROKER_URL_RE.is_match(&channel.broker_url) {
        errors.push(format!(
            "channel.broker_url = {:?} is not a ws:// or wss:// URL",
            channel.broker_url
        ));
    }
    validate_range(
        errors,
        "channel.reconnect_delay_ms",
        channel.reconnect_delay_ms,
        10,
        600_000,
    );
    validate_range(
        errors,
        "channel.connect_timeout_secs",
        channel.connect_timeout_secs,
        1,
        300,
    );
    for (name, prefix) in [
        ("channel.topic_prefix", &channel.topic_prefix),
        ("channel.app_prefix", &channel.app_prefix),
    ] {
        if !prefix.starts_with('/') || prefix.ends_with('/') {
            errors.push(format!(
                "{name} = {prefix:?} must start with '/' and not end with '/'"
            ));
        }
    }
}

pub(crate) fn validate_whiteboard(errors: &mut Vec<String>, config: &LiveroomConfig) {
    let wb = &config.whiteboard;
    validate_range(errors, "whiteboard.width", wb.width as u64, 16, 8192);
    validate_range(errors, "whiteboard.height", wb.height as u64, 16, 8192);
    validate_range(
        errors,
        "whiteboard.flush_interval_ms",
        wb.flush_interval_ms,
        10,
        1000,
    );
    validate_range(
        errors,
        "whiteboard.history_limit",
        wb.history_limit as u64,
        1,
        200,
    );
    validate_range_f32(errors, "whiteboard.default_width", wb.default_width, 1.0, 20.0);
    if !HEX_COLOR_RE.is_match(&wb.default_color) {
        errors.push(format!(
            "whiteboard.default_color = {:?} is not a #RRGGBB color",
            wb.default_color
        ));
    }
}

pub(crate) fn validate_documents(errors: &mut Vec<String>, config: &LiveroomConfig) {
    let docs = &config.documents;
    if !HTTP_URL_RE.is_match(&docs.api_base_url) {
        errors.push(format!(
            "documents.api_base_url = {:?} is not an http:// or https:// URL",
            docs.api_base_url
        ));
    }
    validate_range(
        errors,
        "documents.request_timeout_secs",
        docs.request_timeout_secs,
        1,
        600,
    );
}

pub(crate) fn validate_negotiation(errors: &mut Vec<String>, config: &LiveroomConfig) {
    for server in &config.negotiation.stun_servers {
        if !(server.starts_with("stun:") || server.starts_with("turn:") || server.starts_with("turns:"))
        {
            errors.push(format!("negotiation.stun_servers entry {server:?} has no stun:/turn: scheme"));
        }
    }
}

pub(crate) fn validate_chat(errors: &mut Vec<String>, config: &LiveroomConfig) {
    validate_range(
        errors,
        "chat.history_limit",
        config.chat.history_limit as u64,
        1,
        10_000,
    );
    validate_range(
        errors,
        "chat.typing_timeout_ms",
        config.chat.typing_timeout_ms,
        100,
        60_000,
    );
}
