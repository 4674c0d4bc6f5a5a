use super::*;

fn errors_of(config: &LiveroomConfig) -> String {
    match validate(config) {
        Err(ConfigError::ValidationError(msg)) => msg,
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn default_config_is_valid() {
    assert!(validate(&LiveroomConfig::default()).is_ok());
}

#[test]
fn rejects_http_broker_url() {
    let mut config = LiveroomConfig::default();
    config.channel.broker_url = "http://localhost:8088/ws".into();
    assert!(errors_of(&config).contains("channel.broker_url"));
}

#[test]
fn accepts_wss_broker_url() {
    let mut config = LiveroomConfig::default();
    config.channel.broker_url = "wss://school.example.org/ws".into();
    assert!(validate(&config).is_ok());
}

#[test]
fn rejects_zero_history_limit() {
    let mut config = LiveroomConfig::default();
    config.whiteboard.history_limit = 0;
    let msg = errors_of(&config);
    assert!(msg.contains("whiteboard.history_limit = 0 is out of range [1, 200]"));
}

#[test]
fn rejects_bad_pen_color() {
    let mut config = LiveroomConfig::default();
    config.whiteboard.default_color = "red".into();
    assert!(errors_of(&config).contains("whiteboard.default_color"));
}

#[test]
fn rejects_trailing_slash_prefix() {
    let mut config = LiveroomConfig::default();
    config.channel.topic_prefix = "/topic/room/".into();
    assert!(errors_of(&config).contains("channel.topic_prefix"));
}

#[test]
fn rejects_unknown_ice_scheme() {
    let mut config = LiveroomConfig::default();
    config.negotiation.stun_servers = vec!["stun.example.org:3478".into()];
    assert!(errors_of(&config).contains("negotiation.stun_servers"));
}

#[test]
fn collects_multiple_errors() {
    let mut config = LiveroomConfig::default();
    config.whiteboard.width = 1;
    config.chat.history_limit = 0;
    let msg = errors_of(&config);
    assert!(msg.contains("whiteboard.width"));
    assert!(msg.contains("chat.history_limit"));
    assert!(msg.contains("; "));
}
