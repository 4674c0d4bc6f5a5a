use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

/// Failures surfaced by the live-session core.
///
/// Only `Transport` is ever retried automatically (by the channel client);
/// everything else is reported once and left to the user.
#[derive(Debug, thiserror::Error)]
pub enum LiveError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("channel not connected")]
    NotConnected,

    #[error("negotiation error with {peer}: {reason}")]
    Negotiation { peer: String, reason: String },

    #[error("media error: {0}")]
    Media(String),

    #[error("not authorized: {0}")]
    NotAuthorized(String),

    #[error("not entitled: {0}")]
    NotEntitled(String),

    #[error("document service error: {0}")]
    Document(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("session closed")]
    SessionClosed,

    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for LiveError {
    fn from(e: serde_json::Error) -> Self {
        LiveError::Protocol(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::FileNotFound(PathBuf::from("/tmp/missing.toml"));
        assert_eq!(err.to_string(), "config file not found: /tmp/missing.toml");

        let err = ConfigError::ParseError("unexpected token".into());
        assert_eq!(err.to_string(), "config parse error: unexpected token");

        let err = ConfigError::ValidationError("whiteboard.width = 0".into());
        assert_eq!(
            err.to_string(),
            "config validation error: whiteboard.width = 0"
        );
    }

    #[test]
    fn live_error_from_config() {
        let config_err = ConfigError::ParseError("bad toml".into());
        let err: LiveError = config_err.into();
        assert!(matches!(err, LiveError::Config(_)));
        assert!(err.to_string().contains("bad toml"));
    }

    #[test]
    fn live_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: LiveError = json_err.into();
        assert!(matches!(err, LiveError::Protocol(_)));
    }

    #[test]
    fn live_error_variants() {
        let err = LiveError::Negotiation {
            peer: "student-1".into(),
            reason: "no local description".into(),
        };
        assert_eq!(
            err.to_string(),
            "negotiation error with student-1: no local description"
        );

        assert_eq!(LiveError::NotConnected.to_string(), "channel not connected");
        assert_eq!(
            LiveError::NotAuthorized("kick".into()).to_string(),
            "not authorized: kick"
        );
        assert_eq!(
            LiveError::NotEntitled("chat".into()).to_string(),
            "not entitled: chat"
        );
        assert_eq!(LiveError::Other("boom".into()).to_string(), "boom");
    }
}
