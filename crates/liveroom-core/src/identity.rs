use serde::{Deserialize, Serialize};

use liveroom_common::InstanceId;

/// Role of a participant in a room.
///
/// Accepts the `TEACHER`/`STUDENT` spellings used by the classroom backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "HOST", alias = "TEACHER", alias = "host")]
    Host,
    #[default]
    #[serde(rename = "MEMBER", alias = "STUDENT", alias = "member")]
    Member,
}

impl Role {
    pub fn is_host(&self) -> bool {
        matches!(self, Role::Host)
    }
}

/// Public description of a participant, carried by join envelopes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantInfo {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default = "enabled")]
    pub video_enabled: bool,
    #[serde(default = "enabled")]
    pub audio_enabled: bool,
}

fn enabled() -> bool {
    true
}

impl ParticipantInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role,
            video_enabled: true,
            audio_enabled: true,
        }
    }
}

/// The local participant plus the credentials used to reach the broker.
#[derive(Clone)]
pub struct LocalIdentity {
    pub info: ParticipantInfo,
    /// Fresh per process; origin of outbound sequence stamps.
    pub instance: InstanceId,
    /// Optional bearer token presented on CONNECT.
    pub access_token: Option<String>,
}

impl std::fmt::Debug for LocalIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalIdentity")
            .field("info", &self.info)
            .field("instance", &self.instance)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl LocalIdentity {
    pub fn new(id: impl Into<String>, name: impl Into<String>, role: Role) -> Self {
        Self {
            info: ParticipantInfo::new(id, name, role),
            instance: InstanceId::new(),
            access_token: None,
        }
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.info.id
    }

    pub fn role(&self) -> Role {
        self.info.role
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_accepts_classroom_aliases() {
        let r: Role = serde_json::from_str("\"TEACHER\"").unwrap();
        assert_eq!(r, Role::Host);
        let r: Role = serde_json::from_str("\"STUDENT\"").unwrap();
        assert_eq!(r, Role::Member);
        assert_eq!(serde_json::to_string(&Role::Host).unwrap(), "\"HOST\"");
    }

    #[test]
    fn participant_info_defaults_media_flags() {
        let info: ParticipantInfo =
            serde_json::from_str(r#"{"id":"s1","name":"Hoa","role":"STUDENT"}"#).unwrap();
        assert!(info.video_enabled);
        assert!(info.audio_enabled);
        assert_eq!(info.role, Role::Member);
    }

    #[test]
    fn participant_info_uses_camel_case() {
        let info = ParticipantInfo::new("t1", "Giao", Role::Host);
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["videoEnabled"], true);
        assert_eq!(json["role"], "HOST");
    }

    #[test]
    fn debug_redacts_token() {
        let id = LocalIdentity::new("t1", "Giao", Role::Host).with_access_token("jwt-secret");
        let debug = format!("{id:?}");
        assert!(!debug.contains("jwt-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
