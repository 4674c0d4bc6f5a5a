//! Wire envelope exchanged on the room channel.
//!
//! Every message on the broker is one JSON [`Envelope`]: a `type`
//! discriminator, the room and sender, an optional unicast target, a free
//! payload and a sender timestamp. Outbound envelopes additionally carry a
//! sequence stamp so receivers can ignore replays of mutating messages.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use liveroom_common::LiveError;

use crate::identity::Role;
use crate::permissions::Entitlement;

// ---------------------------------------------------------------------------
// Kinds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EnvelopeKind {
    Join,
    Leave,
    Offer,
    Answer,
    IceCandidate,
    WhiteboardDraw,
    WhiteboardClear,
    DocumentNavigation,
    DocumentUploaded,
    DocumentDeleted,
    PermissionUpdate,
    GlobalPermissionUpdate,
    MuteAll,
    AllowUnmuteAll,
    ParticipantKicked,
    ChatMessage,
    UserTyping,
    #[serde(other)]
    Unknown,
}

/// Which publish destination an envelope goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Join,
    Leave,
    Signal,
}

impl EnvelopeKind {
    pub fn route(&self) -> Route {
        match self {
            EnvelopeKind::Join => Route::Join,
            EnvelopeKind::Leave => Route::Leave,
            _ => Route::Signal,
        }
    }

    /// Kinds that change shared room state and are subject to replay checks.
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            EnvelopeKind::WhiteboardDraw
                | EnvelopeKind::WhiteboardClear
                | EnvelopeKind::DocumentNavigation
                | EnvelopeKind::DocumentUploaded
                | EnvelopeKind::DocumentDeleted
                | EnvelopeKind::PermissionUpdate
                | EnvelopeKind::GlobalPermissionUpdate
                | EnvelopeKind::MuteAll
                | EnvelopeKind::AllowUnmuteAll
                | EnvelopeKind::ParticipantKicked
        )
    }

    /// Kinds only a host may originate.
    pub fn is_privileged(&self) -> bool {
        matches!(
            self,
            EnvelopeKind::WhiteboardClear
                | EnvelopeKind::PermissionUpdate
                | EnvelopeKind::GlobalPermissionUpdate
                | EnvelopeKind::MuteAll
                | EnvelopeKind::AllowUnmuteAll
                | EnvelopeKind::ParticipantKicked
        )
    }

    /// Targeted kinds that every participant still records (the target's
    /// entitlements are part of the shared room view).
    pub fn is_public_when_targeted(&self) -> bool {
        matches!(
            self,
            EnvelopeKind::PermissionUpdate | EnvelopeKind::ParticipantKicked
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EnvelopeKind::Join => "join",
            EnvelopeKind::Leave => "leave",
            EnvelopeKind::Offer => "offer",
            EnvelopeKind::Answer => "answer",
            EnvelopeKind::IceCandidate => "ice-candidate",
            EnvelopeKind::WhiteboardDraw => "whiteboard-draw",
            EnvelopeKind::WhiteboardClear => "whiteboard-clear",
            EnvelopeKind::DocumentNavigation => "document-navigation",
            EnvelopeKind::DocumentUploaded => "document-uploaded",
            EnvelopeKind::DocumentDeleted => "document-deleted",
            EnvelopeKind::PermissionUpdate => "permission-update",
            EnvelopeKind::GlobalPermissionUpdate => "global-permission-update",
            EnvelopeKind::MuteAll => "mute-all",
            EnvelopeKind::AllowUnmuteAll => "allow-unmute-all",
            EnvelopeKind::ParticipantKicked => "participant-kicked",
            EnvelopeKind::ChatMessage => "chat-message",
            EnvelopeKind::UserTyping => "user-typing",
            EnvelopeKind::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for EnvelopeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// Per-origin sequence stamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequence {
    pub origin: String,
    pub n: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: EnvelopeKind,
    pub room_id: String,
    pub sender_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
    #[serde(default)]
    pub payload: serde_json::Value,
    #[serde(default)]
    pub timestamp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq: Option<Sequence>,
}

impl Envelope {
    pub fn decode(text: &str) -> Result<Self, LiveError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn encode(&self) -> Result<String, LiveError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize the payload into a typed body.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, LiveError> {
        serde_json::from_value(self.payload.clone()).map_err(|e| {
            LiveError::Protocol(format!("malformed {} payload: {e}", self.kind))
        })
    }
}

/// An outbound envelope before the session stamps room, sender, time and
/// sequence onto it.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    pub kind: EnvelopeKind,
    pub target_id: Option<String>,
    pub payload: serde_json::Value,
}

impl Draft {
    pub fn broadcast<P: Serialize>(kind: EnvelopeKind, payload: &P) -> Result<Self, LiveError> {
        Ok(Self {
            kind,
            target_id: None,
            payload: serde_json::to_value(payload)?,
        })
    }

    pub fn unicast<P: Serialize>(
        kind: EnvelopeKind,
        target: impl Into<String>,
        payload: &P,
    ) -> Result<Self, LiveError> {
        Ok(Self {
            kind,
            target_id: Some(target.into()),
            payload: serde_json::to_value(payload)?,
        })
    }

    /// Broadcast with an empty object payload.
    pub fn bare(kind: EnvelopeKind) -> Self {
        Self {
            kind,
            target_id: None,
            payload: serde_json::Value::Object(Default::default()),
        }
    }
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeavePayload {
    pub participant_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionPayload {
    pub permission: Entitlement,
    pub value: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KickPayload {
    /// Older clients put the target here instead of in `targetId`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_user_id: Option<String>,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatPayload {
    #[serde(default)]
    pub id: Option<String>,
    pub content: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub user_role: Role,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingPayload {
    #[serde(default)]
    pub user_name: String,
    pub is_typing: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_wire_names() {
        for kind in [
            EnvelopeKind::IceCandidate,
            EnvelopeKind::GlobalPermissionUpdate,
            EnvelopeKind::AllowUnmuteAll,
            EnvelopeKind::ParticipantKicked,
            EnvelopeKind::DocumentNavigation,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn unknown_kind_is_tolerated() {
        let text = r#"{"type":"raise-hand","roomId":"r1","senderId":"s1","payload":{}}"#;
        let env = Envelope::decode(text).unwrap();
        assert_eq!(env.kind, EnvelopeKind::Unknown);
        assert_eq!(env.timestamp, 0);
        assert!(env.seq.is_none());
    }

    #[test]
    fn envelope_uses_camel_case_and_skips_empty_target() {
        let env = Envelope {
            kind: EnvelopeKind::MuteAll,
            room_id: "r1".into(),
            sender_id: "t1".into(),
            target_id: None,
            payload: serde_json::json!({}),
            timestamp: 42,
            seq: Some(Sequence {
                origin: "o".into(),
                n: 7,
            }),
        };
        let v: serde_json::Value = serde_json::from_str(&env.encode().unwrap()).unwrap();
        assert_eq!(v["type"], "mute-all");
        assert_eq!(v["roomId"], "r1");
        assert_eq!(v["senderId"], "t1");
        assert!(v.get("targetId").is_none());
        assert_eq!(v["seq"]["n"], 7);
    }

    #[test]
    fn routes() {
        assert_eq!(EnvelopeKind::Join.route(), Route::Join);
        assert_eq!(EnvelopeKind::Leave.route(), Route::Leave);
        assert_eq!(EnvelopeKind::Offer.route(), Route::Signal);
        assert_eq!(EnvelopeKind::ChatMessage.route(), Route::Signal);
    }

    #[test]
    fn privileged_kinds_are_mutating() {
        for kind in [
            EnvelopeKind::WhiteboardClear,
            EnvelopeKind::PermissionUpdate,
            EnvelopeKind::GlobalPermissionUpdate,
            EnvelopeKind::MuteAll,
            EnvelopeKind::AllowUnmuteAll,
            EnvelopeKind::ParticipantKicked,
        ] {
            assert!(kind.is_privileged());
            assert!(kind.is_mutating());
        }
        assert!(!EnvelopeKind::Offer.is_mutating());
        assert!(!EnvelopeKind::ChatMessage.is_privileged());
    }

    #[test]
    fn malformed_payload_is_protocol_error() {
        let env = Envelope {
            kind: EnvelopeKind::PermissionUpdate,
            room_id: "r1".into(),
            sender_id: "t1".into(),
            target_id: Some("s1".into()),
            payload: serde_json::json!({"permission": "teleport", "value": true}),
            timestamp: 0,
            seq: None,
        };
        let err = env.payload_as::<PermissionPayload>().unwrap_err();
        assert!(matches!(err, LiveError::Protocol(_)));
        assert!(err.to_string().contains("permission-update"));
    }

    #[test]
    fn kick_payload_accepts_legacy_target_field() {
        let p: KickPayload =
            serde_json::from_value(serde_json::json!({"targetUserId": "s9"})).unwrap();
        assert_eq!(p.target_user_id.as_deref(), Some("s9"));
        assert!(p.reason.is_empty());
    }

    #[test]
    fn draft_bare_has_object_payload() {
        let d = Draft::bare(EnvelopeKind::AllowUnmuteAll);
        assert!(d.payload.is_object());
        assert!(d.target_id.is_none());
    }
}
