use serde_json::json;

use liveroom_config::{AuthorityPolicy, LiveroomConfig};

use super::*;
use crate::documents::DocumentSlot;
use crate::identity::{LocalIdentity, ParticipantInfo, Role};
use crate::negotiation::Signal;
use crate::permissions::Entitlement;
use crate::protocol::{Draft, Envelope, EnvelopeKind, Sequence};

const ROOM: &str = "room-1";

/// A remote participant producing stamped envelopes.
struct Remote {
    id: String,
    origin: String,
    n: u64,
}

impl Remote {
    fn new(id: &str) -> Self {
        Self {
            id: id.into(),
            origin: format!("{id}-instance"),
            n: 0,
        }
    }

    fn send(&mut self, kind: EnvelopeKind, payload: serde_json::Value) -> Envelope {
        self.n += 1;
        Envelope {
            kind,
            room_id: ROOM.into(),
            sender_id: self.id.clone(),
            target_id: None,
            payload,
            timestamp: 1_700_000_000_000 + self.n,
            seq: Some(Sequence {
                origin: self.origin.clone(),
                n: self.n,
            }),
        }
    }

    fn send_to(&mut self, kind: EnvelopeKind, target: &str, payload: serde_json::Value) -> Envelope {
        let mut env = self.send(kind, payload);
        env.target_id = Some(target.into());
        env
    }

    fn join(&mut self, role: Role) -> Envelope {
        let info = ParticipantInfo::new(self.id.clone(), self.id.to_uppercase(), role);
        self.send(EnvelopeKind::Join, serde_json::to_value(info).unwrap())
    }

    fn leave(&mut self) -> Envelope {
        let id = self.id.clone();
        self.send(EnvelopeKind::Leave, json!({ "participantId": id }))
    }
}

fn state_with(policy: AuthorityPolicy) -> RoomState {
    let mut config = LiveroomConfig::default();
    config.room.authority = policy;
    RoomState::new(LocalIdentity::new("me", "Me", Role::Member), ROOM, &config)
}

fn state() -> RoomState {
    state_with(AuthorityPolicy::Verify)
}

fn slot(id: &str, at: &str) -> DocumentSlot {
    serde_json::from_value(json!({
        "id": id,
        "isPresentation": true,
        "currentPage": 1,
        "totalPages": 10,
        "lastPresentationControlAt": at,
    }))
    .unwrap()
}

fn nav(slot: &str, page: u32) -> serde_json::Value {
    json!({ "documentId": slot, "currentPage": page, "action": "NAVIGATE", "controlledBy": "host" })
}

// ---------------------------------------------------------------------------
// Membership
// ---------------------------------------------------------------------------

#[test]
fn roster_is_joined_minus_left() {
    let mut room = state();
    let mut a = Remote::new("a");
    let mut b = Remote::new("b");
    let mut c = Remote::new("c");

    for env in [
        a.join(Role::Member),
        b.join(Role::Member),
        a.join(Role::Member),
        c.join(Role::Host),
        b.leave(),
        b.leave(),
    ] {
        room.apply(&env);
    }

    let mut ids = room.roster().ids();
    ids.sort();
    assert_eq!(ids, vec!["a", "c"]);
}

#[test]
fn repeated_join_is_announced_once() {
    let mut room = state();
    let mut a = Remote::new("a");
    let first = room.apply(&a.join(Role::Member));
    assert!(matches!(first.as_slice(), [Effect::PeerJoined(p)] if p.id == "a"));
    assert!(room.apply(&a.join(Role::Member)).is_empty());
}

#[test]
fn join_id_comes_from_sender() {
    let mut room = state();
    let mut mallory = Remote::new("mallory");
    let forged = mallory.send(
        EnvelopeKind::Join,
        json!({ "id": "someone-else", "name": "X", "role": "MEMBER" }),
    );
    room.apply(&forged);
    assert!(room.roster().contains("mallory"));
    assert!(!room.roster().contains("someone-else"));
}

#[test]
fn leave_yields_peer_left_even_for_unseen_participant() {
    let mut room = state();
    let mut ghost = Remote::new("ghost");
    let effects = room.apply(&ghost.leave());
    assert!(matches!(effects.as_slice(), [Effect::PeerLeft(p)] if p.id == "ghost"));
}

#[test]
fn reset_roster_keeps_only_reannounced() {
    let mut room = state();
    let mut a = Remote::new("a");
    let mut b = Remote::new("b");
    room.announce_join(1).unwrap();
    room.apply(&a.join(Role::Member));
    room.apply(&b.join(Role::Member));

    let gone = room.reset_roster();
    assert_eq!(gone.len(), 2);
    assert!(room.roster().is_empty());

    room.announce_join(2).unwrap();
    room.apply(&a.join(Role::Member));
    let mut ids = room.roster().ids();
    ids.sort();
    assert_eq!(ids, vec!["a", "me"]);
}

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

#[test]
fn echo_and_foreign_room_are_ignored() {
    let mut room = state();
    let draft = room.announce_join(1).unwrap();
    let own = room.stamp(draft, 1);
    assert!(room.apply(&own).is_empty());

    let mut a = Remote::new("a");
    let mut env = a.join(Role::Member);
    env.room_id = "other".into();
    assert!(room.apply(&env).is_empty());
    assert!(!room.roster().contains("a"));
}

#[test]
fn unicast_for_someone_else_is_ignored() {
    let mut room = state();
    let mut host = Remote::new("host");
    let offer = json!({ "type": "offer", "sdp": "v=0" });
    assert!(room
        .apply(&host.send_to(EnvelopeKind::Offer, "other", offer.clone()))
        .is_empty());

    let effects = room.apply(&host.send_to(EnvelopeKind::Offer, "me", offer));
    assert!(matches!(
        effects.as_slice(),
        [Effect::Signal { from, signal: Signal::Offer(_) }] if from == "host"
    ));
}

#[test]
fn malformed_payload_is_dropped() {
    let mut room = state();
    let mut a = Remote::new("a");
    let env = a.send_to(EnvelopeKind::IceCandidate, "me", json!({ "sdpMid": 3 }));
    assert!(room.apply(&env).is_empty());
}

#[test]
fn stamp_fills_envelope_fields() {
    let mut room = state();
    let first = room.stamp(Draft::bare(EnvelopeKind::MuteAll), 10);
    let second = room.stamp(Draft::bare(EnvelopeKind::MuteAll), 11);
    assert_eq!(first.room_id, ROOM);
    assert_eq!(first.sender_id, "me");
    assert_eq!(first.timestamp, 10);
    assert_eq!(first.seq.as_ref().unwrap().n + 1, second.seq.unwrap().n);
}

// ---------------------------------------------------------------------------
// Authority and entitlements
// ---------------------------------------------------------------------------

#[test]
fn permission_from_non_host_ignored_under_verify() {
    let mut room = state();
    let mut mallory = Remote::new("mallory");
    room.apply(&mallory.join(Role::Member));
    let env = mallory.send_to(
        EnvelopeKind::PermissionUpdate,
        "me",
        json!({ "permission": "chat", "value": false }),
    );
    assert!(room.apply(&env).is_empty());
    assert!(room.permissions().own().chat);
}

#[test]
fn permission_from_non_host_applied_under_trust() {
    let mut room = state_with(AuthorityPolicy::Trust);
    let mut mallory = Remote::new("mallory");
    let env = mallory.send_to(
        EnvelopeKind::PermissionUpdate,
        "me",
        json!({ "permission": "chat", "value": false }),
    );
    let effects = room.apply(&env);
    assert_eq!(effects.len(), 1);
    assert!(!room.permissions().own().chat);
}

#[test]
fn configured_host_id_is_an_authority() {
    let mut config = LiveroomConfig::default();
    config.room.host_id = Some("teacher".into());
    let mut room = RoomState::new(LocalIdentity::new("me", "Me", Role::Member), ROOM, &config);
    let mut teacher = Remote::new("teacher");
    room.apply(&teacher.send(EnvelopeKind::MuteAll, json!({})));
    assert!(!room.permissions().own().mic);
}

#[test]
fn host_who_joined_earlier_is_accepted_under_verify() {
    // The host's join happened before this client connected.
    let mut room = state();
    let mut host = Remote::new("host");
    let effects = room.apply(&host.send(
        EnvelopeKind::GlobalPermissionUpdate,
        json!({ "permission": "chat", "value": false }),
    ));
    assert_eq!(effects.len(), 1);
    assert!(!room.permissions().own().chat);

    let kicked = room.apply(&host.send_to(
        EnvelopeKind::ParticipantKicked,
        "me",
        json!({ "reason": "bye" }),
    ));
    assert!(matches!(kicked.as_slice(), [Effect::Kicked { by, .. }] if by == "host"));
}

#[test]
fn configured_host_id_refuses_unseen_senders() {
    let mut config = LiveroomConfig::default();
    config.room.host_id = Some("teacher".into());
    let mut room = RoomState::new(LocalIdentity::new("me", "Me", Role::Member), ROOM, &config);
    let mut stranger = Remote::new("stranger");
    assert!(room
        .apply(&stranger.send(EnvelopeKind::MuteAll, json!({})))
        .is_empty());
    assert!(room.permissions().own().mic);
}

#[test]
fn global_change_reaches_members_and_future_joiners() {
    let mut room = state();
    let mut host = Remote::new("host");
    let mut b = Remote::new("b");
    room.apply(&host.join(Role::Host));
    room.apply(&b.join(Role::Member));

    let effects = room.apply(&host.send(
        EnvelopeKind::GlobalPermissionUpdate,
        json!({ "permission": "chat", "value": false }),
    ));
    assert_eq!(effects.len(), 2);
    assert!(!room.permissions().own_allows(Entitlement::Chat));
    assert!(!room.permissions().get("b").unwrap().chat);

    let mut late = Remote::new("late");
    room.apply(&late.join(Role::Member));
    assert!(!room.permissions().get("late").unwrap().chat);
}

#[test]
fn targeted_permission_is_recorded_by_everyone() {
    let mut room = state();
    let mut host = Remote::new("host");
    let mut b = Remote::new("b");
    room.apply(&host.join(Role::Host));
    room.apply(&b.join(Role::Member));
    let effects = room.apply(&host.send_to(
        EnvelopeKind::PermissionUpdate,
        "b",
        json!({ "permission": "whiteboard", "value": true }),
    ));
    assert!(matches!(
        effects.as_slice(),
        [Effect::EntitlementsChanged(c)] if c.participant == "b" && c.state.whiteboard
    ));
    assert!(!room.permissions().own().whiteboard);
}

#[test]
fn repeated_permission_update_is_idempotent() {
    let mut room = state();
    let mut host = Remote::new("host");
    room.apply(&host.join(Role::Host));
    let payload = json!({ "permission": "camera", "value": false });
    let first = room.apply(&host.send_to(EnvelopeKind::PermissionUpdate, "me", payload.clone()));
    let second = room.apply(&host.send_to(EnvelopeKind::PermissionUpdate, "me", payload));
    assert_eq!(first.len(), 1);
    assert!(second.is_empty());
    assert!(!room.permissions().own().camera);
}

#[test]
fn kick_targets() {
    let mut room = state();
    let mut host = Remote::new("host");
    room.apply(&host.join(Role::Host));

    let other = room.apply(&host.send_to(
        EnvelopeKind::ParticipantKicked,
        "b",
        json!({ "reason": "spam" }),
    ));
    assert!(matches!(other.as_slice(), [Effect::ParticipantKicked { id }] if id == "b"));

    // legacy form: target only in the payload
    let me = room.apply(&host.send(
        EnvelopeKind::ParticipantKicked,
        json!({ "targetUserId": "me", "reason": "bye" }),
    ));
    assert!(matches!(
        me.as_slice(),
        [Effect::Kicked { reason, by }] if reason == "bye" && by == "host"
    ));
}

#[test]
fn forged_clear_ignored_under_verify() {
    let mut room = state();
    let mut a = Remote::new("a");
    room.apply(&a.join(Role::Member));
    assert!(room
        .apply(&a.send(EnvelopeKind::WhiteboardClear, json!({})))
        .is_empty());
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

#[test]
fn last_received_navigation_wins() {
    let mut room = state();
    room.documents_mut()
        .replace_slots(vec![slot("7", "2024-05-01T10:00:00Z")]);
    let mut host = Remote::new("host");
    room.apply(&host.join(Role::Host));

    room.apply(&host.send(EnvelopeKind::DocumentNavigation, nav("7", 5)));
    let effects = room.apply(&host.send(EnvelopeKind::DocumentNavigation, nav("7", 3)));
    assert!(matches!(
        effects.as_slice(),
        [Effect::PageChanged { slot, page: 3, .. }] if slot == "7"
    ));
    assert_eq!(room.documents().current_page(), 3);
}

#[test]
fn replayed_navigation_does_not_move_page_back() {
    let mut room = state();
    room.documents_mut()
        .replace_slots(vec![slot("7", "2024-05-01T10:00:00Z")]);
    let mut host = Remote::new("host");
    let old = host.send(EnvelopeKind::DocumentNavigation, nav("7", 2));
    let new = host.send(EnvelopeKind::DocumentNavigation, nav("7", 6));
    room.apply(&old);
    room.apply(&new);
    assert!(room.apply(&old).is_empty());
    assert_eq!(room.documents().current_page(), 6);
}

#[test]
fn navigation_for_untracked_slot_ignored() {
    let mut room = state();
    room.documents_mut()
        .replace_slots(vec![slot("7", "2024-05-01T10:00:00Z")]);
    let mut host = Remote::new("host");
    assert!(room
        .apply(&host.send(EnvelopeKind::DocumentNavigation, nav("8", 4)))
        .is_empty());
    assert_eq!(room.documents().current_page(), 1);
}

#[test]
fn deleting_active_slot_clears_pointer() {
    let mut room = state();
    room.documents_mut()
        .replace_slots(vec![slot("7", "2024-05-01T10:00:00Z")]);
    let mut host = Remote::new("host");
    let effects = room.apply(&host.send(EnvelopeKind::DocumentDeleted, json!({ "documentId": 7 })));
    assert_eq!(effects, vec![Effect::ActiveSlotCleared, Effect::RefreshSlots]);
    assert!(room.documents().active_id().is_none());

    let effects = room.apply(&host.send(EnvelopeKind::DocumentUploaded, json!({ "documentId": 8 })));
    assert_eq!(effects, vec![Effect::RefreshSlots]);
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

#[test]
fn chat_is_recorded_once() {
    let mut room = state();
    let mut a = Remote::new("a");
    room.apply(&a.join(Role::Member));
    let body = json!({ "id": "m1", "content": "hello", "userRole": "STUDENT" });
    let effects = room.apply(&a.send(EnvelopeKind::ChatMessage, body.clone()));
    assert!(matches!(
        effects.as_slice(),
        [Effect::Chat(m)] if m.sender_name == "A" && m.content == "hello"
    ));
    assert!(room.apply(&a.send(EnvelopeKind::ChatMessage, body)).is_empty());
    assert_eq!(room.chat().len(), 1);
}

#[test]
fn local_chat_goes_into_history() {
    let mut room = state();
    let (draft, message) = room.record_local_chat("hi all", 5).unwrap();
    assert_eq!(draft.kind, EnvelopeKind::ChatMessage);
    assert_eq!(draft.payload["content"], "hi all");
    assert_eq!(draft.payload["id"], message.id.as_str());
    assert_eq!(room.chat().len(), 1);
}
