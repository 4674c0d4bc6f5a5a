//! Host-issued entitlement changes and their local application.

use std::collections::BTreeMap;

use liveroom_common::LiveError;

use super::types::{Entitlement, EntitlementState};
use crate::identity::{ParticipantInfo, Role};
use crate::protocol::{Draft, EnvelopeKind, KickPayload, PermissionPayload};

/// New state of one participant after an entitlement change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitlementChange {
    pub participant: String,
    pub state: EntitlementState,
}

/// Entitlement book for one room, plus the host-only operations that
/// change it.
///
/// Hosts are never tracked; they hold every entitlement. Members get a copy
/// of the default template when first seen.
#[derive(Debug, Clone)]
pub struct PermissionEngine {
    local_id: String,
    local_role: Role,
    template: EntitlementState,
    entries: BTreeMap<String, EntitlementState>,
}

impl PermissionEngine {
    pub fn new(local: &ParticipantInfo, template: EntitlementState) -> Self {
        let mut engine = Self {
            local_id: local.id.clone(),
            local_role: local.role,
            template,
            entries: BTreeMap::new(),
        };
        engine.track(local);
        engine
    }

    pub fn template(&self) -> EntitlementState {
        self.template
    }

    /// Start tracking a participant if it is a member and not yet known.
    pub fn track(&mut self, info: &ParticipantInfo) {
        if !info.role.is_host() {
            self.entries.entry(info.id.clone()).or_insert(self.template);
        }
    }

    pub fn forget(&mut self, id: &str) {
        if id != self.local_id {
            self.entries.remove(id);
        }
    }

    pub fn get(&self, id: &str) -> Option<EntitlementState> {
        self.entries.get(id).copied()
    }

    /// Effective entitlements of the local participant.
    pub fn own(&self) -> EntitlementState {
        if self.local_role.is_host() {
            return EntitlementState::all_granted();
        }
        self.get(&self.local_id).unwrap_or(self.template)
    }

    pub fn own_allows(&self, entitlement: Entitlement) -> bool {
        self.own().get(entitlement)
    }

    /// Fail unless the local participant holds `entitlement`.
    pub fn require(&self, entitlement: Entitlement) -> Result<(), LiveError> {
        if self.own_allows(entitlement) {
            Ok(())
        } else {
            Err(LiveError::NotEntitled(entitlement.to_string()))
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = (&String, &EntitlementState)> {
        self.entries.iter()
    }

    // -- inbound ------------------------------------------------------------

    /// Apply a per-participant update. `None` when nothing changed.
    pub fn apply_update(
        &mut self,
        target: &str,
        entitlement: Entitlement,
        value: bool,
    ) -> Option<EntitlementChange> {
        if target == self.local_id && self.local_role.is_host() {
            return None;
        }
        let state = self
            .entries
            .entry(target.to_string())
            .or_insert(self.template);
        state.set(entitlement, value).then(|| EntitlementChange {
            participant: target.to_string(),
            state: *state,
        })
    }

    /// Change the default template and every tracked member.
    pub fn apply_global(&mut self, entitlement: Entitlement, value: bool) -> Vec<EntitlementChange> {
        self.template.set(entitlement, value);
        self.set_all_members(entitlement, value)
    }

    /// Mute-all / allow-unmute-all: the mic flag of every tracked member.
    /// The template is left alone.
    pub fn apply_mic_all(&mut self, value: bool) -> Vec<EntitlementChange> {
        self.set_all_members(Entitlement::Mic, value)
    }

    fn set_all_members(&mut self, entitlement: Entitlement, value: bool) -> Vec<EntitlementChange> {
        self.entries
            .iter_mut()
            .filter_map(|(id, state)| {
                state.set(entitlement, value).then(|| EntitlementChange {
                    participant: id.clone(),
                    state: *state,
                })
            })
            .collect()
    }

    // -- host operations ----------------------------------------------------

    fn require_host(&self, action: &str) -> Result<(), LiveError> {
        if self.local_role.is_host() {
            Ok(())
        } else {
            Err(LiveError::NotAuthorized(action.to_string()))
        }
    }

    pub fn set_entitlement(
        &mut self,
        target: &str,
        entitlement: Entitlement,
        value: bool,
    ) -> Result<Draft, LiveError> {
        self.require_host("permission-update")?;
        self.apply_update(target, entitlement, value);
        Draft::unicast(
            EnvelopeKind::PermissionUpdate,
            target,
            &PermissionPayload {
                permission: entitlement,
                value,
            },
        )
    }

    pub fn set_global(&mut self, entitlement: Entitlement, value: bool) -> Result<Draft, LiveError> {
        self.require_host("global-permission-update")?;
        self.apply_global(entitlement, value);
        Draft::broadcast(
            EnvelopeKind::GlobalPermissionUpdate,
            &PermissionPayload {
                permission: entitlement,
                value,
            },
        )
    }

    pub fn mute_all(&mut self) -> Result<Draft, LiveError> {
        self.require_host("mute-all")?;
        self.apply_mic_all(false);
        Ok(Draft::bare(EnvelopeKind::MuteAll))
    }

    pub fn allow_unmute_all(&mut self) -> Result<Draft, LiveError> {
        self.require_host("allow-unmute-all")?;
        self.apply_mic_all(true);
        Ok(Draft::bare(EnvelopeKind::AllowUnmuteAll))
    }

    pub fn kick(&self, target: &str, reason: &str) -> Result<Draft, LiveError> {
        self.require_host("kick")?;
        if target == self.local_id {
            return Err(LiveError::Other("cannot kick yourself".into()));
        }
        Draft::unicast(
            EnvelopeKind::ParticipantKicked,
            target,
            &KickPayload {
                target_user_id: Some(target.to_string()),
                reason: reason.to_string(),
            },
        )
    }
}
