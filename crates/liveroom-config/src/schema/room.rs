//! Room-level policy configuration.

use serde::{Deserialize, Serialize};

/// How privileged envelopes from other participants are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthorityPolicy {
    /// Refuse privileged envelopes from senders that announced themselves
    /// as members. With `host_id` set, accept only that id or a host in the
    /// roster.
    #[default]
    Verify,
    /// Apply every privileged envelope as received.
    Trust,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    pub authority: AuthorityPolicy,
    /// Host identity known from the external class session, if any.
    pub host_id: Option<String>,
}
