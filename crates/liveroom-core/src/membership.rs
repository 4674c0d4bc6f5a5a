//! Client-local room roster built from join/leave envelopes.
//!
//! There is no roster sync: the roster holds exactly the participants seen
//! joining since this client last connected, minus those seen leaving.

use crate::identity::ParticipantInfo;

#[derive(Debug, Clone)]
pub struct RosterEntry {
    pub info: ParticipantInfo,
    /// Sender timestamp of the join envelope that added the entry.
    pub joined_at: u64,
}

/// Participants in join order, unique by id.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    entries: Vec<RosterEntry>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or refresh a participant. Returns `true` if the id was new.
    ///
    /// A repeated join updates name, role and media flags in place and keeps
    /// the original position.
    pub fn upsert(&mut self, info: ParticipantInfo, joined_at: u64) -> bool {
        match self.entries.iter_mut().find(|e| e.info.id == info.id) {
            Some(existing) => {
                existing.info = info;
                false
            }
            None => {
                self.entries.push(RosterEntry { info, joined_at });
                true
            }
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<ParticipantInfo> {
        let idx = self.entries.iter().position(|e| e.info.id == id)?;
        Some(self.entries.remove(idx).info)
    }

    pub fn get(&self, id: &str) -> Option<&ParticipantInfo> {
        self.entries
            .iter()
            .find(|e| e.info.id == id)
            .map(|e| &e.info)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn is_host(&self, id: &str) -> bool {
        self.get(id).is_some_and(|p| p.role.is_host())
    }

    pub fn set_media_flags(&mut self, id: &str, video: bool, audio: bool) -> bool {
        match self.entries.iter_mut().find(|e| e.info.id == id) {
            Some(e) => {
                e.info.video_enabled = video;
                e.info.audio_enabled = audio;
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParticipantInfo> {
        self.entries.iter().map(|e| &e.info)
    }

    pub fn ids(&self) -> Vec<String> {
        self.iter().map(|p| p.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Role;

    fn member(id: &str) -> ParticipantInfo {
        ParticipantInfo::new(id, id.to_uppercase(), Role::Member)
    }

    #[test]
    fn roster_is_joined_minus_left_deduplicated() {
        let mut roster = Roster::new();
        let events: [(&str, bool); 7] = [
            ("a", true),
            ("b", true),
            ("a", true),
            ("c", true),
            ("b", false),
            ("d", false),
            ("b", true),
        ];
        for (id, join) in events {
            if join {
                roster.upsert(member(id), 0);
            } else {
                roster.remove(id);
            }
        }
        assert_eq!(roster.ids(), vec!["a", "c", "b"]);
    }

    #[test]
    fn upsert_reports_new_and_refreshes_existing() {
        let mut roster = Roster::new();
        assert!(roster.upsert(member("a"), 1));
        let mut renamed = member("a");
        renamed.name = "Anh".into();
        assert!(!roster.upsert(renamed, 2));
        assert_eq!(roster.len(), 1);
        assert_eq!(roster.get("a").unwrap().name, "Anh");
    }

    #[test]
    fn host_lookup() {
        let mut roster = Roster::new();
        roster.upsert(ParticipantInfo::new("t", "Teacher", Role::Host), 0);
        roster.upsert(member("s"), 0);
        assert!(roster.is_host("t"));
        assert!(!roster.is_host("s"));
        assert!(!roster.is_host("nobody"));
    }

    #[test]
    fn media_flags_update() {
        let mut roster = Roster::new();
        roster.upsert(member("s"), 0);
        assert!(roster.set_media_flags("s", false, true));
        let s = roster.get("s").unwrap();
        assert!(!s.video_enabled);
        assert!(s.audio_enabled);
        assert!(!roster.set_media_flags("x", false, false));
    }

    #[test]
    fn clear_empties() {
        let mut roster = Roster::new();
        roster.upsert(member("a"), 0);
        roster.clear();
        assert!(roster.is_empty());
    }
}
