//! Tracks the slot list and the active presentation page of one room.

use tracing::{debug, warn};

use liveroom_common::LiveError;

use super::types::{format_millis, DocumentSlot, NavigationAction, NavigationPayload};

#[derive(Debug, Clone, Default)]
pub struct DocumentTracker {
    slots: Vec<DocumentSlot>,
    active: Option<String>,
    current_page: u32,
}

impl DocumentTracker {
    pub fn new() -> Self {
        Self {
            current_page: 1,
            ..Default::default()
        }
    }

    pub fn slots(&self) -> &[DocumentSlot] {
        &self.slots
    }

    pub fn active(&self) -> Option<&DocumentSlot> {
        let id = self.active.as_deref()?;
        self.slots.iter().find(|s| s.id == id)
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    /// Replace the slot list with a fresh copy from the document service.
    ///
    /// The presentation slot with the latest control time becomes active.
    /// Without one, the previous active slot is kept if it still exists.
    pub fn replace_slots(&mut self, slots: Vec<DocumentSlot>) {
        self.slots = slots;
        let candidate = self
            .slots
            .iter()
            .filter(|s| s.is_presentation)
            .filter_map(|s| s.control_time().map(|t| (t, s)))
            .max_by_key(|(t, _)| *t)
            .map(|(_, s)| (s.id.clone(), s.current_page));

        match candidate {
            Some((id, page)) => {
                debug!(slot = %id, page, "Active presentation slot");
                self.active = Some(id);
                self.current_page = page.max(1);
            }
            None => match self.active().map(|s| s.current_page) {
                Some(page) => self.current_page = page.max(1),
                None => {
                    self.active = None;
                    self.current_page = 1;
                }
            },
        }
    }

    /// Track a slot chosen by the user. Returns `false` for unknown ids.
    pub fn select(&mut self, slot_id: &str) -> bool {
        match self.slots.iter().find(|s| s.id == slot_id) {
            Some(slot) => {
                self.current_page = slot.current_page.max(1);
                self.active = Some(slot.id.clone());
                true
            }
            None => false,
        }
    }

    /// Apply a received navigation. Only the tracked slot moves; the last
    /// one received wins regardless of page number.
    pub fn apply_navigation(&mut self, nav: &NavigationPayload, at_ms: u64) -> bool {
        if self.active.as_deref() != Some(nav.document_id.as_str()) {
            debug!(slot = %nav.document_id, "Navigation for untracked slot ignored");
            return false;
        }
        let Some(slot) = self.slots.iter_mut().find(|s| s.id == nav.document_id) else {
            return false;
        };
        if !slot.accepts_page(nav.current_page) {
            warn!(slot = %nav.document_id, page = nav.current_page, "Navigation to invalid page ignored");
            return false;
        }
        slot.current_page = nav.current_page;
        slot.last_presentation_control_by = nav.controlled_by.clone();
        slot.last_presentation_control_at = format_millis(at_ms);
        self.current_page = nav.current_page;
        true
    }

    /// Resolve the page an action lands on for `slot_id`.
    pub fn target_page(
        &self,
        slot_id: &str,
        action: NavigationAction,
        requested: u32,
    ) -> Result<u32, LiveError> {
        let slot = self
            .slots
            .iter()
            .find(|s| s.id == slot_id)
            .ok_or_else(|| LiveError::Document(format!("unknown slot {slot_id}")))?;
        let current = if self.active.as_deref() == Some(slot_id) {
            self.current_page
        } else {
            slot.current_page
        };
        let page = match action {
            NavigationAction::Navigate => requested,
            NavigationAction::NextPage => current.checked_add(1).ok_or_else(|| {
                LiveError::Document(format!("slot {slot_id} is already on the last page"))
            })?,
            NavigationAction::PreviousPage => current.saturating_sub(1),
            NavigationAction::FirstPage => 1,
            NavigationAction::LastPage => slot.total_pages.ok_or_else(|| {
                LiveError::Document(format!("slot {slot_id} has no page count"))
            })?,
        };
        if !slot.accepts_page(page) {
            return Err(LiveError::Document(format!(
                "page {page} is out of range for slot {slot_id}"
            )));
        }
        Ok(page)
    }

    /// Record a navigation issued locally and build its payload. The slot
    /// becomes the tracked one.
    pub fn navigate_local(
        &mut self,
        slot_id: &str,
        page: u32,
        action: NavigationAction,
        by: &str,
        at_ms: u64,
    ) -> Result<NavigationPayload, LiveError> {
        if !self.select(slot_id) {
            return Err(LiveError::Document(format!("unknown slot {slot_id}")));
        }
        let payload = NavigationPayload {
            document_id: slot_id.to_string(),
            current_page: page,
            action,
            controlled_by: Some(by.to_string()),
        };
        if !self.apply_navigation(&payload, at_ms) {
            return Err(LiveError::Document(format!(
                "page {page} is out of range for slot {slot_id}"
            )));
        }
        Ok(payload)
    }

    /// Drop a slot. Returns `true` if it was the tracked one.
    pub fn remove_slot(&mut self, slot_id: &str) -> bool {
        self.slots.retain(|s| s.id != slot_id);
        if self.active.as_deref() == Some(slot_id) {
            self.active = None;
            self.current_page = 1;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(id: &str, presentation: bool, at: Option<&str>, page: u32) -> DocumentSlot {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "isPresentation": presentation,
            "currentPage": page,
            "totalPages": 20,
            "lastPresentationControlAt": at,
        }))
        .unwrap()
    }

    fn nav(id: &str, page: u32) -> NavigationPayload {
        NavigationPayload {
            document_id: id.into(),
            current_page: page,
            action: NavigationAction::Navigate,
            controlled_by: Some("t".into()),
        }
    }

    fn tracker() -> DocumentTracker {
        let mut t = DocumentTracker::new();
        t.replace_slots(vec![
            slot("a", true, Some("2025-01-01T08:00:00"), 2),
            slot("b", true, Some("2025-01-01T09:00:00"), 4),
            slot("c", false, Some("2025-01-01T10:00:00"), 1),
            slot("d", true, None, 1),
        ]);
        t
    }

    #[test]
    fn active_is_latest_controlled_presentation() {
        let t = tracker();
        assert_eq!(t.active_id(), Some("b"));
        assert_eq!(t.current_page(), 4);
    }

    #[test]
    fn last_received_navigation_wins() {
        let mut t = tracker();
        assert!(t.apply_navigation(&nav("b", 5), 1));
        assert!(t.apply_navigation(&nav("b", 3), 2));
        assert_eq!(t.current_page(), 3);
        assert_eq!(t.active().unwrap().current_page, 3);
    }

    #[test]
    fn untracked_and_invalid_navigation_ignored() {
        let mut t = tracker();
        assert!(!t.apply_navigation(&nav("a", 9), 1));
        assert!(!t.apply_navigation(&nav("b", 0), 1));
        assert!(!t.apply_navigation(&nav("b", 21), 1));
        assert_eq!(t.current_page(), 4);
    }

    #[test]
    fn deleting_active_slot_invalidates_pointer() {
        let mut t = tracker();
        assert!(!t.remove_slot("a"));
        assert!(t.remove_slot("b"));
        assert!(t.active().is_none());
        assert_eq!(t.current_page(), 1);
        assert_eq!(t.slots().len(), 2);
    }

    #[test]
    fn refresh_without_candidate_keeps_selection() {
        let mut t = DocumentTracker::new();
        t.replace_slots(vec![slot("x", false, None, 6)]);
        assert!(t.active().is_none());
        assert!(t.select("x"));
        t.replace_slots(vec![slot("x", false, None, 7), slot("y", false, None, 1)]);
        assert_eq!(t.active_id(), Some("x"));
        assert_eq!(t.current_page(), 7);
    }

    #[test]
    fn target_pages() {
        let t = tracker();
        assert_eq!(t.target_page("b", NavigationAction::NextPage, 0).unwrap(), 5);
        assert_eq!(t.target_page("b", NavigationAction::PreviousPage, 0).unwrap(), 3);
        assert_eq!(t.target_page("b", NavigationAction::LastPage, 0).unwrap(), 20);
        assert_eq!(t.target_page("a", NavigationAction::FirstPage, 0).unwrap(), 1);
        assert!(t.target_page("b", NavigationAction::Navigate, 0).is_err());
        assert!(t.target_page("zzz", NavigationAction::Navigate, 1).is_err());
    }

    #[test]
    fn next_page_at_the_numeric_limit_is_refused() {
        let mut t = DocumentTracker::new();
        let mut unbounded = slot("u", true, Some("2025-01-01T08:00:00"), 1);
        unbounded.total_pages = None;
        t.replace_slots(vec![unbounded]);
        assert!(t.apply_navigation(&nav("u", u32::MAX), 1));
        assert!(matches!(
            t.target_page("u", NavigationAction::NextPage, 0),
            Err(LiveError::Document(_))
        ));
        assert_eq!(
            t.target_page("u", NavigationAction::PreviousPage, 0).unwrap(),
            u32::MAX - 1
        );
    }

    #[test]
    fn local_navigation_selects_and_builds_payload() {
        let mut t = tracker();
        let p = t
            .navigate_local("a", 7, NavigationAction::Navigate, "t", 10)
            .unwrap();
        assert_eq!(p.document_id, "a");
        assert_eq!(p.controlled_by.as_deref(), Some("t"));
        assert_eq!(t.active_id(), Some("a"));
        assert_eq!(t.current_page(), 7);
    }
}
