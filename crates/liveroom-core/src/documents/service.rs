use async_trait::async_trait;

use liveroom_common::LiveError;

use super::types::{DocumentSlot, NavigationAction, PresentationState, SlotUpload};

/// The external document service. Slot metadata it returns is the source
/// of truth; the core only broadcasts navigation deltas on top of it.
#[async_trait]
pub trait DocumentService: Send + Sync {
    async fn list_slots(&self, room_id: &str) -> Result<Vec<DocumentSlot>, LiveError>;

    async fn upload_slot(&self, room_id: &str, upload: SlotUpload)
        -> Result<DocumentSlot, LiveError>;

    async fn delete_slot(&self, slot_id: &str) -> Result<(), LiveError>;

    /// Persist the presentation page of a slot.
    async fn navigate(
        &self,
        slot_id: &str,
        page: u32,
        action: NavigationAction,
    ) -> Result<(), LiveError>;

    async fn presentation_state(&self, slot_id: &str) -> Result<PresentationState, LiveError>;
}

/// Stand-in for rooms without a document backend. Listing returns nothing;
/// every write fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDocuments;

#[async_trait]
impl DocumentService for NoDocuments {
    async fn list_slots(&self, _room_id: &str) -> Result<Vec<DocumentSlot>, LiveError> {
        Ok(Vec::new())
    }

    async fn upload_slot(
        &self,
        _room_id: &str,
        _upload: SlotUpload,
    ) -> Result<DocumentSlot, LiveError> {
        Err(LiveError::Document("no document service configured".into()))
    }

    async fn delete_slot(&self, _slot_id: &str) -> Result<(), LiveError> {
        Err(LiveError::Document("no document service configured".into()))
    }

    async fn navigate(
        &self,
        _slot_id: &str,
        _page: u32,
        _action: NavigationAction,
    ) -> Result<(), LiveError> {
        Err(LiveError::Document("no document service configured".into()))
    }

    async fn presentation_state(&self, _slot_id: &str) -> Result<PresentationState, LiveError> {
        Err(LiveError::Document("no document service configured".into()))
    }
}
