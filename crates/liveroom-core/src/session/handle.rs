use tokio::sync::{mpsc, oneshot, watch};

use liveroom_common::LiveError;

use super::types::{Reply, RoomSnapshot, SessionCommand};
use crate::chat::ChatMessage;
use crate::documents::{DocumentSlot, NavigationAction, PresentationState, SlotUpload};
use crate::permissions::Entitlement;
use crate::whiteboard::Tool;

/// Cheap, cloneable front for a running [`LiveSession`](super::LiveSession).
///
/// Every operation is a request to the session loop; once the session has
/// closed they all fail with [`LiveError::SessionClosed`].
#[derive(Clone)]
pub struct LiveSessionHandle {
    command_tx: mpsc::Sender<SessionCommand>,
    snapshot: watch::Receiver<RoomSnapshot>,
}

impl LiveSessionHandle {
    pub(crate) fn new(
        command_tx: mpsc::Sender<SessionCommand>,
        snapshot: watch::Receiver<RoomSnapshot>,
    ) -> Self {
        Self {
            command_tx,
            snapshot,
        }
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(Reply<T>) -> SessionCommand,
    ) -> Result<T, LiveError> {
        let (reply, rx) = oneshot::channel();
        self.command_tx
            .send(make(reply))
            .await
            .map_err(|_| LiveError::SessionClosed)?;
        rx.await.map_err(|_| LiveError::SessionClosed)?
    }

    /// Latest state of the room.
    pub fn snapshot(&self) -> RoomSnapshot {
        self.snapshot.borrow().clone()
    }

    /// A receiver that wakes on every snapshot change.
    pub fn watch(&self) -> watch::Receiver<RoomSnapshot> {
        self.snapshot.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.command_tx.is_closed()
    }

    // -- whiteboard ---------------------------------------------------------

    pub async fn pointer_down(&self, x: f32, y: f32) -> Result<(), LiveError> {
        self.request(|reply| SessionCommand::PointerDown { x, y, reply })
            .await
    }

    pub async fn pointer_move(&self, x: f32, y: f32) -> Result<(), LiveError> {
        self.request(|reply| SessionCommand::PointerMove { x, y, reply })
            .await
    }

    pub async fn pointer_up(&self) -> Result<(), LiveError> {
        self.request(|reply| SessionCommand::PointerUp { reply }).await
    }

    /// Selecting the eraser is host-only.
    pub async fn set_tool(&self, tool: Tool) -> Result<(), LiveError> {
        self.request(|reply| SessionCommand::SetTool { tool, reply })
            .await
    }

    pub async fn set_color(&self, color: impl Into<String>) -> Result<(), LiveError> {
        let color = color.into();
        self.request(|reply| SessionCommand::SetColor { color, reply })
            .await
    }

    pub async fn set_width(&self, width: f32) -> Result<(), LiveError> {
        self.request(|reply| SessionCommand::SetWidth { width, reply })
            .await
    }

    /// Local only. Returns `false` when there was nothing to undo.
    pub async fn undo(&self) -> Result<bool, LiveError> {
        self.request(|reply| SessionCommand::Undo { reply }).await
    }

    pub async fn redo(&self) -> Result<bool, LiveError> {
        self.request(|reply| SessionCommand::Redo { reply }).await
    }

    pub async fn clear_surface(&self) -> Result<(), LiveError> {
        self.request(|reply| SessionCommand::ClearSurface { reply })
            .await
    }

    /// The drawing surface as a binary PPM image.
    pub async fn export_surface(&self) -> Result<Vec<u8>, LiveError> {
        self.request(|reply| SessionCommand::ExportSurface { reply })
            .await
    }

    // -- documents ----------------------------------------------------------

    /// Move the presentation of `slot`. `page` is only read for
    /// [`NavigationAction::Navigate`]. Returns the page landed on.
    pub async fn navigate(
        &self,
        slot: impl Into<String>,
        page: u32,
        action: NavigationAction,
    ) -> Result<u32, LiveError> {
        let slot = slot.into();
        self.request(|reply| SessionCommand::Navigate {
            slot,
            page,
            action,
            reply,
        })
        .await
    }

    pub async fn go_to_page(&self, slot: impl Into<String>, page: u32) -> Result<u32, LiveError> {
        self.navigate(slot, page, NavigationAction::Navigate).await
    }

    pub async fn next_page(&self, slot: impl Into<String>) -> Result<u32, LiveError> {
        self.navigate(slot, 0, NavigationAction::NextPage).await
    }

    pub async fn previous_page(&self, slot: impl Into<String>) -> Result<u32, LiveError> {
        self.navigate(slot, 0, NavigationAction::PreviousPage).await
    }

    /// Track `slot` locally without broadcasting.
    pub async fn select_slot(&self, slot: impl Into<String>) -> Result<(), LiveError> {
        let slot = slot.into();
        self.request(|reply| SessionCommand::SelectSlot { slot, reply })
            .await
    }

    pub async fn refresh_slots(&self) -> Result<(), LiveError> {
        self.request(|reply| SessionCommand::RefreshSlots { reply })
            .await
    }

    pub async fn upload_slot(&self, upload: SlotUpload) -> Result<DocumentSlot, LiveError> {
        self.request(|reply| SessionCommand::UploadSlot { upload, reply })
            .await
    }

    pub async fn delete_slot(&self, slot: impl Into<String>) -> Result<(), LiveError> {
        let slot = slot.into();
        self.request(|reply| SessionCommand::DeleteSlot { slot, reply })
            .await
    }

    pub async fn presentation_state(
        &self,
        slot: impl Into<String>,
    ) -> Result<PresentationState, LiveError> {
        let slot = slot.into();
        self.request(|reply| SessionCommand::PresentationState { slot, reply })
            .await
    }

    // -- moderation (host only) ---------------------------------------------

    pub async fn set_entitlement(
        &self,
        target: impl Into<String>,
        entitlement: Entitlement,
        value: bool,
    ) -> Result<(), LiveError> {
        let target = target.into();
        self.request(|reply| SessionCommand::SetEntitlement {
            target,
            entitlement,
            value,
            reply,
        })
        .await
    }

    /// Change the room default and every current member at once.
    pub async fn set_global(&self, entitlement: Entitlement, value: bool) -> Result<(), LiveError> {
        self.request(|reply| SessionCommand::SetGlobal {
            entitlement,
            value,
            reply,
        })
        .await
    }

    pub async fn mute_all(&self) -> Result<(), LiveError> {
        self.request(|reply| SessionCommand::MuteAll { reply }).await
    }

    pub async fn allow_unmute_all(&self) -> Result<(), LiveError> {
        self.request(|reply| SessionCommand::AllowUnmuteAll { reply })
            .await
    }

    pub async fn kick(
        &self,
        target: impl Into<String>,
        reason: impl Into<String>,
    ) -> Result<(), LiveError> {
        let target = target.into();
        let reason = reason.into();
        self.request(|reply| SessionCommand::Kick {
            target,
            reason,
            reply,
        })
        .await
    }

    // -- chat ---------------------------------------------------------------

    pub async fn send_chat(&self, content: impl Into<String>) -> Result<ChatMessage, LiveError> {
        let content = content.into();
        self.request(|reply| SessionCommand::SendChat { content, reply })
            .await
    }

    pub async fn set_typing(&self, is_typing: bool) -> Result<(), LiveError> {
        self.request(|reply| SessionCommand::SetTyping { is_typing, reply })
            .await
    }

    // -- local media --------------------------------------------------------

    pub async fn set_camera(&self, enabled: bool) -> Result<(), LiveError> {
        self.request(|reply| SessionCommand::SetCamera { enabled, reply })
            .await
    }

    pub async fn set_mic(&self, enabled: bool) -> Result<(), LiveError> {
        self.request(|reply| SessionCommand::SetMic { enabled, reply })
            .await
    }

    pub async fn start_screen_share(&self) -> Result<(), LiveError> {
        self.request(|reply| SessionCommand::StartScreenShare { reply })
            .await
    }

    pub async fn stop_screen_share(&self) -> Result<(), LiveError> {
        self.request(|reply| SessionCommand::StopScreenShare { reply })
            .await
    }

    /// Announce departure and shut the session down. Idempotent.
    pub async fn leave(&self) -> Result<(), LiveError> {
        match self.request(|reply| SessionCommand::Leave { reply }).await {
            Err(LiveError::SessionClosed) => Ok(()),
            other => other,
        }
    }
}

impl std::fmt::Debug for LiveSessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveSessionHandle")
            .field("room_id", &self.snapshot.borrow().room_id)
            .field("closed", &self.is_closed())
            .finish()
    }
}
