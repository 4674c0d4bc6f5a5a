//! Collaborative whiteboard.
//!
//! Local strokes are throttled into batches (the end of a stroke always
//! flushes at once), remote batches are replayed in receipt order, and
//! undo/redo restores whole-surface snapshots locally without broadcasting.

mod engine;
mod history;
mod stroke;
mod surface;

pub use engine::StrokeSync;
pub use history::SnapshotHistory;
pub use stroke::{PointKind, StrokeBatch, StrokeBuffer, StrokePoint, Tool};
pub use surface::{parse_color, PenStyle, Surface, TRANSPARENT, WHITE};
