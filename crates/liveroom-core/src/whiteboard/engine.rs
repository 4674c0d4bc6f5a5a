//! Stroke synchronization: local input, remote replay, undo/redo.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::debug;

use liveroom_config::WhiteboardConfig;

use super::history::SnapshotHistory;
use super::stroke::{PointKind, StrokeBatch, StrokeBuffer, StrokePoint, Tool};
use super::surface::{PenStyle, Surface};

/// Pen position and style of a stroke being replayed.
#[derive(Debug, Clone, Copy)]
struct Pen {
    at: (f32, f32),
    style: PenStyle,
}

/// Owns the local drawing surface.
///
/// Local input is drawn immediately and buffered for sending; remote
/// batches are replayed in the order given. Local and remote strokes
/// interleave on the same surface without isolation.
#[derive(Debug)]
pub struct StrokeSync {
    surface: Surface,
    history: SnapshotHistory,
    buffer: StrokeBuffer,
    tool: Tool,
    color: String,
    width: f32,
    local: Option<Pen>,
    /// In-progress remote strokes, by sender.
    remote: HashMap<String, Pen>,
}

impl StrokeSync {
    pub fn new(config: &WhiteboardConfig) -> Self {
        let surface = Surface::new(config.width, config.height);
        Self {
            history: SnapshotHistory::new(&surface, config.history_limit),
            surface,
            buffer: StrokeBuffer::new(Duration::from_millis(config.flush_interval_ms)),
            tool: Tool::Pen,
            color: config.default_color.clone(),
            width: config.default_width,
            local: None,
            remote: HashMap::new(),
        }
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.tool = tool;
    }

    pub fn set_color(&mut self, color: impl Into<String>) {
        self.color = color.into();
    }

    pub fn set_width(&mut self, width: f32) {
        self.width = width;
    }

    pub fn is_drawing(&self) -> bool {
        self.buffer.is_active()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn point(&self, kind: PointKind, (x, y): (f32, f32)) -> StrokePoint {
        StrokePoint {
            kind,
            x,
            y,
            tool: self.tool,
            color: self.color.clone(),
            width: self.width,
        }
    }

    // -- local input --------------------------------------------------------

    pub fn pointer_down(&mut self, x: f32, y: f32) {
        let point = self.point(PointKind::Start, (x, y));
        self.local = Some(Pen {
            at: (x, y),
            style: PenStyle::from_point(&point),
        });
        self.buffer.begin(point);
    }

    pub fn pointer_move(&mut self, x: f32, y: f32, now: Instant) -> Option<StrokeBatch> {
        if !self.buffer.is_active() {
            return None;
        }
        let pen = self.local.as_mut()?;
        self.surface.stroke_segment(pen.at, (x, y), &pen.style);
        pen.at = (x, y);
        let point = self.point(PointKind::Draw, (x, y));
        self.buffer.extend(point, now)
    }

    /// End the local stroke: flush immediately and snapshot the surface.
    pub fn pointer_up(&mut self, now: Instant) -> Option<StrokeBatch> {
        if !self.buffer.is_active() {
            return None;
        }
        let at = self.local.take().map_or((0.0, 0.0), |pen| pen.at);
        let point = self.point(PointKind::End, at);
        let batch = self.buffer.finish(point, now);
        self.history.record(&self.surface);
        batch
    }

    /// Flush points held back by the throttle.
    pub fn tick(&mut self, now: Instant) -> Option<StrokeBatch> {
        self.buffer.tick(now)
    }

    /// Abandon the local stroke without sending its remaining points.
    pub fn abort_stroke(&mut self) {
        self.buffer.discard();
        self.local = None;
    }

    // -- remote -------------------------------------------------------------

    pub fn apply_remote(&mut self, sender: &str, batch: &StrokeBatch) {
        for point in &batch.points {
            let at = (point.x, point.y);
            match point.kind {
                PointKind::Start => {
                    self.remote.insert(
                        sender.to_string(),
                        Pen {
                            at,
                            style: PenStyle::from_point(point),
                        },
                    );
                }
                PointKind::Draw => match self.remote.get_mut(sender) {
                    Some(pen) => {
                        self.surface.stroke_segment(pen.at, at, &pen.style);
                        pen.at = at;
                    }
                    None => {
                        debug!(sender = %sender, "Draw point without start, resuming from here");
                        self.remote.insert(
                            sender.to_string(),
                            Pen {
                                at,
                                style: PenStyle::from_point(point),
                            },
                        );
                    }
                },
                PointKind::End => {
                    self.remote.remove(sender);
                }
            }
        }
    }

    /// Forget a sender's in-progress stroke (sender left).
    pub fn forget_sender(&mut self, sender: &str) {
        self.remote.remove(sender);
    }

    // -- whole surface ------------------------------------------------------

    /// Clear the surface, drop any buffered local points and snapshot.
    /// Used for both local and received clears.
    pub fn clear(&mut self) {
        self.surface.clear();
        self.abort_stroke();
        self.remote.clear();
        self.history.record(&self.surface);
    }

    /// Step back one snapshot. Refused while a local stroke is in progress.
    pub fn undo(&mut self) -> bool {
        if self.buffer.is_active() {
            return false;
        }
        match self.history.undo() {
            Some(snapshot) => {
                self.surface = snapshot.clone();
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        if self.buffer.is_active() {
            return false;
        }
        match self.history.redo() {
            Some(snapshot) => {
                self.surface = snapshot.clone();
                true
            }
            None => false,
        }
    }

    pub fn export_ppm(&self) -> Vec<u8> {
        self.surface.to_ppm()
    }
}
