//! Stroke points, batches, and the outbound throttle.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    #[default]
    Pen,
    Eraser,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointKind {
    Start,
    #[default]
    Draw,
    End,
}

/// One input sample, in surface-normalized coordinates (0.0..=1.0).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrokePoint {
    #[serde(rename = "type")]
    pub kind: PointKind,
    pub x: f32,
    pub y: f32,
    pub tool: Tool,
    pub color: String,
    pub width: f32,
}

impl Default for StrokePoint {
    fn default() -> Self {
        Self {
            kind: PointKind::Draw,
            x: 0.0,
            y: 0.0,
            tool: Tool::Pen,
            color: "#000000".to_string(),
            width: 2.0,
        }
    }
}

/// Points flushed together; body of a `whiteboard-draw` envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrokeBatch {
    #[serde(rename = "drawingData")]
    pub points: Vec<StrokePoint>,
}

// ---------------------------------------------------------------------------
// Throttle
// ---------------------------------------------------------------------------

/// Accumulates local points and releases them at most once per interval.
/// The end of a stroke always flushes immediately.
#[derive(Debug)]
pub struct StrokeBuffer {
    pending: Vec<StrokePoint>,
    interval: Duration,
    last_flush: Option<Instant>,
    active: bool,
}

impl StrokeBuffer {
    pub fn new(interval: Duration) -> Self {
        Self {
            pending: Vec::new(),
            interval,
            last_flush: None,
            active: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Begin a stroke. Leftovers of an abandoned stroke are dropped.
    pub fn begin(&mut self, point: StrokePoint) {
        self.pending.clear();
        self.pending.push(point);
        self.active = true;
    }

    /// Add a point to the current stroke; flush if the interval has passed.
    pub fn extend(&mut self, point: StrokePoint, now: Instant) -> Option<StrokeBatch> {
        if !self.active {
            return None;
        }
        self.pending.push(point);
        if self.due(now) {
            self.flush(now)
        } else {
            None
        }
    }

    /// End the stroke and flush everything regardless of the timer.
    pub fn finish(&mut self, point: StrokePoint, now: Instant) -> Option<StrokeBatch> {
        if !self.active {
            return None;
        }
        self.pending.push(point);
        self.active = false;
        self.flush(now)
    }

    /// Timer-driven flush of points left over from throttled moves.
    pub fn tick(&mut self, now: Instant) -> Option<StrokeBatch> {
        if self.pending.is_empty() || !self.due(now) {
            return None;
        }
        self.flush(now)
    }

    /// Drop buffered points and abandon the current stroke.
    pub fn discard(&mut self) {
        self.pending.clear();
        self.active = false;
    }

    fn due(&self, now: Instant) -> bool {
        self.last_flush
            .map_or(true, |last| now.duration_since(last) >= self.interval)
    }

    fn flush(&mut self, now: Instant) -> Option<StrokeBatch> {
        if self.pending.is_empty() {
            return None;
        }
        self.last_flush = Some(now);
        Some(StrokeBatch {
            points: std::mem::take(&mut self.pending),
        })
    }
}
