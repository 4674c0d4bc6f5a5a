use super::surface::Surface;

/// Bounded list of whole-surface snapshots with an undo cursor.
///
/// Recording after an undo drops the redo branch. When the list is full the
/// oldest snapshot goes and the cursor stays on the newest entry.
#[derive(Debug, Clone)]
pub struct SnapshotHistory {
    entries: Vec<Surface>,
    index: usize,
    limit: usize,
}

impl SnapshotHistory {
    /// Start with `initial` as the only entry.
    pub fn new(initial: &Surface, limit: usize) -> Self {
        Self {
            entries: vec![initial.clone()],
            index: 0,
            limit: limit.max(1),
        }
    }

    pub fn record(&mut self, surface: &Surface) {
        self.entries.truncate(self.index + 1);
        self.entries.push(surface.clone());
        if self.entries.len() > self.limit {
            self.entries.remove(0);
        }
        self.index = self.entries.len() - 1;
    }

    pub fn undo(&mut self) -> Option<&Surface> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        self.entries.get(self.index)
    }

    pub fn redo(&mut self) -> Option<&Surface> {
        if self.index + 1 >= self.entries.len() {
            return None;
        }
        self.index += 1;
        self.entries.get(self.index)
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::whiteboard::stroke::Tool;
    use crate::whiteboard::surface::PenStyle;

    fn marked(n: u32) -> Surface {
        let mut s = Surface::new(8, 8);
        let style = PenStyle {
            tool: Tool::Pen,
            rgba: 0x0000_00FF,
            width: 1.0,
        };
        let x = n as f32 / 8.0;
        s.stroke_segment((x, 0.0), (x, 1.0), &style);
        s
    }

    #[test]
    fn undo_then_redo_restores_exact_snapshot() {
        let mut h = SnapshotHistory::new(&Surface::new(8, 8), 50);
        h.record(&marked(1));
        h.record(&marked(2));
        assert_eq!(h.undo().cloned(), Some(marked(1)));
        assert_eq!(h.redo().cloned(), Some(marked(2)));
        assert!(h.redo().is_none());
    }

    #[test]
    fn cannot_undo_past_initial() {
        let mut h = SnapshotHistory::new(&Surface::new(8, 8), 50);
        assert!(!h.can_undo());
        assert!(h.undo().is_none());
        h.record(&marked(1));
        assert_eq!(h.undo().cloned(), Some(Surface::new(8, 8)));
        assert!(h.undo().is_none());
    }

    #[test]
    fn recording_drops_redo_branch() {
        let mut h = SnapshotHistory::new(&Surface::new(8, 8), 50);
        h.record(&marked(1));
        h.record(&marked(2));
        h.undo();
        h.record(&marked(3));
        assert!(!h.can_redo());
        assert_eq!(h.len(), 3);
        assert_eq!(h.undo().cloned(), Some(marked(1)));
    }

    #[test]
    fn bounded_at_limit() {
        let mut h = SnapshotHistory::new(&Surface::new(8, 8), 5);
        for n in 0..8 {
            h.record(&marked(n));
        }
        assert_eq!(h.len(), 5);
        let mut undos = 0;
        while h.undo().is_some() {
            undos += 1;
        }
        assert_eq!(undos, 4);
    }
}
