//! Outbound sequence stamps and inbound replay detection.

use std::collections::HashMap;

use liveroom_common::InstanceId;

use crate::protocol::Sequence;

/// Stamps outbound envelopes and keeps a high-water mark per sender.
#[derive(Debug)]
pub struct Sequencer {
    origin: InstanceId,
    next: u64,
    /// sender id -> (origin, highest n seen)
    marks: HashMap<String, (String, u64)>,
}

impl Sequencer {
    pub fn new(origin: InstanceId) -> Self {
        Self {
            origin,
            next: 0,
            marks: HashMap::new(),
        }
    }

    pub fn stamp(&mut self) -> Sequence {
        self.next += 1;
        Sequence {
            origin: self.origin.as_str().to_string(),
            n: self.next,
        }
    }

    /// Decide whether a mutating envelope is fresh, and if so advance the
    /// sender's mark. Unstamped envelopes are always admitted; a different
    /// origin (the sender restarted) resets the mark.
    pub fn admit(&mut self, sender: &str, seq: Option<&Sequence>) -> bool {
        let Some(seq) = seq else {
            return true;
        };
        match self.marks.get_mut(sender) {
            Some((origin, mark)) if *origin == seq.origin => {
                if seq.n > *mark {
                    *mark = seq.n;
                    true
                } else {
                    false
                }
            }
            _ => {
                self.marks
                    .insert(sender.to_string(), (seq.origin.clone(), seq.n));
                true
            }
        }
    }

    pub fn forget(&mut self, sender: &str) {
        self.marks.remove(sender);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(origin: &str, n: u64) -> Sequence {
        Sequence {
            origin: origin.into(),
            n,
        }
    }

    #[test]
    fn stamps_increase() {
        let mut s = Sequencer::new(InstanceId::from("me"));
        assert_eq!(s.stamp(), seq("me", 1));
        assert_eq!(s.stamp(), seq("me", 2));
    }

    #[test]
    fn replays_are_rejected() {
        let mut s = Sequencer::new(InstanceId::from("me"));
        assert!(s.admit("t", Some(&seq("o1", 5))));
        assert!(!s.admit("t", Some(&seq("o1", 5))));
        assert!(!s.admit("t", Some(&seq("o1", 3))));
        assert!(s.admit("t", Some(&seq("o1", 9))));
    }

    #[test]
    fn new_origin_resets_mark() {
        let mut s = Sequencer::new(InstanceId::from("me"));
        assert!(s.admit("t", Some(&seq("o1", 50))));
        assert!(s.admit("t", Some(&seq("o2", 1))));
        assert!(s.admit("t", Some(&seq("o2", 2))));
    }

    #[test]
    fn senders_are_independent_and_unstamped_pass() {
        let mut s = Sequencer::new(InstanceId::from("me"));
        assert!(s.admit("a", Some(&seq("o", 10))));
        assert!(s.admit("b", Some(&seq("o", 1))));
        assert!(s.admit("a", None));
        s.forget("a");
        assert!(s.admit("a", Some(&seq("o", 1))));
    }
}
