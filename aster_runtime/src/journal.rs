use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;

/// One journal line. `frame` is the clock's frame counter at record time;
/// entries recorded before the first frame carry `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JournalEntry {
    pub sequence: u32,
    pub frame: Option<u64>,
    pub label: String,
}

/// Ordered log of run markers recorded by scripts and trigger callbacks.
#[derive(Debug, Default, Clone, Serialize)]
pub struct Journal {
    events: Vec<JournalEntry>,
    #[serde(skip)]
    next_sequence: u32,
    #[serde(skip)]
    current_frame: Option<u64>,
}

impl Journal {
    pub fn new() -> Self {
        Journal::default()
    }

    /// Stamps subsequent entries with the given frame number. The scheduler
    /// calls this right after advancing the clock.
    pub fn set_frame(&mut self, frame: u64) {
        self.current_frame = Some(frame);
    }

    pub fn record(&mut self, label: impl Into<String>) {
        let entry = JournalEntry {
            sequence: self.next_sequence,
            frame: self.current_frame,
            label: label.into(),
        };
        self.next_sequence += 1;
        self.events.push(entry);
    }

    pub fn events(&self) -> &[JournalEntry] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Cloneable handle to the journal shared between the context, scripts,
/// and trigger callbacks.
#[derive(Debug, Clone, Default)]
pub struct JournalHandle {
    inner: Rc<RefCell<Journal>>,
}

impl JournalHandle {
    pub fn new() -> Self {
        JournalHandle::default()
    }

    pub fn set_frame(&self, frame: u64) {
        self.inner.borrow_mut().set_frame(frame);
    }

    pub fn record(&self, label: impl Into<String>) {
        self.inner.borrow_mut().record(label);
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }

    /// Copy of the journal, for serialization once a run has finished.
    pub fn snapshot(&self) -> Journal {
        self.inner.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_are_sequenced_and_frame_stamped() {
        let journal = JournalHandle::new();
        journal.record("boot");
        journal.set_frame(0);
        journal.record("first");
        journal.set_frame(3);
        journal.record("later");

        let snapshot = journal.snapshot();
        let events = snapshot.events();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].sequence, 0);
        assert_eq!(events[0].frame, None);
        assert_eq!(events[1].frame, Some(0));
        assert_eq!(events[2].sequence, 2);
        assert_eq!(events[2].frame, Some(3));
        assert_eq!(events[2].label, "later");
    }
}
