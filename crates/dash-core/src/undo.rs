//! Layout undo/redo history
//!
//! Every undoable command leaves an [`UndoRecord`] holding the layout and stash as they were
//! before it ran. Undoing restores the prior snapshot of the oldest popped record, so undoing
//! several commands at once is a single state replacement.

use std::collections::VecDeque;

use ahash::AHashMap;
use dash_model::{Layout, ObjRef, Stash, Widget};

use crate::commands::UndoPoint;

/// Layout and stash as of one moment
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutSnapshot {
    pub layout: Layout,
    pub stash: Stash,
}

impl LayoutSnapshot {
    /// Swap widget identities found in `identities` for their new values
    pub fn remap_widget_refs(&mut self, identities: &AHashMap<ObjRef, ObjRef>) {
        let mut remap = |widget: &mut Widget| {
            if let Some(new_ref) = widget.widget_ref().and_then(|r| identities.get(r)) {
                widget.set_widget_ref(new_ref.clone());
            }
        };
        self.layout.for_each_widget_mut(&mut remap);
        for item in self.stash.values_mut().flatten() {
            remap(&mut item.widget);
            if let Some(nested) = item.nested_layout_mut() {
                nested.for_each_widget_mut(&mut remap);
            }
        }
    }
}

/// One undoable command
#[derive(Debug, Clone, PartialEq)]
pub struct UndoRecord {
    pub command_type: &'static str,
    pub correlation_id: Option<String>,
    /// State before the command ran
    pub prior: LayoutSnapshot,
}

#[derive(Debug, Clone)]
struct RedoEntry {
    /// Undone records, oldest first
    records: Vec<UndoRecord>,
    /// State right before the undo
    restored_from: LayoutSnapshot,
}

/// Bounded undo stack with a redo stack on the side
#[derive(Debug)]
pub struct UndoStack {
    limit: usize,
    records: VecDeque<UndoRecord>,
    redo: Vec<RedoEntry>,
}

impl UndoStack {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            records: VecDeque::new(),
            redo: Vec::new(),
        }
    }

    /// Record a command; drops the oldest record past the limit and forgets redo history
    pub fn push(&mut self, record: UndoRecord) {
        self.redo.clear();
        if self.limit == 0 {
            return;
        }
        self.records.push_back(record);
        while self.records.len() > self.limit {
            self.records.pop_front();
        }
    }

    /// Number of records an undo to `point` pops; zero when there is nothing to undo
    pub fn count_for(&self, point: &UndoPoint) -> usize {
        match point {
            UndoPoint::Last => self.records.len().min(1),
            UndoPoint::Count(n) => (*n).min(self.records.len()),
            UndoPoint::CorrelationPrefix(prefix) => self
                .records
                .iter()
                .rev()
                .take_while(|r| r.correlation_id.as_deref().is_some_and(|id| id.starts_with(prefix.as_str())))
                .count(),
        }
    }

    /// Snapshot an undo of `count` records restores
    pub fn peek_undo(&self, count: usize) -> Option<&LayoutSnapshot> {
        if count == 0 || count > self.records.len() {
            return None;
        }
        self.records.get(self.records.len() - count).map(|r| &r.prior)
    }

    /// Snapshot a redo restores
    pub fn peek_redo(&self) -> Option<&LayoutSnapshot> {
        self.redo.last().map(|entry| &entry.restored_from)
    }

    /// Pop `count` records; `current` is the state being undone
    ///
    /// Returns the restored snapshot.
    pub fn undo(&mut self, count: usize, current: LayoutSnapshot, redoable: bool) -> Option<LayoutSnapshot> {
        if count == 0 || count > self.records.len() {
            return None;
        }
        let records: Vec<UndoRecord> = self.records.drain(self.records.len() - count..).collect();
        let restored = records.first().map(|r| r.prior.clone());

        if redoable {
            self.redo.push(RedoEntry {
                records,
                restored_from: current,
            });
        } else {
            self.redo.clear();
        }
        restored
    }

    /// Re-apply the most recent undo; returns the snapshot to restore
    pub fn redo(&mut self) -> Option<LayoutSnapshot> {
        let entry = self.redo.pop()?;
        self.records.extend(entry.records);
        while self.records.len() > self.limit {
            self.records.pop_front();
        }
        Some(entry.restored_from)
    }

    /// Rewrite widget identities in every undo and redo snapshot
    pub fn remap_widget_refs(&mut self, identities: &AHashMap<ObjRef, ObjRef>) {
        if identities.is_empty() {
            return;
        }
        for record in self.records.iter_mut() {
            record.prior.remap_widget_refs(identities);
        }
        for entry in self.redo.iter_mut() {
            entry.restored_from.remap_widget_refs(identities);
            for record in entry.records.iter_mut() {
                record.prior.remap_widget_refs(identities);
            }
        }
    }

    /// Forget all history
    pub fn clear(&mut self) {
        self.records.clear();
        self.redo.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dash_model::Section;

    fn snapshot(sections: usize) -> LayoutSnapshot {
        LayoutSnapshot {
            layout: Layout::new(vec![Section::default(); sections]),
            stash: Stash::new(),
        }
    }

    fn record(correlation_id: Option<&str>, sections: usize) -> UndoRecord {
        UndoRecord {
            command_type: "DASH/CMD.FLUID_LAYOUT.ADD_SECTION",
            correlation_id: correlation_id.map(str::to_string),
            prior: snapshot(sections),
        }
    }

    #[test]
    fn test_undo_restores_oldest_popped() {
        let mut stack = UndoStack::new(10);
        stack.push(record(None, 0));
        stack.push(record(None, 1));
        stack.push(record(None, 2));

        let restored = stack.undo(2, snapshot(3), true).unwrap();
        assert_eq!(restored.layout.sections.len(), 1);
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.redo_len(), 1);
    }

    #[test]
    fn test_redo_brings_back_state_and_records() {
        let mut stack = UndoStack::new(10);
        stack.push(record(None, 0));
        stack.undo(1, snapshot(1), true);

        let restored = stack.redo().unwrap();
        assert_eq!(restored.layout.sections.len(), 1);
        assert_eq!(stack.len(), 1);
        assert!(stack.redo().is_none());
    }

    #[test]
    fn test_push_clears_redo() {
        let mut stack = UndoStack::new(10);
        stack.push(record(None, 0));
        stack.undo(1, snapshot(1), true);
        stack.push(record(None, 0));

        assert_eq!(stack.redo_len(), 0);
    }

    #[test]
    fn test_bounded() {
        let mut stack = UndoStack::new(2);
        for sections in 0..5 {
            stack.push(record(None, sections));
        }

        assert_eq!(stack.len(), 2);
        assert_eq!(stack.peek_undo(2).unwrap().layout.sections.len(), 3);
    }

    #[test]
    fn test_correlation_prefix_run() {
        let mut stack = UndoStack::new(10);
        stack.push(record(Some("dnd-1"), 0));
        stack.push(record(None, 1));
        stack.push(record(Some("dnd-2"), 2));
        stack.push(record(Some("dnd-2"), 3));

        assert_eq!(stack.count_for(&UndoPoint::CorrelationPrefix("dnd-".to_string())), 2);
        assert_eq!(stack.count_for(&UndoPoint::Count(9)), 4);
        assert_eq!(stack.count_for(&UndoPoint::Last), 1);
        assert_eq!(UndoStack::new(10).count_for(&UndoPoint::Last), 0);
    }

    #[test]
    fn test_remap_reaches_undo_redo_and_stash() {
        let temporary = ObjRef::temporary();
        let saved = ObjRef::identifier("widget-1");
        let mut widget = Widget::RichText(dash_model::RichTextWidget::new("note"));
        widget.set_widget_ref(temporary.clone());
        let item = dash_model::Item::new(widget, 4);

        let mut with_widget = snapshot(0);
        with_widget.layout = Layout::new(vec![Section::new(vec![item.clone()])]);
        with_widget.stash.insert("s1".to_string(), vec![item]);

        let mut stack = UndoStack::new(10);
        stack.push(UndoRecord {
            command_type: "DASH/CMD.FLUID_LAYOUT.ADD_SECTION",
            correlation_id: None,
            prior: with_widget.clone(),
        });
        stack.push(record(None, 0));
        stack.undo(1, with_widget, true);

        let identities: AHashMap<ObjRef, ObjRef> = [(temporary, saved.clone())].into_iter().collect();
        stack.remap_widget_refs(&identities);

        let redo = stack.peek_redo().unwrap();
        assert_eq!(redo.layout.sections[0].items[0].widget.widget_ref(), Some(&saved));
        let prior = stack.peek_undo(1).unwrap();
        assert_eq!(prior.layout.sections[0].items[0].widget.widget_ref(), Some(&saved));
        assert_eq!(prior.stash["s1"][0].widget.widget_ref(), Some(&saved));
    }
}
