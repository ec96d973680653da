//! # Tree Synchronizer
//!
//! Collects the tree updates a transaction needs while its operations are processed, then
//! applies them in one pass once the linear data is final.
//!
//! ## Design
//!
//! - Rebuilds and resizes are queued in the coordinates of the tree before the transaction,
//!   which stays untouched until [`Synchronizer::synchronize`] runs
//! - Queued tree updates never overlap or touch: a new update that meets a queued one is
//!   merged with it into a single rebuild covering both, with the length changes summed
//! - Rebuild ranges are widened to whole sibling runs when queued, so merging sees the
//!   nodes a rebuild will really replace
//! - Updates are applied in document order with a running shift for the length changes
//!   already applied
//! - Attribute and annotation notes are positioned in final coordinates and reported after
//!   the tree is up to date
//!
//! Each applied update is reported to a [`SyncObserver`], the seam to a view layer.

use serde_json::Value;
use tracing::debug;
use wikiedit_model::{Document, NodeId, Range};

use crate::errors::EditorResult;

/// A tree update waiting to be applied
#[derive(Debug, Clone, PartialEq)]
pub enum SyncAction {
    /// Rebuild the siblings spanning `range`, whose length changes by `delta`
    Rebuild { range: Range, delta: isize },

    /// Change the length of a text node
    Resize {
        node: NodeId,
        range: Range,
        delta: isize,
    },
}

impl SyncAction {
    fn range(&self) -> Range {
        match self {
            SyncAction::Rebuild { range, .. } | SyncAction::Resize { range, .. } => *range,
        }
    }

    fn delta(&self) -> isize {
        match self {
            SyncAction::Rebuild { delta, .. } | SyncAction::Resize { delta, .. } => *delta,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum SyncNote {
    AttributeChange {
        offset: usize,
        key: String,
        from: Option<Value>,
        to: Option<Value>,
    },
    Annotation {
        range: Range,
    },
}

/// What changed, as reported to a [`SyncObserver`]
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    Rebuilt {
        parent: NodeId,
        index: usize,
        removed: usize,
        added: Vec<NodeId>,
        range: Range,
    },
    Resized {
        node: NodeId,
        delta: isize,
    },
    AttributeChanged {
        node: Option<NodeId>,
        offset: usize,
        key: String,
        from: Option<Value>,
        to: Option<Value>,
    },
    Annotated {
        range: Range,
    },
}

pub trait SyncObserver {
    fn on_sync(&mut self, event: &SyncEvent);
}

impl SyncObserver for Vec<SyncEvent> {
    fn on_sync(&mut self, event: &SyncEvent) {
        self.push(event.clone());
    }
}

/// Observer that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SyncObserver for NoopObserver {
    fn on_sync(&mut self, _event: &SyncEvent) {}
}

fn meets(a: &Range, b: &Range) -> bool {
    a.start() <= b.end() && b.start() <= a.end()
}

#[derive(Debug, Default)]
pub struct Synchronizer {
    actions: Vec<SyncAction>,
    notes: Vec<SyncNote>,
}

impl Synchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn actions(&self) -> &[SyncAction] {
        &self.actions
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty() && self.notes.is_empty()
    }

    /// Queue a rebuild of `range` (pre-transaction coordinates) whose length changes by
    /// `delta`
    pub fn push_rebuild(&mut self, doc: &Document, range: Range, delta: isize) {
        let mut range = doc.rebuild_span(range.normalized()).range.union(&range);
        let mut delta = delta;
        loop {
            let mut merged = false;
            self.actions.retain(|action| {
                if meets(&action.range(), &range) {
                    range = range.union(&action.range());
                    delta += action.delta();
                    merged = true;
                    false
                } else {
                    true
                }
            });
            let widened = doc.rebuild_span(range).range.union(&range);
            if !merged && widened == range {
                break;
            }
            range = widened;
        }
        self.insert(SyncAction::Rebuild { range, delta });
    }

    /// Queue a length change of a text node
    pub fn push_resize(&mut self, doc: &Document, node: NodeId, delta: isize) {
        let range = doc.node_outer_range(node);
        if let Some(SyncAction::Resize { delta: queued, .. }) = self
            .actions
            .iter_mut()
            .find(|action| matches!(action, SyncAction::Resize { node: queued, .. } if *queued == node))
        {
            *queued += delta;
            return;
        }
        if self.actions.iter().any(|action| meets(&action.range(), &range)) {
            self.push_rebuild(doc, range, delta);
            return;
        }
        self.insert(SyncAction::Resize { node, range, delta });
    }

    /// Note an attribute change on the element opened at `offset` (final coordinates)
    pub fn push_attribute_change(
        &mut self,
        offset: usize,
        key: &str,
        from: Option<Value>,
        to: Option<Value>,
    ) {
        self.notes.push(SyncNote::AttributeChange {
            offset,
            key: key.to_string(),
            from,
            to,
        });
    }

    /// Note a range whose annotations changed (final coordinates)
    pub fn push_annotation(&mut self, range: Range) {
        if !range.is_collapsed() {
            self.notes.push(SyncNote::Annotation { range });
        }
    }

    fn insert(&mut self, action: SyncAction) {
        let at = self
            .actions
            .partition_point(|queued| queued.range().start() <= action.range().start());
        self.actions.insert(at, action);
    }

    /// Apply every queued update to the document tree
    pub fn synchronize(
        self,
        doc: &mut Document,
        observer: &mut dyn SyncObserver,
    ) -> EditorResult<()> {
        let mut shift = 0isize;
        for action in self.actions {
            let applied = action.delta();
            match action {
                SyncAction::Rebuild { range, delta } => {
                    let span = doc.rebuild_span(range.shifted(shift));
                    let new_length = span.range.len().saturating_add_signed(delta);
                    let added = doc.rebuild_nodes(
                        span.parent,
                        span.index,
                        span.count,
                        span.range.start(),
                        new_length,
                    )?;
                    debug!(range = %span.range, delta, added = added.len(), "synchronized rebuild");
                    observer.on_sync(&SyncEvent::Rebuilt {
                        parent: span.parent,
                        index: span.index,
                        removed: span.count,
                        added,
                        range: Range::new(span.range.start(), span.range.start() + new_length),
                    });
                }
                SyncAction::Resize { node, delta, .. } => {
                    doc.resize_node(node, delta)?;
                    observer.on_sync(&SyncEvent::Resized { node, delta });
                }
            }
            shift += applied;
        }
        for note in self.notes {
            let event = match note {
                SyncNote::AttributeChange {
                    offset,
                    key,
                    from,
                    to,
                } => SyncEvent::AttributeChanged {
                    node: doc.node_opened_at(offset),
                    offset,
                    key,
                    from,
                    to,
                },
                SyncNote::Annotation { range } => SyncEvent::Annotated { range },
            };
            observer.on_sync(&event);
        }
        Ok(())
    }
}
