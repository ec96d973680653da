//! # Transaction Processor
//!
//! Applies a [`Transaction`] to a [`Document`], forwards (commit) or backwards (rollback).
//!
//! ## Design
//!
//! - A cursor walks the linear data as operations are consumed; retains and replaces
//!   advance it, attribute and annotate operations do not
//! - Rolling back swaps the two sides of every operation: removes with inserts, `from` with
//!   `to`, and setting with clearing
//! - Annotate operations only open and close brackets; the annotations are applied to the
//!   items the following retains and replaces cover
//! - A replace whose data holds only content splices in place and resizes the text node it
//!   falls in, or rebuilds its content branch when inline elements are involved
//! - A structural replace keeps consuming operations until the opening and closing markers
//!   it removed and inserted balance out, then rebuilds the covering range once
//! - Tree updates are queued on a [`Synchronizer`] and applied after the last operation
//!
//! A failing transaction leaves the document as it was: every commit and rollback first
//! clones the document, so each one costs time and memory linear in the document size on
//! top of the work the operations themselves need.

use std::sync::Arc;
use tracing::{debug, instrument, warn};
use wikiedit_model::data::contains_element_data;
use wikiedit_model::offsets::is_content_data;
use wikiedit_model::{Annotation, AnnotationSet, Document, Item, NodeFactory, NodeId, Range};

use crate::errors::{EditorError, EditorResult};
use crate::operation::{AnnotationBias, AnnotationMethod, Operation};
use crate::synchronizer::{NoopObserver, SyncObserver, Synchronizer};
use crate::transaction::Transaction;

pub struct TransactionProcessor<'a> {
    document: &'a mut Document,
    factory: Arc<NodeFactory>,
    operations: &'a [Operation],
    index: usize,
    reversed: bool,
    cursor: usize,
    /// Length change so far, to map the cursor back to pre-transaction offsets
    adjustment: isize,
    set: AnnotationSet,
    clear: AnnotationSet,
    synchronizer: Synchronizer,
}

impl<'a> TransactionProcessor<'a> {
    fn new(document: &'a mut Document, transaction: &'a Transaction, reversed: bool) -> Self {
        let factory = document.shared_factory();
        Self {
            document,
            factory,
            operations: transaction.operations(),
            index: 0,
            reversed,
            cursor: 0,
            adjustment: 0,
            set: AnnotationSet::new(),
            clear: AnnotationSet::new(),
            synchronizer: Synchronizer::new(),
        }
    }

    pub fn commit(document: &mut Document, transaction: &Transaction) -> EditorResult<()> {
        Self::commit_observed(document, transaction, &mut NoopObserver)
    }

    pub fn rollback(document: &mut Document, transaction: &Transaction) -> EditorResult<()> {
        Self::rollback_observed(document, transaction, &mut NoopObserver)
    }

    #[instrument(skip_all, fields(ops = transaction.operations().len()))]
    pub fn commit_observed(
        document: &mut Document,
        transaction: &Transaction,
        observer: &mut dyn SyncObserver,
    ) -> EditorResult<()> {
        Self::run(document, transaction, false, observer)
    }

    #[instrument(skip_all, fields(ops = transaction.operations().len()))]
    pub fn rollback_observed(
        document: &mut Document,
        transaction: &Transaction,
        observer: &mut dyn SyncObserver,
    ) -> EditorResult<()> {
        Self::run(document, transaction, true, observer)
    }

    fn run(
        document: &mut Document,
        transaction: &Transaction,
        reversed: bool,
        observer: &mut dyn SyncObserver,
    ) -> EditorResult<()> {
        let snapshot = document.clone();
        let result = TransactionProcessor::new(document, transaction, reversed).process(observer);
        match result {
            Ok(()) => {
                debug!(
                    reversed,
                    length = document.len(),
                    "processed transaction"
                );
                Ok(())
            }
            Err(error) => {
                warn!(%error, reversed, "transaction failed, document restored");
                *document = snapshot;
                Err(error)
            }
        }
    }

    fn process(mut self, observer: &mut dyn SyncObserver) -> EditorResult<()> {
        while let Some(op) = self.next_operation() {
            self.execute(op)?;
        }
        if !self.set.is_empty() || !self.clear.is_empty() {
            return Err(EditorError::invalid_annotation_state(
                "transaction ended with annotations still open",
            ));
        }
        self.synchronizer.synchronize(self.document, observer)
    }

    fn next_operation(&mut self) -> Option<&'a Operation> {
        let op = self.operations.get(self.index)?;
        self.index += 1;
        Some(op)
    }

    fn execute(&mut self, op: &'a Operation) -> EditorResult<()> {
        match op {
            Operation::Retain { length } => self.retain(*length),
            Operation::Replace { remove, insert } => {
                let (remove, insert) = self.sides(remove, insert);
                self.replace(remove, insert)
            }
            Operation::Attribute { key, from, to } => {
                let (from, to) = self.sides(from, to);
                self.attribute(key, from.clone(), to.clone())
            }
            Operation::Annotate {
                method,
                bias,
                annotation,
            } => self.annotate(*method, *bias, annotation),
        }
    }

    /// `(old, new)` in the direction being processed
    fn sides<'o, T: ?Sized>(&self, old: &'o T, new: &'o T) -> (&'o T, &'o T) {
        if self.reversed {
            (new, old)
        } else {
            (old, new)
        }
    }

    /// Pre-transaction offset of the cursor
    fn old_cursor(&self) -> usize {
        self.cursor.saturating_add_signed(-self.adjustment)
    }

    fn retain(&mut self, length: usize) -> EditorResult<()> {
        let end = self.cursor + length;
        if end > self.document.len() {
            return Err(EditorError::out_of_bounds(format!(
                "retain of {} at {} passes the end of the document ({})",
                length,
                self.cursor,
                self.document.len()
            )));
        }
        self.apply_annotations(end)?;
        self.cursor = end;
        Ok(())
    }

    fn annotate(
        &mut self,
        method: AnnotationMethod,
        bias: AnnotationBias,
        annotation: &Annotation,
    ) -> EditorResult<()> {
        let method = if self.reversed { method.inverse() } else { method };
        let target = match method {
            AnnotationMethod::Set => &mut self.set,
            AnnotationMethod::Clear => &mut self.clear,
        };
        let hash = annotation.hash();
        match bias {
            AnnotationBias::Start => {
                if !target.insert_hashed(hash.clone(), annotation.clone()) {
                    return Err(EditorError::invalid_annotation_state(format!(
                        "annotation {} is already open",
                        hash
                    )));
                }
            }
            AnnotationBias::Stop => {
                if target.remove(&hash).is_none() {
                    return Err(EditorError::invalid_annotation_state(format!(
                        "annotation {} is not open",
                        hash
                    )));
                }
            }
        }
        Ok(())
    }

    fn attribute(
        &mut self,
        key: &str,
        from: Option<serde_json::Value>,
        to: Option<serde_json::Value>,
    ) -> EditorResult<()> {
        let offset = self.cursor;
        let element = self
            .document
            .item_mut(offset)
            .and_then(Item::element_mut)
            .ok_or(EditorError::NotAnElement { offset })?;
        if element.is_close() {
            return Err(EditorError::ClosingElement { offset });
        }
        match &to {
            Some(value) => element.set_attribute(key, value.clone()),
            None => {
                element.remove_attribute(key);
            }
        }
        self.synchronizer.push_attribute_change(offset, key, from, to);
        Ok(())
    }

    /// Apply the open annotation brackets to the items in `[cursor, end)`
    fn apply_annotations(&mut self, end: usize) -> EditorResult<()> {
        if self.set.is_empty() && self.clear.is_empty() {
            return Ok(());
        }
        for offset in self.cursor..end {
            let Some(item) = self.document.item_mut(offset) else {
                break;
            };
            let replacement = match item {
                Item::Element(element) => {
                    if element.is_close() {
                        continue;
                    }
                    if self.factory.can_node_have_children(element.node_type())? {
                        return Err(EditorError::BranchAnnotation { offset });
                    }
                    let annotations = element.annotations.get_or_insert_with(AnnotationSet::new);
                    apply_diff(annotations, &self.set, &self.clear, offset)?;
                    if annotations.is_empty() {
                        element.annotations = None;
                    }
                    None
                }
                Item::Char(ch) => {
                    let mut annotations = AnnotationSet::new();
                    apply_diff(&mut annotations, &self.set, &self.clear, offset)?;
                    (!annotations.is_empty()).then(|| Item::Annotated(*ch, annotations))
                }
                Item::Annotated(ch, annotations) => {
                    apply_diff(annotations, &self.set, &self.clear, offset)?;
                    annotations.is_empty().then(|| Item::Char(*ch))
                }
            };
            if let Some(replacement) = replacement {
                *item = replacement;
            }
        }
        self.synchronizer
            .push_annotation(Range::new(self.cursor, end));
        Ok(())
    }

    fn replace(&mut self, remove: &'a [Item], insert: &'a [Item]) -> EditorResult<()> {
        if self.cursor + remove.len() > self.document.len() {
            return Err(EditorError::out_of_bounds(format!(
                "removal of {} items at {} passes the end of the document ({})",
                remove.len(),
                self.cursor,
                self.document.len()
            )));
        }
        if is_content_data(&self.factory, remove) && is_content_data(&self.factory, insert) {
            self.replace_content(remove, insert)
        } else {
            self.replace_structure(remove, insert)
        }
    }

    fn replace_content(&mut self, remove: &[Item], insert: &[Item]) -> EditorResult<()> {
        let old = self.old_cursor();
        let range = Range::new(old, old + remove.len());
        let delta = insert.len() as isize - remove.len() as isize;

        self.document
            .splice_both(self.cursor, remove.len(), insert.to_vec())?;
        self.apply_annotations(self.cursor + insert.len())?;

        let text = if contains_element_data(remove) || contains_element_data(insert) {
            None
        } else {
            self.text_node_for(range, delta)
        };
        match text {
            Some(node) => self.synchronizer.push_resize(self.document, node, delta),
            None => self.synchronizer.push_rebuild(self.document, range, delta),
        }
        debug!(at = self.cursor, removed = remove.len(), inserted = insert.len(), "content replace");

        self.cursor += insert.len();
        self.adjustment += delta;
        Ok(())
    }

    /// Text node (pre-transaction tree) that can absorb a content change over `range`.
    ///
    /// A text node is not emptied while it has siblings; the branch is rebuilt instead.
    fn text_node_for(&self, range: Range, delta: isize) -> Option<NodeId> {
        let tree = self.document.tree();
        let branch = self.document.branch_containing(range);
        if !tree[branch].can_contain_content() {
            return None;
        }
        let children = tree.children(branch);
        let mut start = tree.inner_range(branch).start();
        for &child in children {
            let node = &tree[child];
            let end = start + node.outer_length();
            if node.is_text() && start <= range.start() && range.end() <= end {
                let emptied = node.length.saturating_add_signed(delta) == 0;
                return (!emptied || children.len() == 1).then_some(child);
            }
            start = end;
        }
        None
    }

    fn replace_structure(&mut self, remove: &'a [Item], insert: &'a [Item]) -> EditorResult<()> {
        let start_adjustment = self.adjustment;
        let mut affected = Vec::new();
        let mut scope: Option<NodeId> = None;
        let mut remove_level = 0isize;
        let mut insert_level = 0isize;
        let mut min_insert_level = 0isize;
        let (mut remove, mut insert) = (remove, insert);

        loop {
            let old = self.old_cursor();
            affected.push(Range::new(old, old + remove.len()));

            for element in remove.iter().filter_map(Item::element) {
                remove_level += if element.is_close() { -1 } else { 1 };
            }
            for element in insert.iter().filter_map(Item::element) {
                if element.is_open() {
                    insert_level += 1;
                    continue;
                }
                insert_level -= 1;
                if insert_level < min_insert_level {
                    // Closing something the insertion never opened: the enclosing node is
                    // split, so all of it is affected
                    let current = scope
                        .unwrap_or_else(|| self.document.branch_containing(Range::collapsed(old)));
                    affected.push(self.document.node_outer_range(current));
                    scope = Some(self.document.tree().parent(current).unwrap_or(current));
                    min_insert_level = insert_level;
                }
            }

            self.document
                .splice_both(self.cursor, remove.len(), insert.to_vec())?;
            self.cursor += insert.len();
            self.adjustment += insert.len() as isize - remove.len() as isize;

            if remove_level == 0 && insert_level == 0 {
                break;
            }
            (remove, insert) = loop {
                let op = self.next_operation().ok_or(EditorError::UnbalancedReplace)?;
                match op {
                    Operation::Replace { remove, insert } => {
                        break self.sides(remove.as_slice(), insert.as_slice());
                    }
                    other => self.execute(other)?,
                }
            };
            if self.cursor + remove.len() > self.document.len() {
                return Err(EditorError::UnbalancedReplace);
            }
        }

        let covering = Range::covering(&affected).unwrap_or_else(|| Range::collapsed(self.old_cursor()));
        let delta = self.adjustment - start_adjustment;
        debug!(range = %covering, delta, "structural replace");
        self.synchronizer.push_rebuild(self.document, covering, delta);
        Ok(())
    }
}

fn apply_diff(
    annotations: &mut AnnotationSet,
    set: &AnnotationSet,
    clear: &AnnotationSet,
    offset: usize,
) -> EditorResult<()> {
    for (hash, annotation) in set.iter() {
        if !annotations.insert_hashed(hash.clone(), annotation.clone()) {
            return Err(EditorError::invalid_annotation_state(format!(
                "annotation {} is already set at offset {}",
                hash, offset
            )));
        }
    }
    for hash in clear.hashes() {
        if annotations.remove(hash).is_none() {
            return Err(EditorError::invalid_annotation_state(format!(
                "annotation {} is not set at offset {}",
                hash, offset
            )));
        }
    }
    Ok(())
}
