//! # Transactions
//!
//! An ordered list of [`Operation`]s spanning the whole document: the retains and replaces
//! together cover every item exactly once.
//!
//! The `push_*` appenders keep the list compact. Consecutive retains coalesce, a replace
//! directly after another replace merges into it, and empty operations are dropped.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use wikiedit_model::{Annotation, Item};

use crate::operation::{AnnotationBias, AnnotationMethod, Operation};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    operations: Vec<Operation>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_operations(operations: Vec<Operation>) -> Self {
        Self { operations }
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn into_operations(self) -> Vec<Operation> {
        self.operations
    }

    /// Change in document length once the transaction is committed
    pub fn length_difference(&self) -> isize {
        self.operations.iter().map(Operation::length_difference).sum()
    }

    /// True when committing would leave the document untouched
    pub fn is_no_op(&self) -> bool {
        self.operations.iter().all(Operation::is_retain)
    }

    pub fn push_retain(&mut self, length: usize) {
        if length == 0 {
            return;
        }
        if let Some(Operation::Retain { length: last }) = self.operations.last_mut() {
            *last += length;
            return;
        }
        self.operations.push(Operation::Retain { length });
    }

    pub fn push_replace(&mut self, remove: Vec<Item>, insert: Vec<Item>) {
        if remove.is_empty() && insert.is_empty() {
            return;
        }
        if let Some(Operation::Replace {
            remove: last_remove,
            insert: last_insert,
        }) = self.operations.last_mut()
        {
            last_remove.extend(remove);
            last_insert.extend(insert);
            return;
        }
        self.operations.push(Operation::Replace { remove, insert });
    }

    pub fn push_replace_element_attribute(
        &mut self,
        key: impl Into<String>,
        from: Option<Value>,
        to: Option<Value>,
    ) {
        self.operations.push(Operation::Attribute {
            key: key.into(),
            from,
            to,
        });
    }

    pub fn push_start_annotating(&mut self, method: AnnotationMethod, annotation: Annotation) {
        self.operations.push(Operation::Annotate {
            method,
            bias: AnnotationBias::Start,
            annotation,
        });
    }

    pub fn push_stop_annotating(&mut self, method: AnnotationMethod, annotation: Annotation) {
        self.operations.push(Operation::Annotate {
            method,
            bias: AnnotationBias::Stop,
            annotation,
        });
    }

    /// Map an offset in the document before the transaction to the document after it.
    ///
    /// Offsets at an insertion point stay before the inserted data. Offsets inside a removal
    /// land on the start of the replacement.
    pub fn translate_offset(&self, offset: usize) -> usize {
        let mut cursor = 0usize;
        let mut adjustment = 0isize;
        for op in &self.operations {
            match op {
                Operation::Retain { length } => {
                    if offset < cursor + length {
                        return offset.saturating_add_signed(adjustment);
                    }
                    cursor += length;
                }
                Operation::Replace { remove, insert } => {
                    if offset == cursor || offset < cursor + remove.len() {
                        return cursor.saturating_add_signed(adjustment);
                    }
                    cursor += remove.len();
                    adjustment += insert.len() as isize - remove.len() as isize;
                }
                Operation::Attribute { .. } | Operation::Annotate { .. } => {}
            }
        }
        offset.saturating_add_signed(adjustment)
    }
}
