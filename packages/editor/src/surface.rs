//! # Editing Surface
//!
//! One editor's view of a document: the document itself, the current selection and the
//! undo history of the changes made through it.

use tracing::debug;
use wikiedit_model::{Annotation, Document, Range};

use crate::errors::EditorResult;
use crate::history::History;
use crate::operation::AnnotationMethod;
use crate::processor::TransactionProcessor;
use crate::transaction::Transaction;

#[derive(Debug)]
pub struct Surface {
    document: Document,
    selection: Range,
    history: History,
}

impl Surface {
    pub fn new(document: Document) -> Self {
        Self::with_history(document, History::new())
    }

    pub fn with_history(document: Document, history: History) -> Self {
        Self {
            document,
            selection: Range::collapsed(0),
            history,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    pub fn selection(&self) -> Range {
        self.selection
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Commit and record `transaction` and/or move the selection
    pub fn change(
        &mut self,
        transaction: Option<Transaction>,
        selection: Option<Range>,
    ) -> EditorResult<()> {
        if let Some(transaction) = transaction {
            TransactionProcessor::commit(&mut self.document, &transaction)?;
            debug!(
                ops = transaction.operations().len(),
                delta = transaction.length_difference(),
                "surface change"
            );
            self.history.record(transaction);
        }
        if let Some(selection) = selection {
            self.selection = selection.normalized();
        }
        Ok(())
    }

    /// Group everything changed since the last breakpoint into one undo step
    pub fn breakpoint(&mut self) -> bool {
        self.history.breakpoint(self.selection)
    }

    /// Undo the last step, returning the selection to restore
    pub fn undo(&mut self) -> EditorResult<Option<Range>> {
        self.breakpoint();
        let selection = self.history.undo(&mut self.document)?;
        if let Some(selection) = selection {
            self.selection = self.clamped(selection);
        }
        Ok(selection)
    }

    /// Redo the last undone step, returning the selection to restore
    pub fn redo(&mut self) -> EditorResult<Option<Range>> {
        self.breakpoint();
        let selection = self.history.redo(&mut self.document)?;
        if let Some(selection) = selection {
            self.selection = self.clamped(selection);
        }
        Ok(selection)
    }

    /// Set or clear `annotation` over the selection. A collapsed selection changes nothing.
    pub fn annotate(&mut self, method: AnnotationMethod, annotation: &Annotation) -> EditorResult<()> {
        if self.selection.is_collapsed() {
            return Ok(());
        }
        let transaction =
            Transaction::new_from_annotation(&self.document, self.selection, method, annotation)?;
        if transaction.is_no_op() {
            return Ok(());
        }
        self.change(Some(transaction), None)
    }

    fn clamped(&self, range: Range) -> Range {
        let len = self.document.len();
        Range::new(range.from.min(len), range.to.min(len)).normalized()
    }
}
