//! # Undo/Redo History
//!
//! Tracks committed transactions and replays them backwards or forwards.
//!
//! ## Design
//!
//! - Transactions are recorded as they are committed and stay pending until a breakpoint
//! - A breakpoint closes the pending transactions into one step, stored with the selection
//!   at that moment
//! - Undo rolls a step's transactions back in reverse order and moves it to the redo stack
//! - Redo commits them again in order
//! - Recording a new transaction clears the redo stack
//! - The oldest steps are dropped once `max_levels` is exceeded (0 = unlimited)

use tracing::debug;
use wikiedit_model::{Document, Range};

use crate::errors::EditorResult;
use crate::processor::TransactionProcessor;
use crate::transaction::Transaction;

/// Transactions undone and redone together
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryStep {
    /// In commit order
    pub transactions: Vec<Transaction>,
    /// Selection after the step was made
    pub selection: Range,
}

impl HistoryStep {
    pub fn length_difference(&self) -> isize {
        self.transactions
            .iter()
            .map(Transaction::length_difference)
            .sum()
    }
}

#[derive(Debug)]
pub struct History {
    undo_stack: Vec<HistoryStep>,
    redo_stack: Vec<HistoryStep>,
    max_levels: usize,
    pending: Vec<Transaction>,
}

impl History {
    /// History with the default limit of 100 steps
    pub fn new() -> Self {
        Self::with_max_levels(100)
    }

    pub fn with_max_levels(max_levels: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_levels,
            pending: Vec::new(),
        }
    }

    /// Record a transaction that has just been committed
    pub fn record(&mut self, transaction: Transaction) {
        self.pending.push(transaction);
        self.redo_stack.clear();
    }

    /// Close the pending transactions into one undo step. Returns false when nothing was
    /// pending.
    pub fn breakpoint(&mut self, selection: Range) -> bool {
        if self.pending.is_empty() {
            return false;
        }
        let step = HistoryStep {
            transactions: std::mem::take(&mut self.pending),
            selection,
        };
        self.undo_stack.push(step);
        if self.max_levels > 0 && self.undo_stack.len() > self.max_levels {
            self.undo_stack.remove(0);
        }
        true
    }

    /// Roll back the most recent step.
    ///
    /// Returns `None` when there is nothing to undo, otherwise the step's selection with its
    /// end moved back by the step's length change.
    pub fn undo(&mut self, doc: &mut Document) -> EditorResult<Option<Range>> {
        let Some(step) = self.undo_stack.pop() else {
            return Ok(None);
        };
        for (index, transaction) in step.transactions.iter().enumerate().rev() {
            if let Err(error) = TransactionProcessor::rollback(doc, transaction) {
                // Put back what was already undone so the document and history agree
                for redo in &step.transactions[index + 1..] {
                    TransactionProcessor::commit(doc, redo)?;
                }
                self.undo_stack.push(step);
                return Err(error);
            }
        }
        let diff = step.length_difference();
        let selection = Range::new(
            step.selection.from,
            step.selection.to.saturating_add_signed(-diff),
        );
        debug!(transactions = step.transactions.len(), "undo");
        self.redo_stack.push(step);
        Ok(Some(selection))
    }

    /// Commit the most recently undone step again, returning its selection
    pub fn redo(&mut self, doc: &mut Document) -> EditorResult<Option<Range>> {
        let Some(step) = self.redo_stack.pop() else {
            return Ok(None);
        };
        for (index, transaction) in step.transactions.iter().enumerate() {
            if let Err(error) = TransactionProcessor::commit(doc, transaction) {
                for undo in step.transactions[..index].iter().rev() {
                    TransactionProcessor::rollback(doc, undo)?;
                }
                self.redo_stack.push(step);
                return Err(error);
            }
        }
        debug!(transactions = step.transactions.len(), "redo");
        let selection = step.selection;
        self.undo_stack.push(step);
        Ok(Some(selection))
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.pending.clear();
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}
