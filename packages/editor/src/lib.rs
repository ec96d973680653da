//! # Wikiedit Editor
//!
//! Editing engine on top of the linear document model.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ builder: edit intent → Transaction          │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ processor: Transaction → linear data        │
//! │  - commit / rollback                        │
//! │  - annotation brackets                      │
//! │  - balanced structural replaces             │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ synchronizer: queued rebuilds → node tree   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! [`Surface`] ties a document to a selection and a [`History`] of committed transactions.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use wikiedit_editor::{Surface, Transaction};
//! use wikiedit_model::{data::chars, example::example_data, Document};
//!
//! let mut surface = Surface::new(Document::with_defaults(example_data())?);
//! let tx = Transaction::new_from_insertion(surface.document(), 1, &chars("hi"))?;
//! surface.change(Some(tx), None)?;
//! surface.breakpoint();
//! surface.undo()?;
//! ```

mod builder;
mod errors;
mod history;
mod operation;
mod processor;
mod surface;
mod synchronizer;
mod transaction;

pub use errors::{EditorError, EditorResult};
pub use history::{History, HistoryStep};
pub use operation::{AnnotationBias, AnnotationMethod, Operation};
pub use processor::TransactionProcessor;
pub use surface::Surface;
pub use synchronizer::{NoopObserver, SyncAction, SyncEvent, SyncObserver, Synchronizer};
pub use transaction::Transaction;
