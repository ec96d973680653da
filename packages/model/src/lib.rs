//! Linear document model.
//!
//! A document is a flat array of items: characters (optionally annotated) and element
//! markers that open and close nodes.
//!
//! ```text
//!   data:  <p>  a  b  </p>  <list> <listItem> <p>  c  </p> </listItem> </list>
//!   tree:  document
//!          ├── paragraph ── text(2)
//!          └── list ── listItem ── paragraph ── text(1)
//! ```
//!
//! The node tree stores lengths only; offsets are derived by summing sibling lengths. The
//! offset map records, for every offset, the deepest branch covering it. Both are kept in
//! step with the data by [`Document::splice_both`], [`Document::rebuild_nodes`] and
//! [`Document::resize_node`].

pub mod annotation;
mod build;
mod builtin;
pub mod data;
pub mod document;
pub mod error;
pub mod example;
pub mod factory;
pub mod fixup;
pub mod offsets;
pub mod queries;
pub mod range;
pub mod select;
pub mod tree;

pub use annotation::{Annotation, AnnotationSet};
pub use data::{Element, Item, LinearData};
pub use document::{Document, SiblingSpan};
pub use error::{ModelError, ModelResult};
pub use factory::{
    AnnotationConverters, AnnotationDescriptor, AnnotationFactory, NodeConverters, NodeDescriptor,
    NodeFactory, NodeRules,
};
pub use range::Range;
pub use select::{NodeSelection, SelectMode};
pub use tree::{Node, NodeId, NodeTree};
