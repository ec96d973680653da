//! # wikiedit Converter
//!
//! Moves documents between the external DOM tree and linear data.
//!
//! ```text
//! Vec<DomNode> ──get_data_from_dom──▶ LinearData ──get_dom_from_data──▶ Vec<DomNode>
//! ```
//!
//! - Annotation tags (`b`, `i`, `a`, ...) become annotations on the characters inside them
//! - Registered tags become element markers; unknown ones are kept as alien nodes holding
//!   their markup
//! - Text or inline content directly inside a branch that cannot hold content is wrapped in
//!   a paragraph
//! - Comments are dropped

mod converter;
mod error;

pub use converter::{
    Converter, ALIEN_HTML_ATTRIBUTE, GENERATED_CONTENT_ATTRIBUTE, HTML_ATTRIBUTE_PREFIX,
};
pub use error::{ConverterError, ConverterResult};
