//! # wikiedit DOM
//!
//! A small, implementation-independent stand-in for a browser DOM. The converter reads and
//! writes this tree; a platform adapter can map it onto any real DOM or XML library.
//!
//! ```text
//! HTML text ──parse_fragment──▶ Vec<DomNode> ──to_html──▶ HTML text
//! ```

pub mod error;
pub mod html;
pub mod node;

pub use error::{HtmlError, HtmlResult};
pub use html::{parse_fragment, to_html};
pub use node::DomNode;
