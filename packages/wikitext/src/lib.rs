//! # wikiedit Wikitext
//!
//! Serializes a token stream, or a DOM tree flattened into one, to wikitext.
//!
//! ```text
//! Vec<DomNode> ──tokens_from_dom──▶ Vec<Token> ──WikitextSerializer──▶ chunks / String
//! ```
//!
//! Content the parser marked as literal HTML, and tags with no wiki syntax, are written back
//! as HTML so a round trip does not reinterpret them.

mod dom;
mod error;
mod hints;
mod serializer;
mod token;

pub use dom::tokens_from_dom;
pub use error::{WikitextError, WikitextResult};
pub use hints::{DataHints, HINTS_ATTRIBUTE};
pub use serializer::{SerializerOptions, WikitextSerializer};
pub use token::{Tag, Token};
