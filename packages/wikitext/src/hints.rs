//! Round-trip hints carried in an element's `data-mw` attribute.
//!
//! The parser records how a construct was written (literal HTML or wiki syntax, same-line
//! table cells, link tails) so the serializer can write it back the same way.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Attribute holding the JSON-encoded hints
pub const HINTS_ATTRIBUTE: &str = "data-mw";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataHints {
    /// Syntax the element was written in: `html`, `urllink`, ...
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stx: Option<String>,

    /// Table cell variant; `row` for cells on the same line as the previous one
    #[serde(default, rename = "stx_v", skip_serializing_if = "Option::is_none")]
    pub stx_v: Option<String>,

    /// Word characters glued after a link's closing brackets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tail: Option<String>,

    /// Content generated by the parser rather than written by the author
    #[serde(default, deserialize_with = "truthy", skip_serializing_if = "std::ops::Not::not")]
    pub gc: bool,

    /// Link target as originally written
    #[serde(default, rename = "sHref", skip_serializing_if = "Option::is_none")]
    pub s_href: Option<String>,
}

impl DataHints {
    /// Hints from the attribute text; blank text gives the defaults
    pub fn parse(source: &str) -> serde_json::Result<Self> {
        if source.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(source)
    }

    pub fn is_html(&self) -> bool {
        self.stx.as_deref() == Some("html")
    }

    pub fn is_url_link(&self) -> bool {
        self.stx.as_deref() == Some("urllink")
    }

    pub fn is_same_row(&self) -> bool {
        self.stx_v.as_deref() == Some("row")
    }

    /// Non-empty link tail
    pub fn tail(&self) -> Option<&str> {
        self.tail.as_deref().filter(|tail| !tail.is_empty())
    }
}

/// Parsers write flags as `true` or `1`
fn truthy<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => false,
        Value::Bool(flag) => flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    })
}
