//! Linear data items.
//!
//! Wire shapes:
//! - plain character: `"a"`
//! - annotated character: `["a", {hash: annotation}]`
//! - element marker: `{"type": "paragraph", "attributes"?: {...}, "annotations"?: {...}}`,
//!   closing markers carry a leading `/` in their type

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::annotation::AnnotationSet;

pub type LinearData = Vec<Item>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Item {
    Char(char),
    Annotated(char, AnnotationSet),
    Element(Element),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    #[serde(rename = "type")]
    pub element_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<BTreeMap<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<AnnotationSet>,
}

impl Element {
    pub fn open(node_type: impl Into<String>) -> Self {
        Self {
            element_type: node_type.into(),
            attributes: None,
            annotations: None,
        }
    }

    pub fn close(node_type: &str) -> Self {
        Self::open(format!("/{}", node_type))
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_attribute(key, value);
        self
    }

    pub fn is_close(&self) -> bool {
        self.element_type.starts_with('/')
    }

    pub fn is_open(&self) -> bool {
        !self.is_close()
    }

    /// Node type without the closing marker
    pub fn node_type(&self) -> &str {
        self.element_type.trim_start_matches('/')
    }

    /// Closing marker matching this element
    pub fn closing(&self) -> Element {
        Element::close(self.node_type())
    }

    /// Copy with type and attributes only, as used when reopening a split node
    pub fn cloned_opening(&self) -> Element {
        Element {
            element_type: self.node_type().to_string(),
            attributes: self.attributes.clone(),
            annotations: None,
        }
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.as_ref()?.get(key)
    }

    pub fn attribute_str(&self, key: &str) -> Option<&str> {
        self.attribute(key)?.as_str()
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.attributes
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
    }

    /// Remove an attribute, dropping the map once it is empty
    pub fn remove_attribute(&mut self, key: &str) -> Option<Value> {
        let attributes = self.attributes.as_mut()?;
        let removed = attributes.remove(key);
        if attributes.is_empty() {
            self.attributes = None;
        }
        removed
    }
}

impl Item {
    pub fn open(node_type: impl Into<String>) -> Self {
        Item::Element(Element::open(node_type))
    }

    pub fn close(node_type: &str) -> Self {
        Item::Element(Element::close(node_type))
    }

    pub fn is_element(&self) -> bool {
        matches!(self, Item::Element(_))
    }

    pub fn is_open_element(&self) -> bool {
        matches!(self, Item::Element(element) if element.is_open())
    }

    pub fn is_close_element(&self) -> bool {
        matches!(self, Item::Element(element) if element.is_close())
    }

    pub fn element(&self) -> Option<&Element> {
        match self {
            Item::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Item::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Raw element type, with the leading `/` for closings
    pub fn element_type(&self) -> Option<&str> {
        self.element().map(|element| element.element_type.as_str())
    }

    pub fn character(&self) -> Option<char> {
        match self {
            Item::Char(ch) | Item::Annotated(ch, _) => Some(*ch),
            Item::Element(_) => None,
        }
    }

    /// Annotations on a character or on an element
    pub fn annotations(&self) -> Option<&AnnotationSet> {
        match self {
            Item::Char(_) => None,
            Item::Annotated(_, set) => Some(set),
            Item::Element(element) => element.annotations.as_ref(),
        }
    }
}

impl From<char> for Item {
    fn from(ch: char) -> Self {
        Item::Char(ch)
    }
}

impl From<Element> for Item {
    fn from(element: Element) -> Self {
        Item::Element(element)
    }
}

/// Plain character items for a string
pub fn chars(text: &str) -> LinearData {
    text.chars().map(Item::Char).collect()
}

/// Annotated character items for a string; plain items when the set is empty
pub fn annotated_chars(text: &str, annotations: &AnnotationSet) -> LinearData {
    text.chars()
        .map(|ch| {
            if annotations.is_empty() {
                Item::Char(ch)
            } else {
                Item::Annotated(ch, annotations.clone())
            }
        })
        .collect()
}

pub fn contains_element_data(data: &[Item]) -> bool {
    data.iter().any(Item::is_element)
}

/// Closing markers for a list of openings, innermost first
pub fn closings_for(openings: &[Item]) -> LinearData {
    openings
        .iter()
        .rev()
        .filter_map(|item| item.element().map(|element| Item::Element(element.closing())))
        .collect()
}

/// Text of the character items in `data`
pub fn text_of(data: &[Item]) -> String {
    data.iter().filter_map(Item::character).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::Annotation;
    use serde_json::json;

    #[test]
    fn test_item_wire_shapes() {
        let bold: AnnotationSet = [Annotation::new("textStyle/bold")].into_iter().collect();
        let data = vec![
            Item::Element(Element::open("heading").with_attribute("level", 1)),
            Item::Char('a'),
            Item::Annotated('b', bold),
            Item::close("heading"),
        ];
        let value = serde_json::to_value(&data).unwrap();
        assert_eq!(
            value,
            json!([
                {"type": "heading", "attributes": {"level": 1}},
                "a",
                ["b", {"{\"type\":\"textStyle/bold\"}": {"type": "textStyle/bold"}}],
                {"type": "/heading"}
            ])
        );
        let parsed: LinearData = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, data);
    }

    #[test]
    fn test_remove_attribute_drops_empty_map() {
        let mut element = Element::open("heading").with_attribute("level", 2);
        assert_eq!(element.remove_attribute("level"), Some(json!(2)));
        assert_eq!(element.attributes, None);
    }

    #[test]
    fn test_closings_for() {
        let openings = vec![Item::open("list"), Item::open("listItem")];
        assert_eq!(
            closings_for(&openings),
            vec![Item::close("listItem"), Item::close("list")]
        );
    }
}
