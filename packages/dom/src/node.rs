use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::html;

/// Node of the external document tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DomNode {
    /// Element with a lowercase tag name
    Element {
        tag: String,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        attributes: BTreeMap<String, String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        children: Vec<DomNode>,
    },

    /// Text node
    Text { content: String },

    /// Comment node
    Comment { content: String },
}

impl DomNode {
    pub fn element(tag: impl Into<String>) -> Self {
        DomNode::Element {
            tag: tag.into().to_ascii_lowercase(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        DomNode::Text {
            content: content.into(),
        }
    }

    pub fn comment(content: impl Into<String>) -> Self {
        DomNode::Comment {
            content: content.into(),
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    pub fn with_child(mut self, child: DomNode) -> Self {
        self.push_child(child);
        self
    }

    pub fn with_children(mut self, new_children: Vec<DomNode>) -> Self {
        if let DomNode::Element {
            ref mut children, ..
        } = self
        {
            children.extend(new_children);
        }
        self
    }

    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        if let DomNode::Element {
            ref mut attributes, ..
        } = self
        {
            attributes.insert(key.into(), value.into());
        }
    }

    /// Append a child, merging adjacent text nodes. No-op on text and comments.
    pub fn push_child(&mut self, child: DomNode) {
        if let DomNode::Element {
            ref mut children, ..
        } = self
        {
            push_merged(children, child);
        }
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            DomNode::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        match self {
            DomNode::Element { attributes, .. } => attributes.get(name).map(String::as_str),
            _ => None,
        }
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    pub fn attributes(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            DomNode::Element { attributes, .. } => Some(attributes),
            _ => None,
        }
    }

    pub fn children(&self) -> &[DomNode] {
        match self {
            DomNode::Element { children, .. } => children,
            _ => &[],
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<DomNode>> {
        match self {
            DomNode::Element { children, .. } => Some(children),
            _ => None,
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self, DomNode::Element { .. })
    }

    pub fn is_text(&self) -> bool {
        matches!(self, DomNode::Text { .. })
    }

    /// Concatenated text of this node and all descendants
    pub fn text_content(&self) -> String {
        let mut output = String::new();
        self.collect_text(&mut output);
        output
    }

    fn collect_text(&self, output: &mut String) {
        match self {
            DomNode::Text { content } => output.push_str(content),
            DomNode::Element { children, .. } => {
                for child in children {
                    child.collect_text(output);
                }
            }
            DomNode::Comment { .. } => {}
        }
    }

    pub fn outer_html(&self) -> String {
        html::to_html(std::slice::from_ref(self))
    }

    pub fn inner_html(&self) -> String {
        html::to_html(self.children())
    }
}

/// Push a node onto a child list, joining it with a preceding text node.
pub(crate) fn push_merged(children: &mut Vec<DomNode>, child: DomNode) {
    if let DomNode::Text { content } = &child {
        if let Some(DomNode::Text { content: previous }) = children.last_mut() {
            previous.push_str(content);
            return;
        }
    }
    children.push(child);
}
