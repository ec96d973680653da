//! # Operations
//!
//! The steps a transaction is made of. Each operation reads the document at the processor's
//! cursor and moves it forward:
//!
//! - `retain`: skip `length` items, applying any open annotation brackets to them
//! - `replace`: swap the `remove` items at the cursor for the `insert` items
//! - `attribute`: change one attribute of the element at the cursor
//! - `annotate`: open (`start`) or close (`stop`) an annotation bracket
//!
//! Every operation carries enough data to be run backwards, so a transaction is its own
//! inverse when processed in reverse.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use wikiedit_model::{Annotation, Item};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Operation {
    Retain {
        length: usize,
    },

    Replace {
        remove: Vec<Item>,
        insert: Vec<Item>,
    },

    Attribute {
        key: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        to: Option<Value>,
    },

    Annotate {
        method: AnnotationMethod,
        bias: AnnotationBias,
        annotation: Annotation,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnnotationMethod {
    Set,
    Clear,
}

impl AnnotationMethod {
    pub fn inverse(self) -> Self {
        match self {
            AnnotationMethod::Set => AnnotationMethod::Clear,
            AnnotationMethod::Clear => AnnotationMethod::Set,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnnotationBias {
    Start,
    Stop,
}

impl Operation {
    pub fn retain(length: usize) -> Self {
        Operation::Retain { length }
    }

    pub fn replace(remove: Vec<Item>, insert: Vec<Item>) -> Self {
        Operation::Replace { remove, insert }
    }

    /// Change in document length caused by this operation
    pub fn length_difference(&self) -> isize {
        match self {
            Operation::Replace { remove, insert } => insert.len() as isize - remove.len() as isize,
            _ => 0,
        }
    }

    pub fn is_retain(&self) -> bool {
        matches!(self, Operation::Retain { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_operation_wire_shapes() {
        let ops = vec![
            Operation::retain(3),
            Operation::replace(vec![Item::Char('a')], vec![]),
            Operation::Attribute {
                key: "level".to_string(),
                from: Some(json!(1)),
                to: None,
            },
            Operation::Annotate {
                method: AnnotationMethod::Set,
                bias: AnnotationBias::Start,
                annotation: Annotation::new("textStyle/bold"),
            },
        ];
        assert_eq!(
            serde_json::to_value(&ops).unwrap(),
            json!([
                {"type": "retain", "length": 3},
                {"type": "replace", "remove": ["a"], "insert": []},
                {"type": "attribute", "key": "level", "from": 1},
                {
                    "type": "annotate",
                    "method": "set",
                    "bias": "start",
                    "annotation": {"type": "textStyle/bold"}
                }
            ])
        );
    }

    #[test]
    fn test_length_difference() {
        let op = Operation::replace(vec![Item::Char('a')], vec![Item::Char('b'), Item::Char('c')]);
        assert_eq!(op.length_difference(), 1);
        assert_eq!(Operation::retain(5).length_difference(), 0);
    }
}
