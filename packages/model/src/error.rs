use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Unknown node type: {0}")]
    UnknownType(String),

    #[error("Unknown annotation type: {0}")]
    UnknownAnnotationType(String),

    #[error("Missing conversion data in implementation of {0}")]
    MissingConverters(String),

    #[error("Unbalanced input passed to document (at index {index})")]
    UnbalancedInput { index: usize },

    #[error("Offset {offset} is out of bounds (length {length})")]
    OutOfBounds { offset: usize, length: usize },

    #[error("Inserted data is trying to close the root node (at index {index})")]
    CannotCloseRoot { index: usize },

    #[error("Cannot insert {node_type} because it cannot have a parent (at index {index})")]
    NoAllowedParent { node_type: String, index: usize },

    #[error("Cannot insert {node_type} even after closing all containing nodes (at index {index})")]
    NoValidContainer { node_type: String, index: usize },

    #[error("Node {0} is not part of the document tree")]
    DetachedNode(usize),
}

impl ModelError {
    pub fn unknown_type(node_type: impl Into<String>) -> Self {
        Self::UnknownType(node_type.into())
    }

    pub fn unknown_annotation_type(annotation_type: impl Into<String>) -> Self {
        Self::UnknownAnnotationType(annotation_type.into())
    }

    pub fn out_of_bounds(offset: usize, length: usize) -> Self {
        Self::OutOfBounds { offset, length }
    }

    pub fn no_allowed_parent(node_type: impl Into<String>, index: usize) -> Self {
        Self::NoAllowedParent {
            node_type: node_type.into(),
            index,
        }
    }

    pub fn no_valid_container(node_type: impl Into<String>, index: usize) -> Self {
        Self::NoValidContainer {
            node_type: node_type.into(),
            index,
        }
    }
}
