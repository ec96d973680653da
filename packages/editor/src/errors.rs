//! Error types for the editor

use thiserror::Error;
use wikiedit_model::ModelError;

pub type EditorResult<T> = Result<T, EditorError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditorError {
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Cannot set attributes on non-element data (at offset {offset})")]
    NotAnElement { offset: usize },

    #[error("Cannot set attributes on a closing element (at offset {offset})")]
    ClosingElement { offset: usize },

    #[error("Element does not match: expected {expected} but found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("Out of bounds: {0}")]
    OutOfBounds(String),

    #[error("Unbalanced set of replace operations found")]
    UnbalancedReplace,

    #[error("Invalid annotation state: {0}")]
    InvalidAnnotationState(String),

    #[error("Cannot annotate a branch element (at offset {offset})")]
    BranchAnnotation { offset: usize },
}

impl EditorError {
    pub fn type_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn out_of_bounds(message: impl Into<String>) -> Self {
        Self::OutOfBounds(message.into())
    }

    pub fn invalid_annotation_state(message: impl Into<String>) -> Self {
        Self::InvalidAnnotationState(message.into())
    }
}
