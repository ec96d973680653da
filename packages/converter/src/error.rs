use thiserror::Error;
use wikiedit_dom::HtmlError;
use wikiedit_model::ModelError;

pub type ConverterResult<T> = Result<T, ConverterError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConverterError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("Alien markup could not be parsed: {0}")]
    Html(#[from] HtmlError),

    #[error("No DOM element for data element of type {0}")]
    UnconvertibleElement(String),

    #[error("No DOM element for annotation of type {0}")]
    UnconvertibleAnnotation(String),

    #[error("Alien node of type {0} has no html attribute")]
    MissingAlienHtml(String),
}

impl ConverterError {
    pub fn unconvertible_element(node_type: impl Into<String>) -> Self {
        Self::UnconvertibleElement(node_type.into())
    }

    pub fn unconvertible_annotation(annotation_type: impl Into<String>) -> Self {
        Self::UnconvertibleAnnotation(annotation_type.into())
    }
}
