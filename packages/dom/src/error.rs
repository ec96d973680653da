use thiserror::Error;

pub type HtmlResult<T> = Result<T, HtmlError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HtmlError {
    #[error("Unterminated tag starting at offset {offset}")]
    UnterminatedTag { offset: usize },

    #[error("Unterminated comment starting at offset {offset}")]
    UnterminatedComment { offset: usize },
}
