use thiserror::Error;

pub type WikitextResult<T> = Result<T, WikitextError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WikitextError {
    #[error("Invalid data-mw hints on <{tag}>: {reason}")]
    InvalidHints { tag: String, reason: String },
}

impl WikitextError {
    pub fn invalid_hints(tag: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidHints {
            tag: tag.into(),
            reason: reason.to_string(),
        }
    }
}
