use thiserror::Error;

/// Errors surfaced by parameter validation and generation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: String, reason: String },
    #[error("unknown parameter `{0}`")]
    UnknownParameter(String),
}

impl FieldError {
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
