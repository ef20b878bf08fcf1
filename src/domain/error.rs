use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("malformed identifier `{input}`")]
    MalformedId { input: String },
    #[error("domain validation failed: {message}")]
    Validation { message: String },
}

impl DomainError {
    pub fn malformed_id(input: impl Into<String>) -> Self {
        Self::MalformedId {
            input: input.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}
