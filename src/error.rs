pub type FramescriptResult<T> = Result<T, FramescriptError>;

#[derive(thiserror::Error, Debug)]
pub enum FramescriptError {
    #[error("duplicate reference id '{0}'")]
    DuplicateId(String),

    #[error("conflicting attributes ('{field}'): self={left}, other={right}")]
    ConflictingAttributes {
        field: &'static str,
        left: String,
        right: String,
    },

    #[error("missing attribute: {0}")]
    MissingAttribute(String),

    #[error("invalid type: {0}")]
    InvalidType(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FramescriptError {
    pub fn duplicate_id(id: impl Into<String>) -> Self {
        Self::DuplicateId(id.into())
    }

    pub fn missing_attribute(msg: impl Into<String>) -> Self {
        Self::MissingAttribute(msg.into())
    }

    pub fn invalid_type(msg: impl Into<String>) -> Self {
        Self::InvalidType(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }
}
