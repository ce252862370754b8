use std::fmt::{self, Display};

/// Errors produced by model constructors and identifier parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// The value is not a 24 character hexadecimal store identity.
    InvalidObjectId(String),
    /// A business identifier was empty after trimming.
    EmptyKey(&'static str),
}

impl Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::InvalidObjectId(raw) => {
                write!(f, "invalid object id: {raw:?}")
            }
            ModelError::EmptyKey(kind) => {
                write!(f, "{kind} cannot be empty")
            }
        }
    }
}

impl std::error::Error for ModelError {}

pub type Result<T> = std::result::Result<T, ModelError>;
