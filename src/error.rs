use thiserror::Error;

#[derive(Error, Debug)]
pub enum HumidorError {
    #[error("Not in a humidor project. Run 'humidor init' first.")]
    NotInitialized,

    #[error("Already initialized. Remove .humidor/ to reinitialize.")]
    AlreadyInitialized,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Tasting not found: {0}")]
    TastingNotFound(i64),

    #[error("Cigar not found: {0}")]
    CigarNotFound(i64),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse classification used by the transports to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Storage,
}

impl HumidorError {
    pub fn validation(message: impl Into<String>) -> Self {
        HumidorError::Validation(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            HumidorError::Validation(_) => ErrorKind::Validation,
            HumidorError::TastingNotFound(_) | HumidorError::CigarNotFound(_) => {
                ErrorKind::NotFound
            }
            HumidorError::NotInitialized
            | HumidorError::AlreadyInitialized
            | HumidorError::Storage(_)
            | HumidorError::Config(_)
            | HumidorError::Io(_)
            | HumidorError::Json(_) => ErrorKind::Storage,
        }
    }
}

pub type Result<T> = std::result::Result<T, HumidorError>;
