use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Content source error: {0}")]
    Source(String),

    #[error("Persona not found: {id}")]
    PersonaNotFound { id: String },

    #[error("Post not found: {id}")]
    PostNotFound { id: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "huggingface")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl FeedError {
    pub fn persona_not_found(id: impl Into<String>) -> Self {
        FeedError::PersonaNotFound { id: id.into() }
    }

    pub fn post_not_found(id: impl Into<String>) -> Self {
        FeedError::PostNotFound { id: id.into() }
    }

    /// True for unknown-id errors raised by lookups.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            FeedError::PersonaNotFound { .. } | FeedError::PostNotFound { .. }
        )
    }
}

pub type FeedResult<T> = Result<T, FeedError>;
