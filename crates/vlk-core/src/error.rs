use thiserror::Error;

pub type VlkResult<T> = Result<T, VlkError>;

#[derive(Debug, Error)]
pub enum VlkError {
    #[error("config error: {0}")]
    Config(String),

    #[error("secret store error: {0}")]
    Store(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
