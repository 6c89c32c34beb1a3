use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unknown clinical domain: {0}")]
    UnknownDomain(String),
    #[error("unknown partition: {0} (expected train, validation or test)")]
    UnknownPartition(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
