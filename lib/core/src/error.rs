use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// The item/trait relation handed to `Dataset::build` is inconsistent.
    #[error("Invalid dataset: {0}")]
    Validation(String),

    #[error("Unknown trait in answer: {0}")]
    InvalidAnswer(String),

    #[error("Trait already answered: {0}")]
    AlreadyAnswered(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
