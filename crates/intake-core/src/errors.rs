use crate::store::StorageError;

/// Core error type for the intake bot.
///
/// Adapter crates should map their specific errors into this type so the form
/// core can decide between a user-facing message and a silent log entry.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
