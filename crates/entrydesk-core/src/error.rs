use thiserror::Error;

pub type Result<T> = std::result::Result<T, DeskError>;

#[derive(Debug, Error)]
pub enum DeskError {
    #[error("Unknown visibility: {0} (expected \"public\" or \"private\")")]
    UnknownVisibility(String),

    #[error("Invalid entry path: {0:?}")]
    InvalidPath(String),
}
