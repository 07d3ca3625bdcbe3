use thiserror::Error;

/// Failure taxonomy shared by the store, the estimator and the service layer.
#[derive(Debug, Error)]
pub enum Error {
    /// Bad or missing required input. Raised before anything is written.
    #[error("{0}")]
    Validation(String),

    #[error("Invalid date '{0}'. Use YYYY-MM-DD")]
    InvalidDateFormat(String),

    /// The external estimator failed, timed out, or answered with garbage.
    #[error("{0}")]
    Estimation(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn estimation(msg: impl Into<String>) -> Self {
        Self::Estimation(msg.into())
    }
}
