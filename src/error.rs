use thiserror::Error;

pub type Result<T, E = AdminError> = std::result::Result<T, E>;

/// Failure taxonomy of the console core.
///
/// Remote-facing operations either fully succeed and update retained state,
/// or fail with one of these and leave prior state untouched.
#[derive(Debug, Error)]
pub enum AdminError {
    /// The remote reports the resource does not exist. Callers that can
    /// default (settings load) recover from this locally.
    #[error("remote resource not found")]
    NotFound,

    /// Version token mismatch on write. Surfaced to the operator, never
    /// retried automatically.
    #[error("settings changed remotely: {0}")]
    Conflict(String),

    /// Bad or expired credential. The stored session is cleared and setup
    /// restarts.
    #[error("authorization failed: {0}")]
    Auth(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("recipient already listed: {0}")]
    Duplicate(String),

    #[error("recipient index out of range: {0}")]
    OutOfRange(usize),

    /// Operation requires a session, or the gate to be passed first.
    #[error("{0}")]
    Locked(String),

    #[error("remote request failed: {0}")]
    Transport(String),

    #[error("session store i/o: {0}")]
    Io(#[from] std::io::Error),

    #[error("encode/decode settings: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for AdminError {
    fn from(err: reqwest::Error) -> Self {
        AdminError::Transport(err.to_string())
    }
}
