//! Error types.
//!
//! - `TimingError` is what the library returns. Every variant is a deterministic
//!   input problem, so nothing here is ever retried.
//! - `AppError` is what the `xt` binary reports: a message plus a process exit code.

use thiserror::Error;

/// Library error for all timing operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimingError {
    /// An optional attribute (channel, pulse width, orbit parameters) was needed
    /// by the requested operation but was never supplied.
    #[error("missing attribute: {attribute} was not loaded for this event stream")]
    MissingAttribute { attribute: &'static str },

    /// Out-of-domain argument (non-positive period, empty input, malformed bin spec, ...).
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Two sequences that must run in parallel have different lengths.
    #[error("length mismatch: {what} has {found} entries, expected {expected}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
}

impl TimingError {
    pub fn invalid(message: impl Into<String>) -> Self {
        TimingError::InvalidParameter(message.into())
    }
}

/// Library result alias.
pub type Result<T> = std::result::Result<T, TimingError>;

/// Error surfaced by the command-line front-end.
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<TimingError> for AppError {
    fn from(err: TimingError) -> Self {
        let exit_code = match err {
            TimingError::InvalidParameter(_) => 2,
            TimingError::MissingAttribute { .. } => 3,
            TimingError::LengthMismatch { .. } => 4,
        };
        AppError::new(exit_code, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
