//! Fee engine errors

use thiserror::Error;

/// Errors raised by the fee engine.
///
/// Both kinds are synchronous and non-retryable: the engine performs no I/O,
/// so a call either yields one amount or fails atomically.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeeError {
    #[error("ticket {ticket} is still active and cannot be billed")]
    ActiveSession { ticket: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result type for fee computations
pub type FeeResult<T> = Result<T, FeeError>;

impl FeeError {
    /// Amount that does not fit in the fee type
    pub(crate) fn overflow() -> Self {
        FeeError::InvalidArgument("fee exceeds the representable amount".into())
    }
}
