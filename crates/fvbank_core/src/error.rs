//! Error types for fvbank core.

use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in fvbank core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] fvbank_storage::StorageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A record's declared size disagrees with the bytes actually available.
    ///
    /// Terminal for the current scan; a malformed record is never skipped
    /// or clamped.
    #[error("corrupt template record at offset {offset}: {message}")]
    Corruption {
        /// Byte offset of the record that failed to decode.
        offset: u64,
        /// Description of the mismatch.
        message: String,
    },

    /// A caller-supplied value violates a construction precondition.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of the violated precondition.
        message: String,
    },
}

impl CoreError {
    /// Creates a corruption error for the record at `offset`.
    pub fn corruption(offset: u64, message: impl Into<String>) -> Self {
        Self::Corruption {
            offset,
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}
