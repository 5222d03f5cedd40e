//! Decode errors for the MPD response stream.

use thiserror::Error;

/// Reasons a response could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The daemon rejected the command with an `ACK` line.
    #[error("error from daemon: {message}")]
    Daemon { message: String },

    /// The input ended before an `OK` or `ACK` line was seen.
    #[error("not enough data read from socket")]
    IncompleteRead,

    /// A `binary: <n>` announcement exceeded the size limit.
    #[error("server requested binary size {size} (max {max})")]
    OversizedBinary { size: usize, max: usize },

    /// A `binary:` announcement whose length is not a number.
    #[error("invalid binary length '{0}'")]
    InvalidBinaryLength(String),

    /// A line grew past the size limit without a terminator.
    #[error("response line exceeded {max} bytes")]
    LineTooLong { max: usize },
}

impl DecodeError {
    /// Whether the byte stream can no longer be trusted after this error.
    ///
    /// An `ACK` ends the response cleanly, every other failure leaves
    /// unread bytes (or a dead peer) behind.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, DecodeError::Daemon { .. })
    }
}
