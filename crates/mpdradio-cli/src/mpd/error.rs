//! Errors surfaced by the MPD client engine.

use std::time::Duration;

use mpdradio_core::error::DecodeError;
use thiserror::Error;

/// Failure of a client operation.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Dialing the daemon or reading its greeting failed.
    #[error("failed to connect to {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: Box<ClientError>,
    },

    /// A command was attempted with no live connection.
    #[error("not connected")]
    NotConnected,

    /// The daemon answered with `ACK`.
    #[error("error from daemon: {message}")]
    Daemon { message: String },

    /// The stream ended before the response was complete.
    #[error("not enough data read from socket")]
    IncompleteRead,

    /// The daemon announced a binary chunk above the size limit.
    #[error("server requested binary size {size} (max {max})")]
    OversizedBinary { size: usize, max: usize },

    /// Any other malformed response.
    #[error("protocol error: {0}")]
    Protocol(DecodeError),

    /// The command would not fit on one protocol line.
    #[error("invalid command {0:?}: commands must be a single line")]
    InvalidCommand(String),

    #[error("I/O timed out after {0:?}")]
    Timeout(Duration),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Whether the connection must be dropped after this error.
    ///
    /// Only an `ACK` (and errors raised before any byte was written) leave the
    /// stream positioned at the start of the next response.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            ClientError::Daemon { .. } | ClientError::NotConnected | ClientError::InvalidCommand(_)
        )
    }

    pub(crate) fn connect(address: &str, source: ClientError) -> Self {
        ClientError::Connect {
            address: address.to_string(),
            source: Box::new(source),
        }
    }
}

impl From<DecodeError> for ClientError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::Daemon { message } => ClientError::Daemon { message },
            DecodeError::IncompleteRead => ClientError::IncompleteRead,
            DecodeError::OversizedBinary { size, max } => {
                ClientError::OversizedBinary { size, max }
            }
            other => ClientError::Protocol(other),
        }
    }
}
