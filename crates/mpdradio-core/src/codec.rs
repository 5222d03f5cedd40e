//! Response codec
//!
//! Decodes the MPD daemon's reply stream into a [`Response`].
//!
//! ## Wire Format
//!
//! ```text
//! key: value\n          field (last write wins)
//! anything else\n       unparsed line
//! binary: <n>\n         followed by exactly n raw bytes, then \n
//! OK[ status]\n         terminal, success
//! ACK message\n         terminal, daemon error
//! ```
//!
//! The decoder is incremental: it consumes bytes from the front of a
//! [`BytesMut`] in whatever chunks the socket delivers, so a response may
//! span any number of reads. Bytes after a terminal line are left in the
//! buffer for the next response.

use std::mem;

use bytes::{Buf, BytesMut};

use crate::error::DecodeError;
use crate::protocol::Response;

/// Maximum size of a single binary chunk (1 MiB).
pub const MAX_BINARY_SIZE: usize = 1024 * 1024;

/// Maximum length of a single response line (1 MiB).
pub const MAX_LINE_LENGTH: usize = 1024 * 1024;

/// Incremental decoder for one response at a time.
///
/// After a response completes or an error is returned the decoder is reset
/// and can be reused for the next response.
#[derive(Debug, Default)]
pub struct ResponseDecoder {
    response: Response,
    /// Bytes of the current line seen so far.
    line: Vec<u8>,
    /// Raw bytes still owed to the current binary chunk.
    binary_remaining: usize,
    /// A binary chunk just ended; its trailing newline may follow.
    after_binary: bool,
}

impl ResponseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if no bytes of a response have been seen yet.
    pub fn is_empty(&self) -> bool {
        self.line.is_empty()
            && self.binary_remaining == 0
            && !self.after_binary
            && self.response == Response::default()
    }

    /// Consume bytes from the front of `src`.
    ///
    /// Returns the response once its terminal `OK` line has been consumed,
    /// or `None` when `src` ran dry first. Partial lines are buffered inside
    /// the decoder, so `src` is always drained up to the terminal line (or
    /// the `ACK` line on error).
    pub fn feed(&mut self, src: &mut BytesMut) -> Result<Option<Response>, DecodeError> {
        let result = self.feed_inner(src);
        if result.is_err() {
            self.reset();
        }
        result
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    fn feed_inner(&mut self, src: &mut BytesMut) -> Result<Option<Response>, DecodeError> {
        while !src.is_empty() {
            if self.binary_remaining > 0 {
                let take = self.binary_remaining.min(src.len());
                self.response.binary.extend_from_slice(&src[..take]);
                src.advance(take);
                self.binary_remaining -= take;
                if self.binary_remaining == 0 {
                    self.after_binary = true;
                }
                continue;
            }

            if self.after_binary {
                self.after_binary = false;
                if src[0] == b'\n' {
                    src.advance(1);
                    continue;
                }
            }

            match src.iter().position(|&b| b == b'\n') {
                Some(newline) => {
                    let line = src.split_to(newline + 1);
                    self.extend_line(&line[..newline])?;

                    let raw = mem::take(&mut self.line);
                    let line = String::from_utf8_lossy(&raw).into_owned();
                    if self.process_line(line)? {
                        let response = mem::take(&mut self.response);
                        self.reset();
                        return Ok(Some(response));
                    }
                }
                None => {
                    self.extend_line(&src[..])?;
                    src.clear();
                }
            }
        }

        Ok(None)
    }

    fn extend_line(&mut self, bytes: &[u8]) -> Result<(), DecodeError> {
        if self.line.len() + bytes.len() > MAX_LINE_LENGTH {
            return Err(DecodeError::LineTooLong {
                max: MAX_LINE_LENGTH,
            });
        }
        self.line.extend_from_slice(bytes);
        Ok(())
    }

    /// Handle one complete line. Returns true when the response is finished.
    fn process_line(&mut self, line: String) -> Result<bool, DecodeError> {
        if let Some(rest) = line.strip_prefix("OK") {
            self.response.status = rest.trim().to_string();
            return Ok(true);
        }

        if let Some(rest) = line.strip_prefix("ACK") {
            return Err(DecodeError::Daemon {
                message: rest.trim().to_string(),
            });
        }

        let Some((key, value)) = line.split_once(": ") else {
            self.response.unparsed.push(line);
            return Ok(false);
        };

        if key.eq_ignore_ascii_case("binary") {
            let size: usize = value
                .trim()
                .parse()
                .map_err(|_| DecodeError::InvalidBinaryLength(value.to_string()))?;
            if size > MAX_BINARY_SIZE {
                return Err(DecodeError::OversizedBinary {
                    size,
                    max: MAX_BINARY_SIZE,
                });
            }
            self.binary_remaining = size;
            self.after_binary = size == 0;
        }

        self.response
            .fields
            .insert(key.to_string(), value.to_string());
        Ok(false)
    }
}

/// Decode one response from a complete buffer.
///
/// Fails with [`DecodeError::IncompleteRead`] if the buffer ends before a
/// terminal line.
pub fn decode(bytes: &[u8]) -> Result<Response, DecodeError> {
    let mut src = BytesMut::from(bytes);
    ResponseDecoder::new()
        .feed(&mut src)?
        .ok_or(DecodeError::IncompleteRead)
}
