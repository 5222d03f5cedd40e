//! `tokio_util` codec framing commands and responses on the socket.

use bytes::{BufMut, BytesMut};
use mpdradio_core::codec::ResponseDecoder;
use mpdradio_core::error::DecodeError;
use mpdradio_core::protocol::Response;
use tokio_util::codec::{Decoder, Encoder};

use super::error::ClientError;

/// One terminal-delimited reply.
///
/// `ACK` is a frame rather than a decode error so the framed stream keeps
/// going afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Frame {
    Ok(Response),
    Ack { message: String },
}

#[derive(Debug, Default)]
pub(crate) struct MpdCodec {
    decoder: ResponseDecoder,
}

impl MpdCodec {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

impl Decoder for MpdCodec {
    type Item = Frame;
    type Error = ClientError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decoder.feed(src) {
            Ok(response) => Ok(response.map(Frame::Ok)),
            Err(DecodeError::Daemon { message }) => Ok(Some(Frame::Ack { message })),
            Err(e) => Err(e.into()),
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None if self.decoder.is_empty() => Ok(None),
            None => Err(ClientError::IncompleteRead),
        }
    }
}

impl Encoder<&str> for MpdCodec {
    type Error = ClientError;

    fn encode(&mut self, command: &str, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if command.contains('\n') {
            return Err(ClientError::InvalidCommand(command.to_string()));
        }
        dst.reserve(command.len() + 1);
        dst.put_slice(command.as_bytes());
        dst.put_u8(b'\n');
        Ok(())
    }
}
