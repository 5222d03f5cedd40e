//! A single TCP connection to the daemon.

use std::io;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use mpdradio_core::protocol::Response;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::codec::Framed;
use tracing::debug;

use super::codec::{Frame, MpdCodec};
use super::error::ClientError;

/// An open, greeted connection.
///
/// Only ever touched while the owning client's command lock is held.
#[derive(Debug)]
pub(crate) struct Connection {
    framed: Framed<TcpStream, MpdCodec>,
    io_timeout: Duration,
}

impl Connection {
    /// Dial `address` and consume the daemon's greeting.
    ///
    /// Returns the connection and the decoded greeting. Every failure is
    /// wrapped in [`ClientError::Connect`].
    pub(crate) async fn open(
        address: &str,
        connect_timeout: Duration,
        io_timeout: Duration,
    ) -> Result<(Self, Response), ClientError> {
        let stream = timeout(connect_timeout, TcpStream::connect(address))
            .await
            .map_err(|_| ClientError::connect(address, ClientError::Timeout(connect_timeout)))?
            .map_err(|e| ClientError::connect(address, ClientError::Io(e)))?;

        // Commands are tiny and strictly request/response.
        stream
            .set_nodelay(true)
            .map_err(|e| ClientError::connect(address, ClientError::Io(e)))?;

        let mut connection = Self {
            framed: Framed::new(stream, MpdCodec::new()),
            io_timeout,
        };

        let greeting = connection
            .read_response()
            .await
            .map_err(|e| ClientError::connect(address, e))?;

        debug!("Connected to {} ({})", address, greeting.status);
        Ok((connection, greeting))
    }

    /// Send one command and read its response.
    pub(crate) async fn round_trip(&mut self, command: &str) -> Result<Response, ClientError> {
        self.write_command(command).await?;
        self.read_response().await
    }

    async fn write_command(&mut self, command: &str) -> Result<(), ClientError> {
        let io_timeout = self.io_timeout;
        timeout(io_timeout, self.framed.send(command))
            .await
            .map_err(|_| ClientError::Timeout(io_timeout))?
    }

    /// Wait for the next terminal-delimited reply.
    ///
    /// A response may span any number of socket reads.
    pub(crate) async fn read_response(&mut self) -> Result<Response, ClientError> {
        let io_timeout = self.io_timeout;
        let frame = timeout(io_timeout, self.framed.next())
            .await
            .map_err(|_| ClientError::Timeout(io_timeout))?;

        match frame {
            Some(Ok(Frame::Ok(response))) => Ok(response),
            Some(Ok(Frame::Ack { message })) => Err(ClientError::Daemon { message }),
            Some(Err(e)) => Err(e),
            None => Err(ClientError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "daemon closed the connection",
            ))),
        }
    }

    /// Flush and shut down the write half; errors are irrelevant at this point.
    pub(crate) async fn shutdown(mut self) {
        if let Err(e) = self.framed.close().await {
            debug!("Socket shutdown failed: {}", e);
        }
    }
}
