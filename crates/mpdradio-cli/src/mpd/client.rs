//! Client for one MPD daemon.
//!
//! All socket I/O for a client happens while holding its command lock, a
//! `tokio::sync::Mutex` around [`ConnectionState`]. That includes the
//! keepalive pings, so request/response pairs never interleave on the wire.

use std::sync::{Arc, Mutex as StdMutex, PoisonError, Weak};
use std::time::{Duration, Instant};

use mpdradio_core::protocol::Response;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::connection::Connection;
use super::error::ClientError;
use super::keepalive::Keepalive;

/// Timing knobs for a client.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Upper bound for dialing the daemon.
    pub connect_timeout: Duration,
    /// Upper bound for each socket read or write.
    pub io_timeout: Duration,
    /// Pause between keepalive pings.
    pub keepalive_interval: Duration,
    /// Close the connection after this long without a caller command.
    pub idle_timeout: Duration,
    /// Wait before the single reconnect attempt of `execute_or_reconnect`.
    pub reconnect_delay: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            io_timeout: Duration::from_secs(30),
            keepalive_interval: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(60),
            reconnect_delay: Duration::from_secs(1),
        }
    }
}

/// Connection state guarded by the command lock.
#[derive(Debug)]
enum ConnectionState {
    Connected(Connection),
    Disconnected,
}

pub(crate) struct ClientInner {
    address: String,
    settings: ClientSettings,
    /// The command lock.
    state: Mutex<ConnectionState>,
    /// Serializes whole `connect()` calls, including keepalive replacement.
    connect_lock: Mutex<()>,
    last_used: StdMutex<Instant>,
    server_version: StdMutex<Option<String>>,
    keepalive: StdMutex<Option<Keepalive>>,
}

impl Drop for ClientInner {
    fn drop(&mut self) {
        let keepalive = self
            .keepalive
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(keepalive) = keepalive {
            keepalive.cancel();
        }
    }
}

/// Handle to one daemon connection.
///
/// Cheap to clone; clones share the connection and its lock.
#[derive(Clone)]
pub struct MpdClient {
    inner: Arc<ClientInner>,
}

impl std::fmt::Debug for MpdClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MpdClient")
            .field("address", &self.inner.address)
            .finish_non_exhaustive()
    }
}

impl MpdClient {
    /// Create a disconnected client.
    pub fn new(address: impl Into<String>, settings: ClientSettings) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                address: address.into(),
                settings,
                state: Mutex::new(ConnectionState::Disconnected),
                connect_lock: Mutex::new(()),
                last_used: StdMutex::new(Instant::now()),
                server_version: StdMutex::new(None),
                keepalive: StdMutex::new(None),
            }),
        }
    }

    /// Create a client and connect it right away.
    pub async fn connect_to(
        address: impl Into<String>,
        settings: ClientSettings,
    ) -> Result<Self, ClientError> {
        let client = Self::new(address, settings);
        client.connect().await?;
        Ok(client)
    }

    pub fn address(&self) -> &str {
        &self.inner.address
    }

    /// Status text of the last greeting, e.g. `MPD 0.23.5`.
    pub fn server_version(&self) -> Option<String> {
        self.inner
            .server_version
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub async fn is_connected(&self) -> bool {
        matches!(*self.inner.state.lock().await, ConnectionState::Connected(_))
    }

    /// Time since the last successful caller command (or connect).
    pub fn idle_for(&self) -> Duration {
        self.inner
            .last_used
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .elapsed()
    }

    fn touch(&self) {
        *self
            .inner
            .last_used
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    /// Dial the daemon, read its greeting and start a fresh keepalive task.
    ///
    /// Any previous connection and keepalive task are replaced.
    pub async fn connect(&self) -> Result<(), ClientError> {
        let _connecting = self.inner.connect_lock.lock().await;

        // Stop the old task first: it may be waiting on the command lock.
        if let Some(previous) = self.take_keepalive() {
            previous.stop().await;
        }

        let settings = &self.inner.settings;
        let (connection, greeting) = Connection::open(
            &self.inner.address,
            settings.connect_timeout,
            settings.io_timeout,
        )
        .await?;

        {
            let mut state = self.inner.state.lock().await;
            if let ConnectionState::Connected(old) =
                std::mem::replace(&mut *state, ConnectionState::Connected(connection))
            {
                old.shutdown().await;
            }
        }

        *self
            .inner
            .server_version
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(greeting.status.clone());
        self.touch();

        let keepalive = Keepalive::spawn(
            Arc::downgrade(&self.inner),
            settings.keepalive_interval,
            settings.idle_timeout,
        );
        *self
            .inner
            .keepalive
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(keepalive);

        info!("Connected to {} ({})", self.inner.address, greeting.status);
        Ok(())
    }

    /// Release the socket. Safe to call when already closed.
    pub async fn close(&self) {
        let mut state = self.inner.state.lock().await;
        if let ConnectionState::Connected(connection) =
            std::mem::replace(&mut *state, ConnectionState::Disconnected)
        {
            connection.shutdown().await;
            debug!("Closed connection to {}", self.inner.address);
        }
    }

    /// Cancel the keepalive task, wait for it, and close the connection.
    ///
    /// Waits for an in-flight `connect()` so it cannot leave a fresh
    /// connection and keepalive behind.
    pub async fn shutdown(&self) {
        let _connecting = self.inner.connect_lock.lock().await;
        if let Some(keepalive) = self.take_keepalive() {
            keepalive.stop().await;
        }
        self.close().await;
    }

    fn take_keepalive(&self) -> Option<Keepalive> {
        self.inner
            .keepalive
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Run one command on the current connection.
    ///
    /// Fails with [`ClientError::NotConnected`] when there is no connection.
    /// Errors that leave the stream out of step close the connection.
    pub async fn execute(&self, command: &str) -> Result<Response, ClientError> {
        self.run_command(command, true).await
    }

    /// Send `ping` without counting it as use.
    pub(crate) async fn ping(&self) -> Result<Response, ClientError> {
        self.run_command("ping", false).await
    }

    async fn run_command(&self, command: &str, touch: bool) -> Result<Response, ClientError> {
        if command.contains('\n') {
            return Err(ClientError::InvalidCommand(command.to_string()));
        }

        let mut state = self.inner.state.lock().await;
        let ConnectionState::Connected(connection) = &mut *state else {
            return Err(ClientError::NotConnected);
        };

        debug!("Running command: {}", command);
        match connection.round_trip(command).await {
            Ok(mut response) => {
                response.command = command.to_string();
                if touch {
                    self.touch();
                }
                log_response(&response);
                Ok(response)
            }
            Err(e) => {
                if e.is_fatal() {
                    warn!(
                        "Closing connection to {} after error: {}",
                        self.inner.address, e
                    );
                    if let ConnectionState::Connected(connection) =
                        std::mem::replace(&mut *state, ConnectionState::Disconnected)
                    {
                        connection.shutdown().await;
                    }
                }
                Err(e)
            }
        }
    }

    /// Run a command, reconnecting once if there is no connection.
    ///
    /// Only [`ClientError::NotConnected`] triggers the reconnect; the retry
    /// result is returned as is, so there is at most one reconnect per call.
    pub async fn execute_or_reconnect(&self, command: &str) -> Result<Response, ClientError> {
        match self.execute(command).await {
            Err(ClientError::NotConnected) => {
                info!(
                    "Not connected to {}, reconnecting in {:?}",
                    self.inner.address, self.inner.settings.reconnect_delay
                );
                tokio::time::sleep(self.inner.settings.reconnect_delay).await;
                self.connect().await?;
                self.execute(command).await
            }
            other => other,
        }
    }

    pub(crate) fn upgrade(inner: &Weak<ClientInner>) -> Option<Self> {
        inner.upgrade().map(|inner| Self { inner })
    }

    #[cfg(test)]
    pub(crate) fn downgrade(&self) -> Weak<ClientInner> {
        Arc::downgrade(&self.inner)
    }
}

/// Structured diagnostics for a decoded response.
fn log_response(response: &Response) {
    debug!(
        command = %response.command,
        status = %response.status,
        fields = response.fields.len(),
        "Response"
    );
    for (key, value) in &response.fields {
        debug!("  {}: {}", key, value);
    }
    for line in &response.unparsed {
        debug!("  unparsed: {}", line);
    }
    if !response.binary.is_empty() {
        debug!("  binary: {} bytes", response.binary.len());
    }
}
