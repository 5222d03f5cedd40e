//! The set of player clients owned by the front-end.
//!
//! Built at startup from the saved player list and torn down at shutdown.

use std::net::IpAddr;

use mpdradio_core::protocol::{join_host_port, DEFAULT_PORT};
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::mpd::{ClientError, ClientSettings, MpdClient};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("player '{0}' is already connected")]
    Duplicate(String),
    #[error("player '{0}' not found")]
    NotFound(String),
    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Turn user input into a dialable `host:port`, adding the default port
/// when none is given.
pub fn player_address(input: &str) -> String {
    if input.parse::<IpAddr>().is_ok() || !input.contains(':') {
        return join_host_port(input, DEFAULT_PORT);
    }
    input.to_string()
}

/// Live clients, in the order they were added.
pub struct PlayerRegistry {
    settings: ClientSettings,
    clients: Vec<MpdClient>,
}

impl PlayerRegistry {
    pub fn new(settings: ClientSettings) -> Self {
        Self {
            settings,
            clients: Vec::new(),
        }
    }

    /// Connect to `host` (port 6600 unless given) and keep the client.
    pub async fn add(&mut self, host: &str, port: Option<u16>) -> Result<MpdClient, RegistryError> {
        let address = join_host_port(host, port.unwrap_or(DEFAULT_PORT));
        self.add_address(address).await
    }

    /// Connect to a `host:port` address and keep the client.
    pub async fn add_address(
        &mut self,
        address: impl Into<String>,
    ) -> Result<MpdClient, RegistryError> {
        let address = address.into();
        if self.find(&address).is_some() {
            return Err(RegistryError::Duplicate(address));
        }

        let client = MpdClient::connect_to(address, self.settings.clone()).await?;
        self.clients.push(client.clone());
        Ok(client)
    }

    /// Create clients for saved addresses, connecting them concurrently.
    ///
    /// A player that cannot be reached is still registered, disconnected,
    /// so a later `execute_or_reconnect` can pick it up.
    pub async fn connect_saved(&mut self, addresses: &[String]) {
        let mut connecting = JoinSet::new();

        for address in addresses {
            if self.find(address).is_some() {
                continue;
            }
            let client = MpdClient::new(address.clone(), self.settings.clone());
            self.clients.push(client.clone());
            connecting.spawn(async move {
                if let Err(e) = client.connect().await {
                    warn!("Failed to connect to saved player: {}", e);
                }
            });
        }

        while let Some(result) = connecting.join_next().await {
            if let Err(e) = result {
                warn!("Connect task failed: {}", e);
            }
        }
    }

    pub fn find(&self, address: &str) -> Option<&MpdClient> {
        self.clients.iter().find(|c| c.address() == address)
    }

    /// The first registered client, if any.
    pub fn first(&self) -> Option<&MpdClient> {
        self.clients.first()
    }

    pub fn addresses(&self) -> Vec<String> {
        self.clients.iter().map(|c| c.address().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Drop a client, stopping its keepalive and closing its socket.
    #[allow(dead_code)]
    pub async fn remove(&mut self, address: &str) -> Result<(), RegistryError> {
        let index = self
            .clients
            .iter()
            .position(|c| c.address() == address)
            .ok_or_else(|| RegistryError::NotFound(address.to_string()))?;
        let client = self.clients.remove(index);
        client.shutdown().await;
        info!("Removed player {}", address);
        Ok(())
    }

    pub async fn shutdown_all(&mut self) {
        for client in self.clients.drain(..) {
            client.shutdown().await;
        }
    }
}
