//! Saved players and radio stations.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A saved radio station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Radio {
    pub name: String,
    pub url: String,
}

/// Errors from editing a [`Library`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LibraryError {
    #[error("player '{0}' is already saved")]
    DuplicatePlayer(String),
    #[error("player '{0}' not found")]
    PlayerNotFound(String),
    #[error("radio '{0}' is already saved")]
    DuplicateRadio(String),
    #[error("radio '{0}' not found")]
    RadioNotFound(String),
    #[error("radio name must not be empty")]
    EmptyRadioName,
}

/// Everything the user has saved, in display order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Library {
    /// Player addresses as `host:port`.
    #[serde(default)]
    pub players: Vec<String>,
    #[serde(default)]
    pub radios: Vec<Radio>,
}

impl Library {
    pub fn add_player(&mut self, address: impl Into<String>) -> Result<(), LibraryError> {
        let address = address.into();
        if self.players.contains(&address) {
            return Err(LibraryError::DuplicatePlayer(address));
        }
        self.players.push(address);
        Ok(())
    }

    pub fn remove_player(&mut self, address: &str) -> Result<(), LibraryError> {
        let before = self.players.len();
        self.players.retain(|p| p != address);
        if self.players.len() == before {
            return Err(LibraryError::PlayerNotFound(address.to_string()));
        }
        Ok(())
    }

    pub fn add_radio(
        &mut self,
        name: impl Into<String>,
        url: impl Into<String>,
    ) -> Result<(), LibraryError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(LibraryError::EmptyRadioName);
        }
        if self.radio(&name).is_some() {
            return Err(LibraryError::DuplicateRadio(name));
        }
        self.radios.push(Radio {
            name,
            url: url.into(),
        });
        Ok(())
    }

    pub fn remove_radio(&mut self, name: &str) -> Result<(), LibraryError> {
        let before = self.radios.len();
        self.radios.retain(|r| r.name != name);
        if self.radios.len() == before {
            return Err(LibraryError::RadioNotFound(name.to_string()));
        }
        Ok(())
    }

    /// Find a radio by name.
    pub fn radio(&self, name: &str) -> Option<&Radio> {
        self.radios.iter().find(|r| r.name == name)
    }
}
