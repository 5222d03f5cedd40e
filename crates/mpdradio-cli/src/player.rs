//! Playback operations built on top of the raw command executor.

use std::fmt;

use mpdradio_core::protocol::quote_arg;
use thiserror::Error;
use tracing::debug;

use crate::mpd::{ClientError, MpdClient};

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("'{command}' response has no '{field}' field")]
    MissingField {
        command: &'static str,
        field: &'static str,
    },
    #[error("player reported volume '{0}'")]
    InvalidVolume(String),
}

/// What the player is doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerState {
    /// Playing; holds the station name or, failing that, the file/URL.
    Playing(String),
    Stopped,
    Paused,
    Unknown(String),
}

impl fmt::Display for PlayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerState::Playing(what) => write!(f, "Playing: {}", what),
            PlayerState::Stopped => write!(f, "Stopped"),
            PlayerState::Paused => write!(f, "Paused"),
            PlayerState::Unknown(state) => write!(f, "Unknown state: {}", state),
        }
    }
}

/// Query the playback state.
pub async fn status(client: &MpdClient) -> Result<PlayerState, PlayerError> {
    let response = client.execute_or_reconnect("status").await?;
    let state = response.get("state").ok_or(PlayerError::MissingField {
        command: "status",
        field: "state",
    })?;

    match state {
        "play" => {
            let song = client.execute_or_reconnect("currentsong").await?;
            let playing = song
                .get("Name")
                .or_else(|| song.get("file"))
                .unwrap_or_default();
            Ok(PlayerState::Playing(playing.to_string()))
        }
        "stop" => Ok(PlayerState::Stopped),
        "pause" => Ok(PlayerState::Paused),
        other => Ok(PlayerState::Unknown(other.to_string())),
    }
}

/// Replace the queue with `url` and start playing it.
///
/// Returns the song id assigned by the daemon.
pub async fn play(client: &MpdClient, url: &str) -> Result<String, PlayerError> {
    client.execute_or_reconnect("clear").await?;

    let added = client
        .execute_or_reconnect(&format!("addid {} 0", quote_arg(url)))
        .await?;
    let id = added
        .get("Id")
        .ok_or(PlayerError::MissingField {
            command: "addid",
            field: "Id",
        })?
        .to_string();
    debug!("Added {} as song {}", url, id);

    client.execute_or_reconnect(&format!("playid {}", id)).await?;
    Ok(id)
}

pub async fn stop(client: &MpdClient) -> Result<(), PlayerError> {
    client.execute_or_reconnect("stop").await?;
    Ok(())
}

pub async fn pause(client: &MpdClient) -> Result<(), PlayerError> {
    client.execute_or_reconnect("pause").await?;
    Ok(())
}

/// Move the volume by `delta` percent, clamped to 0..=100.
///
/// Returns the new volume.
pub async fn change_volume(client: &MpdClient, delta: i32) -> Result<u8, PlayerError> {
    let response = client.execute_or_reconnect("status").await?;
    let raw = response.get("volume").ok_or(PlayerError::MissingField {
        command: "status",
        field: "volume",
    })?;

    // MPD reports -1 when there is no mixer.
    let current: i32 = match raw.parse() {
        Ok(v) if (0..=100).contains(&v) => v,
        _ => return Err(PlayerError::InvalidVolume(raw.to_string())),
    };

    let volume = current.saturating_add(delta).clamp(0, 100) as u8;
    client
        .execute_or_reconnect(&format!("setvol {}", volume))
        .await?;
    Ok(volume)
}
