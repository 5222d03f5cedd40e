//! Location and persistence of the saved players and radios.
//!
//! Priority for the config directory:
//! 1. `MPDRADIO_CONFIG_DIR` (explicit override)
//! 2. The platform config directory (`~/.config` on Linux)
//! 3. The system temp dir (last resort)
//!
//! The library is stored as JSON in `{config_dir}/mpd-radio-config.json`.

use std::env;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use mpdradio_core::library::Library;
use tracing::debug;

/// File name of the saved library.
pub const CONFIG_FILE: &str = "mpd-radio-config.json";

/// Get the config directory with priority fallback.
pub fn get_config_dir() -> PathBuf {
    // 1. Explicit override (ignore empty)
    if let Ok(dir) = env::var("MPDRADIO_CONFIG_DIR") {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }

    // 2. Platform config dir
    if let Some(dir) = dirs::config_dir() {
        return dir;
    }

    // 3. Last resort
    env::temp_dir()
}

/// Get the path of the config file.
pub fn get_config_path() -> PathBuf {
    get_config_dir().join(CONFIG_FILE)
}

/// The JSON file holding the [`Library`].
#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: PathBuf,
}

impl ConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file at [`get_config_path`].
    pub fn default_location() -> Self {
        Self::new(get_config_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the library. A missing file is an empty library.
    pub fn load(&self) -> Result<Library> {
        let data = match std::fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No config at {:?}, starting empty", self.path);
                return Ok(Library::default());
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read config file: {:?}", self.path));
            }
        };

        serde_json::from_slice(&data)
            .with_context(|| format!("Failed to parse config file: {:?}", self.path))
    }

    /// Write the library, readable only by the owner on Unix.
    pub fn save(&self, library: &Library) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }

        let data = serde_json::to_vec_pretty(library).context("Failed to serialize config")?;

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options
            .open(&self.path)
            .with_context(|| format!("Failed to open config file: {:?}", self.path))?;

        // The creation mode only applies to new files.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("Failed to set permissions on {:?}", self.path))?;
        }

        file.write_all(&data)
            .with_context(|| format!("Failed to write config file: {:?}", self.path))?;

        debug!("Saved config to {:?}", self.path);
        Ok(())
    }
}
