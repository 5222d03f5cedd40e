//! Protocol client engine for MPD daemons.

pub mod client;
mod codec;
mod connection;
pub mod error;
mod keepalive;
#[cfg(test)]
pub(crate) mod testing;

pub use client::{ClientSettings, MpdClient};
pub use error::ClientError;
