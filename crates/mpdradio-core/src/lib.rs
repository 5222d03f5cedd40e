//! Core types and logic for mpdradio.
//!
//! This crate holds the runtime-independent half of the MPD client: the
//! response codec and the data types shared with the command-line front-end.
//!
//! # Modules
//!
//! - [`codec`]: incremental decoder for the daemon's text/binary replies
//! - [`error`]: decode errors
//! - [`protocol`]: the decoded [`protocol::Response`] and argument helpers
//! - [`library`]: saved players and radio stations
//!
//! # Response framing
//!
//! | Line | Meaning |
//! |------|---------|
//! | `OK[ status]` | end of a successful response |
//! | `ACK message` | end of a rejected command |
//! | `binary: <n>` | `n` raw bytes follow |
//! | `key: value` | field |
//! | anything else | unparsed line |

pub mod codec;
pub mod error;
pub mod library;
pub mod protocol;
