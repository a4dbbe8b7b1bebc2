//! Gameconf Server: gamedata update service
//!
//! Clients submit the hashes of their gamedata files; the server answers with
//! the files whose authoritative copy differs, picked from an ordered list of
//! version-gated mount directories, and serves those files on request.

pub mod api;
pub mod cli;
pub mod config;
pub mod diff;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod mount;
pub mod server;
pub mod vdf;
