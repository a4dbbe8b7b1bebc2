//! Integration tests for the gameconf update server

mod config_loading;
mod diff_protocol;
