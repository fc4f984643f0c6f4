//! Configuration parsing for boxgate
//!
//! This crate handles the gateway configuration file
//! (`~/.config/boxgate/config.toml`): listen address, transport security
//! material, token keys and the container runtime socket.

mod error;
mod gateway;

pub use error::*;
pub use gateway::*;
