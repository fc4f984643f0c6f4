//! Error types for the gateway server

use crate::credentials::CredentialsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Credentials error: {0}")]
    Credentials(#[from] CredentialsError),

    #[error("Invalid listen address {addr}: {reason}")]
    InvalidAddress { addr: String, reason: String },

    #[error("Reflection registry error: {0}")]
    Reflection(String),

    #[error("Transport error: {0}")]
    Transport(#[from] tonic::transport::Error),
}

pub type Result<T> = std::result::Result<T, GatewayError>;
