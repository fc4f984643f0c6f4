//! Error types for container runtimes

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Failed to connect to container runtime: {0}")]
    ConnectionError(String),

    #[error("Container not found: {0}")]
    ContainerNotFound(String),

    #[error("Image not found: {0}")]
    ImageNotFound(String),

    #[error("Invalid container spec: {0}")]
    InvalidSpec(String),

    #[error("Container runtime error: {0}")]
    EngineError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<bollard::errors::Error> for RuntimeError {
    fn from(e: bollard::errors::Error) -> Self {
        match e {
            bollard::errors::Error::DockerResponseServerError {
                status_code: 404,
                message,
            } => RuntimeError::ContainerNotFound(message),
            bollard::errors::Error::DockerResponseServerError {
                status_code: 400,
                message,
            } => RuntimeError::InvalidSpec(message),
            other => RuntimeError::EngineError(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
