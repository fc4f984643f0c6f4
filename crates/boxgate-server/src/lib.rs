//! Authenticated gRPC dispatch layer for boxgate
//!
//! Wires the three pieces that stand between a remote caller and the
//! container runtime:
//!
//! 1. transport credentials — mutual TLS, peer certificate required and
//!    verified;
//! 2. per-call token authentication in front of every handler;
//! 3. the lifecycle dispatcher translating validated calls into runtime
//!    operations.
//!
//! Authentication failures never reach the runtime; runtime failures are
//! surfaced to the caller without retries.

mod auth;
mod credentials;
mod error;
mod service;

pub use auth::{AuthInterceptor, Authenticator, Identity, TokenAuthenticator, TOKEN_METADATA_KEY};
pub use credentials::{client_tls, server_tls, CredentialsError};
pub use error::*;
pub use service::ContainerGateway;

use boxgate_config::GatewayConfig;
use boxgate_provider::ContainerRuntime;
use proto::containers_server::ContainersServer;
use std::net::SocketAddr;
use std::sync::Arc;
use tonic::service::interceptor::InterceptedService;
use tonic::transport::Server;

/// Generated protocol types
pub mod proto {
    tonic::include_proto!("boxgate.v1");

    pub const FILE_DESCRIPTOR_SET: &[u8] =
        tonic::include_file_descriptor_set!("boxgate_descriptor");
}

/// Build the lifecycle service with the authentication interceptor in front
///
/// This is the only wiring of handler and interceptor; `serve` and the
/// tests share it so there is exactly one authentication path.
pub fn authenticated_service(
    runtime: Arc<dyn ContainerRuntime>,
    authenticator: Arc<dyn Authenticator>,
) -> InterceptedService<ContainersServer<ContainerGateway>, AuthInterceptor> {
    ContainersServer::with_interceptor(
        ContainerGateway::new(runtime),
        AuthInterceptor::new(authenticator),
    )
}

/// Run the gateway until the process is stopped
///
/// Builds transport credentials first: a credentials failure returns before
/// any listener is bound. The authenticator and dispatcher are constructed
/// once and shared, immutable, by every call.
pub async fn serve(config: &GatewayConfig, runtime: Arc<dyn ContainerRuntime>) -> Result<()> {
    let addr: SocketAddr =
        config
            .listen_addr()
            .parse()
            .map_err(|e: std::net::AddrParseError| GatewayError::InvalidAddress {
                addr: config.listen_addr(),
                reason: e.to_string(),
            })?;

    let tls = server_tls(&config.tls)?;

    let authenticator: Arc<dyn Authenticator> = Arc::new(TokenAuthenticator::new(
        &config.auth.sign_key,
        &config.auth.auth_key,
    ));

    let reflection = tonic_reflection::server::Builder::configure()
        .register_encoded_file_descriptor_set(proto::FILE_DESCRIPTOR_SET)
        .build_v1()
        .map_err(|e| GatewayError::Reflection(e.to_string()))?;

    let mut builder = Server::builder();
    if let Some(tls) = tls {
        tracing::info!("mutual TLS enabled; client certificates are required");
        builder = builder.tls_config(tls)?;
    } else {
        tracing::warn!("TLS disabled; serving over plain transport");
    }

    tracing::info!(%addr, "container gateway listening");

    builder
        .add_service(authenticated_service(runtime, authenticator))
        .add_service(reflection)
        .serve(addr)
        .await?;

    Ok(())
}
