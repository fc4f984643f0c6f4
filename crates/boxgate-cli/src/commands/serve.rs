//! Gateway server bootstrap

use anyhow::{Context, Result};
use boxgate_config::GatewayConfig;
use boxgate_provider::connect_runtime;
use std::sync::Arc;

/// Validate the config, connect the runtime and serve until stopped.
///
/// Transport credentials are built inside `boxgate_server::serve`; any
/// credentials failure aborts before a listener is bound.
pub async fn serve(config: GatewayConfig) -> Result<()> {
    config.validate()?;

    let runtime = connect_runtime(&config.runtime).await.with_context(|| {
        format!(
            "could not connect to the container runtime at {}",
            config.runtime.socket
        )
    })?;
    tracing::info!(socket = %config.runtime.socket, "connected to container runtime");

    boxgate_server::serve(&config, Arc::from(runtime)).await?;
    Ok(())
}
