//! Remote environment server (default binary).
//!
//! Serves the built-in environments over WebSocket until interrupted.
//! Configuration comes from `REMOTE_ENV_*` variables, log verbosity from
//! `RUST_LOG`.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use remote_env::adapter::{run_server, ServerConfig};
use remote_env::core::{BuiltinFactory, EnvFactory, Registry};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::from_env();
    let registry = Arc::new(Registry::builtin());

    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() ^ d.as_secs() as u32)
        .unwrap_or(1);
    let factory: Arc<dyn EnvFactory> = Arc::new(BuiltinFactory::new(config.cursor, seed));

    info!("environments: {}", registry.names().join(", "));

    tokio::select! {
        result = run_server(config, registry, factory, None) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("shutting down");
            Ok(())
        }
    }
}
