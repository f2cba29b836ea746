//! WebSocket server for the environment API
//!
//! Accepts TCP connections, upgrades them to WebSocket, resolves the
//! environment named in the request path (`/env/<name>`), and runs one
//! [`Session`] task per connection.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tracing::{info, warn};

use crate::core::{EnvFactory, Registry};
use crate::session::{Session, SessionConfig};
use crate::types::{EnvSpec, EventFilter, DEFAULT_FRAME_MS};
use crate::wire_log::WireLog;

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Simulated time per step.
    pub frame_time: Duration,
    pub filter: EventFilter,
    /// Render the pointer into observations (built-in engines).
    pub cursor: bool,
    /// Append every message to this file.
    pub log_path: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            frame_time: Duration::from_millis(DEFAULT_FRAME_MS),
            filter: EventFilter::NoFilter,
            cursor: false,
            log_path: None,
        }
    }
}

impl ServerConfig {
    /// Create from `REMOTE_ENV_*` environment variables, falling back to
    /// the defaults for anything missing or unparsable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let host = lookup("REMOTE_ENV_HOST").unwrap_or(defaults.host);
        let port = lookup("REMOTE_ENV_PORT")
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(defaults.port);

        let frame_time = lookup("REMOTE_ENV_FRAME_MS")
            .and_then(|s| s.trim().parse::<u64>().ok())
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .unwrap_or(defaults.frame_time);

        let filter = match lookup("REMOTE_ENV_FILTER") {
            Some(s) => s.trim().parse().unwrap_or_else(|e| {
                warn!("REMOTE_ENV_FILTER: {}; using {}", e, defaults.filter);
                defaults.filter
            }),
            None => defaults.filter,
        };

        let cursor = lookup("REMOTE_ENV_CURSOR")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(defaults.cursor);

        let log_path = lookup("REMOTE_ENV_LOG_PATH")
            .map(|s| s.trim().to_string())
            .and_then(|s| if s.is_empty() { None } else { Some(s) });

        Self {
            host,
            port,
            frame_time,
            filter,
            cursor,
            log_path,
        }
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            frame_time: self.frame_time,
            filter: self.filter,
        }
    }
}

/// Extract the environment name from an `/env/<name>` request path.
pub fn env_name_from_path(path: &str) -> Option<&str> {
    let rest = path.strip_prefix("/env/")?;
    let name = rest.strip_suffix('/').unwrap_or(rest);
    if name.is_empty()
        || !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return None;
    }
    Some(name)
}

/// Start the WebSocket server and serve until the listener fails.
///
/// `ready_tx` receives the bound address once the listener is up, which
/// lets callers bind port 0.
pub async fn run_server(
    config: ServerConfig,
    registry: Arc<Registry>,
    factory: Arc<dyn EnvFactory>,
    ready_tx: Option<oneshot::Sender<SocketAddr>>,
) -> anyhow::Result<()> {
    let wire_log = match config.log_path.as_deref() {
        Some(path) => Some(
            WireLog::open(path)
                .await
                .with_context(|| format!("open wire log {}", path))?,
        ),
        None => None,
    };

    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(&addr).await?;
    let bound = listener.local_addr()?;
    info!(
        "listening on ws://{}/env/<name> (filter: {}, frame time: {:?})",
        bound, config.filter, config.frame_time
    );
    if let Some(tx) = ready_tx {
        let _ = tx.send(bound);
    }

    let session_config = config.session_config();
    let mut client_id_counter = 0usize;

    loop {
        let (socket, addr) = listener.accept().await?;
        client_id_counter += 1;
        let client_id = client_id_counter;

        let registry = Arc::clone(&registry);
        let factory = Arc::clone(&factory);
        let wire_log = wire_log.clone();

        tokio::spawn(async move {
            if let Err(e) =
                handle_client(socket, addr, client_id, registry, factory, session_config, wire_log)
                    .await
            {
                warn!(client = client_id, "client error: {:#}", e);
            }
        });
    }
}

/// Upgrade one connection and run its session to completion.
async fn handle_client(
    socket: TcpStream,
    addr: SocketAddr,
    client_id: usize,
    registry: Arc<Registry>,
    factory: Arc<dyn EnvFactory>,
    session_config: SessionConfig,
    wire_log: Option<WireLog>,
) -> anyhow::Result<()> {
    let mut requested: Option<EnvSpec> = None;
    let route = |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
        let path = req.uri().path();
        let found = match env_name_from_path(path) {
            Some(name) => registry.lookup(name).map_err(|e| e.to_string()),
            None => Err(format!("no environment at {}", path)),
        };
        match found {
            Ok(spec) => {
                requested = Some(spec.clone());
                Ok(resp)
            }
            Err(reason) => {
                let mut err = ErrorResponse::new(Some(reason));
                *err.status_mut() = StatusCode::NOT_FOUND;
                Err(err)
            }
        }
    };

    let ws = tokio_tungstenite::accept_hdr_async(socket, route)
        .await
        .with_context(|| format!("websocket upgrade from {}", addr))?;
    let spec = requested.context("upgrade accepted without an environment")?;

    info!(client = client_id, %addr, env = %spec.name, "client connected");
    let session = Session::new(client_id, spec, factory, session_config).with_wire_log(wire_log);
    let result = session.handle(ws).await;
    info!(client = client_id, "client disconnected");

    match result {
        Ok(()) => Ok(()),
        Err(e) if e.reportable() => {
            warn!(client = client_id, "session ended: {}", e);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
