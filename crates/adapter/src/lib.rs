//! Adapter module - remote control of environments over WebSocket
//!
//! This crate exposes the environments in a [`core::Registry`] to external
//! agents. Each connection drives one private environment instance through
//! a small JSON protocol.
//!
//! # Protocol Overview
//!
//! 1. **Connection**: Client opens `ws://<host>:<port>/env/<name>`. Unknown
//!    names are refused during the handshake with HTTP 404.
//! 2. **Reset**: Client sends `reset`; the server creates the environment on
//!    first use, resets it and answers with the first observation.
//! 3. **Step**: Client sends `step` with a batch of input events; the server
//!    advances one frame and answers with observation, reward and done.
//! 4. **Failure**: Any error is reported once as an `error` message and the
//!    connection is closed.
//!
//! # Message Types
//!
//! ## Client → Server
//!
//! - **reset**: Start a new episode
//! - **step**: Apply `actions` (each `{"keyEvent":{..}}` or `{"mouseEvent":{..}}`)
//!   and advance one frame
//!
//! ## Server → Client
//!
//! - **reset**: `observation` (base64 PNG)
//! - **step**: `observation`, `reward`, `done`
//! - **error**: `error` text, followed by close
//!
//! # Environment Variables
//!
//! - `REMOTE_ENV_HOST`: Bind address (default: "127.0.0.1")
//! - `REMOTE_ENV_PORT`: Port number (default: 8080, 0 picks a free port)
//! - `REMOTE_ENV_FRAME_MS`: Simulated time per step (default: 100)
//! - `REMOTE_ENV_FILTER`: `NoFilter` or `DeltaFilter` (default: NoFilter)
//! - `REMOTE_ENV_CURSOR`: Set to "1" or "true" to draw the pointer
//! - `REMOTE_ENV_LOG_PATH`: Append every message to this file
//!
//! # Example Protocol Flow
//!
//! ```text
//! Client -> Server: {"type":"reset"}
//! Server -> Client: {"type":"reset","observation":"iVBORw0KGgo..."}
//! Client -> Server: {"type":"step","actions":[{"mouseEvent":{"type":"mouseMoved","x":10,"y":20}}]}
//! Server -> Client: {"type":"step","observation":"iVBORw0KGgo...","reward":0.0,"done":false}
//! ```
//!
//! See [`protocol`] for message definitions, [`session`] for the per
//! connection state machine and [`server`] for the listener.

pub mod observation;
pub mod protocol;
pub mod server;
pub mod session;
pub mod wire_log;

pub use remote_env_core as core;
pub use remote_env_types as types;

pub use protocol::{parse_message, Command, ServerMessage};
pub use server::{env_name_from_path, run_server, ServerConfig};
pub use session::{Session, SessionConfig, SessionError, SessionState};
pub use wire_log::WireLog;
