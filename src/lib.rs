//! Remote environment server (workspace facade crate).
//!
//! Re-exports the `remote_env::{adapter,core,types}` API while the
//! implementation lives in dedicated crates under `crates/`.

pub use remote_env_adapter as adapter;
pub use remote_env_core as core;
pub use remote_env_types as types;
