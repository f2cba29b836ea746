//! Environment layer - the engine interface, event filtering, and descriptors
//!
//! This crate contains everything between a protocol session and the thing
//! that actually simulates an application. It has **no dependency** on
//! networking or encoding, which keeps it:
//!
//! - **Synchronous**: every [`Env`] call blocks until the engine returns
//! - **Composable**: decorators like [`FilteredEnv`] implement [`Env`] too
//! - **Testable**: engines are plain trait objects, easy to script in tests
//!
//! # Module Structure
//!
//! - [`env`]: the [`Env`] capability trait and the [`EnvFactory`] that creates instances
//! - [`filter`]: the delta event filter and the [`FilteredEnv`] decorator
//! - [`registry`]: named, read-only environment descriptors
//! - [`builtin`]: two small engines (`Target`, `KeyMatch`) for running out of the box
//! - [`rng`]: deterministic LCG used by the built-in engines
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use remote_env_core::{filter_env, BuiltinFactory, EnvFactory, Registry};
//! use remote_env_core::types::{Action, EventFilter, MouseEvent};
//!
//! let registry = Registry::builtin();
//! let spec = registry.spec_for_name("TargetSmall-v0").unwrap();
//!
//! let factory = BuiltinFactory::new(false, 1);
//! let mut env = filter_env(factory.create(spec).unwrap(), EventFilter::DeltaFilter);
//! env.reset().unwrap();
//!
//! let moves = [Action::Mouse(MouseEvent::moved(3, 4)), Action::Mouse(MouseEvent::moved(5, 6))];
//! let result = env.step(Duration::from_millis(100), &moves).unwrap();
//! assert!(!result.done);
//!
//! let frame = env.observe().unwrap();
//! assert_eq!((frame.width, frame.height), (100, 80));
//! env.close().unwrap();
//! ```

pub mod builtin;
pub mod env;
pub mod error;
pub mod filter;
pub mod registry;
pub mod rng;

pub use remote_env_types as types;

pub use builtin::BuiltinFactory;
pub use env::{Env, EnvFactory, StepResult};
pub use error::EnvError;
pub use filter::{filter_env, DeltaFilter, FilteredEnv, InputState};
pub use registry::Registry;
pub use rng::Lcg;
