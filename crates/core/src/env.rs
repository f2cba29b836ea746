//! The capability interface every environment engine exposes.
//!
//! The session layer only ever talks to `Box<dyn Env>`; engines and
//! decorators such as [`FilteredEnv`](crate::filter::FilteredEnv) implement
//! the same trait, so they compose freely.

use std::time::Duration;

use crate::error::EnvError;
use crate::types::{Action, EnvSpec, Frame};

/// Outcome of advancing an environment by one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepResult {
    pub reward: f64,
    pub done: bool,
}

/// A running, stateful environment instance.
///
/// All methods are blocking: an engine may take a full simulated frame to
/// return from [`Env::step`]. Callers on an async runtime should move the
/// instance onto a blocking thread for the duration of the call.
pub trait Env: Send {
    /// Descriptor this instance was created from.
    fn spec(&self) -> &EnvSpec;

    /// Start a new episode.
    fn reset(&mut self) -> Result<(), EnvError>;

    /// Apply `events` and advance the simulation by `frame_time`.
    fn step(&mut self, frame_time: Duration, events: &[Action]) -> Result<StepResult, EnvError>;

    /// Render the current state.
    fn observe(&mut self) -> Result<Frame, EnvError>;

    /// Release engine resources. Further calls fail with [`EnvError::Closed`].
    fn close(&mut self) -> Result<(), EnvError>;
}

/// Creates environment instances from descriptors.
pub trait EnvFactory: Send + Sync {
    fn create(&self, spec: &EnvSpec) -> Result<Box<dyn Env>, EnvError>;
}
