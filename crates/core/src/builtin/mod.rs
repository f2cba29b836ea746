//! Built-in engines.
//!
//! Real deployments plug their own engine in through [`EnvFactory`]; these
//! two small simulations exist so the server runs out of the box and so the
//! protocol layer can be exercised end to end.

pub mod canvas;
pub mod key_match;
pub mod target;

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use crate::env::{Env, EnvFactory};
use crate::error::EnvError;
use crate::types::{EngineKind, EnvSpec};

pub use key_match::KeyMatchEnv;
pub use target::TargetEnv;

/// Factory for the built-in engines.
#[derive(Debug, Default)]
pub struct BuiltinFactory {
    /// Render the pointer into observations.
    pub cursor: bool,
    next_seed: AtomicU32,
}

impl BuiltinFactory {
    pub fn new(cursor: bool, seed: u32) -> Self {
        Self {
            cursor,
            next_seed: AtomicU32::new(seed),
        }
    }
}

impl EnvFactory for BuiltinFactory {
    fn create(&self, spec: &EnvSpec) -> Result<Box<dyn Env>, EnvError> {
        // Each instance gets its own seed so concurrent sessions differ.
        let seed = self.next_seed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(env = %spec.name, seed, "creating built-in environment");
        let env: Box<dyn Env> = match spec.engine {
            EngineKind::Target => Box::new(TargetEnv::new(spec.clone(), seed, self.cursor)),
            EngineKind::KeyMatch => Box::new(KeyMatchEnv::new(spec.clone(), seed, self.cursor)),
        };
        Ok(env)
    }
}

/// Episode bookkeeping shared by the built-in engines.
#[derive(Debug, Clone)]
pub(crate) struct Episode {
    seed: u32,
    count: u32,
    elapsed: Duration,
    running: bool,
    closed: bool,
}

impl Episode {
    pub(crate) fn new(seed: u32) -> Self {
        Self {
            seed,
            count: 0,
            elapsed: Duration::ZERO,
            running: false,
            closed: false,
        }
    }

    /// Start the next episode, returning its RNG seed.
    pub(crate) fn begin(&mut self) -> Result<u32, EnvError> {
        self.check_open()?;
        self.count += 1;
        self.elapsed = Duration::ZERO;
        self.running = true;
        Ok(self.seed.wrapping_mul(31).wrapping_add(self.count))
    }

    pub(crate) fn check_open(&self) -> Result<(), EnvError> {
        if self.closed {
            return Err(EnvError::Closed);
        }
        Ok(())
    }

    pub(crate) fn check_running(&self) -> Result<(), EnvError> {
        self.check_open()?;
        if !self.running {
            return Err(EnvError::NotReset);
        }
        Ok(())
    }

    /// Account for one frame; true once the episode is over.
    pub(crate) fn advance(&mut self, frame_time: Duration, length: Duration) -> bool {
        self.elapsed += frame_time;
        self.elapsed >= length
    }

    pub(crate) fn close(&mut self) -> Result<(), EnvError> {
        self.check_open()?;
        self.closed = true;
        self.running = false;
        Ok(())
    }
}
