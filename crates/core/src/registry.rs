//! Named environment descriptors.
//!
//! The registry is built once at startup and shared read-only between
//! sessions (`Arc<Registry>`); nothing mutates it afterwards.

use std::time::Duration;

use crate::error::EnvError;
use crate::types::{EngineKind, EnvSpec};

const ARROW_KEYS: [&str; 4] = ["ArrowLeft", "ArrowRight", "ArrowUp", "ArrowDown"];

#[derive(Debug, Clone, Default)]
pub struct Registry {
    specs: Vec<EnvSpec>,
}

impl Registry {
    pub fn new(specs: Vec<EnvSpec>) -> Self {
        Self { specs }
    }

    /// Descriptors for the engines shipped with this crate.
    pub fn builtin() -> Self {
        Self::new(vec![
            EnvSpec {
                name: "Target-v0".to_string(),
                width: 160,
                height: 210,
                key_whitelist: Some(Vec::new()),
                engine: EngineKind::Target,
                episode_length: Duration::from_secs(30),
            },
            EnvSpec {
                name: "TargetSmall-v0".to_string(),
                width: 100,
                height: 80,
                key_whitelist: Some(Vec::new()),
                engine: EngineKind::Target,
                episode_length: Duration::from_secs(30),
            },
            EnvSpec {
                name: "KeyMatch-v0".to_string(),
                width: 120,
                height: 120,
                key_whitelist: Some(ARROW_KEYS.iter().map(|k| k.to_string()).collect()),
                engine: EngineKind::KeyMatch,
                episode_length: Duration::from_secs(20),
            },
        ])
    }

    pub fn spec_for_name(&self, name: &str) -> Option<&EnvSpec> {
        self.specs.iter().find(|s| s.name == name)
    }

    pub fn lookup(&self, name: &str) -> Result<&EnvSpec, EnvError> {
        self.spec_for_name(name)
            .ok_or_else(|| EnvError::UnknownEnv(name.to_string()))
    }

    /// Descriptor names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.specs.iter().map(|s| s.name.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn iter(&self) -> impl Iterator<Item = &EnvSpec> {
        self.specs.iter()
    }
}
