//! Per-directory generator state (`.generateProjects.state`).
//!
//! The state is loaded when processing of a build directory starts and written
//! back only when processing finishes without an error, so a failed run never
//! leaves partial results behind.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::core::configuration::BuildConfiguration;
use crate::util::fs::{read_to_string, write_string};

/// Name of the state file, also the "prepared" marker.
pub const STATE_FILE_NAME: &str = ".generateProjects.state";

/// Key holding the configuration a directory was prepared for.
pub const BUILD_CONFIGURATION_KEY: &str = "build-configuration";

/// Opaque key/value state of one build directory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneratorState {
    dir: PathBuf,
    values: Map<String, Value>,
}

impl GeneratorState {
    /// Path of the state file inside `dir`.
    pub fn path_in(dir: &Path) -> PathBuf {
        dir.join(STATE_FILE_NAME)
    }

    /// Load the state of `dir`. A missing file yields an empty state.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = Self::path_in(dir);
        let values = if path.is_file() {
            let contents = read_to_string(&path)?;
            serde_json::from_str(&contents)
                .with_context(|| format!("failed to parse state file: {}", path.display()))?
        } else {
            Map::new()
        };

        Ok(GeneratorState {
            dir: dir.to_path_buf(),
            values,
        })
    }

    /// Write the state to its directory, creating the directory if needed.
    pub fn store(&self) -> Result<()> {
        let path = Self::path_in(&self.dir);
        let contents = serde_json::to_string(&self.values)
            .context("failed to serialize generator state")?;
        write_string(&path, &contents)
    }

    /// Run `f` with the state of `dir`, storing it only if `f` succeeds.
    pub fn scoped<T>(dir: &Path, f: impl FnOnce(&mut GeneratorState) -> Result<T>) -> Result<T> {
        let mut state = Self::load(dir)?;
        let value = f(&mut state)?;
        state.store()?;
        Ok(value)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Typed value for `key`. Values of the wrong shape read as absent.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.values
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn set<T: Serialize>(&mut self, key: &str, value: T) -> Result<()> {
        let value = serde_json::to_value(value)
            .with_context(|| format!("failed to serialize state value `{}`", key))?;
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    /// Forget everything, e.g. after the directory was wiped.
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Whether a different configuration was recorded for this directory.
    ///
    /// The comparison is structural on the serialized tuple, so a stored value
    /// that no longer parses also counts as a mismatch. No stored value is
    /// not a mismatch.
    pub fn conflicts_with(&self, config: &BuildConfiguration) -> bool {
        match self.values.get(BUILD_CONFIGURATION_KEY) {
            Some(stored) => serde_json::to_value(config)
                .map(|current| &current != stored)
                .unwrap_or(true),
            None => false,
        }
    }

    /// The configuration recorded for this directory, if any.
    pub fn build_configuration(&self) -> Option<BuildConfiguration> {
        self.get(BUILD_CONFIGURATION_KEY)
    }

    pub fn set_build_configuration(&mut self, config: &BuildConfiguration) -> Result<()> {
        self.set(BUILD_CONFIGURATION_KEY, config)
    }
}
