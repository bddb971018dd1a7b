//! Emscripten SDK activation.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::util::process::ProcessBuilder;

const NODE_COMPONENT: &str = "node-4.1.1-64bit";

/// The Emscripten SDK as seen by the webems executor.
pub trait EmscriptenSdk {
    /// Full version string recorded in the build directory state.
    fn version(&self) -> String;

    /// Root of the emscripten installation, passed to cmake.
    fn root_path(&self) -> PathBuf;

    /// Make sure the configured version is installed and active.
    fn ensure_active(&self) -> Result<()>;
}

/// An `emsdk` checkout driven through its command line.
#[derive(Debug, Clone)]
pub struct Emsdk {
    base_version: String,
    sdk_dir: PathBuf,
}

impl Emsdk {
    pub fn new(base_version: impl Into<String>, sdk_dir: impl Into<PathBuf>) -> Self {
        Emsdk {
            base_version: base_version.into(),
            sdk_dir: sdk_dir.into(),
        }
    }

    pub fn sdk_dir(&self) -> &Path {
        &self.sdk_dir
    }

    /// Components that must be active, in activation order.
    pub fn components(&self) -> Vec<String> {
        let version = self.version();
        vec![
            format!("emscripten-tag-{}", version),
            format!("clang-tag-e{}", version),
            NODE_COMPONENT.to_string(),
        ]
    }

    fn emsdk(&self) -> ProcessBuilder {
        ProcessBuilder::new(self.sdk_dir.join("emsdk")).cwd(&self.sdk_dir)
    }

    fn ensure_component_active(&self, component: &str) -> Result<()> {
        // `activate` exits with 0 even for missing components.
        let active = match self.emsdk().args(["activate", component]).exec() {
            Ok(output) => {
                let text = format!(
                    "{}{}",
                    String::from_utf8_lossy(&output.stdout),
                    String::from_utf8_lossy(&output.stderr)
                );
                output.status.success() && !text.contains("not installed")
            }
            Err(e) => {
                tracing::debug!("emsdk activate {} failed: {:#}", component, e);
                false
            }
        };

        if !active {
            tracing::info!(
                "Emscripten component {} is apparently not installed yet. Installing...",
                component
            );
            self.emsdk().arg("update").run()?;
            self.emsdk().args(["install", component]).run()?;
            self.emsdk().args(["activate", component]).run()?;
        }
        Ok(())
    }
}

impl EmscriptenSdk for Emsdk {
    fn version(&self) -> String {
        format!("{}-64bit", self.base_version)
    }

    fn root_path(&self) -> PathBuf {
        self.sdk_dir
            .join("emscripten")
            .join(format!("tag-{}", self.base_version))
    }

    fn ensure_active(&self) -> Result<()> {
        tracing::info!("Checking active emscripten version...");
        for component in self.components() {
            self.ensure_component_active(&component)?;
        }
        tracing::info!("Emscripten {} is active.", self.version());
        Ok(())
    }
}
