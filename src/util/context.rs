//! Global context for bauer operations.
//!
//! Resolves the source directory, the build root and the merged
//! configuration once, before any command runs.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::util::config::{global_config_path, load_config, project_config_path, Config};

/// Build root used when neither the command line nor a config file names one.
pub const DEFAULT_BUILD_FOLDER: &str = "build";

/// Global context containing configuration and paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Project source directory (contains the top-level CMakeLists.txt)
    source_dir: PathBuf,

    /// Root of all build directories
    build_root: PathBuf,

    config: Config,

    verbose: bool,
}

impl GlobalContext {
    /// Context for the current working directory, reading config files.
    pub fn new(build_folder: Option<&Path>) -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        let global = global_config_path();
        let config = load_config(global.as_deref(), &project_config_path(&cwd));
        Ok(Self::with_config(cwd, build_folder, config))
    }

    /// Context for an explicit source directory and configuration.
    ///
    /// A relative build folder is taken relative to the source directory.
    pub fn with_config(source_dir: PathBuf, build_folder: Option<&Path>, config: Config) -> Self {
        let folder = build_folder
            .map(Path::to_path_buf)
            .or_else(|| config.build.build_folder.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BUILD_FOLDER));

        GlobalContext {
            build_root: source_dir.join(folder),
            source_dir,
            config,
            verbose: false,
        }
    }

    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    pub fn build_root(&self) -> &Path {
        &self.build_root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_build_root() {
        let ctx = GlobalContext::with_config(PathBuf::from("/src"), None, Config::default());
        assert_eq!(ctx.build_root(), Path::new("/src/build"));
    }

    #[test]
    fn test_build_folder_precedence() {
        let mut config = Config::default();
        config.build.build_folder = Some(PathBuf::from("out"));

        let ctx = GlobalContext::with_config(PathBuf::from("/src"), None, config.clone());
        assert_eq!(ctx.build_root(), Path::new("/src/out"));

        let ctx = GlobalContext::with_config(
            PathBuf::from("/src"),
            Some(Path::new("/tmp/builds")),
            config,
        );
        assert_eq!(ctx.build_root(), Path::new("/tmp/builds"));
    }
}
