//! Configuration file support for bauer.
//!
//! Two locations are read, later ones overriding earlier ones:
//! - Global: `~/.bauer/config.toml` - user-wide defaults
//! - Project: `<source>/.bauer/config.toml` - project-specific overrides
//!
//! Command-line flags override both.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_ANDROID_BUILD_API_VERSION: &str = "26";
pub const DEFAULT_ANDROID_BUILD_TOOLS_VERSION: &str = "26.0.2";
pub const DEFAULT_ANDROID_EMULATOR_API_VERSION: &str = "26";
pub const DEFAULT_ANDROID_PACKAGE_ID_PREFIX: &str = "io.boden.android";
pub const DEFAULT_GRADLE_PLUGIN_VERSION: &str = "3.0.1";
pub const DEFAULT_GRADLE_DISTRIBUTION_URL: &str =
    "https://services.gradle.org/distributions/gradle-4.1-all.zip";
pub const DEFAULT_EMSCRIPTEN_VERSION: &str = "1.38.0";

/// bauer configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub build: BuildConfig,
    pub android: AndroidConfig,
    pub emscripten: EmscriptenConfig,
    pub macos: MacOsConfig,
    pub package: PackageConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Default number of parallel jobs
    pub jobs: Option<usize>,

    /// Build root, relative to the source directory
    pub build_folder: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AndroidConfig {
    pub build_api_version: Option<String>,
    pub build_tools_version: Option<String>,
    pub emulator_api_version: Option<String>,
    pub package_id_prefix: Option<String>,
    pub gradle_plugin_version: Option<String>,
    pub gradle_distribution_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmscriptenConfig {
    /// SDK version to activate
    pub version: Option<String>,

    /// emsdk checkout; `EMSDK_BASE_DIR` wins over this
    pub sdk_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacOsConfig {
    pub sdk_path: Option<String>,
    pub min_version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageConfig {
    /// CPack generator
    pub generator: Option<String>,

    /// Output folder, relative to the build root
    pub folder: Option<String>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        fn take<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }

        take(&mut self.build.jobs, other.build.jobs);
        take(&mut self.build.build_folder, other.build.build_folder);

        let android = other.android;
        take(&mut self.android.build_api_version, android.build_api_version);
        take(&mut self.android.build_tools_version, android.build_tools_version);
        take(&mut self.android.emulator_api_version, android.emulator_api_version);
        take(&mut self.android.package_id_prefix, android.package_id_prefix);
        take(&mut self.android.gradle_plugin_version, android.gradle_plugin_version);
        take(&mut self.android.gradle_distribution_url, android.gradle_distribution_url);

        take(&mut self.emscripten.version, other.emscripten.version);
        take(&mut self.emscripten.sdk_dir, other.emscripten.sdk_dir);

        take(&mut self.macos.sdk_path, other.macos.sdk_path);
        take(&mut self.macos.min_version, other.macos.min_version);

        take(&mut self.package.generator, other.package.generator);
        take(&mut self.package.folder, other.package.folder);
    }
}

impl AndroidConfig {
    pub fn build_api_version(&self) -> &str {
        self.build_api_version
            .as_deref()
            .unwrap_or(DEFAULT_ANDROID_BUILD_API_VERSION)
    }

    pub fn build_tools_version(&self) -> &str {
        self.build_tools_version
            .as_deref()
            .unwrap_or(DEFAULT_ANDROID_BUILD_TOOLS_VERSION)
    }

    pub fn emulator_api_version(&self) -> &str {
        self.emulator_api_version
            .as_deref()
            .unwrap_or(DEFAULT_ANDROID_EMULATOR_API_VERSION)
    }

    pub fn package_id_prefix(&self) -> &str {
        self.package_id_prefix
            .as_deref()
            .unwrap_or(DEFAULT_ANDROID_PACKAGE_ID_PREFIX)
    }

    pub fn gradle_plugin_version(&self) -> &str {
        self.gradle_plugin_version
            .as_deref()
            .unwrap_or(DEFAULT_GRADLE_PLUGIN_VERSION)
    }

    pub fn gradle_distribution_url(&self) -> &str {
        self.gradle_distribution_url
            .as_deref()
            .unwrap_or(DEFAULT_GRADLE_DISTRIBUTION_URL)
    }
}

impl EmscriptenConfig {
    pub fn version(&self) -> &str {
        self.version.as_deref().unwrap_or(DEFAULT_EMSCRIPTEN_VERSION)
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.bauer/config.toml)
/// 2. Global config (~/.bauer/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        config.merge(Config::load_or_default(global_path));
    }
    config.merge(Config::load_or_default(project_path));

    config
}

/// Get the global bauer config directory (~/.bauer).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".bauer"))
}

/// Get the global config path (~/.bauer/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (<source>/.bauer/config.toml).
pub fn project_config_path(source_dir: &Path) -> PathBuf {
    source_dir.join(".bauer").join("config.toml")
}
