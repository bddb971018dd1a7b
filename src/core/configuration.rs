//! Build configurations: the (platform, arch, buildsystem, config) key.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::error::BauerError;

/// Architecture sentinel meaning "the default architecture set".
pub const STD_ARCH: &str = "std";

/// Build system name for Android Gradle projects.
pub const ANDROID_STUDIO: &str = "AndroidStudio";

/// A target platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Win32,
    WinUwp,
    Linux,
    Mac,
    Ios,
    Android,
    WebEms,
    DotNet,
}

impl Platform {
    /// All known platforms.
    pub const ALL: [Platform; 8] = [
        Platform::WinUwp,
        Platform::Win32,
        Platform::DotNet,
        Platform::Linux,
        Platform::Mac,
        Platform::Ios,
        Platform::Android,
        Platform::WebEms,
    ];

    /// Directory and command-line name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Win32 => "win32",
            Platform::WinUwp => "winuwp",
            Platform::Linux => "linux",
            Platform::Mac => "mac",
            Platform::Ios => "ios",
            Platform::Android => "android",
            Platform::WebEms => "webems",
            Platform::DotNet => "dotnet",
        }
    }

    /// Short description for help output.
    pub fn description(&self) -> &'static str {
        match self {
            Platform::WinUwp => "Universal Windows app (Windows 10 and later)",
            Platform::Win32 => "Classic Windows desktop program (32 and 64 bit)",
            Platform::DotNet => ".NET program",
            Platform::Linux => "Linux",
            Platform::Mac => "Apple macOS",
            Platform::Ios => "iPhone, iPad",
            Platform::Android => "Android devices",
            Platform::WebEms => "Javascript/WebAssembly app or library built with Emscripten",
        }
    }

    /// Whether this is one of the Windows platforms.
    pub fn is_windows(&self) -> bool {
        matches!(self, Platform::Win32 | Platform::WinUwp)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = BauerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| BauerError::InvalidPlatformName(s.to_string()))
    }
}

/// The build type baked in by single-config generators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BuildType {
    Debug,
    Release,
}

impl BuildType {
    pub const ALL: [BuildType; 2] = [BuildType::Debug, BuildType::Release];

    pub fn as_str(&self) -> &'static str {
        match self {
            BuildType::Debug => "Debug",
            BuildType::Release => "Release",
        }
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildType {
    type Err = BauerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Debug" => Ok(BuildType::Debug),
            "Release" => Ok(BuildType::Release),
            _ => Err(BauerError::InvalidConfigName(s.to_string())),
        }
    }
}

/// Serialized form of a configuration: `["android","std","AndroidStudio",null]`.
type ConfigurationTuple = (Platform, String, String, Option<BuildType>);

/// One buildable variant.
///
/// `config` is `None` for multi-config generators, which select the build type
/// at build time rather than at configure time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "ConfigurationTuple", into = "ConfigurationTuple")]
pub struct BuildConfiguration {
    pub platform: Platform,
    pub arch: String,
    pub buildsystem: String,
    pub config: Option<BuildType>,
}

impl BuildConfiguration {
    pub fn new(
        platform: Platform,
        arch: impl Into<String>,
        buildsystem: impl Into<String>,
        config: Option<BuildType>,
    ) -> Self {
        BuildConfiguration {
            platform,
            arch: arch.into(),
            buildsystem: buildsystem.into(),
            config,
        }
    }

    /// Whether the architecture is the `std` sentinel.
    pub fn is_std_arch(&self) -> bool {
        self.arch == STD_ARCH
    }

    /// Whether this configuration uses the Gradle-based Android build.
    pub fn is_android_studio(&self) -> bool {
        self.platform == Platform::Android && self.buildsystem == ANDROID_STUDIO
    }
}

impl From<ConfigurationTuple> for BuildConfiguration {
    fn from((platform, arch, buildsystem, config): ConfigurationTuple) -> Self {
        BuildConfiguration {
            platform,
            arch,
            buildsystem,
            config,
        }
    }
}

impl From<BuildConfiguration> for ConfigurationTuple {
    fn from(c: BuildConfiguration) -> Self {
        (c.platform, c.arch, c.buildsystem, c.config)
    }
}

impl fmt::Display for BuildConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.platform, self.arch, self.buildsystem)?;
        if let Some(config) = self.config {
            write!(f, "/{}", config)?;
        }
        Ok(())
    }
}

/// Explicit command-line intent. Unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigurationFilter {
    pub platform: Option<Platform>,
    pub arch: Option<String>,
    pub buildsystem: Option<String>,
    pub config: Option<BuildType>,
}

impl ConfigurationFilter {
    /// Parse raw command-line values, validating platform and config names.
    pub fn parse(
        platform: Option<&str>,
        arch: Option<&str>,
        buildsystem: Option<&str>,
        config: Option<&str>,
    ) -> Result<Self, BauerError> {
        Ok(ConfigurationFilter {
            platform: platform.map(str::parse).transpose()?,
            arch: arch.map(str::to_string),
            buildsystem: buildsystem.map(str::to_string),
            config: config.map(str::parse).transpose()?,
        })
    }

    /// Whether `candidate` agrees with every field that is set.
    ///
    /// A requested config only filters single-config directories; a
    /// multi-config directory can build any config.
    pub fn matches(&self, candidate: &BuildConfiguration) -> bool {
        self.platform.map_or(true, |p| p == candidate.platform)
            && self.arch.as_deref().map_or(true, |a| a == candidate.arch)
            && self
                .buildsystem
                .as_deref()
                .map_or(true, |b| b == candidate.buildsystem)
            && match (self.config, candidate.config) {
                (Some(wanted), Some(have)) => wanted == have,
                _ => true,
            }
    }

    pub fn is_empty(&self) -> bool {
        self == &ConfigurationFilter::default()
    }
}
