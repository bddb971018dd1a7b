//! Typed view of the CMake server `codemodel` reply.
//!
//! The reply is parsed once into these records; optional fields default to
//! empty values so consumers never have to check for presence.

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::core::error::BauerError;

/// The kind of a CMake target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum TargetType {
    Executable,
    StaticLibrary,
    SharedLibrary,
    ModuleLibrary,
    ObjectLibrary,
    InterfaceLibrary,
    Utility,
    Other(String),
}

impl From<String> for TargetType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "EXECUTABLE" => TargetType::Executable,
            "STATIC_LIBRARY" => TargetType::StaticLibrary,
            "SHARED_LIBRARY" => TargetType::SharedLibrary,
            "MODULE_LIBRARY" => TargetType::ModuleLibrary,
            "OBJECT_LIBRARY" => TargetType::ObjectLibrary,
            "INTERFACE_LIBRARY" => TargetType::InterfaceLibrary,
            "UTILITY" => TargetType::Utility,
            _ => TargetType::Other(s),
        }
    }
}

impl TargetType {
    /// Shared or static library.
    pub fn is_linkable_library(&self) -> bool {
        matches!(self, TargetType::SharedLibrary | TargetType::StaticLibrary)
    }
}

/// The whole code model.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeModel {
    #[serde(default)]
    pub configurations: Vec<Configuration>,
}

/// One CMake configuration. Single-config generators report exactly one
/// with an empty name.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub projects: Vec<Project>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub name: String,
    #[serde(default)]
    pub source_directory: String,
    #[serde(default)]
    pub build_directory: String,
    #[serde(default)]
    pub targets: Vec<Target>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    pub name: String,
    #[serde(rename = "type")]
    pub target_type: TargetType,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub source_directory: String,
    #[serde(default)]
    pub build_directory: String,
    #[serde(default)]
    pub artifacts: Vec<String>,
    /// Raw linker command-line fragment.
    #[serde(default)]
    pub link_libraries: String,
    #[serde(default)]
    pub file_groups: Vec<FileGroup>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileGroup {
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub defines: Vec<String>,
    #[serde(default)]
    pub sources: Vec<String>,
}

impl CodeModel {
    /// Parse the payload of a `codemodel` reply.
    pub fn from_reply(reply: Value) -> Result<Self, BauerError> {
        serde_json::from_value(reply)
            .map_err(|e| BauerError::CMakeServer(format!("malformed codemodel reply: {}", e)))
    }

    /// The one and only configuration.
    ///
    /// More than one configuration is not supported by the consumers that
    /// need a single target list.
    pub fn single_configuration(&self) -> Result<&Configuration, BauerError> {
        match self.configurations.as_slice() {
            [config] => Ok(config),
            other => Err(BauerError::CMakeServer(format!(
                "number of configurations is not 1 (found {})",
                other.len()
            ))),
        }
    }

    /// Non-empty configuration names, for multi-config generators.
    pub fn configuration_names(&self) -> Vec<&str> {
        self.configurations
            .iter()
            .map(|c| c.name.as_str())
            .filter(|n| !n.is_empty())
            .collect()
    }

    /// Every target of every configuration.
    pub fn targets(&self) -> impl Iterator<Item = &Target> {
        self.configurations
            .iter()
            .flat_map(|c| c.projects.iter())
            .flat_map(|p| p.targets.iter())
    }

    /// First target with the given name in any configuration.
    pub fn find_target(&self, name: &str) -> Option<&Target> {
        self.targets().find(|t| t.name == name)
    }

    /// Look up an executable target for a build config.
    ///
    /// A configuration with an empty name stands for all configs.
    pub fn executable_target(&self, config: &str, name: &str) -> Result<&Target, BauerError> {
        let target = self
            .configurations
            .iter()
            .filter(|c| c.name.is_empty() || c.name == config)
            .inspect(|c| tracing::debug!("found config: {:?}", c.name))
            .flat_map(|c| c.projects.iter())
            .flat_map(|p| p.targets.iter())
            .find(|t| t.name == name)
            .ok_or_else(|| BauerError::ProgramArgument(format!("couldn't find module {}", name)))?;

        if target.target_type != TargetType::Executable {
            return Err(BauerError::ProgramArgument(format!(
                "module {} is not an executable",
                name
            )));
        }

        Ok(target)
    }
}

impl Target {
    /// The artifact whose file name equals the target's full name.
    pub fn executable_artifact_path(&self) -> Option<&str> {
        self.artifacts
            .iter()
            .find(|a| file_name(a) == Some(self.full_name.as_str()))
            .map(String::as_str)
    }

    /// File names of all declared artifacts.
    pub fn artifact_basenames(&self) -> impl Iterator<Item = &str> {
        self.artifacts.iter().filter_map(|a| file_name(a))
    }

    /// All preprocessor defines across file groups.
    pub fn defines(&self) -> impl Iterator<Item = &str> {
        self.file_groups
            .iter()
            .flat_map(|g| g.defines.iter())
            .map(String::as_str)
    }

    /// Value of a `NAME=value` define, if present.
    pub fn define_value(&self, name: &str) -> Option<&str> {
        self.defines().find_map(|d| match d.split_once('=') {
            Some((key, value)) if key == name => Some(value.trim_matches('"')),
            _ => None,
        })
    }
}

fn file_name(path: &str) -> Option<&str> {
    Path::new(path).file_name().and_then(|n| n.to_str())
}
