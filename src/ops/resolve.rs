//! Configuration resolution.
//!
//! Turns the partial intent given on the command line into the concrete
//! configurations a command acts on. Prepared directories are preferred;
//! a new configuration is only synthesized when nothing prepared matches.

use anyhow::Result;

use crate::cmake::GeneratorInfo;
use crate::core::error::BauerError;
use crate::core::{
    BuildConfiguration, BuildDirectoryLayout, BuildType, ConfigurationFilter, Platform,
    ANDROID_STUDIO, STD_ARCH,
};

/// Decides which configurations a command runs for.
pub struct ConfigurationResolver<'a> {
    layout: &'a BuildDirectoryLayout,
    generators: &'a GeneratorInfo,
    apple_host: bool,
}

impl<'a> ConfigurationResolver<'a> {
    pub fn new(layout: &'a BuildDirectoryLayout, generators: &'a GeneratorInfo, apple_host: bool) -> Self {
        ConfigurationResolver {
            layout,
            generators,
            apple_host,
        }
    }

    /// Resolve `filter` to a non-empty list of configurations.
    ///
    /// With `allow_new` unset only prepared configurations are returned and
    /// an empty result is a [`BauerError::PreparedState`].
    pub fn resolve(
        &self,
        filter: &ConfigurationFilter,
        allow_new: bool,
    ) -> Result<Vec<BuildConfiguration>> {
        let existing = self
            .layout
            .existing_configurations(|buildsystem| self.generators.is_single_config(buildsystem));
        let matched = self.layout.matching_configurations(&existing, filter);

        tracing::debug!("Selected configurations:");
        for config in &matched {
            tracing::debug!("* {}", config);
        }

        if !matched.is_empty() {
            return Ok(matched);
        }

        if !allow_new {
            return Err(BauerError::PreparedState(format!(
                "no prepared build directory matches the selection in {}",
                self.layout.root().display()
            ))
            .into());
        }

        let configuration = self.new_configuration(filter)?;
        tracing::debug!("No prepared configuration matches, using {}", configuration);
        Ok(vec![configuration])
    }

    /// A configuration for a directory that has not been prepared yet.
    pub fn new_configuration(&self, filter: &ConfigurationFilter) -> Result<BuildConfiguration, BauerError> {
        let (platform, buildsystem) = match (filter.platform, filter.buildsystem.as_deref()) {
            (Some(platform), Some(buildsystem)) => (platform, buildsystem.to_string()),
            (platform, None) => {
                let (platform, buildsystem) = default_buildsystem(platform, self.apple_host)?;
                (platform, buildsystem.to_string())
            }
            (None, Some(_)) => {
                return Err(BauerError::IncorrectCall(
                    "--platform PLATFORM must be specified when prepare is first called."
                        .to_string(),
                ))
            }
        };

        let config = if self.generators.is_single_config(&buildsystem) {
            Some(filter.config.unwrap_or(BuildType::Debug))
        } else {
            None
        };

        let arch = filter.arch.as_deref().unwrap_or(STD_ARCH);
        Ok(BuildConfiguration::new(platform, arch, buildsystem, config))
    }
}

/// The build system used for a platform when none was given.
pub fn default_buildsystem(
    platform: Option<Platform>,
    apple_host: bool,
) -> Result<(Platform, &'static str), BauerError> {
    match platform {
        None if apple_host => Ok((Platform::Ios, "Xcode")),
        None => Ok((Platform::Android, ANDROID_STUDIO)),
        Some(Platform::Android) => Ok((Platform::Android, ANDROID_STUDIO)),
        Some(platform @ (Platform::Ios | Platform::Mac)) => Ok((platform, "Xcode")),
        Some(platform @ (Platform::WebEms | Platform::Linux)) => Ok((platform, "Unix Makefiles")),
        Some(platform) => Err(BauerError::IncorrectCall(format!(
            "--build-system BUILDSYSTEM must be specified when prepare is first called for platform {}.",
            platform
        ))),
    }
}
