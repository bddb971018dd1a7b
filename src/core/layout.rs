//! On-disk build directory layout.
//!
//! ```text
//! <build root>/<platform>/<arch>/<buildsystem>[/<config>]/.generateProjects.state
//! ```
//!
//! The state file marks a directory as prepared. Multi-config build systems
//! keep it at the buildsystem level, single-config build systems inside each
//! `Debug`/`Release` subdirectory.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::core::configuration::{BuildConfiguration, BuildType, ConfigurationFilter, Platform};
use crate::core::state::STATE_FILE_NAME;

/// Maps build configurations to directories below a build root.
#[derive(Debug, Clone)]
pub struct BuildDirectoryLayout {
    root: PathBuf,
}

impl BuildDirectoryLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        BuildDirectoryLayout { root: root.into() }
    }

    /// The base build root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory for one configuration.
    pub fn build_dir(&self, config: &BuildConfiguration) -> PathBuf {
        let mut dir = self
            .root
            .join(config.platform.as_str())
            .join(&config.arch)
            .join(&config.buildsystem);
        if let Some(build_type) = config.config {
            dir.push(build_type.as_str());
        }
        dir
    }

    /// Scan the build root for prepared configurations.
    ///
    /// Directories named after unknown platforms are skipped. A missing build
    /// root yields an empty list. A marker only counts at the depth the build
    /// system keeps it: inside `Debug`/`Release` when `is_single_config`
    /// holds for it, at the buildsystem level otherwise.
    pub fn existing_configurations(
        &self,
        is_single_config: impl Fn(&str) -> bool,
    ) -> Vec<BuildConfiguration> {
        let mut found = Vec::new();

        let walker = WalkDir::new(&self.root)
            .min_depth(3)
            .max_depth(4)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.file_type().is_dir());

        for entry in walker.filter_map(Result::ok) {
            if !entry.path().join(STATE_FILE_NAME).is_file() {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };

            let parts: Vec<&str> = relative
                .components()
                .filter_map(|c| c.as_os_str().to_str())
                .collect();

            let Some(config) = Self::parse_components(&parts) else {
                continue;
            };
            if is_single_config(&config.buildsystem) != config.config.is_some() {
                tracing::debug!(
                    "ignoring misplaced state file in {}",
                    entry.path().display()
                );
                continue;
            }
            tracing::debug!("found prepared configuration {}", config);
            found.push(config);
        }

        found
    }

    /// Prepared configurations that agree with the filter.
    pub fn matching_configurations(
        &self,
        candidates: &[BuildConfiguration],
        filter: &ConfigurationFilter,
    ) -> Vec<BuildConfiguration> {
        candidates
            .iter()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect()
    }

    fn parse_components(parts: &[&str]) -> Option<BuildConfiguration> {
        let (platform, arch, buildsystem, config) = match parts {
            [platform, arch, buildsystem] => (platform, arch, buildsystem, None),
            [platform, arch, buildsystem, config] => {
                (platform, arch, buildsystem, Some(config.parse::<BuildType>().ok()?))
            }
            _ => return None,
        };

        let platform = platform.parse::<Platform>().ok()?;
        Some(BuildConfiguration::new(platform, *arch, *buildsystem, config))
    }
}
