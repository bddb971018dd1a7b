//! Android SDK package management through `sdkmanager`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use thiserror::Error;

use crate::executor::HostEnvironment;
use crate::util::process::ProcessBuilder;

/// Answers to the licence prompts.
const LICENSE_ANSWERS: usize = 100;

/// A package the build can do without failed to install.
#[derive(Debug, Error)]
#[error("failed to install {package}: {reason}")]
pub struct SdkWarning {
    pub package: String,
    pub reason: String,
}

/// Drives `tools/bin/sdkmanager` of one SDK installation.
#[derive(Debug, Clone)]
pub struct SdkManager {
    android_home: PathBuf,
    sdkmanager: PathBuf,
}

impl SdkManager {
    pub fn new(android_home: &Path, host: &HostEnvironment) -> Self {
        SdkManager {
            android_home: android_home.to_path_buf(),
            sdkmanager: host.tool_path(&android_home.join("tools").join("bin"), "sdkmanager"),
        }
    }

    /// Environment every Android tool runs with.
    pub fn tool_env(&self) -> BTreeMap<String, String> {
        BTreeMap::from([(
            "ANDROID_HOME".to_string(),
            self.android_home.display().to_string(),
        )])
    }

    fn command(&self) -> ProcessBuilder {
        ProcessBuilder::new(&self.sdkmanager).envs(&self.tool_env())
    }

    pub fn license_command(&self) -> ProcessBuilder {
        self.command()
            .arg("--licenses")
            .stdin("y\n".repeat(LICENSE_ANSWERS))
    }

    pub fn install_command<S: AsRef<str>>(&self, packages: &[S]) -> ProcessBuilder {
        self.command().args(packages.iter().map(|p| p.as_ref()))
    }

    /// Accept every pending licence agreement.
    pub fn accept_licenses(&self) -> Result<()> {
        tracing::info!("Ensuring that all android license agreements are accepted ...");
        self.license_command().exec_and_check()?;
        tracing::info!("Done updating licenses.");
        Ok(())
    }

    /// Install the packages a native build needs.
    pub fn install_required(&self, build_tools_version: &str, api_version: &str) -> Result<()> {
        tracing::info!("Ensuring that all necessary android packages are installed...");
        self.install_command(&required_packages(build_tools_version, api_version))
            .run()?;
        tracing::info!("Done updating packages.");
        Ok(())
    }

    /// Install the emulator image for `abi`. Only running needs it.
    pub fn install_system_image(&self, api_version: &str, abi: &str) -> Result<(), SdkWarning> {
        let package = system_image_package(api_version, abi);
        self.install_command(&[package.as_str()])
            .run()
            .map_err(|e| SdkWarning {
                package,
                reason: format!("{:#}", e),
            })
    }
}

pub fn required_packages(build_tools_version: &str, api_version: &str) -> Vec<String> {
    vec![
        "platform-tools".to_string(),
        "ndk-bundle".to_string(),
        "extras;android;m2repository".to_string(),
        "extras;google;m2repository".to_string(),
        format!("build-tools;{}", build_tools_version),
        format!("platforms;android-{}", api_version),
    ]
}

pub fn system_image_package(api_version: &str, abi: &str) -> String {
    format!("system-images;android-{};google_apis;{}", api_version, abi)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> SdkManager {
        SdkManager::new(Path::new("/sdk"), &HostEnvironment::default())
    }

    #[test]
    fn test_required_packages() {
        assert_eq!(
            required_packages("26.0.2", "26"),
            vec![
                "platform-tools",
                "ndk-bundle",
                "extras;android;m2repository",
                "extras;google;m2repository",
                "build-tools;26.0.2",
                "platforms;android-26",
            ]
        );
        assert_eq!(
            system_image_package("26", "x86_64"),
            "system-images;android-26;google_apis;x86_64"
        );
    }

    #[test]
    fn test_commands() {
        let sdk = manager();
        let cmd = sdk.install_command(&["ndk-bundle"]);
        assert_eq!(cmd.get_program(), Path::new("/sdk/tools/bin/sdkmanager"));
        assert_eq!(cmd.get_args(), &["ndk-bundle".to_string()]);
        assert_eq!(cmd.get_env("ANDROID_HOME"), Some("/sdk"));

        let cmd = sdk.license_command();
        assert_eq!(cmd.get_args(), &["--licenses".to_string()]);
    }

    #[test]
    fn test_missing_system_image_is_a_warning() {
        let tmp = tempfile::TempDir::new().unwrap();
        let sdk = SdkManager::new(tmp.path(), &HostEnvironment::default());
        let warning = sdk.install_system_image("26", "x86_64").unwrap_err();
        assert_eq!(warning.package, "system-images;android-26;google_apis;x86_64");
    }
}
