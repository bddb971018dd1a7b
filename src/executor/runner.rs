//! Running built programs.
//!
//! Desktop programs are started directly. Everything that needs a device or
//! simulator is handed to a [`DeviceLauncher`].

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use crate::core::error::BauerError;
use crate::core::BuildConfiguration;
use crate::executor::ExecutorContext;
use crate::util::process::ProcessBuilder;

/// What a device launcher needs to start a program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    pub configuration: BuildConfiguration,
    pub build_dir: PathBuf,
    /// Executable, app bundle, web page or APK
    pub artifact: PathBuf,
    /// Android application id
    pub package_id: Option<String>,
    pub params: Vec<String>,
}

/// Starts a program on a simulator, emulator or browser and reports its
/// exit code.
pub trait DeviceLauncher {
    fn launch(&self, request: &LaunchRequest) -> Result<i32>;
}

/// Runs a host executable with inherited stdio.
#[derive(Debug, Clone)]
pub struct DesktopRunner {
    executable: PathBuf,
}

impl DesktopRunner {
    pub fn new(executable: &Path) -> Self {
        DesktopRunner {
            executable: executable.to_path_buf(),
        }
    }

    pub fn command(&self, params: &[String]) -> ProcessBuilder {
        let mut cmd = ProcessBuilder::new(&self.executable).args(params);
        if let Some(dir) = self.executable.parent().filter(|d| !d.as_os_str().is_empty()) {
            cmd = cmd.cwd(dir);
        }
        cmd
    }

    pub fn run(&self, params: &[String]) -> Result<()> {
        let cmd = self.command(params);
        tracing::info!("Running: {}", cmd.display_command());
        let status = cmd.status()?;
        // A signal leaves no code; report it as a generic failure.
        check_exit_code(status.code().unwrap_or(-1))
    }
}

/// Map a program exit code to success or [`BauerError::ApplicationFailed`].
pub fn check_exit_code(exit_code: i32) -> Result<()> {
    if exit_code != 0 {
        return Err(BauerError::ApplicationFailed { exit_code }.into());
    }
    Ok(())
}

/// Hand a built artifact to the configured device launcher.
pub fn run_on_device(
    ctx: &ExecutorContext<'_>,
    configuration: &BuildConfiguration,
    artifact: &Path,
    package_id: Option<&str>,
) -> Result<()> {
    let request = LaunchRequest {
        configuration: configuration.clone(),
        build_dir: ctx.layout.build_dir(configuration),
        artifact: artifact.to_path_buf(),
        package_id: package_id.map(str::to_string),
        params: ctx.options.run_params.clone(),
    };

    let Some(launcher) = ctx.launcher else {
        bail!(
            "running {} programs needs a device launcher, none is available in this build",
            configuration.platform
        );
    };

    tracing::debug!("Launching {}", request.artifact.display());
    check_exit_code(launcher.launch(&request)?)
}
