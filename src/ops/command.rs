//! Command processing.
//!
//! Every command resolves its configurations first and then processes them
//! one after the other. Each build directory's state is loaded before its
//! configuration is processed and stored only when processing succeeded.

use std::fmt;
use std::str::FromStr;

use anyhow::Result;

use crate::core::error::BauerError;
use crate::core::{BuildConfiguration, ConfigurationFilter, GeneratorState};
use crate::executor::{executor_for, ExecutorContext};
use crate::ops::resolve::ConfigurationResolver;
use crate::util::fs::remove_dir_all_if_exists;
use crate::util::shell::{Shell, Status};

/// A bauer command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Prepare,
    Build,
    Clean,
    DistClean,
    Run,
    Package,
}

impl Command {
    pub const ALL: [Command; 6] = [
        Command::Prepare,
        Command::Build,
        Command::Clean,
        Command::DistClean,
        Command::Run,
        Command::Package,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Prepare => "prepare",
            Command::Build => "build",
            Command::Clean => "clean",
            Command::DistClean => "distclean",
            Command::Run => "run",
            Command::Package => "package",
        }
    }

    /// Whether the command may prepare a configuration that has no build
    /// directory yet.
    pub fn creates_configurations(&self) -> bool {
        !matches!(self, Command::Clean | Command::DistClean)
    }

    fn status(&self) -> Status {
        match self {
            Command::Prepare => Status::Preparing,
            Command::Build => Status::Building,
            Command::Clean | Command::DistClean => Status::Cleaning,
            Command::Run => Status::Running,
            Command::Package => Status::Packaging,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Command {
    type Err = BauerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Command::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| BauerError::ProgramArgument(format!("Invalid command: '{}'", s)))
    }
}

/// Runs one command against every resolved configuration.
pub struct CommandProcessor<'a> {
    ctx: &'a ExecutorContext<'a>,
    shell: &'a Shell,
}

impl<'a> CommandProcessor<'a> {
    pub fn new(ctx: &'a ExecutorContext<'a>, shell: &'a Shell) -> Self {
        CommandProcessor { ctx, shell }
    }

    /// The configurations `command` would process.
    pub fn resolve(&self, command: Command, filter: &ConfigurationFilter) -> Result<Vec<BuildConfiguration>> {
        ConfigurationResolver::new(self.ctx.layout, self.ctx.generators, self.ctx.host.is_apple)
            .resolve(filter, command.creates_configurations())
    }

    pub fn process(&self, command: Command, filter: &ConfigurationFilter) -> Result<()> {
        tracing::debug!("Starting command: {}", command);
        let configurations = self.resolve(command, filter)?;

        for configuration in &configurations {
            if command == Command::DistClean {
                self.dist_clean(configuration)?;
            } else {
                self.process_configuration(command, configuration)?;
            }
        }
        Ok(())
    }

    fn process_configuration(&self, command: Command, configuration: &BuildConfiguration) -> Result<()> {
        let build_dir = self.ctx.layout.build_dir(configuration);
        let span = self.shell.span(command.status(), configuration);

        GeneratorState::scoped(&build_dir, |state| {
            if state.conflicts_with(configuration) {
                tracing::info!(
                    "Build system does not match the one used when the projects for this platform were first prepared. Cleaning existing build files."
                );
                if let Some(old) = state.build_configuration() {
                    tracing::debug!("Old config: {}", old);
                }
                tracing::debug!("New config: {}", configuration);
                remove_dir_all_if_exists(&build_dir)?;
                state.clear();
            }
            state.set_build_configuration(configuration)?;

            let mut executor = executor_for(configuration, self.ctx);
            match command {
                Command::Prepare => executor.prepare(configuration, state),
                Command::Build => {
                    executor.prepare(configuration, state)?;
                    executor.build(configuration)
                }
                Command::Clean => executor.clean(configuration),
                Command::Run => {
                    executor.prepare(configuration, state)?;
                    executor.run(configuration)
                }
                Command::Package => {
                    executor.prepare(configuration, state)?;
                    executor.package(configuration)
                }
                Command::DistClean => unreachable!("distclean never loads state"),
            }
        })?;

        span.finish();
        Ok(())
    }

    fn dist_clean(&self, configuration: &BuildConfiguration) -> Result<()> {
        let build_dir = self.ctx.layout.build_dir(configuration);
        tracing::info!("Cleaning {}", build_dir.display());
        remove_dir_all_if_exists(&build_dir)?;
        self.shell.status(Status::Removed, build_dir.display());
        Ok(())
    }
}
