//! CLI definitions using clap.
//!
//! Every option also reads a `BAUER_*` environment variable when it is not
//! given on the command line.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use bauer::core::error::BauerError;
use bauer::core::ConfigurationFilter;
use bauer::executor::ExecutionOptions;
use bauer::Command;

/// bauer - build orchestration on top of CMake
#[derive(Parser)]
#[command(name = "bauer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug output
    #[arg(short = 'd', long = "enable-debug-output", global = true, env = "BAUER_ENABLE_DEBUG_OUTPUT")]
    pub debug: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Prepare the build directories (runs cmake)
    Prepare {
        #[command(flatten)]
        selection: SelectionArgs,
        #[command(flatten)]
        configure: ConfigureArgs,
    },

    /// Prepare and build
    Build {
        #[command(flatten)]
        selection: SelectionArgs,
        #[command(flatten)]
        configure: ConfigureArgs,
        #[command(flatten)]
        build: BuildArgs,
    },

    /// Remove build output of prepared configurations
    Clean {
        #[command(flatten)]
        selection: SelectionArgs,
        #[command(flatten)]
        build: BuildArgs,
    },

    /// Delete the build directories of prepared configurations
    #[command(name = "distclean")]
    DistClean {
        #[command(flatten)]
        selection: SelectionArgs,
    },

    /// Prepare and run a target
    Run {
        #[command(flatten)]
        selection: SelectionArgs,
        #[command(flatten)]
        configure: ConfigureArgs,
        #[command(flatten)]
        build: BuildArgs,

        /// Arguments passed to the program (after --)
        #[arg(last = true)]
        params: Vec<String>,
    },

    /// Prepare and build the package target
    Package {
        #[command(flatten)]
        selection: SelectionArgs,
        #[command(flatten)]
        configure: ConfigureArgs,
        #[command(flatten)]
        build: BuildArgs,
    },
}

/// Which configurations a command applies to.
#[derive(Args, Debug, Default)]
pub struct SelectionArgs {
    /// Target platform (see below)
    #[arg(short, long, env = "BAUER_PLATFORM")]
    pub platform: Option<String>,

    /// Build system or cmake generator name (aliases like `make` or `vs2017` work)
    #[arg(short, long = "build-system", env = "BAUER_BUILD_SYSTEM")]
    pub build_system: Option<String>,

    /// Build type: Debug or Release
    #[arg(short, long, env = "BAUER_CONFIG")]
    pub config: Option<String>,

    /// Architecture; `std` selects the platform default
    #[arg(short, long, env = "BAUER_ARCH")]
    pub arch: Option<String>,

    /// Root of all build directories
    #[arg(long, env = "BAUER_BUILD_FOLDER")]
    pub build_folder: Option<PathBuf>,
}

/// Options that influence how build directories are configured.
#[derive(Args, Debug, Default)]
pub struct ConfigureArgs {
    /// Extra cmake cache entry, e.g. -D FOO=1 (repeatable)
    #[arg(short = 'D', long = "cmake-option", env = "BAUER_CMAKE_OPTION")]
    pub cmake_options: Vec<String>,

    /// Accept the Android SDK licence agreements
    #[arg(long, env = "BAUER_ACCEPT_TERMS")]
    pub accept_terms: bool,

    /// CPack generator used by `package`
    #[arg(long, env = "BAUER_PACKAGE_GENERATOR")]
    pub package_generator: Option<String>,

    /// Package output folder, relative to the build folder
    #[arg(long, env = "BAUER_PACKAGE_FOLDER")]
    pub package_folder: Option<String>,

    /// macOS SDK to build against
    #[arg(long, env = "BAUER_MACOS_SDK_PATH")]
    pub macos_sdk_path: Option<String>,

    /// Minimum macOS version
    #[arg(long, env = "BAUER_MACOS_MIN_VERSION")]
    pub macos_min_version: Option<String>,
}

/// Options of the build step.
#[derive(Args, Debug, Default)]
pub struct BuildArgs {
    /// Target to build or run
    #[arg(short, long, env = "BAUER_TARGET")]
    pub target: Option<String>,

    /// Number of parallel jobs
    #[arg(short, long, env = "BAUER_JOBS")]
    pub jobs: Option<usize>,
}

/// A parsed command line, split into what the library needs.
pub struct Invocation {
    pub command: Command,
    pub filter: ConfigurationFilter,
    pub options: ExecutionOptions,
    pub build_folder: Option<PathBuf>,
}

impl Commands {
    /// Validate names and split into command, filter and options.
    pub fn into_invocation(self) -> Result<Invocation, BauerError> {
        let (command, selection, configure, build, params) = match self {
            Commands::Prepare { selection, configure } => {
                (Command::Prepare, selection, configure, BuildArgs::default(), Vec::new())
            }
            Commands::Build { selection, configure, build } => {
                (Command::Build, selection, configure, build, Vec::new())
            }
            Commands::Clean { selection, build } => {
                (Command::Clean, selection, ConfigureArgs::default(), build, Vec::new())
            }
            Commands::DistClean { selection } => (
                Command::DistClean,
                selection,
                ConfigureArgs::default(),
                BuildArgs::default(),
                Vec::new(),
            ),
            Commands::Run { selection, configure, build, params } => {
                (Command::Run, selection, configure, build, params)
            }
            Commands::Package { selection, configure, build } => {
                (Command::Package, selection, configure, build, Vec::new())
            }
        };

        let filter = ConfigurationFilter::parse(
            selection.platform.as_deref(),
            selection.arch.as_deref(),
            selection.build_system.as_deref(),
            selection.config.as_deref(),
        )?;

        let options = ExecutionOptions {
            target: build.target,
            config: filter.config,
            jobs: build.jobs,
            cmake_options: configure.cmake_options,
            package_generator: configure.package_generator,
            package_folder: configure.package_folder,
            macos_sdk_path: configure.macos_sdk_path,
            macos_min_version: configure.macos_min_version,
            accept_terms: configure.accept_terms,
            run_params: params,
        };

        Ok(Invocation {
            command,
            filter,
            options,
            build_folder: selection.build_folder,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_invocation() {
        let cli = Cli::try_parse_from([
            "bauer", "run", "-p", "linux", "-b", "make", "-c", "Release", "-t", "app", "--", "--fast",
        ])
        .unwrap();
        let invocation = cli.command.into_invocation().unwrap();

        assert_eq!(invocation.command, Command::Run);
        assert_eq!(invocation.options.target.as_deref(), Some("app"));
        assert_eq!(invocation.options.run_params, vec!["--fast"]);
        assert_eq!(invocation.options.config, Some(bauer::BuildType::Release));
        assert_eq!(invocation.filter.buildsystem.as_deref(), Some("make"));
    }

    #[test]
    fn test_invalid_platform() {
        let cli = Cli::try_parse_from(["bauer", "prepare", "-p", "amiga"]).unwrap();
        assert!(matches!(
            cli.command.into_invocation(),
            Err(BauerError::InvalidPlatformName(_))
        ));
    }

    #[test]
    fn test_repeated_cmake_options() {
        let cli = Cli::try_parse_from(["bauer", "prepare", "-D", "A=1", "-D", "B=2"]).unwrap();
        let invocation = cli.command.into_invocation().unwrap();
        assert_eq!(invocation.options.cmake_options, vec!["A=1", "B=2"]);
    }
}
