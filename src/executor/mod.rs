//! Platform executors.
//!
//! An executor turns one resolved [`BuildConfiguration`] into tool
//! invocations. Two families exist:
//!
//! - [`CMakeExecutor`]: configure through the cmake server, build with
//!   `cmake --build`. Used for every platform except Android Studio builds.
//! - [`AndroidExecutor`]: enumerate native targets with a throwaway cmake
//!   configure, write a Gradle project, build with `gradlew`.
//!
//! A fresh executor is created for every configuration, so the code model
//! an executor keeps after `prepare` always belongs to that configuration.

pub mod android;
pub mod cmake;
pub mod emscripten;
pub mod host;
pub mod runner;

use std::path::Path;

use anyhow::Result;

use crate::cmake::GeneratorInfo;
use crate::core::{BuildConfiguration, BuildDirectoryLayout, BuildType, GeneratorState};
use crate::util::config::Config;

pub use android::AndroidExecutor;
pub use cmake::{CMakeExecutor, CMakeInvocation};
pub use emscripten::{EmscriptenSdk, Emsdk};
pub use host::{CompilerInfo, HostEnvironment};
pub use runner::{DesktopRunner, DeviceLauncher, LaunchRequest};

/// Per-invocation options taken from the command line.
#[derive(Debug, Clone, Default)]
pub struct ExecutionOptions {
    /// Target (module) to build or run
    pub target: Option<String>,
    /// Build type requested with `--config`
    pub config: Option<BuildType>,
    pub jobs: Option<usize>,
    /// Extra cache entries, `NAME=VALUE` or `-DNAME=VALUE`
    pub cmake_options: Vec<String>,
    pub package_generator: Option<String>,
    pub package_folder: Option<String>,
    pub macos_sdk_path: Option<String>,
    pub macos_min_version: Option<String>,
    pub accept_terms: bool,
    /// Trailing arguments passed to the program on `run`
    pub run_params: Vec<String>,
}

/// Everything an executor may read. Built once per command.
pub struct ExecutorContext<'a> {
    pub source_dir: &'a Path,
    pub layout: &'a BuildDirectoryLayout,
    pub generators: &'a GeneratorInfo,
    pub host: &'a HostEnvironment,
    pub config: &'a Config,
    pub options: &'a ExecutionOptions,
    pub emscripten: &'a dyn EmscriptenSdk,
    pub launcher: Option<&'a dyn DeviceLauncher>,
}

/// Drives the tools for one platform family.
pub trait PlatformExecutor {
    /// Configure the build directory. `state` is the directory's persisted
    /// state and is stored by the caller once processing succeeds.
    fn prepare(&mut self, configuration: &BuildConfiguration, state: &mut GeneratorState)
        -> Result<()>;

    /// Build the requested target, or everything.
    fn build(&mut self, configuration: &BuildConfiguration) -> Result<()>;

    fn clean(&mut self, configuration: &BuildConfiguration) -> Result<()>;

    fn package(&mut self, configuration: &BuildConfiguration) -> Result<()>;

    /// Run the requested target. Requires a preceding `prepare`.
    fn run(&mut self, configuration: &BuildConfiguration) -> Result<()>;
}

/// The executor responsible for `configuration`.
pub fn executor_for<'a>(
    configuration: &BuildConfiguration,
    ctx: &'a ExecutorContext<'a>,
) -> Box<dyn PlatformExecutor + 'a> {
    if configuration.is_android_studio() {
        Box::new(AndroidExecutor::new(ctx))
    } else {
        Box::new(CMakeExecutor::new(ctx))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::Cell;
    use std::path::PathBuf;

    use anyhow::Result;
    use tempfile::TempDir;

    use super::*;

    pub const HELP: &str = "Generators

The following generators are available on this platform:
  Visual Studio 15 2017 [arch] = Generates Visual Studio 2017 project files.
  Unix Makefiles               = Generates standard UNIX makefiles.
  Ninja                        = Generates build.ninja files.
  Xcode                        = Generate Xcode project files.
";

    /// Emscripten SDK stand-in that only counts activations.
    pub struct FakeEmscripten {
        pub version: String,
        pub activations: Cell<usize>,
    }

    impl EmscriptenSdk for FakeEmscripten {
        fn version(&self) -> String {
            self.version.clone()
        }

        fn root_path(&self) -> PathBuf {
            PathBuf::from("/opt/emsdk/emscripten/tag-1.38.0")
        }

        fn ensure_active(&self) -> Result<()> {
            self.activations.set(self.activations.get() + 1);
            Ok(())
        }
    }

    /// Owns everything an [`ExecutorContext`] borrows.
    pub struct Fixture {
        pub tmp: TempDir,
        pub layout: BuildDirectoryLayout,
        pub generators: GeneratorInfo,
        pub host: HostEnvironment,
        pub config: Config,
        pub options: ExecutionOptions,
        pub emscripten: FakeEmscripten,
    }

    impl Fixture {
        pub fn new() -> Self {
            let tmp = TempDir::new().unwrap();
            let layout = BuildDirectoryLayout::new(tmp.path().join("build"));
            Fixture {
                layout,
                generators: GeneratorInfo::from_help_output(HELP),
                host: HostEnvironment::default(),
                config: Config::default(),
                options: ExecutionOptions::default(),
                emscripten: FakeEmscripten {
                    version: "1.38.0-64bit".to_string(),
                    activations: Cell::new(0),
                },
                tmp,
            }
        }

        pub fn source_dir(&self) -> &Path {
            self.tmp.path()
        }

        /// Create an empty toolchain file below the source directory.
        pub fn add_toolchain(&self, name: &str) -> PathBuf {
            let dir = self.tmp.path().join("cmake").join("toolchains");
            std::fs::create_dir_all(&dir).unwrap();
            let path = dir.join(name);
            std::fs::write(&path, "").unwrap();
            path
        }

        pub fn ctx(&self) -> ExecutorContext<'_> {
            ExecutorContext {
                source_dir: self.tmp.path(),
                layout: &self.layout,
                generators: &self.generators,
                host: &self.host,
                config: &self.config,
                options: &self.options,
                emscripten: &self.emscripten,
                launcher: None,
            }
        }
    }
}
