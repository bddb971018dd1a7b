//! Generic CMake executor.
//!
//! Prepare translates the configuration into cmake cache arguments and
//! configures through the cmake server. Build, clean and package all go
//! through `cmake --build`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::cmake::{CMakeServer, CodeModel, OpenRequest};
use crate::core::error::BauerError;
use crate::core::{BuildConfiguration, BuildType, GeneratorState, Platform};
use crate::executor::android::{android_abi, ndk_cmake_arguments};
use crate::executor::runner::{run_on_device, DesktopRunner};
use crate::executor::{ExecutorContext, PlatformExecutor};
use crate::util::fs::{ensure_dir, remove_dir_all_if_exists};
use crate::util::process::ProcessBuilder;

/// State key for the emscripten version a webems directory was prepared with.
pub const EMS_SDK_VERSION_KEY: &str = "emsSdkVersion";

const WINUWP_SYSTEM_VERSION: &str = "10.0.10240.0";

/// Everything needed to configure one build directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CMakeInvocation {
    /// Full generator name, including any architecture suffix
    pub generator: String,
    pub cache_args: Vec<String>,
    /// Environment for the cmake server process
    pub env: BTreeMap<String, String>,
    /// Whether the build directory must be wiped before configuring
    pub clean_first: bool,
}

pub struct CMakeExecutor<'a> {
    ctx: &'a ExecutorContext<'a>,
    code_model: Option<CodeModel>,
}

impl<'a> CMakeExecutor<'a> {
    pub fn new(ctx: &'a ExecutorContext<'a>) -> Self {
        CMakeExecutor {
            ctx,
            code_model: None,
        }
    }

    /// Code model of the last prepare.
    pub fn code_model(&self) -> Option<&CodeModel> {
        self.code_model.as_ref()
    }

    /// Work out generator, cache arguments and environment for `configuration`.
    ///
    /// Records executor-specific keys in `state` (the emscripten version for
    /// webems).
    pub fn cmake_invocation(
        &self,
        configuration: &BuildConfiguration,
        state: &mut GeneratorState,
    ) -> Result<CMakeInvocation> {
        let ctx = self.ctx;
        let mut invocation = CMakeInvocation {
            generator: ctx
                .generators
                .cmake_generator_name(&configuration.buildsystem)
                .to_string(),
            ..CMakeInvocation::default()
        };
        let mut toolchain_file = None;

        if let Some(generator) = ctx
            .options
            .package_generator
            .as_ref()
            .or(ctx.config.package.generator.as_ref())
        {
            invocation.cache_args.push(format!("-DCPACK_GENERATOR={}", generator));
        }

        if let Some(folder) = ctx
            .options
            .package_folder
            .as_ref()
            .or(ctx.config.package.folder.as_ref())
        {
            let folder = ctx.layout.root().join(folder);
            invocation
                .cache_args
                .push(format!("-DCPACK_OUTPUT_FILE_PREFIX={}", folder.display()));
        }

        let arch = configuration.arch.as_str();
        match configuration.platform {
            Platform::Win32 | Platform::WinUwp => {
                if configuration.platform == Platform::WinUwp {
                    invocation.cache_args.extend([
                        "-DCMAKE_SYSTEM_NAME=WindowsStore".to_string(),
                        format!("-DCMAKE_SYSTEM_VERSION={}", WINUWP_SYSTEM_VERSION),
                    ]);
                }
                // `-A` does not make cmake find the right compiler, the
                // architecture has to be part of the generator name.
                if !configuration.is_std_arch() {
                    if !invocation.generator.contains("Visual Studio") {
                        return Err(BauerError::invalid_arch(configuration.platform, arch).into());
                    }
                    match arch {
                        "x64" => invocation.generator.push_str(" Win64"),
                        "arm" => invocation.generator.push_str(" ARM"),
                        _ => {
                            return Err(
                                BauerError::invalid_arch(configuration.platform, arch).into()
                            )
                        }
                    }
                }
            }

            Platform::Mac => {
                if !configuration.is_std_arch() {
                    return Err(BauerError::invalid_arch(configuration.platform, arch).into());
                }
                if let Some(sdk) = ctx
                    .options
                    .macos_sdk_path
                    .as_ref()
                    .or(ctx.config.macos.sdk_path.as_ref())
                {
                    invocation.cache_args.push(format!("-DCMAKE_OSX_SYSROOT={}", sdk));
                }
                if let Some(min) = ctx
                    .options
                    .macos_min_version
                    .as_ref()
                    .or(ctx.config.macos.min_version.as_ref())
                {
                    invocation
                        .cache_args
                        .push(format!("-DCMAKE_OSX_DEPLOYMENT_TARGET={}", min));
                }
            }

            Platform::Ios => {
                let ios_platform = match arch {
                    "std" | "simulator" => "SIMULATOR64",
                    "device" => "OS",
                    _ => return Err(BauerError::invalid_arch(configuration.platform, arch).into()),
                };
                invocation
                    .cache_args
                    .push(format!("-DIOS_PLATFORM={}", ios_platform));
                toolchain_file = Some(self.toolchain_file("ios.toolchain.cmake")?);
            }

            Platform::WebEms => {
                if !configuration.is_std_arch() {
                    return Err(BauerError::invalid_arch(configuration.platform, arch).into());
                }
                let sdk = ctx.emscripten;
                let version = sdk.version();

                if let Some(prepared) = state.get::<String>(EMS_SDK_VERSION_KEY) {
                    if prepared != version {
                        tracing::info!(
                            "Project was previously prepared for different Emscripten version ({} vs. {}). Auto-cleaning old build files.",
                            prepared,
                            version
                        );
                        invocation.clean_first = true;
                    }
                }
                state.set(EMS_SDK_VERSION_KEY, &version)?;

                sdk.ensure_active()?;

                invocation.cache_args.push(format!(
                    "-DEMSCRIPTEN_ROOT_PATH={}",
                    sdk.root_path().display()
                ));
                toolchain_file = Some(self.toolchain_file("emscripten.toolchain.cmake")?);
            }

            Platform::Linux => {
                let compilers = &ctx.host.compilers;
                // GCC 4 ships a standard library with too many bugs.
                if compilers.gcc_major() == Some(4) && compilers.has_clang() {
                    tracing::info!(
                        "Forcing use of clang instead of GCC because of bugs in this GCC version."
                    );
                    if !configuration.is_std_arch() {
                        return Err(BauerError::invalid_arch(configuration.platform, arch).into());
                    }
                    invocation.env = compiler_env("clang", "clang++");
                } else {
                    match arch {
                        "std" => {}
                        "clang" => invocation.env = compiler_env("clang", "clang++"),
                        "gcc" => invocation.env = compiler_env("gcc", "g++"),
                        _ => {
                            return Err(
                                BauerError::invalid_arch(configuration.platform, arch).into()
                            )
                        }
                    }
                }
            }

            Platform::Android => {
                let android_home = ctx.host.require_android_home()?;
                invocation.cache_args.extend(ndk_cmake_arguments(android_home));
                invocation.cache_args.push(format!(
                    "-DANDROID_ABI={}",
                    android_abi(&configuration.arch)
                ));
            }

            Platform::DotNet => {}
        }

        if let Some(path) = toolchain_file {
            invocation
                .cache_args
                .push(format!("-DCMAKE_TOOLCHAIN_FILE={}", path.display()));
        }

        if let Some(build_type) = configuration.config {
            invocation
                .cache_args
                .push(format!("-DCMAKE_BUILD_TYPE={}", build_type));
        }

        invocation
            .cache_args
            .extend(ctx.options.cmake_options.iter().map(|option| {
                if option.starts_with("-D") {
                    option.clone()
                } else {
                    format!("-D{}", option)
                }
            }));

        Ok(invocation)
    }

    fn toolchain_file(&self, name: &str) -> Result<PathBuf, BauerError> {
        let path = self
            .ctx
            .source_dir
            .join("cmake")
            .join("toolchains")
            .join(name);
        if path.is_file() {
            Ok(path)
        } else {
            Err(BauerError::CMakeProblem {
                message: format!("required CMake toolchain file not found: {}", path.display()),
                stderr: String::new(),
            })
        }
    }

    /// The `cmake --build` invocations for `target`, one per build config.
    ///
    /// Single-config generators never get `--config`. Multi-config
    /// generators build the requested config, or every config of the code
    /// model when none was requested.
    pub fn build_commands(
        &self,
        cmake: &Path,
        configuration: &BuildConfiguration,
        target: Option<&str>,
    ) -> Vec<ProcessBuilder> {
        let ctx = self.ctx;
        let build_dir = ctx.layout.build_dir(configuration);
        let single_config = ctx.generators.is_single_config(&configuration.buildsystem);
        let generator = ctx.generators.cmake_generator_name(&configuration.buildsystem);

        let configs: Vec<Option<String>> = match ctx.options.config.or(configuration.config) {
            _ if single_config => vec![None],
            Some(config) => vec![Some(config.to_string())],
            None => match &self.code_model {
                Some(model) if !model.configuration_names().is_empty() => model
                    .configuration_names()
                    .into_iter()
                    .map(|name| Some(name.to_string()))
                    .collect(),
                _ => vec![None],
            },
        };

        configs
            .into_iter()
            .map(|config| {
                let mut cmd = ProcessBuilder::new(cmake)
                    .arg("--build")
                    .arg(&build_dir)
                    .cwd(&build_dir);

                if let Some(target) = target {
                    cmd = cmd.args(["--target", target]);
                }
                if let Some(config) = config {
                    cmd = cmd.args(["--config", config.as_str()]);
                }
                if let Some(jobs) = ctx.options.jobs {
                    if generator.contains("Visual Studio") {
                        cmd = cmd.env("CL", format!("/MP{}", jobs));
                    } else if generator.contains("Xcode") {
                        // xcodebuild takes no job count.
                    } else {
                        cmd = cmd.args(["--".to_string(), format!("-j{}", jobs)]);
                    }
                }
                cmd
            })
            .collect()
    }

    fn build_target(&self, configuration: &BuildConfiguration, target: Option<&str>) -> Result<()> {
        let cmake = self.ctx.generators.ensure_have_cmake()?;
        for cmd in self.build_commands(cmake, configuration, target) {
            cmd.run()?;
        }
        Ok(())
    }

    fn run_config_name(&self, configuration: &BuildConfiguration) -> Result<BuildType> {
        self.ctx
            .options
            .config
            .or(configuration.config)
            .ok_or_else(|| {
                BauerError::ProgramArgument(
                    "Please specify the configuration name with --config CONFIG".to_string(),
                )
                .into()
            })
    }
}

impl PlatformExecutor for CMakeExecutor<'_> {
    fn prepare(
        &mut self,
        configuration: &BuildConfiguration,
        state: &mut GeneratorState,
    ) -> Result<()> {
        let ctx = self.ctx;
        let cmake = ctx.generators.ensure_have_cmake()?.to_path_buf();
        let invocation = self.cmake_invocation(configuration, state)?;
        let build_dir = ctx.layout.build_dir(configuration);

        if invocation.clean_first {
            remove_dir_all_if_exists(&build_dir)?;
        }
        ensure_dir(&build_dir)?;

        tracing::debug!("Starting configure ...");
        tracing::debug!(" Source Directory: {}", ctx.source_dir.display());
        tracing::debug!(" Output Directory: {}", build_dir.display());
        tracing::debug!(" Arguments: {:?}", invocation.cache_args);
        tracing::debug!(" Generator: {}", invocation.generator);

        let request = OpenRequest::new(ctx.source_dir, &build_dir, &invocation.generator);
        let mut server = CMakeServer::spawn(&cmake, &request, &invocation.env)?;
        server
            .configure(&invocation.cache_args)
            .with_context(|| format!("failed to configure {}", configuration))?;
        self.code_model = server.into_code_model();
        Ok(())
    }

    fn build(&mut self, configuration: &BuildConfiguration) -> Result<()> {
        let target = self.ctx.options.target.as_deref();
        self.build_target(configuration, target)
    }

    fn clean(&mut self, configuration: &BuildConfiguration) -> Result<()> {
        self.build_target(configuration, Some("clean"))
    }

    fn package(&mut self, configuration: &BuildConfiguration) -> Result<()> {
        self.build_target(configuration, Some("package"))
    }

    fn run(&mut self, configuration: &BuildConfiguration) -> Result<()> {
        let ctx = self.ctx;
        let target_name = ctx.options.target.as_deref().ok_or_else(|| {
            BauerError::ProgramArgument("Please specify a target name with --target TARGET".to_string())
        })?;
        let config = self.run_config_name(configuration)?;
        let model = self.code_model.as_ref().ok_or_else(|| {
            BauerError::PreparedState(format!("{} has no code model, prepare it first", configuration))
        })?;

        let target = model.executable_target(config.as_str(), target_name)?;
        let artifact = target.executable_artifact_path().ok_or_else(|| {
            BauerError::ProgramArgument(format!(
                "module {} not found on disk, build it first",
                target_name
            ))
        })?;

        match configuration.platform {
            Platform::Ios | Platform::WebEms | Platform::Android => run_on_device(
                ctx,
                configuration,
                Path::new(artifact),
                None,
            ),
            _ => DesktopRunner::new(Path::new(artifact)).run(&ctx.options.run_params),
        }
    }
}

fn compiler_env(cc: &str, cxx: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("CC".to_string(), format!("/usr/bin/{}", cc)),
        ("CXX".to_string(), format!("/usr/bin/{}", cxx)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::testing::Fixture;
    use crate::executor::CompilerInfo;

    fn config(platform: Platform, arch: &str, buildsystem: &str, cfg: Option<BuildType>) -> BuildConfiguration {
        BuildConfiguration::new(platform, arch, buildsystem, cfg)
    }

    fn invocation(fixture: &Fixture, configuration: &BuildConfiguration) -> Result<CMakeInvocation> {
        let ctx = fixture.ctx();
        let executor = CMakeExecutor::new(&ctx);
        let mut state = GeneratorState::load(&fixture.layout.build_dir(configuration)).unwrap();
        executor.cmake_invocation(configuration, &mut state)
    }

    fn arch_error(result: Result<CMakeInvocation>) -> bool {
        matches!(
            result.unwrap_err().downcast_ref::<BauerError>(),
            Some(BauerError::InvalidArchitecture { .. })
        )
    }

    #[test]
    fn test_linux_single_config() {
        let fixture = Fixture::new();
        let inv = invocation(
            &fixture,
            &config(Platform::Linux, "std", "make", Some(BuildType::Debug)),
        )
        .unwrap();

        assert_eq!(inv.generator, "Unix Makefiles");
        assert_eq!(inv.cache_args, vec!["-DCMAKE_BUILD_TYPE=Debug"]);
        assert!(inv.env.is_empty());
        assert!(!inv.clean_first);
    }

    #[test]
    fn test_linux_compiler_selection() {
        let mut fixture = Fixture::new();
        let inv = invocation(
            &fixture,
            &config(Platform::Linux, "clang", "make", Some(BuildType::Debug)),
        )
        .unwrap();
        assert_eq!(inv.env["CC"], "/usr/bin/clang");
        assert_eq!(inv.env["CXX"], "/usr/bin/clang++");

        let inv = invocation(
            &fixture,
            &config(Platform::Linux, "gcc", "make", Some(BuildType::Debug)),
        )
        .unwrap();
        assert_eq!(inv.env["CXX"], "/usr/bin/g++");

        assert!(arch_error(invocation(
            &fixture,
            &config(Platform::Linux, "icc", "make", None)
        )));

        fixture.host.compilers = CompilerInfo {
            gcc_version: Some(vec![4, 8, 4]),
            clang_version: Some(vec![3, 8, 0]),
        };
        let inv = invocation(&fixture, &config(Platform::Linux, "std", "make", None)).unwrap();
        assert_eq!(inv.env["CC"], "/usr/bin/clang");
        assert!(arch_error(invocation(
            &fixture,
            &config(Platform::Linux, "gcc", "make", None)
        )));
    }

    #[test]
    fn test_mac_options() {
        let mut fixture = Fixture::new();
        fixture.options.macos_min_version = Some("10.13".to_string());
        fixture.config.macos.sdk_path = Some("/sdk".to_string());

        let inv = invocation(&fixture, &config(Platform::Mac, "std", "Xcode", None)).unwrap();
        assert_eq!(inv.generator, "Xcode");
        assert_eq!(
            inv.cache_args,
            vec!["-DCMAKE_OSX_SYSROOT=/sdk", "-DCMAKE_OSX_DEPLOYMENT_TARGET=10.13"]
        );

        assert!(arch_error(invocation(
            &fixture,
            &config(Platform::Mac, "arm64", "Xcode", None)
        )));
    }

    #[test]
    fn test_ios_toolchain() {
        let fixture = Fixture::new();
        let missing = invocation(&fixture, &config(Platform::Ios, "device", "Xcode", None));
        assert!(matches!(
            missing.unwrap_err().downcast_ref::<BauerError>(),
            Some(BauerError::CMakeProblem { .. })
        ));

        let toolchain = fixture.add_toolchain("ios.toolchain.cmake");
        let inv = invocation(&fixture, &config(Platform::Ios, "device", "Xcode", None)).unwrap();
        assert_eq!(
            inv.cache_args,
            vec![
                "-DIOS_PLATFORM=OS".to_string(),
                format!("-DCMAKE_TOOLCHAIN_FILE={}", toolchain.display()),
            ]
        );

        let inv = invocation(&fixture, &config(Platform::Ios, "std", "Xcode", None)).unwrap();
        assert_eq!(inv.cache_args[0], "-DIOS_PLATFORM=SIMULATOR64");

        assert!(arch_error(invocation(
            &fixture,
            &config(Platform::Ios, "watch", "Xcode", None)
        )));
    }

    #[test]
    fn test_windows_arch_in_generator_name() {
        let fixture = Fixture::new();
        let inv = invocation(&fixture, &config(Platform::Win32, "x64", "vs2017", None)).unwrap();
        assert_eq!(inv.generator, "Visual Studio 15 2017 Win64");
        assert!(inv.cache_args.iter().all(|a| !a.starts_with("-A")));

        let inv = invocation(&fixture, &config(Platform::WinUwp, "arm", "vs2017", None)).unwrap();
        assert_eq!(inv.generator, "Visual Studio 15 2017 ARM");
        assert_eq!(
            inv.cache_args,
            vec![
                "-DCMAKE_SYSTEM_NAME=WindowsStore",
                "-DCMAKE_SYSTEM_VERSION=10.0.10240.0"
            ]
        );

        assert!(arch_error(invocation(
            &fixture,
            &config(Platform::Win32, "x86", "vs2017", None)
        )));
        assert!(arch_error(invocation(
            &fixture,
            &config(Platform::Win32, "x64", "Ninja", Some(BuildType::Debug))
        )));
    }

    #[test]
    fn test_webems_version_drift_cleans() {
        let fixture = Fixture::new();
        fixture.add_toolchain("emscripten.toolchain.cmake");
        let configuration = config(Platform::WebEms, "std", "make", Some(BuildType::Release));
        let ctx = fixture.ctx();
        let executor = CMakeExecutor::new(&ctx);

        let mut state = GeneratorState::load(&fixture.layout.build_dir(&configuration)).unwrap();
        let inv = executor.cmake_invocation(&configuration, &mut state).unwrap();
        assert!(!inv.clean_first);
        assert!(inv
            .cache_args
            .contains(&"-DEMSCRIPTEN_ROOT_PATH=/opt/emsdk/emscripten/tag-1.38.0".to_string()));
        assert_eq!(
            state.get::<String>(EMS_SDK_VERSION_KEY).as_deref(),
            Some("1.38.0-64bit")
        );
        assert_eq!(fixture.emscripten.activations.get(), 1);

        let inv = executor.cmake_invocation(&configuration, &mut state).unwrap();
        assert!(!inv.clean_first);

        state.set(EMS_SDK_VERSION_KEY, "1.37.0-64bit").unwrap();
        let inv = executor.cmake_invocation(&configuration, &mut state).unwrap();
        assert!(inv.clean_first);
    }

    #[test]
    fn test_android_makefile_build() {
        let mut fixture = Fixture::new();
        let configuration = config(Platform::Android, "std", "make", Some(BuildType::Debug));
        assert!(matches!(
            invocation(&fixture, &configuration).unwrap_err().downcast_ref::<BauerError>(),
            Some(BauerError::MissingSdk(_))
        ));

        fixture.host.android_home = Some(PathBuf::from("/sdk"));
        let inv = invocation(&fixture, &configuration).unwrap();
        assert_eq!(
            inv.cache_args,
            vec![
                "-DCMAKE_TOOLCHAIN_FILE=/sdk/ndk-bundle/build/cmake/android.toolchain.cmake",
                "-DCMAKE_SYSTEM_NAME=Android",
                "-DANDROID_ABI=x86_64",
                "-DCMAKE_BUILD_TYPE=Debug",
            ]
        );
    }

    #[test]
    fn test_package_and_user_options() {
        let mut fixture = Fixture::new();
        fixture.options.package_generator = Some("ZIP".to_string());
        fixture.options.package_folder = Some("packages".to_string());
        fixture.options.cmake_options = vec!["FOO=1".to_string(), "-DBAR=2".to_string()];

        let inv = invocation(
            &fixture,
            &config(Platform::Linux, "std", "make", Some(BuildType::Release)),
        )
        .unwrap();
        let prefix = fixture.layout.root().join("packages");
        assert_eq!(
            inv.cache_args,
            vec![
                "-DCPACK_GENERATOR=ZIP".to_string(),
                format!("-DCPACK_OUTPUT_FILE_PREFIX={}", prefix.display()),
                "-DCMAKE_BUILD_TYPE=Release".to_string(),
                "-DFOO=1".to_string(),
                "-DBAR=2".to_string(),
            ]
        );
    }

    #[test]
    fn test_build_command_single_config() {
        let mut fixture = Fixture::new();
        fixture.options.jobs = Some(8);
        let configuration = config(Platform::Linux, "std", "make", Some(BuildType::Debug));
        let ctx = fixture.ctx();
        let executor = CMakeExecutor::new(&ctx);

        let cmds = executor.build_commands(Path::new("cmake"), &configuration, Some("app"));
        assert_eq!(cmds.len(), 1);
        let dir = fixture.layout.build_dir(&configuration);
        assert_eq!(
            cmds[0].get_args(),
            &[
                "--build".to_string(),
                dir.display().to_string(),
                "--target".to_string(),
                "app".to_string(),
                "--".to_string(),
                "-j8".to_string(),
            ]
        );
        assert_eq!(cmds[0].get_cwd(), Some(dir.as_path()));
    }

    #[test]
    fn test_build_command_visual_studio_jobs() {
        let mut fixture = Fixture::new();
        fixture.options.jobs = Some(4);
        fixture.options.config = Some(BuildType::Release);
        let configuration = config(Platform::Win32, "std", "vs2017", None);
        let ctx = fixture.ctx();
        let executor = CMakeExecutor::new(&ctx);

        let cmds = executor.build_commands(Path::new("cmake"), &configuration, None);
        assert_eq!(cmds.len(), 1);
        assert_eq!(cmds[0].get_env("CL"), Some("/MP4"));
        let args = cmds[0].get_args();
        assert_eq!(&args[2..], &["--config".to_string(), "Release".to_string()]);
    }

    #[test]
    fn test_build_command_xcode_all_configs() {
        let mut fixture = Fixture::new();
        fixture.options.jobs = Some(4);
        let configuration = config(Platform::Mac, "std", "Xcode", None);
        let ctx = fixture.ctx();
        let mut executor = CMakeExecutor::new(&ctx);

        let cmds = executor.build_commands(Path::new("cmake"), &configuration, None);
        assert_eq!(cmds.len(), 1);
        assert!(!cmds[0].get_args().iter().any(|a| a == "--config" || a == "--"));

        executor.code_model = Some(
            CodeModel::from_reply(serde_json::json!({
                "configurations": [{"name": "Debug"}, {"name": "Release"}]
            }))
            .unwrap(),
        );
        let cmds = executor.build_commands(Path::new("cmake"), &configuration, Some("clean"));
        let configs: Vec<&str> = cmds.iter().map(|c| c.get_args()[5].as_str()).collect();
        assert_eq!(configs, vec!["Debug", "Release"]);
    }

    #[test]
    fn test_run_requires_target_and_prepare() {
        let mut fixture = Fixture::new();
        let configuration = config(Platform::Linux, "std", "make", Some(BuildType::Debug));
        {
            let ctx = fixture.ctx();
            let mut executor = CMakeExecutor::new(&ctx);
            let err = executor.run(&configuration).unwrap_err();
            assert!(err.to_string().contains("--target"));
        }

        fixture.options.target = Some("app".to_string());
        let ctx = fixture.ctx();
        let mut executor = CMakeExecutor::new(&ctx);
        let err = executor.run(&configuration).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BauerError>(),
            Some(BauerError::PreparedState(_))
        ));
    }
}
