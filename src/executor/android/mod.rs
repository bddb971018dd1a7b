//! Android Studio builds.
//!
//! Prepare runs cmake once against a throwaway directory to learn the
//! native targets and how they link, then writes a Gradle multi-module
//! project around them. Build, clean and package are Gradle tasks.

pub mod dependencies;
pub mod gradle;
pub mod sdk;

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::cmake::{CMakeServer, CodeModel, OpenRequest, TargetType};
use crate::core::error::BauerError;
use crate::core::{BuildConfiguration, BuildType, GeneratorState, STD_ARCH};
use crate::executor::runner::run_on_device;
use crate::executor::{ExecutorContext, PlatformExecutor};
use crate::util::fs::{ensure_dir, forward_slashes};

pub use dependencies::{calculate_dependencies, module_order, TargetDependencies};
pub use gradle::{GradleModule, GradleProject};
pub use sdk::{SdkManager, SdkWarning};

/// Directory below the build directory used for target discovery.
pub const TARGET_DISCOVERY_DIR: &str = "tmp-cmake-gen";

/// Define carrying the application id of an app target.
pub const APP_ID_DEFINE: &str = "ANDROID_APP_ID";

const DISCOVERY_GENERATOR: &str = "Unix Makefiles";

/// Android ABI for a bauer architecture name.
pub fn android_abi(arch: &str) -> &str {
    if arch == STD_ARCH {
        "x86_64"
    } else {
        arch
    }
}

/// Cache arguments selecting the NDK toolchain.
pub fn ndk_cmake_arguments(android_home: &Path) -> Vec<String> {
    vec![
        format!(
            "-DCMAKE_TOOLCHAIN_FILE={}/ndk-bundle/build/cmake/android.toolchain.cmake",
            forward_slashes(android_home)
        ),
        "-DCMAKE_SYSTEM_NAME=Android".to_string(),
    ]
}

/// Cache arguments of the target discovery configure.
pub fn discovery_cmake_arguments(android_home: &Path, windows_host: bool) -> Vec<String> {
    let mut args = ndk_cmake_arguments(android_home);
    args.push("-DBAUER_RUN=Yes".to_string());
    if windows_host {
        args.push(format!(
            "-DCMAKE_MAKE_PROGRAM={}/ndk-bundle/prebuilt/windows-x86_64/bin/make.exe",
            forward_slashes(android_home)
        ));
    }
    args
}

/// Where Gradle puts the APK of `target`.
pub fn apk_path(build_dir: &Path, target: &str, config: BuildType) -> PathBuf {
    let config = config.as_str().to_lowercase();
    build_dir
        .join(target)
        .join("build")
        .join("outputs")
        .join("apk")
        .join(&config)
        .join(format!("{}-{}.apk", target, config))
}

pub struct AndroidExecutor<'a> {
    ctx: &'a ExecutorContext<'a>,
    code_model: Option<CodeModel>,
}

impl<'a> AndroidExecutor<'a> {
    pub fn new(ctx: &'a ExecutorContext<'a>) -> Self {
        AndroidExecutor {
            ctx,
            code_model: None,
        }
    }

    pub fn code_model(&self) -> Option<&CodeModel> {
        self.code_model.as_ref()
    }

    fn project(&self, configuration: &BuildConfiguration) -> GradleProject {
        let android = &self.ctx.config.android;
        GradleProject::new(
            self.ctx.layout.build_dir(configuration),
            android.build_api_version(),
            android.gradle_plugin_version(),
        )
    }

    fn sdk(&self) -> Result<SdkManager, BauerError> {
        let android_home = self.ctx.host.require_android_home()?;
        Ok(SdkManager::new(android_home, self.ctx.host))
    }

    fn prepare_sdk(&self, sdk: &SdkManager, abi: &str) -> Result<()> {
        let android = &self.ctx.config.android;

        if self.ctx.options.accept_terms {
            sdk.accept_licenses()?;
        } else {
            tracing::info!("Not accepting android licence agreements (pass --accept-terms to do so).");
        }

        sdk.install_required(android.build_tools_version(), android.build_api_version())?;

        // Installed during prepare so a missing image shows up before
        // everything has been built.
        if let Err(warning) = sdk.install_system_image(android.emulator_api_version(), abi) {
            tracing::warn!(
                "{}. You will not be able to 'run' this configuration.",
                warning
            );
        }
        Ok(())
    }

    /// Configure the project with plain makefiles to list its targets.
    fn discover_targets(&self, configuration: &BuildConfiguration, sdk: &SdkManager) -> Result<CodeModel> {
        let ctx = self.ctx;
        let cmake = ctx.generators.ensure_have_cmake()?;
        let android_home = ctx.host.require_android_home()?;
        let discovery_dir = ctx.layout.build_dir(configuration).join(TARGET_DISCOVERY_DIR);
        ensure_dir(&discovery_dir)?;

        let request = OpenRequest::new(ctx.source_dir, &discovery_dir, DISCOVERY_GENERATOR);
        let mut server = CMakeServer::spawn(cmake, &request, &sdk.tool_env())?;
        server.configure(&discovery_cmake_arguments(android_home, ctx.host.is_windows))?;

        server
            .into_code_model()
            .ok_or_else(|| BauerError::CMakeServer("configure produced no code model".to_string()).into())
    }

    /// Write the Gradle modules for the native targets of `model`.
    pub fn write_gradle_project(
        &self,
        configuration: &BuildConfiguration,
        model: &CodeModel,
    ) -> Result<Vec<String>> {
        let project = self.project(configuration);
        let prefix = self.ctx.config.android.package_id_prefix();
        let abi = android_abi(&configuration.arch);

        let dependencies = calculate_dependencies(model)?;
        let configuration_model = model.single_configuration()?;

        let mut modules = Vec::new();
        for cmake_project in &configuration_model.projects {
            tracing::debug!("Found project: {}", cmake_project.name);
            let root_cmake_file =
                forward_slashes(&Path::new(&cmake_project.source_directory).join("CMakeLists.txt"));

            for target in &cmake_project.targets {
                if !matches!(
                    target.target_type,
                    TargetType::SharedLibrary | TargetType::StaticLibrary | TargetType::Executable
                ) {
                    continue;
                }
                tracing::debug!("Found target: {}", target.name);

                modules.push(GradleModule {
                    name: target.name.clone(),
                    package_id: format!("{}.{}", prefix, target.name),
                    source_dir: forward_slashes(Path::new(&target.source_directory)),
                    dependencies: dependencies.get(&target.name).cloned().unwrap_or_default(),
                    is_library: target.target_type == TargetType::SharedLibrary,
                    abi: abi.to_string(),
                    root_cmake_file: root_cmake_file.clone(),
                });
            }
        }

        let order = module_order(&dependencies);
        modules.sort_by_key(|m| order.iter().position(|name| *name == m.name));

        let names: Vec<String> = modules.iter().map(|m| m.name.clone()).collect();
        tracing::debug!("Generating project with modules: {:?}", names);

        project.write_top_level(&names)?;
        for module in &modules {
            project.write_module(module)?;
        }
        project.remove_ide_state()?;

        Ok(names)
    }

    fn gradle_task(&self, configuration: &BuildConfiguration, task: &str) -> Result<()> {
        let sdk = self.sdk()?;
        self.project(configuration)
            .gradlew(self.ctx.host, task, &sdk.tool_env())
            .run()
    }

    fn build_config(&self, configuration: &BuildConfiguration) -> Option<BuildType> {
        self.ctx.options.config.or(configuration.config)
    }
}

impl PlatformExecutor for AndroidExecutor<'_> {
    fn prepare(
        &mut self,
        configuration: &BuildConfiguration,
        _state: &mut GeneratorState,
    ) -> Result<()> {
        let abi = android_abi(&configuration.arch);
        let sdk = self.sdk()?;
        self.prepare_sdk(&sdk, abi)?;

        let model = self.discover_targets(configuration, &sdk)?;

        let project = self.project(configuration);
        let gradle = gradle::find_gradle()?;
        project.write_wrapper(&gradle, self.ctx.config.android.gradle_distribution_url())?;
        self.write_gradle_project(configuration, &model)?;

        self.code_model = Some(model);
        Ok(())
    }

    fn build(&mut self, configuration: &BuildConfiguration) -> Result<()> {
        let config = self.build_config(configuration).unwrap_or(BuildType::Debug);
        self.gradle_task(configuration, gradle::assemble_task(config))
    }

    fn clean(&mut self, configuration: &BuildConfiguration) -> Result<()> {
        self.gradle_task(configuration, "clean")
    }

    fn package(&mut self, configuration: &BuildConfiguration) -> Result<()> {
        self.gradle_task(configuration, gradle::assemble_task(BuildType::Release))
    }

    fn run(&mut self, configuration: &BuildConfiguration) -> Result<()> {
        let ctx = self.ctx;
        let target_name = ctx.options.target.as_deref().ok_or_else(|| {
            BauerError::ProgramArgument("Please specify a target name with --target TARGET".to_string())
        })?;
        let config = self.build_config(configuration).ok_or_else(|| {
            BauerError::ProgramArgument(
                "Please specify the configuration name with --config CONFIG".to_string(),
            )
        })?;
        let model = self.code_model.as_ref().ok_or_else(|| {
            BauerError::PreparedState(format!("{} has no code model, prepare it first", configuration))
        })?;

        let target = model.find_target(target_name).ok_or_else(|| {
            BauerError::ProgramArgument(format!("Could not find target {} in cmake codemodel", target_name))
        })?;
        let package_id = target.define_value(APP_ID_DEFINE).ok_or_else(|| {
            BauerError::ProgramArgument(format!(
                "Could not find package id for target {} (should be a compile definition called {})",
                target_name, APP_ID_DEFINE
            ))
        })?;
        tracing::debug!("Package Id: {}", package_id);

        let apk = apk_path(&ctx.layout.build_dir(configuration), target_name, config);
        if !apk.exists() {
            return Err(BauerError::ProgramArgument(format!(
                "APK not found - expected here: {}",
                apk.display()
            ))
            .into());
        }

        run_on_device(ctx, configuration, &apk, Some(package_id))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serde_json::json;

    use super::*;
    use crate::core::Platform;
    use crate::executor::testing::Fixture;

    fn studio(config: Option<BuildType>) -> BuildConfiguration {
        BuildConfiguration::new(Platform::Android, "std", "AndroidStudio", config)
    }

    fn model() -> CodeModel {
        CodeModel::from_reply(json!({
            "configurations": [{
                "name": "",
                "projects": [{
                    "name": "demo",
                    "sourceDirectory": "/src",
                    "targets": [
                        {"name": "app", "type": "EXECUTABLE", "sourceDirectory": "/src/app",
                         "linkLibraries": "-lcore -lm",
                         "fileGroups": [{"defines": ["ANDROID_APP_ID=\"io.example.app\""]}]},
                        {"name": "core", "type": "SHARED_LIBRARY", "sourceDirectory": "/src/core",
                         "artifacts": ["/b/libcore.so"]},
                        {"name": "docs", "type": "UTILITY"}
                    ]
                }]
            }]
        }))
        .unwrap()
    }

    #[test]
    fn test_android_abi() {
        assert_eq!(android_abi("std"), "x86_64");
        assert_eq!(android_abi("arm64-v8a"), "arm64-v8a");
    }

    #[test]
    fn test_discovery_arguments() {
        assert_eq!(
            discovery_cmake_arguments(Path::new("/sdk"), false),
            vec![
                "-DCMAKE_TOOLCHAIN_FILE=/sdk/ndk-bundle/build/cmake/android.toolchain.cmake",
                "-DCMAKE_SYSTEM_NAME=Android",
                "-DBAUER_RUN=Yes",
            ]
        );
        let windows = discovery_cmake_arguments(Path::new("C:/sdk"), true);
        assert_eq!(
            windows.last().unwrap(),
            "-DCMAKE_MAKE_PROGRAM=C:/sdk/ndk-bundle/prebuilt/windows-x86_64/bin/make.exe"
        );
    }

    #[test]
    fn test_apk_path() {
        assert_eq!(
            apk_path(Path::new("/b"), "app", BuildType::Release),
            PathBuf::from("/b/app/build/outputs/apk/release/app-release.apk")
        );
    }

    #[test]
    fn test_write_gradle_project() {
        let fixture = Fixture::new();
        let ctx = fixture.ctx();
        let executor = AndroidExecutor::new(&ctx);
        let configuration = studio(None);

        let modules = executor.write_gradle_project(&configuration, &model()).unwrap();
        assert_eq!(modules, vec!["core", "app"]);

        let dir = fixture.layout.build_dir(&configuration);
        let settings = fs::read_to_string(dir.join("settings.gradle")).unwrap();
        assert_eq!(settings, "include ':core', ':app'\n");

        let app = fs::read_to_string(dir.join("app/build.gradle")).unwrap();
        assert!(app.contains("applicationId = 'io.boden.android.app'"));
        assert!(app.contains("implementation project(':core')"));
        assert!(app.contains("path \"/src/CMakeLists.txt\""));

        let core = fs::read_to_string(dir.join("core/build.gradle")).unwrap();
        assert!(core.contains("com.android.library"));
        assert!(!dir.join("docs").exists());
    }

    #[test]
    fn test_package_id_prefix_from_config() {
        let mut fixture = Fixture::new();
        fixture.config.android.package_id_prefix = Some("com.example".to_string());
        let ctx = fixture.ctx();
        let executor = AndroidExecutor::new(&ctx);
        let configuration = studio(None);

        executor.write_gradle_project(&configuration, &model()).unwrap();
        let manifest = fs::read_to_string(
            fixture
                .layout
                .build_dir(&configuration)
                .join("app/src/main/AndroidManifest.xml"),
        )
        .unwrap();
        assert!(manifest.contains("package=\"com.example.app\""));
    }

    #[test]
    fn test_run_resolves_apk() {
        let mut fixture = Fixture::new();
        fixture.options.target = Some("app".to_string());
        fixture.options.config = Some(BuildType::Debug);
        let ctx = fixture.ctx();
        let configuration = studio(None);

        let mut executor = AndroidExecutor::new(&ctx);
        executor.code_model = Some(model());

        let err = executor.run(&configuration).unwrap_err();
        assert!(err.to_string().contains("APK not found"));

        let apk = apk_path(&fixture.layout.build_dir(&configuration), "app", BuildType::Debug);
        fs::create_dir_all(apk.parent().unwrap()).unwrap();
        fs::write(&apk, "").unwrap();

        // No launcher is available, so the hand-off itself fails.
        let err = executor.run(&configuration).unwrap_err();
        assert!(err.to_string().contains("device launcher"));
    }

    #[test]
    fn test_run_requires_app_id() {
        let mut fixture = Fixture::new();
        fixture.options.target = Some("core".to_string());
        fixture.options.config = Some(BuildType::Debug);
        let ctx = fixture.ctx();

        let mut executor = AndroidExecutor::new(&ctx);
        executor.code_model = Some(model());
        let err = executor.run(&studio(None)).unwrap_err();
        assert!(err.to_string().contains("ANDROID_APP_ID"));
    }

    #[test]
    fn test_missing_sdk() {
        let fixture = Fixture::new();
        let ctx = fixture.ctx();
        let mut executor = AndroidExecutor::new(&ctx);
        let err = executor.build(&studio(Some(BuildType::Debug))).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BauerError>(),
            Some(BauerError::MissingSdk(_))
        ));
    }
}
