//! Gradle project generation for Android Studio builds.
//!
//! One Gradle module is written per native target. Each module builds its
//! target through Gradle's `externalNativeBuild` against the project's root
//! CMakeLists.txt.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempDir;

use crate::core::error::BauerError;
use crate::core::BuildType;
use crate::executor::HostEnvironment;
use crate::util::fs::{copy_dir_all, ensure_dir, remove_dir_all_if_exists, write_string};
use crate::util::process::{find_executable, ProcessBuilder};

const NATIVE_ACTIVITY: &str = "io.boden.android.NativeRootActivity";
const MIN_SDK_VERSION: u32 = 16;

/// Description of one Gradle module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradleModule {
    /// Module directory name, equal to the cmake target name
    pub name: String,
    pub package_id: String,
    /// Source directory of the cmake target
    pub source_dir: String,
    /// Modules this one links against
    pub dependencies: Vec<String>,
    /// Shared library targets become Android libraries, everything else an app
    pub is_library: bool,
    pub abi: String,
    pub root_cmake_file: String,
}

/// Writes the Gradle project into an Android Studio build directory.
#[derive(Debug, Clone)]
pub struct GradleProject {
    dir: PathBuf,
    api_version: String,
    plugin_version: String,
}

impl GradleProject {
    pub fn new(
        dir: impl Into<PathBuf>,
        api_version: impl Into<String>,
        plugin_version: impl Into<String>,
    ) -> Self {
        GradleProject {
            dir: dir.into(),
            api_version: api_version.into(),
            plugin_version: plugin_version.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Generate the Gradle wrapper for `distribution_url` and install it in
    /// the project directory.
    ///
    /// The wrapper is generated in an empty directory: gradle evaluates any
    /// build.gradle it finds, which fails when the installed gradle does not
    /// match the project.
    pub fn write_wrapper(&self, gradle: &Path, distribution_url: &str) -> Result<()> {
        let tmp = TempDir::new().context("failed to create temporary directory")?;

        ProcessBuilder::new(gradle)
            .args(["wrapper", "--gradle-distribution-url", distribution_url])
            .cwd(tmp.path())
            .run()?;

        ensure_dir(&self.dir)?;
        for entry in fs::read_dir(tmp.path())
            .with_context(|| format!("failed to read directory: {}", tmp.path().display()))?
        {
            let entry = entry?;
            let dest = self.dir.join(entry.file_name());
            if dest.is_dir() {
                remove_dir_all_if_exists(&dest)?;
            }

            if entry.file_type()?.is_dir() {
                copy_dir_all(&entry.path(), &dest)?;
            } else {
                fs::copy(entry.path(), &dest).with_context(|| {
                    format!("failed to copy {} to {}", entry.path().display(), dest.display())
                })?;
            }
        }
        Ok(())
    }

    /// Write the top-level build.gradle and settings.gradle.
    pub fn write_top_level(&self, modules: &[String]) -> Result<()> {
        write_string(
            &self.dir.join("build.gradle"),
            &top_level_build_gradle(&self.plugin_version),
        )?;
        write_string(&self.dir.join("settings.gradle"), &settings_gradle(modules))
    }

    /// Write build.gradle, manifest and resources of one module.
    pub fn write_module(&self, module: &GradleModule) -> Result<()> {
        let module_dir = self.dir.join(&module.name);
        write_string(
            &module_dir.join("build.gradle"),
            &module_build_gradle(module, &self.api_version),
        )?;

        let main_dir = module_dir.join("src").join("main");
        write_string(&main_dir.join("AndroidManifest.xml"), &android_manifest(module))?;
        write_string(
            &main_dir.join("res").join("values").join("strings.xml"),
            &strings_xml(&module.name),
        )
    }

    /// Android Studio does not pick up new source files while its `.idea`
    /// folder exists.
    pub fn remove_ide_state(&self) -> Result<()> {
        let idea = self.dir.join(".idea");
        if idea.exists() {
            tracing::info!("Deleting .idea folder in build dir to force re-detection of files.");
            remove_dir_all_if_exists(&idea)?;
        }
        Ok(())
    }

    /// `gradlew <task>` in the project directory.
    pub fn gradlew(
        &self,
        host: &HostEnvironment,
        task: &str,
        env: &BTreeMap<String, String>,
    ) -> ProcessBuilder {
        ProcessBuilder::new(host.tool_path(&self.dir, "gradlew"))
            .arg(task)
            .cwd(&self.dir)
            .envs(env)
    }
}

/// Gradle task that assembles `config`.
pub fn assemble_task(config: BuildType) -> &'static str {
    match config {
        BuildType::Debug => "assembleDebug",
        BuildType::Release => "assembleRelease",
    }
}

/// The `gradle` executable used to generate wrappers.
pub fn find_gradle() -> Result<PathBuf, BauerError> {
    find_executable("gradle").ok_or_else(|| {
        BauerError::MissingSdk(
            "gradle was not found on PATH. It is needed once to generate the Gradle wrapper."
                .to_string(),
        )
    })
}

pub fn top_level_build_gradle(plugin_version: &str) -> String {
    format!(
        r#"// Top-level build file where you can add configuration options common to all sub-projects/modules.

buildscript {{
    repositories {{
        google()
        jcenter()
    }}
    dependencies {{
        classpath 'com.android.tools.build:gradle:{plugin_version}'
    }}
}}

allprojects {{
    repositories {{
        google()
        jcenter()
    }}
}}

task clean(type: Delete) {{
    delete rootProject.buildDir
}}
"#
    )
}

pub fn settings_gradle(modules: &[String]) -> String {
    let includes: Vec<String> = modules.iter().map(|m| format!("':{}'", m)).collect();
    format!("include {}\n", includes.join(", "))
}

pub fn module_build_gradle(module: &GradleModule, api_version: &str) -> String {
    let (plugin, app_id) = if module.is_library {
        ("com.android.library", String::new())
    } else {
        (
            "com.android.application",
            format!("applicationId = '{}'", module.package_id),
        )
    };

    let project_deps: String = module
        .dependencies
        .iter()
        .map(|dep| format!("    implementation project(':{}')\n", dep))
        .collect();

    let name = &module.name;
    let abi = &module.abi;
    let source = &module.source_dir;
    let root_cmake = &module.root_cmake_file;

    format!(
        r#"apply plugin: '{plugin}'

android {{
    compileSdkVersion {api_version}
    defaultConfig {{
        {app_id}
        minSdkVersion {MIN_SDK_VERSION}
        targetSdkVersion {api_version}
        versionCode 1
        versionName "1.0"
        externalNativeBuild {{
            cmake {{
                targets "{name}"
                arguments "-DANDROID_STL=c++_static", "-DANDROID_CPP_FEATURES=rtti exceptions"
                cppFlags "-std=c++11 -frtti -fexceptions"
                abiFilters '{abi}'
            }}
        }}
    }}
    buildTypes {{
        defaultConfig {{
            minifyEnabled false
            proguardFiles getDefaultProguardFile('proguard-android.txt'), 'proguard-rules.pro'
        }}
    }}
    externalNativeBuild {{
        cmake {{
            path "{root_cmake}"
        }}
    }}
    sourceSets {{
        main {{
            java {{
                srcDir '{source}/java'
            }}
            jni {{
                srcDirs = ['{source}/src', '{source}/include']
            }}
        }}
    }}
}}

dependencies {{
    implementation fileTree(dir: 'libs', include: ['*.jar'])
    implementation 'com.android.support:appcompat-v7:{api_version}.+'
    implementation 'com.android.support.constraint:constraint-layout:1.0.2'
{project_deps}}}
"#
    )
}

pub fn android_manifest(module: &GradleModule) -> String {
    let application = if module.is_library {
        String::new()
    } else {
        format!(
            r#"    <application
        android:allowBackup="true"
        android:label="@string/app_name" >
        <activity android:name="{NATIVE_ACTIVITY}"
                  android:label="@string/app_name"
                  android:configChanges="mcc|mnc|locale|touchscreen|keyboard|keyboardHidden|navigation|screenLayout|fontScale|uiMode|orientation|screenSize|smallestScreenSize|layoutDirection">
            <meta-data android:name="io.boden.android.lib_name"
                       android:value="{}" />
            <intent-filter>
                <action android:name="android.intent.action.MAIN" />
                <category android:name="android.intent.category.LAUNCHER" />
            </intent-filter>
        </activity>
    </application>
"#,
            module.name
        )
    };

    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<manifest xmlns:android="http://schemas.android.com/apk/res/android"
    package="{}">
{}</manifest>
"#,
        module.package_id, application
    )
}

pub fn strings_xml(app_name: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<resources>
    <string name="app_name">{}</string>
</resources>
"#,
        app_name
    )
}
