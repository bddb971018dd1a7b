//! CLI integration tests for bauer.
//!
//! These tests cover argument handling, configuration resolution and the
//! exit codes that do not need cmake or any SDK to be installed.

use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

const STATE_FILE: &str = ".generateProjects.state";

const BAUER_ENV: [&str; 16] = [
    "BAUER_PLATFORM",
    "BAUER_BUILD_SYSTEM",
    "BAUER_CONFIG",
    "BAUER_ARCH",
    "BAUER_TARGET",
    "BAUER_JOBS",
    "BAUER_BUILD_FOLDER",
    "BAUER_CMAKE_OPTION",
    "BAUER_ACCEPT_TERMS",
    "BAUER_ENABLE_DEBUG_OUTPUT",
    "BAUER_PACKAGE_GENERATOR",
    "BAUER_PACKAGE_FOLDER",
    "BAUER_MACOS_SDK_PATH",
    "BAUER_MACOS_MIN_VERSION",
    "ANDROID_HOME",
    "EMSDK_BASE_DIR",
];

/// The bauer binary, isolated from the caller's BAUER_* settings.
fn bauer(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("bauer").unwrap();
    for var in BAUER_ENV {
        cmd.env_remove(var);
    }
    cmd.current_dir(dir);
    cmd
}

fn mark_prepared(dir: &Path, configuration: &str) {
    fs::create_dir_all(dir).unwrap();
    fs::write(
        dir.join(STATE_FILE),
        format!("{{\"build-configuration\":{}}}", configuration),
    )
    .unwrap();
}

// ============================================================================
// argument errors (exit code 1)
// ============================================================================

#[test]
fn test_invalid_platform() {
    let tmp = TempDir::new().unwrap();

    bauer(tmp.path())
        .args(["prepare", "--platform", "amiga"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid platform name: 'amiga'"));
}

#[test]
fn test_invalid_platform_from_environment() {
    let tmp = TempDir::new().unwrap();

    bauer(tmp.path())
        .arg("prepare")
        .env("BAUER_PLATFORM", "bogus")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("bogus"));
}

#[test]
fn test_invalid_config() {
    let tmp = TempDir::new().unwrap();

    bauer(tmp.path())
        .args(["build", "-p", "linux", "-b", "make", "-c", "Fast"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid config name"));
}

#[test]
fn test_unknown_command() {
    let tmp = TempDir::new().unwrap();

    bauer(tmp.path()).arg("codesign").assert().code(1);
}

#[test]
fn test_help_lists_platforms() {
    let tmp = TempDir::new().unwrap();

    bauer(tmp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("webems").and(predicate::str::contains("winuwp")));
}

// ============================================================================
// incorrect calls (exit code 12)
// ============================================================================

#[test]
fn test_build_system_without_platform() {
    let tmp = TempDir::new().unwrap();

    bauer(tmp.path())
        .args(["prepare", "--build-system", "make"])
        .assert()
        .code(12)
        .stderr(predicate::str::contains("--platform"));
}

#[test]
fn test_windows_needs_build_system() {
    let tmp = TempDir::new().unwrap();

    bauer(tmp.path())
        .args(["prepare", "-p", "win32"])
        .assert()
        .code(12)
        .stderr(predicate::str::contains("--build-system"));
}

// ============================================================================
// prepared state (exit code 13)
// ============================================================================

#[test]
fn test_distclean_without_prepared_directories() {
    let tmp = TempDir::new().unwrap();

    bauer(tmp.path()).arg("distclean").assert().code(13);
    assert!(!tmp.path().join("build").exists());
}

#[test]
fn test_clean_unprepared_platform() {
    let tmp = TempDir::new().unwrap();
    mark_prepared(
        &tmp.path().join("build/mac/std/Xcode"),
        r#"["mac","std","Xcode",null]"#,
    );

    bauer(tmp.path())
        .args(["clean", "-p", "linux"])
        .assert()
        .code(13);
}

// ============================================================================
// distclean
// ============================================================================

#[test]
fn test_distclean_removes_matching_directories() {
    let tmp = TempDir::new().unwrap();
    let debug = tmp.path().join("build/linux/std/make/Debug");
    let release = tmp.path().join("build/linux/std/make/Release");
    let mac = tmp.path().join("build/mac/std/Xcode");
    mark_prepared(&debug, r#"["linux","std","make","Debug"]"#);
    mark_prepared(&release, r#"["linux","std","make","Release"]"#);
    mark_prepared(&mac, r#"["mac","std","Xcode",null]"#);

    bauer(tmp.path())
        .args(["distclean", "-p", "linux", "-c", "Release"])
        .assert()
        .success();

    assert!(debug.exists());
    assert!(!release.exists());
    assert!(mac.exists());
}

#[test]
fn test_distclean_honours_build_folder() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("out/android/std/AndroidStudio");
    mark_prepared(&dir, r#"["android","std","AndroidStudio",null]"#);

    bauer(tmp.path())
        .arg("distclean")
        .assert()
        .code(13);
    assert!(dir.exists());

    bauer(tmp.path())
        .args(["distclean", "--build-folder", "out"])
        .assert()
        .success();
    assert!(!dir.exists());
}

#[test]
fn test_distclean_build_folder_from_config_file() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir_all(tmp.path().join(".bauer")).unwrap();
    fs::write(
        tmp.path().join(".bauer/config.toml"),
        "[build]\nbuild_folder = \"cmake-out\"\n",
    )
    .unwrap();
    let dir = tmp.path().join("cmake-out/webems/std/make/Debug");
    mark_prepared(&dir, r#"["webems","std","make","Debug"]"#);

    bauer(tmp.path()).arg("distclean").assert().success();
    assert!(!dir.exists());
}
