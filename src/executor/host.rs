//! Host environment discovery.
//!
//! Everything bauer needs to know about the machine it runs on is probed
//! once here and handed to the executors, which never look at the process
//! environment themselves.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::core::error::BauerError;
use crate::util::process::{find_executable, ProcessBuilder};

/// Leading dotted number of a word, e.g. `4.8.4` in `4.8.4.2ubuntu1`.
static VERSION_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+(?:\.\d+)*").expect("version regex is valid")
});

/// Versions of the system C compilers, if installed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompilerInfo {
    pub gcc_version: Option<Vec<u32>>,
    pub clang_version: Option<Vec<u32>>,
}

impl CompilerInfo {
    /// Ask `gcc` and `clang` for their versions.
    pub fn detect() -> Self {
        CompilerInfo {
            gcc_version: version_output("gcc").and_then(|out| parse_gcc_version(&out)),
            clang_version: version_output("clang").and_then(|out| parse_clang_version(&out)),
        }
    }

    pub fn gcc_major(&self) -> Option<u32> {
        self.gcc_version.as_ref().and_then(|v| v.first().copied())
    }

    pub fn has_clang(&self) -> bool {
        self.clang_version.is_some()
    }
}

fn version_output(compiler: &str) -> Option<String> {
    let path = find_executable(compiler)?;
    let output = ProcessBuilder::new(path).arg("--version").exec().ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Version numbers found in the words of the first output line.
fn version_candidates(output: &str, min_components: usize) -> Vec<Vec<u32>> {
    let first_line = output.lines().next().unwrap_or_default();
    first_line
        .split_whitespace()
        .filter_map(|word| {
            let word = word.replace('-', ".");
            let number = VERSION_PREFIX.find(&word)?;
            let components: Vec<u32> = number
                .as_str()
                .split('.')
                .filter_map(|c| c.parse().ok())
                .collect();
            (components.len() >= min_components).then_some(components)
        })
        .collect()
}

/// `gcc (Ubuntu 4.8.4-2ubuntu1~14.04.4) 4.8.4`: the last version wins.
pub fn parse_gcc_version(output: &str) -> Option<Vec<u32>> {
    version_candidates(output, 3).pop()
}

/// `clang version 3.8.0-2ubuntu4 (tags/RELEASE_380/final)`: the first version wins.
pub fn parse_clang_version(output: &str) -> Option<Vec<u32>> {
    version_candidates(output, 2).into_iter().next()
}

/// Facts about the host machine.
#[derive(Debug, Clone, Default)]
pub struct HostEnvironment {
    pub is_apple: bool,
    pub is_windows: bool,
    pub android_home: Option<PathBuf>,
    pub emsdk_base_dir: Option<PathBuf>,
    pub compilers: CompilerInfo,
}

impl HostEnvironment {
    /// Probe the running machine.
    pub fn detect() -> Self {
        let home = directories::BaseDirs::new().map(|b| b.home_dir().to_path_buf());
        let is_apple = cfg!(target_os = "macos");

        let android_home = discover_android_home(
            std::env::var("ANDROID_HOME").ok(),
            home.as_deref(),
            is_apple,
        );
        if let Some(ref dir) = android_home {
            tracing::debug!("Android home directory: {}", dir.display());
        }

        let emsdk_base_dir = std::env::var_os("EMSDK_BASE_DIR")
            .map(PathBuf::from)
            .filter(|dir| dir.exists());

        HostEnvironment {
            is_apple,
            is_windows: cfg!(windows),
            android_home,
            emsdk_base_dir,
            compilers: CompilerInfo::detect(),
        }
    }

    /// The Android SDK, or an error telling the user to point ANDROID_HOME at it.
    pub fn require_android_home(&self) -> Result<&Path, BauerError> {
        self.android_home.as_deref().ok_or_else(|| {
            BauerError::MissingSdk(
                "ANDROID_HOME environment variable is not set. Please point it to the root of the android SDK installation."
                    .to_string(),
            )
        })
    }

    /// A host tool path with the Windows script/binary extension added when
    /// one exists.
    pub fn tool_path(&self, dir: &Path, tool: &str) -> PathBuf {
        let path = dir.join(tool);
        if self.is_windows {
            for ext in ["bat", "exe"] {
                let candidate = path.with_extension(ext);
                if candidate.exists() {
                    return candidate;
                }
            }
        }
        path
    }
}

/// `ANDROID_HOME` if set, else the Android Studio default location when it
/// exists.
fn discover_android_home(
    env_value: Option<String>,
    home: Option<&Path>,
    is_apple: bool,
) -> Option<PathBuf> {
    if let Some(value) = env_value.filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(value.replace('\\', "/")));
    }

    let relative = if is_apple {
        "Library/Android/sdk"
    } else if cfg!(target_os = "linux") {
        "Android/Sdk"
    } else {
        return None;
    };

    let candidate = home?.join(relative);
    if candidate.exists() {
        tracing::info!(
            "Android home directory automatically detected as: {}",
            candidate.display()
        );
        Some(candidate)
    } else {
        None
    }
}
