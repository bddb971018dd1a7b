//! CMake generator catalogue.
//!
//! Built once from `cmake --help`. The list of generators is the indented
//! block at the very end of that output:
//!
//! ```text
//! Generators
//!
//! The following generators are available on this platform:
//!   Unix Makefiles               = Generates standard UNIX makefiles.
//!   Ninja                        = Generates build.ninja files.
//!   CodeBlocks - Unix Makefiles  = Generates CodeBlocks project files.
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::core::configuration::ANDROID_STUDIO;
use crate::core::error::BauerError;
use crate::util::process::{find_cmake, ProcessBuilder};

const VS_PREFIX: &str = "Visual Studio ";

/// Generators offered by the installed cmake plus short aliases for them.
#[derive(Debug, Clone, Default)]
pub struct GeneratorInfo {
    cmake: Option<PathBuf>,
    generator_names: Vec<String>,
    aliases: BTreeMap<String, String>,
    problem: Option<CMakeFailure>,
}

#[derive(Debug, Clone)]
struct CMakeFailure {
    message: String,
    stderr: String,
}

impl GeneratorInfo {
    /// Locate cmake on PATH and read its generator list.
    ///
    /// Never fails; a missing or broken cmake is remembered and reported by
    /// [`GeneratorInfo::ensure_have_cmake`] when cmake is actually needed.
    pub fn detect() -> Self {
        match find_cmake() {
            Some(cmake) => Self::from_executable(&cmake),
            None => Self::unavailable(
                "couldn't find cmake executable. Please download and install it from www.cmake.org/download",
                "",
            ),
        }
    }

    /// Read the generator list from a specific cmake binary.
    pub fn from_executable(cmake: &Path) -> Self {
        let result = ProcessBuilder::new(cmake).arg("--help").exec();
        let mut info = match result {
            Ok(output) if output.status.success() => {
                Self::from_help_output(&String::from_utf8_lossy(&output.stdout))
            }
            Ok(output) => Self::unavailable(
                format!("`cmake --help` failed ({})", output.status),
                String::from_utf8_lossy(&output.stderr).trim(),
            ),
            Err(e) => Self::unavailable("failed to run `cmake --help`", format!("{:#}", e)),
        };
        info.cmake = Some(cmake.to_path_buf());
        info
    }

    /// Parse captured `cmake --help` output.
    pub fn from_help_output(help: &str) -> Self {
        let mut block: Vec<&str> = help
            .trim()
            .lines()
            .rev()
            .take_while(|line| line.starts_with(' '))
            .collect();
        block.reverse();

        // Continuation lines of long descriptions are indented further.
        let generator_names: Vec<String> = block
            .iter()
            .filter(|line| line.len() > 2 && line.starts_with("  ") && !line[2..].starts_with(' '))
            .filter_map(|line| line.trim().split_once(" = "))
            .map(|(name, _)| name.trim())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();

        let mut aliases = BTreeMap::new();
        for name in &generator_names {
            if let Some((alias, full)) = visual_studio_alias(name) {
                aliases.insert(alias, full);
            }
        }

        for (alias, generator) in [
            ("make", "Unix Makefiles"),
            ("nmake", "NMake Makefiles"),
            ("msysmake", "MSYS Makefiles"),
            ("mingwmake", "MinGW Makefiles"),
        ] {
            aliases.insert(alias.to_string(), generator.to_string());
        }

        for (alias, generator) in [
            ("codeblocks", "CodeBlocks - Unix Makefiles"),
            ("codelite", "CodeLite - Unix Makefiles"),
        ] {
            if generator_names.iter().any(|n| n == generator) {
                aliases.insert(alias.to_string(), generator.to_string());
            }
        }

        GeneratorInfo {
            cmake: None,
            generator_names,
            aliases,
            problem: None,
        }
    }

    fn unavailable(message: impl Into<String>, stderr: impl Into<String>) -> Self {
        GeneratorInfo {
            problem: Some(CMakeFailure {
                message: message.into(),
                stderr: stderr.into(),
            }),
            ..GeneratorInfo::from_help_output("")
        }
    }

    /// The cmake executable, or the problem that prevented using it.
    pub fn ensure_have_cmake(&self) -> Result<&Path, BauerError> {
        if let Some(problem) = &self.problem {
            return Err(BauerError::CMakeProblem {
                message: problem.message.clone(),
                stderr: problem.stderr.clone(),
            });
        }
        self.cmake.as_deref().ok_or_else(|| BauerError::CMakeProblem {
            message: "no cmake executable configured".to_string(),
            stderr: String::new(),
        })
    }

    /// Generator names in the order cmake lists them.
    pub fn generator_names(&self) -> &[String] {
        &self.generator_names
    }

    pub fn aliases(&self) -> &BTreeMap<String, String> {
        &self.aliases
    }

    /// Resolve an alias to the full generator name. Unknown names pass
    /// through unchanged.
    pub fn cmake_generator_name<'a>(&'a self, buildsystem: &'a str) -> &'a str {
        self.aliases
            .get(buildsystem)
            .map(String::as_str)
            .unwrap_or(buildsystem)
    }

    /// Whether the build type is fixed at configure time.
    pub fn is_single_config(&self, buildsystem: &str) -> bool {
        if buildsystem == ANDROID_STUDIO {
            return false;
        }
        let generator = self.cmake_generator_name(buildsystem).to_lowercase();
        generator.contains("makefile") || generator.contains("ninja")
    }

    /// Help text listing the aliases, for `--help` output.
    pub fn alias_help(&self) -> String {
        let mut help = String::from("Aliases for build system names:\n");
        for (alias, generator) in &self.aliases {
            help.push_str(&format!("\n{} = {}", alias, generator));
        }
        help
    }
}

/// `Visual Studio 15 2017 [arch]` becomes `vs2017 -> Visual Studio 15 2017`.
fn visual_studio_alias(name: &str) -> Option<(String, String)> {
    let rest = name.strip_prefix(VS_PREFIX)?;
    let mut words = rest.split_whitespace();
    let internal = words.next()?;
    let year = words.next()?;
    internal.parse::<u32>().ok()?;
    year.parse::<u32>().ok()?;
    Some((
        format!("vs{}", year),
        format!("{}{} {}", VS_PREFIX, internal, year),
    ))
}
