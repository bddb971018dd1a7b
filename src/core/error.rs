//! Error taxonomy and exit codes.
//!
//! Every error that should reach the user with a specific exit code is a
//! [`BauerError`]. Everything else travels as a plain `anyhow::Error` and is
//! reported as unclassified.

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::util::diagnostic::Diagnostic;

/// Exit code for malformed or missing command-line input.
pub const EXIT_PROGRAM_ARGUMENT_ERROR: i32 = 1;
/// Exit code for a missing or broken CMake installation.
pub const EXIT_CMAKE_PROBLEM: i32 = 10;
/// Exit code for an external tool that returned non-zero.
pub const EXIT_TOOL_FAILED: i32 = 11;
/// Exit code for an ambiguous first-time call.
pub const EXIT_INCORRECT_CALL: i32 = 12;
/// Exit code for commands against unprepared build directories.
pub const EXIT_PREPARED_STATE_ERROR: i32 = 13;
/// Exit code for anything not covered above.
pub const EXIT_UNCLASSIFIED: i32 = 50;

/// Errors with a stable, user-facing exit code.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum BauerError {
    #[error("{0}")]
    #[diagnostic(code(bauer::argument))]
    ProgramArgument(String),

    #[error("invalid platform name: '{0}'")]
    #[diagnostic(code(bauer::argument::platform))]
    InvalidPlatformName(String),

    #[error("invalid architecture name: '{arch}' (platform {platform})")]
    #[diagnostic(code(bauer::argument::arch))]
    InvalidArchitecture { platform: String, arch: String },

    #[error("invalid config name: '{0}'")]
    #[diagnostic(code(bauer::argument::config), help("Valid configs are Debug and Release"))]
    InvalidConfigName(String),

    #[error("{0}")]
    #[diagnostic(
        code(bauer::incorrect_call),
        help("Pass --platform and --build-system on the first `prepare`")
    )]
    IncorrectCall(String),

    #[error("{0}")]
    #[diagnostic(
        code(bauer::prepared_state),
        help("Run `bauer prepare` for this platform first")
    )]
    PreparedState(String),

    #[error("there was a problem calling cmake: {message}")]
    #[diagnostic(
        code(bauer::cmake),
        help("CMake is required. Install it from https://cmake.org/download and make sure it is on PATH")
    )]
    CMakeProblem { message: String, stderr: String },

    #[error("cmake server: {0}")]
    #[diagnostic(
        code(bauer::cmake::server),
        help("CMake 3.7 to 3.19 is required for server mode")
    )]
    CMakeServer(String),

    #[error("`{command}` failed with exit code {exit_code}")]
    #[diagnostic(code(bauer::tool_failed), help("Run again with -d for the full tool output"))]
    ToolFailed { command: String, exit_code: i32 },

    #[error("application failed with exit code: 0x{exit_code:02x}")]
    #[diagnostic(code(bauer::run))]
    ApplicationFailed { exit_code: i32 },

    #[error("{0}")]
    #[diagnostic(code(bauer::sdk))]
    MissingSdk(String),
}

impl BauerError {
    /// The process exit code for this error kind.
    pub fn exit_code(&self) -> i32 {
        match self {
            BauerError::ProgramArgument(_)
            | BauerError::InvalidPlatformName(_)
            | BauerError::InvalidArchitecture { .. }
            | BauerError::InvalidConfigName(_) => EXIT_PROGRAM_ARGUMENT_ERROR,
            BauerError::CMakeProblem { .. } | BauerError::CMakeServer(_) => EXIT_CMAKE_PROBLEM,
            BauerError::ToolFailed { .. } => EXIT_TOOL_FAILED,
            BauerError::IncorrectCall(_) => EXIT_INCORRECT_CALL,
            BauerError::PreparedState(_) => EXIT_PREPARED_STATE_ERROR,
            BauerError::ApplicationFailed { exit_code } => *exit_code,
            BauerError::MissingSdk(_) => EXIT_UNCLASSIFIED,
        }
    }

    /// Shorthand for an architecture that the platform does not support.
    pub fn invalid_arch(platform: impl ToString, arch: impl Into<String>) -> Self {
        BauerError::InvalidArchitecture {
            platform: platform.to_string(),
            arch: arch.into(),
        }
    }

    /// Convert to a user-friendly diagnostic. The help line is the one
    /// attached to the variant's `#[diagnostic]`.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut diag = Diagnostic::error(self.to_string());

        match self {
            BauerError::InvalidPlatformName(_) => {
                diag = diag.with_suggestion(format!(
                    "Use one of: {}",
                    crate::core::Platform::ALL
                        .iter()
                        .map(|p| p.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            }
            BauerError::InvalidArchitecture { platform, .. } => {
                diag = diag.with_suggestion(format!(
                    "Use `--arch std` for the default architecture of {}",
                    platform
                ))
            }
            BauerError::CMakeProblem { stderr, .. } if !stderr.is_empty() => {
                diag = diag.with_context(stderr.clone())
            }
            _ => {}
        }

        if let Some(help) = MietteDiagnostic::help(self) {
            diag = diag.with_suggestion(help.to_string());
        }
        diag
    }
}

/// Exit code for an arbitrary error chain.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<BauerError>())
        .map(BauerError::exit_code)
        .unwrap_or(EXIT_UNCLASSIFIED)
}

/// Process exit status for an error.
///
/// Application exit codes may not fit a byte. A code whose low byte is zero
/// would read as success, so it is reported as unclassified instead.
pub fn exit_status_for(err: &anyhow::Error) -> u8 {
    match (exit_code_for(err) & 0xff) as u8 {
        0 => EXIT_UNCLASSIFIED as u8,
        status => status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_stable() {
        assert_eq!(BauerError::ProgramArgument("x".into()).exit_code(), 1);
        assert_eq!(BauerError::InvalidPlatformName("x".into()).exit_code(), 1);
        assert_eq!(BauerError::invalid_arch("mac", "arm").exit_code(), 1);
        assert_eq!(BauerError::InvalidConfigName("x".into()).exit_code(), 1);
        assert_eq!(
            BauerError::CMakeProblem {
                message: "x".into(),
                stderr: String::new()
            }
            .exit_code(),
            10
        );
        assert_eq!(
            BauerError::ToolFailed {
                command: "cmake".into(),
                exit_code: 2
            }
            .exit_code(),
            11
        );
        assert_eq!(BauerError::IncorrectCall("x".into()).exit_code(), 12);
        assert_eq!(BauerError::PreparedState("x".into()).exit_code(), 13);
    }

    #[test]
    fn test_exit_code_for_wrapped_error() {
        let err = anyhow::Error::from(BauerError::PreparedState("nothing".into()))
            .context("while processing android");
        assert_eq!(exit_code_for(&err), 13);

        let plain = anyhow::anyhow!("boom");
        assert_eq!(exit_code_for(&plain), EXIT_UNCLASSIFIED);
    }

    #[test]
    fn test_diagnostic_help_comes_from_variant() {
        let err = BauerError::PreparedState("nothing prepared".into());
        let diag = err.to_diagnostic();
        assert_eq!(
            diag.suggestions,
            vec!["Run `bauer prepare` for this platform first".to_string()]
        );
        assert_eq!(
            MietteDiagnostic::code(&err).map(|c| c.to_string()).as_deref(),
            Some("bauer::prepared_state")
        );

        let err = BauerError::CMakeProblem {
            message: "no generator".into(),
            stderr: "CMake Error: boom".into(),
        };
        let diag = err.to_diagnostic();
        assert_eq!(diag.context, vec!["CMake Error: boom".to_string()]);
        assert_eq!(diag.suggestions.len(), 1);

        let diag = BauerError::InvalidPlatformName("amiga".into()).to_diagnostic();
        assert!(diag.suggestions[0].contains("webems"));
    }

    #[test]
    fn test_exit_status_never_reads_as_success() {
        let status = |code| exit_status_for(&BauerError::ApplicationFailed { exit_code: code }.into());
        assert_eq!(status(3), 3);
        assert_eq!(status(256), 50);
        assert_eq!(status(512), 50);
        assert_eq!(status(259), 3);
        assert_eq!(status(-1), 255);
        assert_eq!(exit_status_for(&BauerError::PreparedState("x".into()).into()), 13);
    }

    #[test]
    fn test_tool_failed_message() {
        let err = BauerError::ToolFailed {
            command: "cmake --build out".into(),
            exit_code: 2,
        };
        assert_eq!(err.to_string(), "`cmake --build out` failed with exit code 2");
    }
}
