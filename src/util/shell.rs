//! Status output for the command line.
//!
//! Status lines go to stderr in the `{status:>12} {message}` format. Tool
//! output (cmake, gradle) is inherited and not touched here.

use std::fmt::Display;
use std::io::{self, IsTerminal};
use std::time::{Duration, Instant};

/// Color output mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorChoice {
    /// Detect TTY and use colors if available.
    #[default]
    Auto,
    Always,
    Never,
}

/// Status types for output messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Preparing,
    Building,
    Cleaning,
    Running,
    Packaging,
    Removed,
    Finished,
}

impl Status {
    fn as_str(&self) -> &'static str {
        match self {
            Status::Preparing => "Preparing",
            Status::Building => "Building",
            Status::Cleaning => "Cleaning",
            Status::Running => "Running",
            Status::Packaging => "Packaging",
            Status::Removed => "Removed",
            Status::Finished => "Finished",
        }
    }

    fn color_code(&self) -> &'static str {
        match self {
            Status::Finished | Status::Removed => "\x1b[1;32m",
            Status::Preparing
            | Status::Building
            | Status::Cleaning
            | Status::Running
            | Status::Packaging => "\x1b[1;36m",
        }
    }
}

const STATUS_WIDTH: usize = 12;

/// Central shell for all CLI status output.
#[derive(Debug, Clone)]
pub struct Shell {
    verbose: bool,
    use_color: bool,
}

impl Shell {
    pub fn new(verbose: bool, color: ColorChoice) -> Self {
        let use_color = match color {
            ColorChoice::Auto => io::stderr().is_terminal(),
            ColorChoice::Always => true,
            ColorChoice::Never => false,
        };
        Shell { verbose, use_color }
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn use_color(&self) -> bool {
        self.use_color
    }

    /// Print a status message.
    pub fn status(&self, status: Status, msg: impl Display) {
        eprintln!("{} {}", self.format_status(status), msg);
    }

    /// Start a timed operation; the `Finished` line is printed by
    /// [`Span::finish`].
    pub fn span(&self, status: Status, msg: impl Display) -> Span {
        let message = msg.to_string();
        self.status(status, &message);
        Span {
            shell: self.clone(),
            message,
            start: Instant::now(),
        }
    }

    fn format_status(&self, status: Status) -> String {
        let text = status.as_str();
        if self.use_color {
            format!(
                "{}{:>width$}\x1b[0m",
                status.color_code(),
                text,
                width = STATUS_WIDTH
            )
        } else {
            format!("{:>width$}", text, width = STATUS_WIDTH)
        }
    }
}

impl Default for Shell {
    fn default() -> Self {
        Shell::new(false, ColorChoice::Auto)
    }
}

/// A timed operation. Nothing is printed if it is dropped unfinished,
/// the error report takes over in that case.
pub struct Span {
    shell: Shell,
    message: String,
    start: Instant,
}

impl Span {
    pub fn finish(self) {
        let elapsed = format_duration(self.start.elapsed());
        self.shell
            .status(Status::Finished, format!("{} in {}", self.message, elapsed));
    }
}

fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs < 60.0 {
        format!("{:.2}s", secs)
    } else {
        format!("{:.1}m", secs / 60.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(500)), "0.50s");
        assert_eq!(format_duration(Duration::from_secs(2)), "2.00s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1.5m");
    }

    #[test]
    fn test_status_formatting() {
        let shell = Shell::new(false, ColorChoice::Never);

        let formatted = shell.format_status(Status::Preparing);
        assert_eq!(formatted.trim(), "Preparing");
        assert_eq!(formatted.len(), 12);
    }

    #[test]
    fn test_colored_status() {
        let shell = Shell::new(true, ColorChoice::Always);
        assert!(shell.is_verbose());
        assert!(shell.format_status(Status::Removed).starts_with("\x1b[1;32m"));
    }
}
