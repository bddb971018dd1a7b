//! High-level operations.
//!
//! Configuration resolution and the per-configuration command loop.

pub mod command;
pub mod resolve;

pub use command::{Command, CommandProcessor};
pub use resolve::{default_buildsystem, ConfigurationResolver};
