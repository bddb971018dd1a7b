//! bauer - build orchestration on top of CMake
//!
//! This crate resolves build configurations against an on-disk build tree,
//! drives cmake through its server protocol and runs the platform tools
//! (cmake, Gradle, the Android SDK, emscripten) for each configuration.

pub mod cmake;
pub mod core;
pub mod executor;
pub mod ops;
pub mod util;

pub use core::{BauerError, BuildConfiguration, BuildType, Platform};
pub use ops::{Command, CommandProcessor};
pub use util::context::GlobalContext;
