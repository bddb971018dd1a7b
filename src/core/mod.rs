//! Core data structures for bauer.
//!
//! - Build configurations and the command-line filter over them
//! - The on-disk build directory layout
//! - Per-directory generator state
//! - The error taxonomy and exit codes

pub mod configuration;
pub mod error;
pub mod layout;
pub mod state;

pub use configuration::{
    BuildConfiguration, BuildType, ConfigurationFilter, Platform, ANDROID_STUDIO, STD_ARCH,
};
pub use error::BauerError;
pub use layout::BuildDirectoryLayout;
pub use state::GeneratorState;
