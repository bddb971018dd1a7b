//! CMake integration: server-mode client, code model and generator catalogue.

pub mod codemodel;
pub mod generator;
pub mod protocol;
pub mod server;

pub use codemodel::{CodeModel, Target, TargetType};
pub use generator::GeneratorInfo;
pub use protocol::{ProcessTransport, Transport};
pub use server::{CMakeServer, OpenRequest, ServerState};
