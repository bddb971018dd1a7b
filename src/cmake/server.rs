//! CMake server-mode client.
//!
//! One client talks to one server process for one build directory:
//!
//! ```text
//! open:      hello -> handshake -> globalSettings       (Ready)
//! configure: configure -> compute -> codemodel          (CodeModelReceived)
//! ```
//!
//! Every request carries a cookie and every packet received while waiting
//! for it must echo that cookie and the request type in `inReplyTo`.
//! Anything else aborts the conversation.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{json, Value};

use crate::cmake::codemodel::CodeModel;
use crate::cmake::protocol::{ProcessTransport, Transport};
use crate::core::error::BauerError;
use crate::util::process::ProcessBuilder;

pub const HANDSHAKE_COOKIE: &str = "OPEN_HANDSHAKE";
pub const GLOBAL_SETTINGS_COOKIE: &str = "GLOBAL_SETTINGS";
pub const CONFIGURE_COOKIE: &str = "CONFIGURE";
pub const COMPUTE_COOKIE: &str = "COMPUTE";
pub const CODEMODEL_COOKIE: &str = "CODEMODEL";

/// Where the conversation with the server stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    NotStarted,
    HandshakeSent,
    HandshakeAcked,
    GlobalSettingsRequested,
    Ready,
    Configuring,
    Computing,
    CodeModelRequested,
    CodeModelReceived,
}

/// Protocol version negotiated during the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolVersion {
    pub major: u64,
    pub minor: u64,
}

/// What to open the server for.
#[derive(Debug, Clone)]
pub struct OpenRequest {
    pub source_dir: PathBuf,
    pub build_dir: PathBuf,
    pub generator: String,
    pub extra_generator: String,
}

impl OpenRequest {
    pub fn new(source_dir: &Path, build_dir: &Path, generator: impl Into<String>) -> Self {
        OpenRequest {
            source_dir: source_dir.to_path_buf(),
            build_dir: build_dir.to_path_buf(),
            generator: generator.into(),
            extra_generator: String::new(),
        }
    }
}

/// Client for one CMake server process.
pub struct CMakeServer<T: Transport = ProcessTransport> {
    transport: T,
    state: ServerState,
    protocol_version: ProtocolVersion,
    global_settings: Value,
    code_model: Option<CodeModel>,
}

impl CMakeServer<ProcessTransport> {
    /// Spawn `cmake` in server mode and open it for `request`.
    pub fn spawn(
        cmake: &Path,
        request: &OpenRequest,
        extra_env: &BTreeMap<String, String>,
    ) -> Result<Self> {
        let transport = ProcessTransport::spawn(ProcessBuilder::new(cmake).envs(extra_env))?;
        CMakeServer::open(transport, request)
    }
}

impl<T: Transport> CMakeServer<T> {
    /// Perform hello, handshake and globalSettings over `transport`.
    pub fn open(transport: T, request: &OpenRequest) -> Result<Self> {
        let mut server = CMakeServer {
            transport,
            state: ServerState::NotStarted,
            protocol_version: ProtocolVersion { major: 0, minor: 0 },
            global_settings: Value::Null,
            code_model: None,
        };

        let hello = server.transport.receive()?.ok_or_else(|| {
            BauerError::CMakeProblem {
                message: "unknown failure, maybe cmake does not support server mode".to_string(),
                stderr: String::new(),
            }
        })?;

        if hello.get("type").and_then(Value::as_str) != Some("hello") {
            return Err(protocol_error("no hello message received from server").into());
        }

        server.protocol_version = first_protocol_version(&hello)?;
        tracing::debug!(
            "server protocol version: {}.{}",
            server.protocol_version.major,
            server.protocol_version.minor
        );

        server.transport.send(&json!({
            "type": "handshake",
            "cookie": HANDSHAKE_COOKIE,
            "protocolVersion": {
                "major": server.protocol_version.major,
                "minor": server.protocol_version.minor,
            },
            "sourceDirectory": forward_slashes(&request.source_dir),
            "buildDirectory": forward_slashes(&request.build_dir),
            "generator": request.generator,
            "extraGenerator": request.extra_generator,
        }))?;
        server.state = ServerState::HandshakeSent;
        server.wait_for_reply("handshake", HANDSHAKE_COOKIE)?;
        server.state = ServerState::HandshakeAcked;

        server.transport.send(&json!({
            "type": "globalSettings",
            "cookie": GLOBAL_SETTINGS_COOKIE,
        }))?;
        server.state = ServerState::GlobalSettingsRequested;
        server.global_settings = server.wait_for_reply("globalSettings", GLOBAL_SETTINGS_COOKIE)?;
        server.state = ServerState::Ready;

        if let Some(version) = server.cmake_version() {
            tracing::debug!("cmake version: {}", version);
        }

        Ok(server)
    }

    /// Run configure, compute and codemodel in order and keep the code model.
    pub fn configure(&mut self, cache_arguments: &[String]) -> Result<&CodeModel> {
        if !matches!(
            self.state,
            ServerState::Ready | ServerState::CodeModelReceived
        ) {
            return Err(protocol_error(format!(
                "configure requested in state {:?}",
                self.state
            ))
            .into());
        }

        tracing::info!("Configuring ...");
        self.transport.send(&json!({
            "type": "configure",
            "cookie": CONFIGURE_COOKIE,
            "cacheArguments": cache_arguments,
        }))?;
        self.state = ServerState::Configuring;
        self.wait_for_reply("configure", CONFIGURE_COOKIE)?;
        tracing::info!("Done.");

        tracing::info!("Generating ...");
        self.transport.send(&json!({
            "type": "compute",
            "cookie": COMPUTE_COOKIE,
        }))?;
        self.state = ServerState::Computing;
        self.wait_for_reply("compute", COMPUTE_COOKIE)?;

        self.transport.send(&json!({
            "type": "codemodel",
            "cookie": CODEMODEL_COOKIE,
        }))?;
        self.state = ServerState::CodeModelRequested;
        let reply = self.wait_for_reply("codemodel", CODEMODEL_COOKIE)?;

        let model = self.code_model.insert(CodeModel::from_reply(reply)?);
        self.state = ServerState::CodeModelReceived;
        Ok(model)
    }

    pub fn state(&self) -> ServerState {
        self.state
    }

    pub fn protocol_version(&self) -> ProtocolVersion {
        self.protocol_version
    }

    /// The raw `globalSettings` reply.
    pub fn global_settings(&self) -> &Value {
        &self.global_settings
    }

    /// Exact version string of the running cmake.
    pub fn cmake_version(&self) -> Option<&str> {
        self.global_settings
            .pointer("/capabilities/version/string")
            .and_then(Value::as_str)
    }

    /// Code model of the last successful configure.
    pub fn code_model(&self) -> Option<&CodeModel> {
        self.code_model.as_ref()
    }

    /// Take the code model out, leaving the server ready for another configure.
    pub fn into_code_model(self) -> Option<CodeModel> {
        self.code_model
    }

    #[cfg(test)]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Drain `message`/`progress` packets until the reply to `request`.
    fn wait_for_reply(&mut self, request: &str, cookie: &str) -> Result<Value> {
        let mut progress = ConfigureProgress::default();

        loop {
            let packet = self.transport.receive()?.ok_or_else(|| {
                protocol_error(format!("server closed the connection waiting for {}", request))
            })?;

            let in_reply_to = packet.get("inReplyTo").and_then(Value::as_str);
            let packet_cookie = packet.get("cookie").and_then(Value::as_str);
            if in_reply_to != Some(request) || packet_cookie != Some(cookie) {
                return Err(protocol_error(format!(
                    "invalid packet received while waiting for {} ({}): {}",
                    request, cookie, packet
                ))
                .into());
            }

            match packet.get("type").and_then(Value::as_str) {
                Some("reply") => {
                    progress.finish();
                    return Ok(packet);
                }
                Some("message") => {
                    if let Some(message) = packet.get("message").and_then(Value::as_str) {
                        tracing::info!("-- {}", message);
                    }
                }
                Some("progress") => progress.update(&packet),
                Some("error") => {
                    progress.finish();
                    let message = packet
                        .get("errorMessage")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown error");
                    return Err(BauerError::CMakeServer(format!(
                        "error during {}: {}",
                        request, message
                    ))
                    .into());
                }
                _ => {
                    return Err(protocol_error(format!("invalid response: {}", packet)).into());
                }
            }
        }
    }
}

/// Progress bar fed by `progress` packets. Hidden when stderr is not a
/// terminal.
#[derive(Default)]
struct ConfigureProgress {
    bar: Option<ProgressBar>,
}

impl ConfigureProgress {
    fn update(&mut self, packet: &Value) {
        let number = |key: &str| packet.get(key).and_then(Value::as_u64).unwrap_or(0);
        let minimum = number("progressMinimum");
        let maximum = number("progressMaximum");
        let current = number("progressCurrent");
        let message = packet
            .get("progressMessage")
            .and_then(Value::as_str)
            .unwrap_or_default();

        tracing::debug!("{} ({}/{})", message, current, maximum);

        let bar = self.bar.get_or_insert_with(|| {
            let bar = ProgressBar::new(maximum.saturating_sub(minimum));
            if let Ok(style) = ProgressStyle::default_bar().template("{bar:30} {pos}/{len} {msg}") {
                bar.set_style(style);
            }
            bar
        });
        bar.set_length(maximum.saturating_sub(minimum));
        bar.set_position(current.saturating_sub(minimum));
        bar.set_message(message.to_string());
    }

    fn finish(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

fn first_protocol_version(hello: &Value) -> Result<ProtocolVersion, BauerError> {
    let first = hello
        .get("supportedProtocolVersions")
        .and_then(Value::as_array)
        .and_then(|versions| versions.first())
        .ok_or_else(|| protocol_error("server offered no protocol version"))?;

    match (
        first.get("major").and_then(Value::as_u64),
        first.get("minor").and_then(Value::as_u64),
    ) {
        (Some(major), Some(minor)) => Ok(ProtocolVersion { major, minor }),
        _ => Err(protocol_error(format!("malformed protocol version: {}", first))),
    }
}

fn forward_slashes(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn protocol_error(message: impl Into<String>) -> BauerError {
    BauerError::CMakeServer(message.into())
}
