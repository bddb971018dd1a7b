//! CMake server-mode wire format and transports.
//!
//! Every message is a JSON object on its own line between two literal
//! marker lines:
//!
//! ```text
//! [== "CMake Server" ==[
//! {"type":"hello", ...}
//! ]== "CMake Server" ==]
//! ```

#[cfg(test)]
use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout};

use anyhow::{Context, Result};
use serde_json::Value;

use crate::core::error::BauerError;
use crate::util::process::ProcessBuilder;

pub const START_MARKER: &str = "[== \"CMake Server\" ==[";
pub const END_MARKER: &str = "]== \"CMake Server\" ==]";

/// Frame one message for sending.
pub fn encode_message(message: &Value) -> String {
    format!("\n{}\n{}\n{}\n", START_MARKER, message, END_MARKER)
}

/// Read the next framed message. Returns `None` at end of stream.
///
/// Lines outside of the markers are ignored.
pub fn read_message<R: BufRead>(reader: &mut R) -> Result<Option<Value>> {
    let mut line = String::new();
    let mut body: Option<String> = None;

    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }

        let trimmed = line.trim_end_matches(['\r', '\n']);
        match body {
            None if trimmed == START_MARKER => body = Some(String::new()),
            None => {}
            Some(ref mut text) if trimmed == END_MARKER => {
                let value = serde_json::from_str(text).map_err(|e| {
                    BauerError::CMakeServer(format!("malformed message from server: {}", e))
                })?;
                return Ok(Some(value));
            }
            Some(ref mut text) => text.push_str(trimmed),
        }
    }
}

/// A bidirectional message channel to a CMake server.
pub trait Transport {
    /// Send one request.
    fn send(&mut self, message: &Value) -> Result<()>;

    /// Block until the next message arrives; `None` once the server is gone.
    fn receive(&mut self) -> Result<Option<Value>>;
}

/// Transport over the stdio of a `cmake -E server` child process.
pub struct ProcessTransport {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl ProcessTransport {
    /// Start `cmake -E server --experimental --debug` with stdio communication.
    pub fn spawn(cmake: ProcessBuilder) -> Result<Self> {
        let command = cmake.args(["-E", "server", "--experimental", "--debug"]);
        tracing::debug!("starting cmake server: {}", command.display_command());

        let mut child = command.spawn_piped().map_err(|e| BauerError::CMakeProblem {
            message: "failed starting cmake server".to_string(),
            stderr: format!("{:#}", e),
        })?;

        let stdin = child.stdin.take().context("cmake server has no stdin")?;
        let stdout = child.stdout.take().context("cmake server has no stdout")?;

        Ok(ProcessTransport {
            child,
            stdin,
            stdout: BufReader::new(stdout),
        })
    }
}

impl Transport for ProcessTransport {
    fn send(&mut self, message: &Value) -> Result<()> {
        self.stdin
            .write_all(encode_message(message).as_bytes())
            .and_then(|_| self.stdin.flush())
            .context("failed to write to cmake server")
    }

    fn receive(&mut self) -> Result<Option<Value>> {
        read_message(&mut self.stdout)
    }
}

impl Drop for ProcessTransport {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// In-memory transport that replays a fixed script of server messages and
/// records what the client sent.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    replies: VecDeque<Value>,
    sent: Vec<Value>,
}

#[cfg(test)]
impl ScriptedTransport {
    pub fn new(replies: impl IntoIterator<Item = Value>) -> Self {
        ScriptedTransport {
            replies: replies.into_iter().collect(),
            sent: Vec::new(),
        }
    }

    /// Requests sent so far.
    pub fn sent(&self) -> &[Value] {
        &self.sent
    }
}

#[cfg(test)]
impl Transport for ScriptedTransport {
    fn send(&mut self, message: &Value) -> Result<()> {
        self.sent.push(message.clone());
        Ok(())
    }

    fn receive(&mut self) -> Result<Option<Value>> {
        Ok(self.replies.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Cursor;

    #[test]
    fn test_encode_message() {
        let text = encode_message(&json!({"type": "compute", "cookie": "COMPUTE"}));
        assert!(text.starts_with("\n[== \"CMake Server\" ==[\n{"));
        assert!(text.ends_with("}\n]== \"CMake Server\" ==]\n"));
    }

    #[test]
    fn test_read_messages_in_sequence() {
        let stream = format!(
            "noise\n{}\n{{\"type\":\"hello\"}}\n{}\r\n\n{}\n{{\"type\":\n\"reply\"}}\n{}\n",
            START_MARKER, END_MARKER, START_MARKER, END_MARKER
        );
        let mut reader = Cursor::new(stream);

        assert_eq!(
            read_message(&mut reader).unwrap(),
            Some(json!({"type": "hello"}))
        );
        assert_eq!(
            read_message(&mut reader).unwrap(),
            Some(json!({"type": "reply"}))
        );
        assert_eq!(read_message(&mut reader).unwrap(), None);
    }

    #[test]
    fn test_read_malformed_message() {
        let stream = format!("{}\n{{not json\n{}\n", START_MARKER, END_MARKER);
        let err = read_message(&mut Cursor::new(stream)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BauerError>(),
            Some(BauerError::CMakeServer(_))
        ));
    }

    #[test]
    fn test_scripted_transport_records_requests() {
        let mut transport = ScriptedTransport::new([json!({"type": "hello"})]);
        transport.send(&json!({"type": "handshake"})).unwrap();

        assert_eq!(transport.sent(), &[json!({"type": "handshake"})]);
        assert_eq!(transport.receive().unwrap(), Some(json!({"type": "hello"})));
        assert_eq!(transport.receive().unwrap(), None);
    }
}
