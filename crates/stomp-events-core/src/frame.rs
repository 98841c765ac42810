//! Text frame codec.
//!
//! A frame on the wire is:
//!
//! ```text
//! COMMAND
//! key:value
//! key:value
//!
//! body...
//! ```
//!
//! The record-separating terminator byte is not part of the frame; the
//! transport appends it on send and strips it on receive.

use std::collections::HashMap;

use crate::protocol::{ClientCommand, header};

/// One protocol message: a command, a set of headers, and a body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    command: String,
    headers: HashMap<String, String>,
    body: String,
}

impl Frame {
    /// Create a frame with the given command and no headers or body.
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            headers: HashMap::new(),
            body: String::new(),
        }
    }

    /// Add a header. A later value for the same key replaces the earlier one.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set the body.
    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// CONNECT request.
    #[must_use]
    pub fn connect(accept_version: &str, host: &str, login: &str, passcode: &str) -> Self {
        Self::new(ClientCommand::Connect.as_str())
            .header(header::ACCEPT_VERSION, accept_version)
            .header(header::HOST, host)
            .header(header::LOGIN, login)
            .header(header::PASSCODE, passcode)
    }

    /// SUBSCRIBE request for `channel`.
    #[must_use]
    pub fn subscribe(channel: &str, subscription_id: u64, receipt_id: u64) -> Self {
        Self::new(ClientCommand::Subscribe.as_str())
            .header(header::DESTINATION, destination(channel))
            .header(header::ID, subscription_id.to_string())
            .header(header::RECEIPT, receipt_id.to_string())
    }

    /// UNSUBSCRIBE request. Carries the subscription id only, never a destination.
    #[must_use]
    pub fn unsubscribe(subscription_id: u64, receipt_id: u64) -> Self {
        Self::new(ClientCommand::Unsubscribe.as_str())
            .header(header::ID, subscription_id.to_string())
            .header(header::RECEIPT, receipt_id.to_string())
    }

    /// SEND request publishing `body` to `channel`.
    #[must_use]
    pub fn send(channel: &str, body: impl Into<String>) -> Self {
        Self::new(ClientCommand::Send.as_str())
            .header(header::DESTINATION, destination(channel))
            .body(body)
    }

    /// DISCONNECT request.
    #[must_use]
    pub fn disconnect(receipt_id: u64) -> Self {
        Self::new(ClientCommand::Disconnect.as_str())
            .header(header::RECEIPT, receipt_id.to_string())
    }

    /// The frame command.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Header value, or the empty string when the header never arrived.
    #[must_use]
    pub fn get_header(&self, key: &str) -> &str {
        self.headers.get(key).map_or("", String::as_str)
    }

    /// Whether the header is present.
    #[must_use]
    pub fn has_header(&self, key: &str) -> bool {
        self.headers.contains_key(key)
    }

    /// All headers.
    #[must_use]
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// The frame body.
    #[must_use]
    pub fn get_body(&self) -> &str {
        &self.body
    }

    /// Render the frame as text, without the terminator byte.
    #[must_use]
    pub fn to_wire_string(&self) -> String {
        let mut out = String::with_capacity(self.command.len() + self.body.len() + 64);
        out.push_str(&self.command);
        out.push('\n');
        for (key, value) in &self.headers {
            out.push_str(key);
            out.push(':');
            out.push_str(value);
            out.push('\n');
        }
        out.push('\n');
        out.push_str(&self.body);
        out
    }

    /// Serialize to bytes, without the terminator byte.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        self.to_wire_string().into_bytes()
    }

    /// Parse one frame.
    ///
    /// Never fails: invalid UTF-8 is replaced, a header line without `:` is
    /// skipped, and input that ends before the blank line yields the command
    /// and headers seen so far with an empty body.
    #[must_use]
    pub fn parse(bytes: &[u8]) -> Self {
        let text = String::from_utf8_lossy(bytes);
        // EOLs between frames are heart-beats.
        let mut rest = text.trim_start_matches(['\r', '\n']);
        let mut frame = Self::default();

        let Some((command, after)) = rest.split_once('\n') else {
            frame.command = strip_cr(rest).to_string();
            return frame;
        };
        frame.command = strip_cr(command).to_string();
        rest = after;

        loop {
            let Some((line, after)) = rest.split_once('\n') else {
                // No blank line before end of input: keep any last header, drop the body.
                tracing::debug!(command = %frame.command, "frame ended before the blank line");
                frame.insert_header_line(rest);
                return frame;
            };
            rest = after;
            let line = strip_cr(line);
            if line.is_empty() {
                frame.body = rest.to_string();
                return frame;
            }
            frame.insert_header_line(line);
        }
    }

    fn insert_header_line(&mut self, line: &str) {
        let line = strip_cr(line);
        if let Some((key, value)) = line.split_once(':') {
            self.headers.insert(key.to_string(), value.to_string());
        } else if !line.is_empty() {
            tracing::debug!(line, "skipping header line without ':'");
        }
    }
}

/// Destination header value for a channel.
#[must_use]
pub fn destination(channel: &str) -> String {
    format!("/{channel}")
}

fn strip_cr(line: &str) -> &str {
    line.strip_suffix('\r').unwrap_or(line)
}
