//! Wire command vocabulary.

use std::fmt;

/// Protocol version offered in CONNECT.
pub const ACCEPT_VERSION: &str = "1.2";

/// Record-separating sentinel appended after every frame on the byte stream.
pub const FRAME_TERMINATOR: u8 = b'\0';

/// Header names.
pub mod header {
    pub const ACCEPT_VERSION: &str = "accept-version";
    pub const HOST: &str = "host";
    pub const LOGIN: &str = "login";
    pub const PASSCODE: &str = "passcode";
    pub const DESTINATION: &str = "destination";
    pub const ID: &str = "id";
    pub const RECEIPT: &str = "receipt";
    pub const RECEIPT_ID: &str = "receipt-id";
    pub const MESSAGE: &str = "message";
}

/// Commands the client sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientCommand {
    Connect,
    Subscribe,
    Unsubscribe,
    Send,
    Disconnect,
}

impl ClientCommand {
    /// Wire form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "CONNECT",
            Self::Subscribe => "SUBSCRIBE",
            Self::Unsubscribe => "UNSUBSCRIBE",
            Self::Send => "SEND",
            Self::Disconnect => "DISCONNECT",
        }
    }
}

impl fmt::Display for ClientCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Commands the server sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServerCommand {
    Connected,
    Error,
    Receipt,
    Message,
}

impl ServerCommand {
    /// Match a wire command. Unrecognized commands yield `None`.
    #[must_use]
    pub fn parse(command: &str) -> Option<Self> {
        match command {
            "CONNECTED" => Some(Self::Connected),
            "ERROR" => Some(Self::Error),
            "RECEIPT" => Some(Self::Receipt),
            "MESSAGE" => Some(Self::Message),
            _ => None,
        }
    }

    /// Wire form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connected => "CONNECTED",
            Self::Error => "ERROR",
            Self::Receipt => "RECEIPT",
            Self::Message => "MESSAGE",
        }
    }
}

impl fmt::Display for ServerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
