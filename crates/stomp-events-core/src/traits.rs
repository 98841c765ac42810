//! Capability traits consumed by the session.

use async_trait::async_trait;
use thiserror::Error;

use crate::batch::Batch;

/// Transport error.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Cannot connect to {0}")]
    Connect(String),
    #[error("Connection closed")]
    Closed,
    #[error("Frame exceeds {0} bytes")]
    FrameTooLarge(usize),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Terminator-delimited byte stream to the server.
///
/// One call to [`Transport::send`] carries one encoded frame; the
/// implementation appends the terminator byte. [`Transport::receive`]
/// yields one frame with the terminator stripped.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one frame.
    async fn send(&self, frame: &[u8]) -> Result<(), TransportError>;

    /// Block until the next frame arrives.
    ///
    /// Returns `Ok(None)` at end of stream, including after [`Transport::close`].
    async fn receive(&self) -> Result<Option<Vec<u8>>, TransportError>;

    /// Close the stream. Pending and later receives return end of stream.
    async fn close(&self);
}

/// Batch-file load error.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}: {source}")]
    Malformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Source of event batches.
#[async_trait]
pub trait BatchSource: Send + Sync {
    /// Load the batch stored at `path`.
    async fn load_events(&self, path: &str) -> Result<Batch, BatchError>;
}

/// Report write error.
#[derive(Debug, Error)]
#[error("{path}: {source}")]
pub struct ReportError {
    pub path: String,
    #[source]
    pub source: std::io::Error,
}

/// Destination for summary reports.
#[async_trait]
pub trait ReportSink: Send + Sync {
    /// Write `text` to `path`, replacing any previous content.
    async fn write_summary(&self, path: &str, text: &str) -> Result<(), ReportError>;
}
