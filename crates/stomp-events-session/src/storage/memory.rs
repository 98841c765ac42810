//! In-memory batch source and report sink.

use std::{
    collections::{HashMap, HashSet},
    io,
    sync::{PoisonError, RwLock},
};

use async_trait::async_trait;
use stomp_events_core::{
    Batch,
    traits::{BatchError, BatchSource, ReportError, ReportSink},
};

/// In-memory store.
///
/// Useful for tests and embedding callers that keep batches in memory.
/// Batches are held as document text so malformed input behaves as it
/// would on disk.
#[derive(Debug, Default)]
pub struct MemoryStore {
    batches: RwLock<HashMap<String, String>>,
    reports: RwLock<HashMap<String, String>>,
    read_only: RwLock<HashSet<String>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a batch document under `path`.
    pub fn insert_batch(&self, path: impl Into<String>, document: impl Into<String>) {
        self.batches
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.into(), document.into());
    }

    /// Make writes to `path` fail.
    pub fn deny_writes(&self, path: impl Into<String>) {
        self.read_only
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.into());
    }

    /// Report written to `path`, if any.
    #[must_use]
    pub fn report(&self, path: &str) -> Option<String> {
        self.reports
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .cloned()
    }
}

#[async_trait]
impl BatchSource for MemoryStore {
    async fn load_events(&self, path: &str) -> Result<Batch, BatchError> {
        let document = self
            .batches
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .cloned()
            .ok_or_else(|| BatchError::Io {
                path: path.to_string(),
                source: io::Error::from(io::ErrorKind::NotFound),
            })?;

        Batch::from_json(&document).map_err(|source| BatchError::Malformed {
            path: path.to_string(),
            source,
        })
    }
}

#[async_trait]
impl ReportSink for MemoryStore {
    async fn write_summary(&self, path: &str, text: &str) -> Result<(), ReportError> {
        if self
            .read_only
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(path)
        {
            return Err(ReportError {
                path: path.to_string(),
                source: io::Error::from(io::ErrorKind::PermissionDenied),
            });
        }

        self.reports
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.to_string(), text.to_string());
        Ok(())
    }
}
