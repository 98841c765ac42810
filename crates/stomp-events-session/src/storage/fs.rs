//! Filesystem-backed batch source and report sink.

use async_trait::async_trait;
use stomp_events_core::{
    Batch,
    traits::{BatchError, BatchSource, ReportError, ReportSink},
};

/// Reads batches from and writes reports to the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsStore;

impl FsStore {
    /// Create a filesystem store.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl BatchSource for FsStore {
    async fn load_events(&self, path: &str) -> Result<Batch, BatchError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| BatchError::Io {
                path: path.to_string(),
                source,
            })?;

        Batch::from_json(&text).map_err(|source| BatchError::Malformed {
            path: path.to_string(),
            source,
        })
    }
}

#[async_trait]
impl ReportSink for FsStore {
    async fn write_summary(&self, path: &str, text: &str) -> Result<(), ReportError> {
        tokio::fs::write(path, text)
            .await
            .map_err(|source| ReportError {
                path: path.to_string(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_and_write() {
        let dir = tempfile::tempdir().unwrap();
        let batch_path = dir.path().join("events.json");
        tokio::fs::write(
            &batch_path,
            r#"{"team a": "Germany", "team b": "Japan",
                "events": [{"event name": "kickoff", "time": 0}]}"#,
        )
        .await
        .unwrap();

        let store = FsStore::new();
        let batch = store
            .load_events(batch_path.to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(batch.channel(), "Germany_Japan");
        assert_eq!(batch.events.len(), 1);

        let report_path = dir.path().join("summary.txt");
        store
            .write_summary(report_path.to_str().unwrap(), "Germany vs Japan\n")
            .await
            .unwrap();
        let written = tokio::fs::read_to_string(&report_path).await.unwrap();
        assert_eq!(written, "Germany vs Japan\n");
    }

    #[tokio::test]
    async fn test_missing_and_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new();

        let missing = dir.path().join("missing.json");
        let err = store
            .load_events(missing.to_str().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, BatchError::Io { .. }));

        let broken = dir.path().join("broken.json");
        tokio::fs::write(&broken, "{ not json").await.unwrap();
        let err = store
            .load_events(broken.to_str().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, BatchError::Malformed { .. }));
    }

    #[tokio::test]
    async fn test_unwritable_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no-such-dir").join("summary.txt");
        let err = FsStore::new()
            .write_summary(path.to_str().unwrap(), "x")
            .await
            .unwrap_err();
        assert!(err.path.ends_with("summary.txt"));
    }
}
