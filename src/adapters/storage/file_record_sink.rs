//! File-based Record Sink Adapter
//!
//! Writes each completed intake as `<session_id>.yaml` under a base directory.
//! Files are created exclusively, so a session can never be written twice.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::domain::foundation::SessionId;
use crate::domain::intake::IntakeRecord;
use crate::ports::{RecordSink, RecordSinkError};

/// File-based storage for completed intake records
#[derive(Debug, Clone)]
pub struct FileRecordSink {
    base_path: PathBuf,
}

impl FileRecordSink {
    /// Create a new file sink rooted at `base_path`
    ///
    /// The directory is created on first write.
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    /// Path of the record file for a session
    pub fn record_path(&self, session_id: &SessionId) -> PathBuf {
        self.base_path.join(format!("{}.yaml", session_id))
    }

    async fn ensure_dir(&self) -> Result<(), RecordSinkError> {
        fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| RecordSinkError::IoError(e.to_string()))
    }
}

#[async_trait]
impl RecordSink for FileRecordSink {
    async fn store(&self, record: &IntakeRecord) -> Result<(), RecordSinkError> {
        let yaml = serde_yaml::to_string(record)
            .map_err(|e| RecordSinkError::SerializationFailed(e.to_string()))?;

        self.ensure_dir().await?;

        let path = self.record_path(&record.session_id);
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => RecordSinkError::AlreadyStored(record.session_id),
                _ => RecordSinkError::IoError(e.to_string()),
            })?;

        file.write_all(yaml.as_bytes())
            .await
            .map_err(|e| RecordSinkError::IoError(e.to_string()))?;
        file.flush()
            .await
            .map_err(|e| RecordSinkError::IoError(e.to_string()))?;

        tracing::info!(
            session_id = %record.session_id,
            path = %path.display(),
            "Intake record stored"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn writes_yaml_named_after_session() {
        let dir = TempDir::new().unwrap();
        let sink = FileRecordSink::new(dir.path());
        let record = IntakeRecord::test_fixture();

        sink.store(&record).await.unwrap();

        let path = dir.path().join(format!("{}.yaml", record.session_id));
        let yaml = std::fs::read_to_string(path).unwrap();
        let parsed: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed["fields"]["name"].as_str(), Some("Sarah Connor"));
        assert_eq!(parsed["fields"]["analysis"].as_str(), Some("Possible meniscus strain"));
        assert_eq!(
            parsed["session_id"].as_str(),
            Some(record.session_id.to_string().as_str())
        );
    }

    #[tokio::test]
    async fn fields_are_written_in_sequence_order() {
        let dir = TempDir::new().unwrap();
        let sink = FileRecordSink::new(dir.path());
        let record = IntakeRecord::test_fixture();

        sink.store(&record).await.unwrap();

        let yaml = std::fs::read_to_string(sink.record_path(&record.session_id)).unwrap();
        let name = yaml.find("name:").unwrap();
        let address = yaml.find("address:").unwrap();
        let analysis = yaml.find("analysis:").unwrap();
        assert!(name < address && address < analysis);
    }

    #[tokio::test]
    async fn creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        let sink = FileRecordSink::new(&nested);

        sink.store(&IntakeRecord::test_fixture()).await.unwrap();

        assert!(nested.is_dir());
    }

    #[tokio::test]
    async fn second_store_for_same_session_is_rejected() {
        let dir = TempDir::new().unwrap();
        let sink = FileRecordSink::new(dir.path());
        let record = IntakeRecord::test_fixture();

        sink.store(&record).await.unwrap();
        let err = sink.store(&record).await.unwrap_err();

        assert!(matches!(err, RecordSinkError::AlreadyStored(id) if id == record.session_id));
    }

    #[tokio::test]
    async fn unwritable_location_is_io_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "x").unwrap();
        let sink = FileRecordSink::new(&blocker);

        let err = sink.store(&IntakeRecord::test_fixture()).await.unwrap_err();

        assert!(matches!(err, RecordSinkError::IoError(_)));
    }
}
