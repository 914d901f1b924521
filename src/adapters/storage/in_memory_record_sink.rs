//! In-Memory Record Sink Adapter
//!
//! Keeps completed records in memory. Useful for testing and development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::SessionId;
use crate::domain::intake::IntakeRecord;
use crate::ports::{RecordSink, RecordSinkError};

/// In-memory storage for completed intake records
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecordSink {
    records: Arc<RwLock<HashMap<SessionId, IntakeRecord>>>,
}

impl InMemoryRecordSink {
    /// Create a new in-memory sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of stored records
    pub async fn record_count(&self) -> usize {
        self.records.read().await.len()
    }

    /// Get a stored record by session
    pub async fn get(&self, session_id: &SessionId) -> Option<IntakeRecord> {
        self.records.read().await.get(session_id).cloned()
    }

    /// All stored records, in no particular order
    pub async fn records(&self) -> Vec<IntakeRecord> {
        self.records.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl RecordSink for InMemoryRecordSink {
    async fn store(&self, record: &IntakeRecord) -> Result<(), RecordSinkError> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.session_id) {
            return Err(RecordSinkError::AlreadyStored(record.session_id));
        }
        records.insert(record.session_id, record.clone());
        Ok(())
    }
}
