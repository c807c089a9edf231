//! Job status storage implementations.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use gobot_core::JobId;

use super::types::JobRecord;

/// Storage key for a job record.
pub fn job_key(job_id: JobId) -> String {
    format!("job:{job_id}")
}

/// Job status store error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("storage error: {0}")]
    Storage(String),
    #[error("corrupt record at {key}: {reason}")]
    Corrupt { key: String, reason: String },
}

/// Key-value persistence for job records.
///
/// Writes are last-writer-wins; there is no compare-and-set. Records are
/// written as a whole, so a reader never observes a half-updated record.
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Insert or overwrite the record under `job:<record.job_id>`.
    async fn put(&self, record: &JobRecord) -> Result<(), StoreError>;

    /// Read the record, if any.
    async fn get(&self, job_id: JobId) -> Result<Option<JobRecord>, StoreError>;

    /// Remove the record. Returns whether something was removed; deleting an
    /// absent key is not an error.
    async fn delete(&self, job_id: JobId) -> Result<bool, StoreError>;

    /// Read the record, mapping absence to a `not_found` record.
    async fn status(&self, job_id: JobId) -> Result<JobRecord, StoreError> {
        Ok(self
            .get(job_id)
            .await?
            .unwrap_or_else(|| JobRecord::not_found(job_id)))
    }
}

#[async_trait]
impl<S> StatusStore for Arc<S>
where
    S: StatusStore + ?Sized,
{
    async fn put(&self, record: &JobRecord) -> Result<(), StoreError> {
        (**self).put(record).await
    }

    async fn get(&self, job_id: JobId) -> Result<Option<JobRecord>, StoreError> {
        (**self).get(job_id).await
    }

    async fn delete(&self, job_id: JobId) -> Result<bool, StoreError> {
        (**self).delete(job_id).await
    }
}

pub(crate) fn encode(record: &JobRecord) -> Result<String, StoreError> {
    serde_json::to_string(record).map_err(|e| StoreError::Storage(format!("encode failed: {e}")))
}

pub(crate) fn decode(key: &str, raw: &str) -> Result<JobRecord, StoreError> {
    serde_json::from_str(raw).map_err(|e| StoreError::Corrupt {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

/// In-memory status store for tests/dev.
///
/// Values are kept as serialised JSON, the same representation the Redis
/// store uses, so both round-trip records identically. With a TTL every
/// write carries a deadline; expired entries read as absent and are swept
/// on the next write.
#[derive(Debug, Default)]
pub struct InMemoryStatusStore {
    records: RwLock<HashMap<String, Entry>>,
    ttl: Option<Duration>,
}

#[derive(Debug)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

impl InMemoryStatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose records expire `ttl` after their last write.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            records: RwLock::default(),
            ttl: Some(ttl),
        }
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Number of unexpired records.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.records
            .read()
            .map(|r| r.values().filter(|e| e.is_live(now)).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn poisoned() -> StoreError {
        StoreError::Storage("status store lock poisoned".to_string())
    }
}

#[async_trait]
impl StatusStore for InMemoryStatusStore {
    async fn put(&self, record: &JobRecord) -> Result<(), StoreError> {
        let value = encode(record)?;
        let now = Instant::now();
        let mut records = self.records.write().map_err(|_| Self::poisoned())?;
        if self.ttl.is_some() {
            records.retain(|_, e| e.is_live(now));
        }
        records.insert(
            job_key(record.job_id),
            Entry {
                value,
                expires_at: self.ttl.map(|ttl| now + ttl),
            },
        );
        Ok(())
    }

    async fn get(&self, job_id: JobId) -> Result<Option<JobRecord>, StoreError> {
        let key = job_key(job_id);
        let now = Instant::now();
        let raw = {
            let records = self.records.read().map_err(|_| Self::poisoned())?;
            records
                .get(&key)
                .filter(|e| e.is_live(now))
                .map(|e| e.value.clone())
        };
        raw.map(|raw| decode(&key, &raw)).transpose()
    }

    async fn delete(&self, job_id: JobId) -> Result<bool, StoreError> {
        let now = Instant::now();
        let mut records = self.records.write().map_err(|_| Self::poisoned())?;
        Ok(records
            .remove(&job_key(job_id))
            .is_some_and(|e| e.is_live(now)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::types::{JobErrorKind, JobStatus};
    use serde_json::json;

    #[test]
    fn key_is_prefixed_job_id() {
        let id = JobId::new();
        assert_eq!(job_key(id), format!("job:{id}"));
    }

    #[tokio::test]
    async fn put_get_overwrite() {
        let store = InMemoryStatusStore::new();
        let mut record = JobRecord::queued(JobId::new());
        store.put(&record).await.unwrap();
        assert_eq!(store.get(record.job_id).await.unwrap(), Some(record.clone()));

        record.mark_processing().unwrap();
        record.mark_completed(json!({ "summary": "ok" })).unwrap();
        store.put(&record).await.unwrap();

        let stored = store.get(record.job_id).await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Completed);
        assert_eq!(stored.result, Some(json!({ "summary": "ok" })));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn absent_record_reads_as_not_found() {
        let store = InMemoryStatusStore::new();
        let id = JobId::new();
        assert_eq!(store.get(id).await.unwrap(), None);

        let status = store.status(id).await.unwrap();
        assert_eq!(status.status, JobStatus::NotFound);
        assert_eq!(status.job_id, id);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = InMemoryStatusStore::new();
        let mut record = JobRecord::queued(JobId::new());
        record.mark_failed("boom", JobErrorKind::Remote).unwrap();
        store.put(&record).await.unwrap();

        assert!(store.delete(record.job_id).await.unwrap());
        assert!(!store.delete(record.job_id).await.unwrap());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn corrupt_value_is_reported_with_its_key() {
        let store = InMemoryStatusStore::new();
        let id = JobId::new();
        store
            .records
            .write()
            .unwrap()
            .insert(
                job_key(id),
                Entry {
                    value: "{not json".to_string(),
                    expires_at: None,
                },
            );

        let err = store.get(id).await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { ref key, .. } if *key == job_key(id)));
    }

    #[tokio::test]
    async fn expired_record_reads_not_found_and_is_swept() {
        let store = InMemoryStatusStore::with_ttl(Duration::from_millis(100));
        let stale = JobRecord::queued(JobId::new());
        store.put(&stale).await.unwrap();
        assert_eq!(store.status(stale.job_id).await.unwrap().status, JobStatus::Queued);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(
            store.status(stale.job_id).await.unwrap().status,
            JobStatus::NotFound
        );
        assert!(store.is_empty());

        let fresh = JobRecord::queued(JobId::new());
        store.put(&fresh).await.unwrap();
        assert_eq!(store.records.read().unwrap().len(), 1);
        assert!(!store.delete(stale.job_id).await.unwrap());
    }

    #[tokio::test]
    async fn every_write_restarts_the_ttl() {
        let store = InMemoryStatusStore::with_ttl(Duration::from_millis(200));
        let mut record = JobRecord::queued(JobId::new());
        store.put(&record).await.unwrap();

        tokio::time::sleep(Duration::from_millis(120)).await;
        record.mark_processing().unwrap();
        store.put(&record).await.unwrap();

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(
            store.status(record.job_id).await.unwrap().status,
            JobStatus::Processing
        );
    }
}
