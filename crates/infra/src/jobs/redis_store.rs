//! Redis-backed status store.
//!
//! Records live under `job:<jobId>` as JSON strings, written with `SET .. EX`
//! so records nobody clears (abandoned polls, failed submissions) expire.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use tracing::instrument;

use gobot_core::JobId;

use super::store::{StatusStore, StoreError, decode, encode, job_key};
use super::types::JobRecord;

#[derive(Clone)]
pub struct RedisStatusStore {
    conn: MultiplexedConnection,
    ttl_secs: u64,
}

impl std::fmt::Debug for RedisStatusStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStatusStore")
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}

impl RedisStatusStore {
    /// Connect to `redis_url` (e.g. "redis://localhost:6379").
    pub async fn connect(redis_url: impl AsRef<str>, ttl: Duration) -> Result<Self, StoreError> {
        let client = redis::Client::open(redis_url.as_ref())
            .map_err(|e| StoreError::Storage(format!("invalid redis url: {e}")))?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| StoreError::Storage(format!("redis connection failed: {e}")))?;
        Ok(Self {
            conn,
            ttl_secs: ttl.as_secs().max(1),
        })
    }
}

fn command_error(e: redis::RedisError) -> StoreError {
    StoreError::Storage(format!("redis command failed: {e}"))
}

#[async_trait]
impl StatusStore for RedisStatusStore {
    #[instrument(skip(self, record), fields(job_id = %record.job_id, status = %record.status))]
    async fn put(&self, record: &JobRecord) -> Result<(), StoreError> {
        let value = encode(record)?;
        let mut conn = self.conn.clone();
        redis::cmd("SET")
            .arg(job_key(record.job_id))
            .arg(value)
            .arg("EX")
            .arg(self.ttl_secs)
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(command_error)
    }

    async fn get(&self, job_id: JobId) -> Result<Option<JobRecord>, StoreError> {
        let key = job_key(job_id);
        let mut conn = self.conn.clone();
        let raw: Option<String> = redis::cmd("GET")
            .arg(&key)
            .query_async(&mut conn)
            .await
            .map_err(command_error)?;
        raw.map(|raw| decode(&key, &raw)).transpose()
    }

    async fn delete(&self, job_id: JobId) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let removed: u64 = redis::cmd("DEL")
            .arg(job_key(job_id))
            .query_async(&mut conn)
            .await
            .map_err(command_error)?;
        Ok(removed > 0)
    }
}
