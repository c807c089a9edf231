use std::sync::{Arc, Mutex};

use gobot_ai::{AiError, BackendClient, LicenseBackend};
use gobot_infra::jobs::{
    InMemoryStatusStore, JobMessage, JobService, JobWorker, PollerConfig, StatusStore, StoreError,
};
use gobot_infra::workers::{ConsumerHandle, ConsumerStats, QueueConsumer};
use gobot_infra::{AppConfig, StoreBackend};
use gobot_queue::InMemoryWorkQueue;

#[cfg(feature = "redis")]
use gobot_infra::jobs::RedisStatusStore;

pub type DynStatusStore = Arc<dyn StatusStore>;

/// Job facade as wired in the server: any status store, in-process queue.
pub type Jobs = JobService<DynStatusStore, Arc<InMemoryWorkQueue<JobMessage>>>;

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("backend client: {0}")]
    Backend(#[from] AiError),
    #[error("status store: {0}")]
    Store(#[from] StoreError),
}

/// Everything the handlers need.
pub struct AppServices {
    pub jobs: Jobs,
    pub license: Arc<dyn LicenseBackend>,
    pub poller: PollerConfig,
    consumer: Mutex<Option<ConsumerHandle>>,
}

impl std::fmt::Debug for AppServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppServices")
            .field("poller", &self.poller)
            .finish_non_exhaustive()
    }
}

impl AppServices {
    pub fn consumer_stats(&self) -> Option<ConsumerStats> {
        self.consumer
            .lock()
            .ok()
            .and_then(|c| c.as_ref().map(ConsumerHandle::stats))
    }

    /// Stop the job consumer, letting in-flight jobs finish.
    pub async fn shutdown(&self) {
        let consumer = self.consumer.lock().ok().and_then(|mut c| c.take());
        if let Some(consumer) = consumer {
            consumer.shutdown().await;
        }
    }
}

pub async fn build_services(config: &AppConfig) -> Result<AppServices, BuildError> {
    let backend = Arc::new(BackendClient::new(&config.backend_url, config.http_timeout)?);
    let store = build_store(config).await?;

    let (queue, deliveries) = InMemoryWorkQueue::new();
    let jobs = JobService::new(store.clone(), Arc::new(queue));

    let worker = Arc::new(JobWorker::new(store, backend.clone()));
    let consumer = QueueConsumer::spawn("gobot.jobs", deliveries, worker, config.worker_concurrency);

    tracing::info!(backend = %config.backend_url, "services ready");

    Ok(AppServices {
        jobs,
        license: backend,
        poller: config.poller,
        consumer: Mutex::new(Some(consumer)),
    })
}

async fn build_store(config: &AppConfig) -> Result<DynStatusStore, BuildError> {
    match &config.store {
        StoreBackend::InMemory => Ok(Arc::new(InMemoryStatusStore::with_ttl(config.job_ttl))),
        StoreBackend::Redis { url } => {
            #[cfg(feature = "redis")]
            {
                let store = RedisStatusStore::connect(url, config.job_ttl).await?;
                tracing::info!("using redis status store");
                Ok(Arc::new(store))
            }
            #[cfg(not(feature = "redis"))]
            {
                tracing::warn!(
                    redis_url = %url,
                    "USE_PERSISTENT_STORES=true but redis feature not enabled, falling back to in-memory"
                );
                Ok(Arc::new(InMemoryStatusStore::with_ttl(config.job_ttl)))
            }
        }
    }
}
