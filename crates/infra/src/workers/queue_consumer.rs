use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use gobot_ai::AiBackend;
use gobot_queue::Deliveries;

use crate::jobs::{JobMessage, JobWorker, StatusStore, WorkOutcome};

/// Handle to control and join a running consumer.
#[derive(Debug)]
pub struct ConsumerHandle {
    cancel: CancellationToken,
    join: JoinHandle<()>,
    stats: Arc<Mutex<ConsumerStats>>,
}

impl ConsumerHandle {
    /// Stop taking new messages and wait for in-flight jobs to finish.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.join.await {
            warn!(error = %e, "queue consumer task ended abnormally");
        }
    }

    pub fn stats(&self) -> ConsumerStats {
        self.stats.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

/// Consumer runtime statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerStats {
    pub received: u64,
    pub completed: u64,
    pub failed: u64,
    pub skipped: u64,
    pub aborted: u64,
    pub in_flight: usize,
}

impl ConsumerStats {
    fn record(&mut self, outcome: &WorkOutcome) {
        self.in_flight = self.in_flight.saturating_sub(1);
        match outcome {
            WorkOutcome::Completed => self.completed += 1,
            WorkOutcome::Failed(_) => self.failed += 1,
            WorkOutcome::Skipped(_) => self.skipped += 1,
            WorkOutcome::Aborted(_) => self.aborted += 1,
        }
    }
}

/// Pulls job messages off the work queue and runs them through a
/// [`JobWorker`].
///
/// - At most `max_concurrent` jobs run at once; distinct jobs may finish in
///   any order
/// - Ends when the queue closes or on shutdown, after draining in-flight jobs
#[derive(Debug)]
pub struct QueueConsumer;

impl QueueConsumer {
    pub fn spawn<S, B>(
        name: &'static str,
        deliveries: Deliveries<JobMessage>,
        worker: Arc<JobWorker<S, B>>,
        max_concurrent: usize,
    ) -> ConsumerHandle
    where
        S: StatusStore + 'static,
        B: AiBackend + 'static,
    {
        let cancel = CancellationToken::new();
        let stats = Arc::new(Mutex::new(ConsumerStats::default()));

        let join = tokio::spawn(consume(
            name,
            deliveries,
            worker,
            max_concurrent.max(1),
            cancel.clone(),
            stats.clone(),
        ));

        ConsumerHandle { cancel, join, stats }
    }
}

async fn consume<S, B>(
    name: &'static str,
    mut deliveries: Deliveries<JobMessage>,
    worker: Arc<JobWorker<S, B>>,
    max_concurrent: usize,
    cancel: CancellationToken,
    stats: Arc<Mutex<ConsumerStats>>,
) where
    S: StatusStore + 'static,
    B: AiBackend + 'static,
{
    info!(consumer = name, max_concurrent, "queue consumer started");
    let permits = Arc::new(Semaphore::new(max_concurrent));
    let mut tasks = JoinSet::new();

    loop {
        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            permit = permits.clone().acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
        };

        let message = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            message = deliveries.recv() => match message {
                Some(message) => message,
                None => break,
            },
        };

        while tasks.try_join_next().is_some() {}

        if let Ok(mut s) = stats.lock() {
            s.received += 1;
            s.in_flight += 1;
        }

        let worker = worker.clone();
        let stats = stats.clone();
        tasks.spawn(async move {
            let outcome = worker.handle(message).await;
            if let Ok(mut s) = stats.lock() {
                s.record(&outcome);
            }
            drop(permit);
        });
    }

    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            warn!(consumer = name, error = %e, "job task ended abnormally");
        }
    }
    info!(consumer = name, "queue consumer stopped");
}
