//! # Worker Pool
//!
//! One ingestion loop per actor pool long-polls the [`UpdateSource`] and
//! pushes raw updates into bounded lanes; worker tasks pull from the lanes
//! and hand each update to an [`UpdateProcessor`].
//!
//! ## Lanes
//!
//! - `serialize_per_actor = true`: one lane per worker, an update goes to the
//!   lane picked by its actor handle. Updates from the same actor are processed
//!   one at a time, in arrival order.
//! - `serialize_per_actor = false`: a single lane shared by every worker.
//!   Arrival order is kept at the lane but two updates from the same actor may
//!   be processed concurrently.
//!
//! ## Shutdown
//!
//! Cancelling the token stops polling. The batch already fetched is still
//! enqueued (its offset has been acknowledged), the lanes are closed and
//! workers drain what is queued before [`WorkerPool::run`] returns.

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use super::router::UpdateProcessor;
use crate::config::PollingConfig;
use crate::transport::{RawUpdate, UpdateSource};

/// Pause after a failed poll before trying again
const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerPoolConfig {
    pub worker_count: usize,
    /// Total queued updates across all lanes
    pub queue_capacity: usize,
    pub serialize_per_actor: bool,
    pub poll_error_backoff: Duration,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            worker_count: 5,
            queue_capacity: 100,
            serialize_per_actor: true,
            poll_error_backoff: POLL_ERROR_BACKOFF,
        }
    }
}

impl From<&PollingConfig> for WorkerPoolConfig {
    fn from(polling: &PollingConfig) -> Self {
        Self {
            worker_count: polling.worker_pool_size,
            queue_capacity: polling.queue_capacity,
            serialize_per_actor: polling.serialize_per_actor,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerPoolStats {
    pub polls: u64,
    pub poll_errors: u64,
    pub updates_received: u64,
    pub updates_processed: u64,
    pub processor_panics: u64,
}

type SharedReceiver = Arc<tokio::sync::Mutex<mpsc::Receiver<RawUpdate>>>;

pub struct WorkerPool {
    name: String,
    config: WorkerPoolConfig,
    processor: Arc<dyn UpdateProcessor>,
    stats: Arc<Mutex<WorkerPoolStats>>,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("name", &self.name)
            .field("config", &self.config)
            .finish()
    }
}

impl WorkerPool {
    pub fn new(
        name: impl Into<String>,
        config: WorkerPoolConfig,
        processor: Arc<dyn UpdateProcessor>,
    ) -> Self {
        Self {
            name: name.into(),
            config,
            processor,
            stats: Arc::new(Mutex::new(WorkerPoolStats::default())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get_statistics(&self) -> WorkerPoolStats {
        self.stats.lock().clone()
    }

    /// Poll and process until `cancel` fires, then drain queued work
    pub async fn run(
        &self,
        source: Arc<dyn UpdateSource>,
        cancel: CancellationToken,
    ) -> WorkerPoolStats {
        let worker_count = self.config.worker_count.max(1);
        let (lane_count, workers_per_lane) = if self.config.serialize_per_actor {
            (worker_count, 1)
        } else {
            (1, worker_count)
        };
        let lane_capacity = (self.config.queue_capacity / lane_count).max(1);

        info!(
            pool = %self.name,
            workers = worker_count,
            lanes = lane_count,
            lane_capacity,
            serialize_per_actor = self.config.serialize_per_actor,
            "🚀 Starting worker pool"
        );

        let tracker = TaskTracker::new();
        let mut senders = Vec::with_capacity(lane_count);
        for lane in 0..lane_count {
            let (tx, rx) = mpsc::channel(lane_capacity);
            senders.push(tx);
            let receiver: SharedReceiver = Arc::new(tokio::sync::Mutex::new(rx));
            for slot in 0..workers_per_lane {
                let worker_id = lane * workers_per_lane + slot;
                tracker.spawn(worker_loop(
                    self.name.clone(),
                    worker_id,
                    receiver.clone(),
                    self.processor.clone(),
                    self.stats.clone(),
                ));
            }
        }
        tracker.close();

        self.ingest(source.as_ref(), &senders, &cancel).await;

        info!(pool = %self.name, "🛑 Ingestion stopped; draining queued updates");
        drop(senders);
        tracker.wait().await;

        let stats = self.get_statistics();
        info!(
            pool = %self.name,
            received = stats.updates_received,
            processed = stats.updates_processed,
            "✅ Worker pool drained"
        );
        stats
    }

    async fn ingest(
        &self,
        source: &dyn UpdateSource,
        senders: &[mpsc::Sender<RawUpdate>],
        cancel: &CancellationToken,
    ) {
        loop {
            let batch = tokio::select! {
                biased;
                _ = cancel.cancelled() => return,
                batch = source.poll_updates() => batch,
            };
            self.record(|s| s.polls += 1);

            let updates = match batch {
                Ok(updates) => updates,
                Err(err) => {
                    self.record(|s| s.poll_errors += 1);
                    warn!(pool = %self.name, error = %err, "⏳ Poll failed; backing off");
                    tokio::select! {
                        _ = cancel.cancelled() => return,
                        _ = tokio::time::sleep(self.config.poll_error_backoff) => continue,
                    }
                }
            };

            for update in updates {
                let lane = lane_for(&update, senders.len());
                debug!(
                    pool = %self.name,
                    update_id = update.update_id,
                    lane,
                    "Enqueuing update"
                );
                self.record(|s| s.updates_received += 1);
                if senders[lane].send(update).await.is_err() {
                    error!(pool = %self.name, lane, "Worker lane closed unexpectedly");
                    return;
                }
            }
        }
    }

    fn record(&self, f: impl FnOnce(&mut WorkerPoolStats)) {
        f(&mut self.stats.lock());
    }
}

/// Updates without a sender handle all land in lane 0
fn lane_for(update: &RawUpdate, lanes: usize) -> usize {
    match update.actor_handle() {
        Some(handle) if lanes > 1 => handle.rem_euclid(lanes as i64) as usize,
        _ => 0,
    }
}

async fn worker_loop(
    pool: String,
    worker_id: usize,
    receiver: SharedReceiver,
    processor: Arc<dyn UpdateProcessor>,
    stats: Arc<Mutex<WorkerPoolStats>>,
) {
    debug!(pool = %pool, worker_id, "Worker started");
    loop {
        let next = receiver.lock().await.recv().await;
        let Some(update) = next else { break };
        let update_id = update.update_id;

        let outcome = AssertUnwindSafe(processor.process(update))
            .catch_unwind()
            .await;

        let mut stats = stats.lock();
        match outcome {
            Ok(_) => stats.updates_processed += 1,
            Err(_) => {
                stats.processor_panics += 1;
                error!(pool = %pool, worker_id, update_id, "Update processing panicked");
            }
        }
    }
    debug!(pool = %pool, worker_id, "Worker stopped");
}
