//! One-shot job scheduling
//!
//! A background tick loop checks the registry for due jobs and hands them
//! to a fixed-size worker pool. Jobs fire exactly once and are removed
//! from the registry when dispatched. Duplicate ids are rejected at
//! registration. A job whose `run_at` is already in the past fires at the
//! next tick rather than being dropped.
//!
//! The pending-job set is snapshotted to disk after every registry
//! mutation so `run` can restore it after a restart. There is no
//! cancellation API: once registered, a job cannot be withdrawn.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{RwLock, Semaphore};
use tokio::time::{interval, Duration};
use tracing::{error, info, trace, warn};

use super::state_manager::JobStateManager;
use crate::errors::SchedulerError;
use crate::models::{JobOutcome, ScheduledJob};
use crate::persistence;

/// Runs fired job bodies.
///
/// The scheduler always captures the result: `Ok` records `Completed` or
/// `Skipped`, `Err` records `Failed` with the error text. Nothing a body
/// returns is ever dropped, and nothing it raises escapes the worker task.
#[async_trait]
pub trait JobExecutor: Send + Sync + 'static {
    async fn execute(&self, job: &ScheduledJob) -> anyhow::Result<JobOutcome>;
}

#[derive(Clone)]
pub struct JobScheduler {
    registry: Arc<RwLock<HashMap<String, ScheduledJob>>>,
    state: JobStateManager,
    executor: Arc<dyn JobExecutor>,
    workers: Arc<Semaphore>,
    tick_interval: Duration,
    snapshot_path: Option<PathBuf>,
}

impl JobScheduler {
    pub fn new(
        workers: usize,
        tick_interval: Duration,
        executor: Arc<dyn JobExecutor>,
        state: JobStateManager,
        snapshot_path: Option<PathBuf>,
    ) -> Self {
        Self {
            registry: Arc::new(RwLock::new(HashMap::new())),
            state,
            executor,
            workers: Arc::new(Semaphore::new(workers)),
            tick_interval,
            snapshot_path,
        }
    }

    /// Register a one-shot job.
    ///
    /// Fails with [`SchedulerError::DuplicateJob`] if a job with the same
    /// id is already pending; the existing registration is untouched.
    pub async fn schedule(&self, job: ScheduledJob) -> Result<(), SchedulerError> {
        {
            let mut registry = self.registry.write().await;
            if registry.contains_key(&job.id) {
                return Err(SchedulerError::DuplicateJob {
                    job_id: job.id.clone(),
                });
            }
            registry.insert(job.id.clone(), job.clone());
        }

        self.state.job_scheduled(&job).await;
        self.write_snapshot().await;
        info!(
            "Registered {} job '{}' for {}",
            job.kind,
            job.id,
            job.run_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        Ok(())
    }

    /// Re-register jobs loaded from a snapshot, skipping duplicates.
    /// Returns how many were restored.
    pub async fn restore(&self, jobs: Vec<ScheduledJob>) -> usize {
        let mut restored = 0;
        for job in jobs {
            let job_id = job.id.clone();
            match self.schedule(job).await {
                Ok(()) => restored += 1,
                Err(SchedulerError::DuplicateJob { .. }) => {
                    warn!("Skipping snapshot job '{}': already registered", job_id);
                }
            }
        }
        restored
    }

    /// Pending jobs ordered by trigger time.
    pub async fn pending_jobs(&self) -> Vec<ScheduledJob> {
        let registry = self.registry.read().await;
        let mut jobs: Vec<ScheduledJob> = registry.values().cloned().collect();
        jobs.sort_by_key(|job| job.run_at);
        jobs
    }

    pub async fn pending_count(&self) -> usize {
        let registry = self.registry.read().await;
        registry.len()
    }

    /// Run the tick loop until the owning task is aborted.
    pub async fn run(&self) {
        info!(
            "Scheduler started ({} workers, tick every {:?})",
            self.workers.available_permits(),
            self.tick_interval
        );

        let mut ticker = interval(self.tick_interval);
        loop {
            ticker.tick().await;
            trace!("Scheduler tick - checking for due jobs");
            self.dispatch_due_jobs().await;
        }
    }

    /// Remove every due job from the registry and hand it to the pool.
    pub async fn dispatch_due_jobs(&self) {
        let now = Utc::now();

        // Collect due jobs first so the registry lock is not held while
        // bodies run.
        let due: Vec<ScheduledJob> = {
            let mut registry = self.registry.write().await;
            let due_ids: Vec<String> = registry
                .values()
                .filter(|job| job.run_at <= now)
                .map(|job| job.id.clone())
                .collect();
            due_ids
                .iter()
                .filter_map(|id| registry.remove(id))
                .collect()
        };

        if due.is_empty() {
            return;
        }

        self.write_snapshot().await;
        for job in due {
            self.fire(job);
        }
    }

    fn fire(&self, job: ScheduledJob) {
        let state = self.state.clone();
        let executor = Arc::clone(&self.executor);
        let workers = Arc::clone(&self.workers);

        tokio::spawn(async move {
            let _permit = match workers.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return,
            };

            state.job_fired(&job.id).await;
            info!("Job '{}' fired ({} for {})", job.id, job.kind, job.file_name());

            match executor.execute(&job).await {
                Ok(JobOutcome::Completed) => {
                    info!("Job '{}' completed", job.id);
                    state.job_completed(&job.id).await;
                }
                Ok(JobOutcome::Skipped { reason }) => {
                    warn!("Job '{}' skipped: {}", job.id, reason);
                    state.job_skipped(&job.id, &reason).await;
                }
                Err(e) => {
                    error!("Job '{}' failed: {:#}", job.id, e);
                    state.job_failed(&job.id, format!("{:#}", e)).await;
                }
            }
        });
    }

    async fn write_snapshot(&self) {
        let Some(path) = &self.snapshot_path else {
            return;
        };
        let jobs = self.pending_jobs().await;
        if let Err(e) = persistence::save_atomic(path, &jobs) {
            warn!("Failed to write schedule snapshot {}: {}", path.display(), e);
        }
    }
}
