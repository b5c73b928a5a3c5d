//! Per-job lifecycle tracking
//!
//! Every registered job gets a [`JobStatus`] record that moves through
//! `Scheduled -> Fired -> {Completed | Failed | Skipped}`. Updates are
//! broadcast so observers (the CLI status stream, tests) can follow job
//! lifecycles without polling. Job bodies never touch observer state
//! directly; this channel is the only path outward.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

use crate::models::{JobState, JobStatus, ScheduledJob};

pub type StatusSender = broadcast::Sender<JobStatus>;
pub type StatusReceiver = broadcast::Receiver<JobStatus>;

#[derive(Clone)]
pub struct JobStateManager {
    states: Arc<RwLock<HashMap<String, JobStatus>>>,
    status_tx: StatusSender,
}

impl JobStateManager {
    pub fn new() -> Self {
        let (status_tx, _) = broadcast::channel(256);
        Self {
            states: Arc::new(RwLock::new(HashMap::new())),
            status_tx,
        }
    }

    pub fn subscribe(&self) -> StatusReceiver {
        self.status_tx.subscribe()
    }

    pub async fn job_scheduled(&self, job: &ScheduledJob) {
        let status = JobStatus {
            job_id: job.id.clone(),
            kind: job.kind,
            state: JobState::Scheduled,
            scheduled_for: job.run_at,
            created_at: job.created_at,
            fired_at: None,
            completed_at: None,
            detail: None,
        };

        {
            let mut states = self.states.write().await;
            states.insert(job.id.clone(), status.clone());
        }

        let _ = self.status_tx.send(status);
    }

    pub async fn job_fired(&self, job_id: &str) {
        self.update(job_id, |status| {
            status.state = JobState::Fired;
            status.fired_at = Some(Utc::now());
        })
        .await;
    }

    pub async fn job_completed(&self, job_id: &str) {
        self.update(job_id, |status| {
            status.state = JobState::Completed;
            status.completed_at = Some(Utc::now());
        })
        .await;
    }

    pub async fn job_skipped(&self, job_id: &str, reason: &str) {
        let reason = reason.to_string();
        self.update(job_id, move |status| {
            status.state = JobState::Skipped;
            status.completed_at = Some(Utc::now());
            status.detail = Some(reason);
        })
        .await;
    }

    pub async fn job_failed(&self, job_id: &str, error: String) {
        self.update(job_id, move |status| {
            status.state = JobState::Failed;
            status.completed_at = Some(Utc::now());
            status.detail = Some(error);
        })
        .await;
    }

    pub async fn get_status(&self, job_id: &str) -> Option<JobStatus> {
        let states = self.states.read().await;
        states.get(job_id).cloned()
    }

    pub async fn all_statuses(&self) -> HashMap<String, JobStatus> {
        let states = self.states.read().await;
        states.clone()
    }

    /// Block until the job reaches a terminal state, returning its final
    /// status. Returns `None` if the job was never registered here.
    pub async fn wait_for_terminal(&self, job_id: &str) -> Option<JobStatus> {
        let mut rx = self.status_tx.subscribe();

        match self.get_status(job_id).await {
            Some(status) if status.state.is_terminal() => return Some(status),
            Some(_) => {}
            None => return None,
        }

        loop {
            match rx.recv().await {
                Ok(status) => {
                    if status.job_id == job_id && status.state.is_terminal() {
                        return Some(status);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => {
                    // Fall back to the stored record after missing updates.
                    if let Some(status) = self.get_status(job_id).await {
                        if status.state.is_terminal() {
                            return Some(status);
                        }
                    }
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    async fn update<F>(&self, job_id: &str, apply: F)
    where
        F: FnOnce(&mut JobStatus),
    {
        let mut current = {
            let states = self.states.read().await;
            states.get(job_id).cloned()
        };

        if let Some(ref mut status) = current {
            apply(status);

            {
                let mut states = self.states.write().await;
                states.insert(job_id.to_string(), status.clone());
            }

            let _ = self.status_tx.send(status.clone());
        }
    }
}

impl Default for JobStateManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::JobKind;
    use std::path::PathBuf;

    fn job(id: &str) -> ScheduledJob {
        ScheduledJob {
            id: id.to_string(),
            kind: JobKind::Story,
            run_at: Utc::now(),
            media_path: PathBuf::from("/tmp/a.jpg"),
            caption: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_lifecycle_transitions() {
        let manager = JobStateManager::new();
        manager.job_scheduled(&job("job-1")).await;

        let status = manager.get_status("job-1").await.unwrap();
        assert_eq!(status.state, JobState::Scheduled);
        assert!(status.fired_at.is_none());

        manager.job_fired("job-1").await;
        let status = manager.get_status("job-1").await.unwrap();
        assert_eq!(status.state, JobState::Fired);
        assert!(status.fired_at.is_some());

        manager.job_completed("job-1").await;
        let status = manager.get_status("job-1").await.unwrap();
        assert_eq!(status.state, JobState::Completed);
        assert!(status.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_failed_records_error_detail() {
        let manager = JobStateManager::new();
        manager.job_scheduled(&job("job-2")).await;
        manager.job_fired("job-2").await;
        manager.job_failed("job-2", "HTTP 400".to_string()).await;

        let status = manager.get_status("job-2").await.unwrap();
        assert_eq!(status.state, JobState::Failed);
        assert_eq!(status.detail.as_deref(), Some("HTTP 400"));
    }

    #[tokio::test]
    async fn test_update_on_unknown_job_is_ignored() {
        let manager = JobStateManager::new();
        manager.job_completed("job-missing").await;
        assert!(manager.get_status("job-missing").await.is_none());
    }

    #[tokio::test]
    async fn test_broadcast_carries_updates() {
        let manager = JobStateManager::new();
        let mut rx = manager.subscribe();

        manager.job_scheduled(&job("job-3")).await;
        let update = rx.recv().await.unwrap();
        assert_eq!(update.job_id, "job-3");
        assert_eq!(update.state, JobState::Scheduled);
    }

    #[tokio::test]
    async fn test_wait_for_terminal_returns_final_status() {
        let manager = JobStateManager::new();
        manager.job_scheduled(&job("job-4")).await;

        let waiter = {
            let manager = manager.clone();
            tokio::spawn(async move { manager.wait_for_terminal("job-4").await })
        };

        manager.job_fired("job-4").await;
        manager.job_skipped("job-4", "media file vanished").await;

        let status = waiter.await.unwrap().unwrap();
        assert_eq!(status.state, JobState::Skipped);
        assert_eq!(status.detail.as_deref(), Some("media file vanished"));
    }

    #[tokio::test]
    async fn test_all_statuses_snapshots_every_job() {
        let manager = JobStateManager::new();
        manager.job_scheduled(&job("job-a")).await;
        manager.job_scheduled(&job("job-b")).await;
        manager.job_fired("job-b").await;

        let statuses = manager.all_statuses().await;
        assert_eq!(statuses.len(), 2);
        assert_eq!(statuses["job-a"].state, JobState::Scheduled);
        assert_eq!(statuses["job-b"].state, JobState::Fired);
    }

    #[tokio::test]
    async fn test_wait_for_terminal_unknown_job() {
        let manager = JobStateManager::new();
        assert!(manager.wait_for_terminal("job-unknown").await.is_none());
    }
}
