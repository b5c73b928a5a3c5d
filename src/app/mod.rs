//! Application controller
//!
//! `App` is the explicit application context: settings, scheduler,
//! notifier, and the two job bodies. A UI layer's only obligations are to
//! supply `ScheduleRequest` inputs and to consume the status stream.

use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::Duration;
use tracing::info;

use crate::api::InstaClient;
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::models::{
    is_supported_media, JobKind, JobOutcome, JobStatus, ScheduledJob, Settings,
    SUPPORTED_MEDIA_EXTENSIONS,
};
use crate::notify::Notifier;
use crate::persistence;
use crate::scheduler::{JobExecutor, JobScheduler, JobStateManager, StatusReceiver};
use crate::utils::datetime;

/// Supplies a publicly reachable URL for a local media file.
///
/// The Graph API only accepts media by URL, so a post job must host the
/// file somewhere first. This is that collaborator's seam.
#[async_trait]
pub trait MediaHost: Send + Sync + 'static {
    async fn public_url(&self, path: &Path) -> AppResult<String>;
}

/// The production media host: none is configured, so every post job fails
/// with an explicit error instead of pretending the upload step exists.
pub struct UnconfiguredMediaHost;

#[async_trait]
impl MediaHost for UnconfiguredMediaHost {
    async fn public_url(&self, _path: &Path) -> AppResult<String> {
        Err(AppError::media_host(
            "media hosting is not configured; a public URL is required to create a media container",
        ))
    }
}

/// Inputs the schedule form (or CLI) collects from the user.
#[derive(Debug, Clone)]
pub struct ScheduleRequest {
    pub kind: JobKind,
    pub media_path: PathBuf,
    pub caption: Option<String>,
    pub when: String,
}

pub struct App {
    config: Config,
    settings: Arc<RwLock<Settings>>,
    scheduler: JobScheduler,
    state: JobStateManager,
}

impl App {
    pub fn new(
        config: Config,
        notifier: Arc<dyn Notifier>,
        media_host: Arc<dyn MediaHost>,
    ) -> Self {
        let settings = Arc::new(RwLock::new(persistence::load_or_default(
            &config.storage.settings_path,
            Settings::default(),
        )));
        let state = JobStateManager::new();

        let runner = Arc::new(JobRunner {
            settings: Arc::clone(&settings),
            api_base: config.api.base_url.clone(),
            notifier,
            media_host,
        });
        let scheduler = JobScheduler::new(
            config.scheduler.workers,
            Duration::from_millis(config.scheduler.tick_interval_ms),
            runner,
            state.clone(),
            Some(config.storage.schedule_path.clone()),
        );

        Self {
            config,
            settings,
            scheduler,
            state,
        }
    }

    /// Trim and persist credentials wholesale, then swap them in memory.
    pub async fn save_settings(&self, ig_business_id: &str, access_token: &str) -> AppResult<Settings> {
        let updated = Settings {
            ig_business_id: ig_business_id.trim().to_string(),
            access_token: access_token.trim().to_string(),
        };
        persistence::save_atomic(&self.config.storage.settings_path, &updated)?;
        *self.settings.write().await = updated.clone();
        info!("Settings saved.");
        Ok(updated)
    }

    pub async fn settings(&self) -> Settings {
        self.settings.read().await.clone()
    }

    /// Validate a schedule request and register the job.
    ///
    /// Validation happens synchronously: a missing file, an unsupported
    /// extension, or an unparsable time is rejected here and no job is
    /// registered.
    pub async fn schedule(&self, request: ScheduleRequest) -> AppResult<ScheduledJob> {
        if !request.media_path.exists() {
            return Err(AppError::validation(format!(
                "media file not found: {}",
                request.media_path.display()
            )));
        }
        if !is_supported_media(&request.media_path) {
            return Err(AppError::validation(format!(
                "unsupported media type: {} (expected one of: {})",
                request.media_path.display(),
                SUPPORTED_MEDIA_EXTENSIONS.join(", ")
            )));
        }

        let run_at = datetime::parse_publish_time(&request.when)
            .map_err(|e| AppError::validation(e.to_string()))?;

        let caption = match request.kind {
            JobKind::Post => request
                .caption
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
            JobKind::Story => None,
        };

        let job = ScheduledJob {
            id: format!("job-{}", Utc::now().timestamp_millis()),
            kind: request.kind,
            run_at,
            media_path: request.media_path,
            caption,
            created_at: Utc::now(),
        };

        self.scheduler.schedule(job.clone()).await?;
        info!(
            "Scheduled a {} at {}",
            job.kind.as_str().to_uppercase(),
            datetime::format_local(&run_at, self.config.scheduler.timezone)
        );
        Ok(job)
    }

    /// Reload the pending-job snapshot written by a previous run.
    /// Past-due jobs fire at the first tick like any other.
    pub async fn restore_pending_jobs(&self) -> usize {
        let jobs: Vec<ScheduledJob> =
            persistence::load_or_default(&self.config.storage.schedule_path, Vec::new());
        if jobs.is_empty() {
            return 0;
        }
        let restored = self.scheduler.restore(jobs).await;
        info!("Restored {} pending job(s) from snapshot", restored);
        restored
    }

    /// Spawn the scheduler tick loop.
    pub fn start(&self) -> tokio::task::JoinHandle<()> {
        let scheduler = self.scheduler.clone();
        tokio::spawn(async move { scheduler.run().await })
    }

    pub async fn wait_for(&self, job_id: &str) -> Option<JobStatus> {
        self.state.wait_for_terminal(job_id).await
    }

    pub fn subscribe_status(&self) -> StatusReceiver {
        self.state.subscribe()
    }

    pub async fn pending_jobs(&self) -> Vec<ScheduledJob> {
        self.scheduler.pending_jobs().await
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// Executes the two job bodies on behalf of the scheduler.
struct JobRunner {
    settings: Arc<RwLock<Settings>>,
    api_base: String,
    notifier: Arc<dyn Notifier>,
    media_host: Arc<dyn MediaHost>,
}

#[async_trait]
impl JobExecutor for JobRunner {
    async fn execute(&self, job: &ScheduledJob) -> anyhow::Result<JobOutcome> {
        // The file existed at schedule time; if it vanished since, the job
        // is skipped rather than failed.
        if !job.media_path.exists() {
            let reason = format!("media file no longer exists: {}", job.media_path.display());
            self.notifier
                .notify("Instagram Schedule Skipped", &reason)
                .await;
            return Ok(JobOutcome::Skipped { reason });
        }

        match job.kind {
            JobKind::Post => self.run_post(job).await,
            JobKind::Story => self.run_story(job).await,
        }
    }
}

impl JobRunner {
    async fn run_post(&self, job: &ScheduledJob) -> anyhow::Result<JobOutcome> {
        match self.publish_post(job).await {
            Ok(()) => {
                self.notifier
                    .notify("Instagram Post", &format!("Posted {}", job.file_name()))
                    .await;
                Ok(JobOutcome::Completed)
            }
            Err(e) => {
                self.notifier
                    .notify(
                        "Instagram Post Failed",
                        &format!("Could not post {}: {}", job.file_name(), e),
                    )
                    .await;
                Err(e.into())
            }
        }
    }

    async fn publish_post(&self, job: &ScheduledJob) -> AppResult<()> {
        let url = self.media_host.public_url(&job.media_path).await?;
        let settings = self.settings.read().await.clone();
        let client = InstaClient::new(&self.api_base, &settings.ig_business_id, &settings.access_token);

        let container_id = client
            .create_media_container(&url, job.caption.as_deref(), job.is_video())
            .await?;
        info!("Created media container '{}' for job '{}'", container_id, job.id);

        let response = client.publish_media(&container_id).await?;
        info!("Published media for job '{}': {}", job.id, response);
        Ok(())
    }

    async fn run_story(&self, job: &ScheduledJob) -> anyhow::Result<JobOutcome> {
        self.notifier
            .notify(
                "Instagram Story Reminder",
                &format!("Open Instagram to post story: {}", job.file_name()),
            )
            .await;
        Ok(JobOutcome::Completed)
    }
}
