use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Media extensions the schedule form accepts.
pub const SUPPORTED_MEDIA_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "mp4", "mov"];

/// Stored account credentials, persisted wholesale as a single JSON document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub ig_business_id: String,
    #[serde(default)]
    pub access_token: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    Post,
    Story,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::Post => "post",
            JobKind::Story => "story",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A one-shot job registered with the scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledJob {
    pub id: String,
    pub kind: JobKind,
    pub run_at: DateTime<Utc>,
    pub media_path: PathBuf,
    /// Post captions only; stories never carry one.
    pub caption: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ScheduledJob {
    /// File name component of the media path, for notification messages.
    pub fn file_name(&self) -> String {
        self.media_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.media_path.display().to_string())
    }

    /// Whether the media file is a video (decides the container type).
    pub fn is_video(&self) -> bool {
        matches!(
            self.media_path
                .extension()
                .map(|e| e.to_string_lossy().to_lowercase())
                .as_deref(),
            Some("mp4") | Some("mov")
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Scheduled,
    Fired,
    Completed,
    Failed,
    Skipped,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed | JobState::Skipped)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobState::Scheduled => "scheduled",
            JobState::Fired => "fired",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
            JobState::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

/// Per-job lifecycle record kept by the state manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatus {
    pub job_id: String,
    pub kind: JobKind,
    pub state: JobState,
    pub scheduled_for: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub fired_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Failure message, or the reason a job was skipped.
    pub detail: Option<String>,
}

/// What a job body reports back to the scheduler on success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Completed,
    Skipped { reason: String },
}

/// Whether a path has one of the accepted media extensions.
pub fn is_supported_media(path: &std::path::Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .map(|ext| SUPPORTED_MEDIA_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}
