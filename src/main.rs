use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use insta_scheduler::{
    app::{App, ScheduleRequest, UnconfiguredMediaHost},
    config::Config,
    models::{JobKind, JobState},
    notify::{DesktopNotifier, LogNotifier, Notifier},
    utils::datetime,
};

#[derive(Parser)]
#[command(name = "insta-scheduler")]
#[command(version)]
#[command(about = "Schedule Instagram posts and story reminders")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "insta-scheduler.toml")]
    config: PathBuf,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,

    /// Deliver notifications to the desktop instead of the log
    #[arg(long)]
    desktop_notifications: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Schedule a post or story reminder, then wait for it to fire
    Schedule {
        /// Local media file path
        #[arg(long)]
        media: PathBuf,

        /// Publish time, e.g. "2026-01-01 12:00" (RFC3339 also accepted)
        #[arg(long)]
        at: String,

        /// Caption (posts only)
        #[arg(long)]
        caption: Option<String>,

        /// Publish automatically (post) or send a reminder (story)
        #[arg(long, value_enum)]
        kind: KindArg,

        /// Exit right after registering instead of waiting for the job
        #[arg(long)]
        no_wait: bool,
    },

    /// Restore the pending-job snapshot and run until interrupted
    Run,

    /// Show or update stored credentials
    Settings {
        #[command(subcommand)]
        action: SettingsCommand,
    },
}

#[derive(Subcommand)]
enum SettingsCommand {
    /// Persist the Instagram business id and access token
    Set {
        #[arg(long)]
        ig_business_id: String,

        #[arg(long)]
        access_token: String,
    },

    /// Print the stored settings (token redacted)
    Show,
}

#[derive(Copy, Clone, ValueEnum)]
enum KindArg {
    Post,
    Story,
}

impl From<KindArg> for JobKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Post => JobKind::Post,
            KindArg::Story => JobKind::Story,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_filter = format!("insta_scheduler={}", cli.log_level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting InstaScheduler v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load(&cli.config)?;
    info!("Configuration loaded from: {}", cli.config.display());

    let notifier: Arc<dyn Notifier> = if cli.desktop_notifications {
        Arc::new(DesktopNotifier)
    } else {
        Arc::new(LogNotifier)
    };
    let app = App::new(config, notifier, Arc::new(UnconfiguredMediaHost));

    match cli.command {
        Command::Settings { action } => match action {
            SettingsCommand::Set {
                ig_business_id,
                access_token,
            } => {
                app.save_settings(&ig_business_id, &access_token).await?;
                println!("Settings saved.");
            }
            SettingsCommand::Show => {
                let settings = app.settings().await;
                println!("ig_business_id: {}", settings.ig_business_id);
                println!("access_token:   {}", redact(&settings.access_token));
            }
        },

        Command::Schedule {
            media,
            at,
            caption,
            kind,
            no_wait,
        } => {
            let job = app
                .schedule(ScheduleRequest {
                    kind: kind.into(),
                    media_path: media,
                    caption,
                    when: at,
                })
                .await?;
            println!(
                "Scheduled {} '{}' for {}",
                job.kind,
                job.id,
                datetime::format_local(&job.run_at, app.config().scheduler.timezone)
            );

            if !no_wait {
                let scheduler_handle = app.start();
                let status = app.wait_for(&job.id).await;
                scheduler_handle.abort();

                match status {
                    Some(status) => {
                        println!("Job '{}' finished: {}", status.job_id, status.state);
                        if let Some(detail) = &status.detail {
                            println!("  {}", detail);
                        }
                        if status.state == JobState::Failed {
                            anyhow::bail!("job '{}' failed", status.job_id);
                        }
                    }
                    None => anyhow::bail!("job '{}' was lost before completion", job.id),
                }
            }
        }

        Command::Run => {
            let restored = app.restore_pending_jobs().await;
            info!("Serving with {} restored job(s)", restored);

            // Status updates from worker tasks arrive over the broadcast
            // channel; this task is the only place they become output.
            let mut status_rx = app.subscribe_status();
            tokio::spawn(async move {
                loop {
                    match status_rx.recv().await {
                        Ok(status) => info!("Job '{}' is now {}", status.job_id, status.state),
                        Err(RecvError::Lagged(_)) => continue,
                        Err(RecvError::Closed) => break,
                    }
                }
            });

            let scheduler_handle = app.start();
            tokio::signal::ctrl_c().await?;
            info!("Shutting down");
            scheduler_handle.abort();
        }
    }

    Ok(())
}

fn redact(token: &str) -> String {
    if token.is_empty() {
        return "(unset)".to_string();
    }
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 4 {
        "****".to_string()
    } else {
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("****{}", tail)
    }
}
