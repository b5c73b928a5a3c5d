//! Local notification delivery
//!
//! The scheduler core only needs a `notify(title, message)` capability;
//! the OS notification service is an external collaborator. Delivery is
//! best-effort and infallible from the caller's view: a failed desktop
//! notification is logged and degrades to the log sink.

use async_trait::async_trait;
use tracing::{info, warn};

#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    async fn notify(&self, title: &str, message: &str);
}

/// Default sink: notifications go to the tracing log.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, title: &str, message: &str) {
        info!("[notification] {}: {}", title, message);
    }
}

/// Desktop notifications via the platform notifier command
/// (`notify-send` on Linux, `osascript` on macOS).
pub struct DesktopNotifier;

#[async_trait]
impl Notifier for DesktopNotifier {
    async fn notify(&self, title: &str, message: &str) {
        match deliver_desktop(title, message).await {
            Ok(()) => {}
            Err(e) => {
                warn!("Desktop notification failed ({}), falling back to log", e);
                info!("[notification] {}: {}", title, message);
            }
        }
    }
}

#[cfg(target_os = "macos")]
async fn deliver_desktop(title: &str, message: &str) -> std::io::Result<()> {
    let script = format!(
        r#"display notification "{}" with title "{}""#,
        message.replace('"', r#"\""#),
        title.replace('"', r#"\""#)
    );
    let status = tokio::process::Command::new("osascript")
        .args(["-e", &script])
        .status()
        .await?;
    if !status.success() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("osascript exited with {}", status),
        ));
    }
    Ok(())
}

#[cfg(target_os = "linux")]
async fn deliver_desktop(title: &str, message: &str) -> std::io::Result<()> {
    let status = tokio::process::Command::new("notify-send")
        .args([title, message])
        .status()
        .await?;
    if !status.success() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("notify-send exited with {}", status),
        ));
    }
    Ok(())
}

#[cfg(not(any(target_os = "macos", target_os = "linux")))]
async fn deliver_desktop(_title: &str, _message: &str) -> std::io::Result<()> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "no desktop notifier on this platform",
    ))
}
