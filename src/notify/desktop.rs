//! Native desktop notifications.
//!
//! Each supported OS gets its own `Notifier` that shells out to the
//! platform's notification tool:
//! - Linux: `notify-send`
//! - macOS: `osascript` (AppleScript `display notification`)
//! - Windows: PowerShell toast via `Windows.UI.Notifications`
//!
//! Unknown platforms get a no-op notifier.

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::{Notifier, PriceAlert};
use crate::types::MonitorError;

const CHANNEL: &str = "desktop";

/// Pick the desktop backend for an OS identifier as reported by
/// `std::env::consts::OS`.
pub fn for_os(os: &str) -> Box<dyn Notifier> {
    match os {
        "linux" => Box::new(LinuxNotifier),
        "macos" => Box::new(MacNotifier),
        "windows" => Box::new(WindowsNotifier),
        other => Box::new(UnsupportedNotifier { os: other.to_string() }),
    }
}

/// Backend for the OS this binary was built for.
pub fn for_current_os() -> Box<dyn Notifier> {
    for_os(std::env::consts::OS)
}

/// Run a notification command and turn a non-zero exit into an error.
async fn run(program: &str, args: &[String]) -> Result<(), MonitorError> {
    let output = Command::new(program)
        .args(args)
        .output()
        .await
        .map_err(|e| MonitorError::Notify {
            channel: CHANNEL.into(),
            message: format!("failed to run {program}: {e}"),
        })?;

    if !output.status.success() {
        return Err(MonitorError::Notify {
            channel: CHANNEL.into(),
            message: format!(
                "{program} exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }
    debug!(program, "Desktop notification shown");
    Ok(())
}

// ---------------------------------------------------------------------------
// Linux
// ---------------------------------------------------------------------------

pub struct LinuxNotifier;

impl LinuxNotifier {
    fn args(alert: &PriceAlert) -> Vec<String> {
        vec![alert.title.clone(), alert.message()]
    }
}

#[async_trait]
impl Notifier for LinuxNotifier {
    async fn notify(&self, alert: &PriceAlert) -> Result<(), MonitorError> {
        run("notify-send", &Self::args(alert)).await
    }

    fn channel(&self) -> &'static str {
        CHANNEL
    }
}

// ---------------------------------------------------------------------------
// macOS
// ---------------------------------------------------------------------------

pub struct MacNotifier;

impl MacNotifier {
    fn escape(s: &str) -> String {
        s.replace('\\', "\\\\").replace('"', "\\\"")
    }

    fn args(alert: &PriceAlert) -> Vec<String> {
        let script = format!(
            "display notification \"{}\" with title \"{}\"",
            Self::escape(&alert.message()),
            Self::escape(&alert.title)
        );
        vec!["-e".to_string(), script]
    }
}

#[async_trait]
impl Notifier for MacNotifier {
    async fn notify(&self, alert: &PriceAlert) -> Result<(), MonitorError> {
        run("osascript", &Self::args(alert)).await
    }

    fn channel(&self) -> &'static str {
        CHANNEL
    }
}

// ---------------------------------------------------------------------------
// Windows
// ---------------------------------------------------------------------------

/// AppUserModelID of the stock PowerShell shortcut. Toasts from an
/// unregistered id are dropped silently.
const POWERSHELL_AUMID: &str =
    r"{1AC14E77-02E7-4E5D-B744-2EB1AE5198B7}\WindowsPowerShell\v1.0\powershell.exe";

pub struct WindowsNotifier;

impl WindowsNotifier {
    /// PowerShell single-quoted literal.
    fn quote(s: &str) -> String {
        format!("'{}'", s.replace('\'', "''"))
    }

    fn args(alert: &PriceAlert) -> Vec<String> {
        let title = Self::quote(&alert.title);
        let message = Self::quote(&alert.message());
        let app_id = Self::quote(POWERSHELL_AUMID);
        let script = format!(
            "[Windows.UI.Notifications.ToastNotificationManager, Windows.UI.Notifications, ContentType = WindowsRuntime] > $null; \
             $t = [Windows.UI.Notifications.ToastNotificationManager]::GetTemplateContent([Windows.UI.Notifications.ToastTemplateType]::ToastText02); \
             $x = $t.GetElementsByTagName('text'); \
             $x.Item(0).AppendChild($t.CreateTextNode({title})) > $null; \
             $x.Item(1).AppendChild($t.CreateTextNode({message})) > $null; \
             [Windows.UI.Notifications.ToastNotificationManager]::CreateToastNotifier({app_id}).Show([Windows.UI.Notifications.ToastNotification]::new($t))"
        );
        vec![
            "-NoProfile".to_string(),
            "-NonInteractive".to_string(),
            "-Command".to_string(),
            script,
        ]
    }
}

#[async_trait]
impl Notifier for WindowsNotifier {
    async fn notify(&self, alert: &PriceAlert) -> Result<(), MonitorError> {
        run("powershell", &Self::args(alert)).await
    }

    fn channel(&self) -> &'static str {
        CHANNEL
    }
}

// ---------------------------------------------------------------------------
// Fallback
// ---------------------------------------------------------------------------

pub struct UnsupportedNotifier {
    os: String,
}

#[async_trait]
impl Notifier for UnsupportedNotifier {
    async fn notify(&self, _alert: &PriceAlert) -> Result<(), MonitorError> {
        debug!(os = %self.os, "Desktop notifications not supported on this system");
        Ok(())
    }

    fn channel(&self) -> &'static str {
        CHANNEL
    }
}
