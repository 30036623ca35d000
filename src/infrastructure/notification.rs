use anyhow::{Context, Result};

/// System notification sink. Delivery failures are never fatal to a scan;
/// callers log and move on.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, title: &str, body: &str) -> Result<()>;
}

/// Desktop notifications via the platform notification service.
pub struct DesktopNotifier {
    app_name: String,
}

impl DesktopNotifier {
    pub fn new() -> Self {
        Self {
            app_name: "Mail Scanner".to_string(),
        }
    }
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationSink for DesktopNotifier {
    fn notify(&self, title: &str, body: &str) -> Result<()> {
        notify_rust::Notification::new()
            .appname(&self.app_name)
            .summary(title)
            .body(body)
            .timeout(notify_rust::Timeout::Milliseconds(15_000))
            .show()
            .context("Failed to send desktop notification")?;
        Ok(())
    }
}

/// No-op sink for headless runs and tests.
#[derive(Default)]
pub struct NullNotifier;

impl NotificationSink for NullNotifier {
    fn notify(&self, _title: &str, _body: &str) -> Result<()> {
        Ok(())
    }
}
