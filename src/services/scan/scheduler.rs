use crate::core::config::ScanConfig;
use crate::core::events::{EventBus, LogLevel, RunMode};
use crate::core::models::MatchedEmail;
use crate::infrastructure::gmail::MailClient;
use crate::infrastructure::notification::NotificationSink;
use crate::services::scan::run::{ProgressStyle, ScanRun};
use crate::services::scan::tracker::MatchTracker;
use crate::services::scan::CancelFlag;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::info;

/// Cooldown before retrying after a scan-level failure, so a failing backend
/// is not hammered at the regular interval.
const ERROR_COOLDOWN_SECS: u64 = 60;

struct ActiveRun {
    cancel: CancelFlag,
    handle: JoinHandle<()>,
}

/// Owns the two run modes: a continuous interval loop and one-shot manual
/// runs. Each mode carries its own cancellation flag and at most one active
/// instance; stopping one never disturbs the other.
pub struct Scheduler {
    client: Arc<dyn MailClient>,
    notifier: Arc<dyn NotificationSink>,
    tracker: MatchTracker,
    events: EventBus,
    continuous: Mutex<Option<ActiveRun>>,
    manual: Mutex<Option<ActiveRun>>,
}

impl Scheduler {
    pub fn new(
        client: Arc<dyn MailClient>,
        notifier: Arc<dyn NotificationSink>,
        events: EventBus,
    ) -> Self {
        Self {
            client,
            notifier,
            tracker: MatchTracker::new(),
            events,
            continuous: Mutex::new(None),
            manual: Mutex::new(None),
        }
    }

    pub fn tracker(&self) -> MatchTracker {
        self.tracker.clone()
    }

    pub fn matched_emails(&self) -> Vec<MatchedEmail> {
        self.tracker.matched_emails()
    }

    /// Start the continuous loop. Returns false (request dropped) when a
    /// loop is already active.
    pub fn start_monitoring(&self, config: ScanConfig) -> bool {
        let mut slot = lock_slot(&self.continuous);
        if slot.as_ref().is_some_and(|run| !run.handle.is_finished()) {
            self.events
                .log(LogLevel::Warning, "Monitoring already running");
            return false;
        }

        self.events.log(
            LogLevel::Info,
            format!(
                "Monitoring attachments for '{}' every {}s",
                config.keyword, config.check_interval
            ),
        );

        let cancel = CancelFlag::new();
        let run = self.build_run(&config, cancel.clone(), ProgressStyle::Background);
        let events = self.events.clone();
        let interval = config.check_interval;
        let task_cancel = cancel.clone();
        let handle = tokio::spawn(async move {
            monitor_loop(run, events, interval, task_cancel).await;
        });

        *slot = Some(ActiveRun { cancel, handle });
        true
    }

    /// Signal the continuous loop to stop and wait for it to wind down. The
    /// loop observes the flag at its next poll point, so the message being
    /// processed is finished first; in-flight manual runs are unaffected.
    pub async fn stop_monitoring(&self) {
        let run = lock_slot(&self.continuous).take();
        if let Some(run) = run {
            info!("Stopping monitoring loop...");
            run.cancel.cancel();
            let _ = run.handle.await;
        }
    }

    /// Start a one-shot manual scan. A second request while one is active is
    /// rejected and the existing run left undisturbed.
    pub fn check_now(&self, config: ScanConfig) -> bool {
        let mut slot = lock_slot(&self.manual);
        if slot.as_ref().is_some_and(|run| !run.handle.is_finished()) {
            self.events
                .log(LogLevel::Warning, "Manual check already in progress");
            return false;
        }

        self.events.log(
            LogLevel::Info,
            format!(
                "Manual check started for attachments containing '{}'",
                config.keyword
            ),
        );

        let cancel = CancelFlag::new();
        let run = self.build_run(&config, cancel.clone(), ProgressStyle::Manual);
        let events = self.events.clone();
        let task_cancel = cancel.clone();
        let handle = tokio::spawn(async move {
            manual_run(run, events, task_cancel).await;
        });

        *slot = Some(ActiveRun { cancel, handle });
        true
    }

    pub fn cancel_manual(&self) {
        if let Some(run) = lock_slot(&self.manual).take() {
            run.cancel.cancel();
        }
    }

    /// The only reset path: empties the matched list and the processed-id
    /// set together.
    pub fn clear_all(&self) {
        self.tracker.clear_all();
        self.events.matches_updated(0, 0);
        self.events
            .log(LogLevel::Info, "Cleared all matched emails and processed ids");
    }

    fn build_run(&self, config: &ScanConfig, cancel: CancelFlag, style: ProgressStyle) -> ScanRun {
        ScanRun::new(
            self.client.clone(),
            self.tracker.clone(),
            self.notifier.clone(),
            self.events.clone(),
            config.clone(),
            cancel,
            style,
        )
    }
}

fn lock_slot(slot: &Mutex<Option<ActiveRun>>) -> MutexGuard<'_, Option<ActiveRun>> {
    slot.lock().unwrap_or_else(|e| e.into_inner())
}

async fn monitor_loop(run: ScanRun, events: EventBus, interval_secs: u64, cancel: CancelFlag) {
    loop {
        if cancel.is_cancelled() {
            break;
        }

        match run.execute().await {
            Ok(_) => {
                // Tick through the interval one second at a time so a stop
                // request is observed promptly.
                let mut stopped = false;
                for elapsed in 1..=interval_secs {
                    if cancel.is_cancelled() {
                        stopped = true;
                        break;
                    }
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    events.interval_progress((elapsed * 100 / interval_secs) as u8);
                }
                events.interval_progress(0);
                if stopped {
                    break;
                }
            }
            Err(e) => {
                events.log(LogLevel::Error, format!("Error checking emails: {}", e));
                let mut stopped = false;
                for _ in 0..ERROR_COOLDOWN_SECS {
                    if cancel.is_cancelled() {
                        stopped = true;
                        break;
                    }
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
                events.interval_progress(0);
                if stopped {
                    break;
                }
            }
        }
    }

    events.log(LogLevel::Info, "Monitoring stopped");
    events.run_finished(RunMode::Continuous);
}

async fn manual_run(run: ScanRun, events: EventBus, cancel: CancelFlag) {
    // Short synthetic ramp so the progress bar is visibly alive before real
    // work starts.
    for step in 0..10u8 {
        if cancel.is_cancelled() {
            break;
        }
        events.progress(step);
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    match run.execute().await {
        Ok(_) => {
            // A cancelled run keeps its last reported value instead of
            // jumping to complete.
            if !cancel.is_cancelled() {
                events.progress(100);
            }
        }
        Err(e) => {
            events.log(LogLevel::Error, format!("Error during manual check: {}", e));
            events.progress(0);
        }
    }

    // Guaranteed even on error so the caller can re-enable controls.
    events.log(LogLevel::Info, "Manual check completed");
    events.run_finished(RunMode::Manual);
}
