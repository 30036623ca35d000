use async_channel::{Receiver, Sender};
use tracing::{debug, error, info, warn};

/// Log severity carried on presentation events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warning,
    Error,
    Success,
    Debug,
}

/// Which run mode produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Continuous,
    Manual,
}

/// Immutable event records emitted by scan workers. The worker never touches
/// presentation state directly; a single consumer drains this queue.
#[derive(Debug, Clone)]
pub enum ScanEvent {
    Log {
        level: LogLevel,
        message: String,
    },
    /// Manual-run progress in [0, 100].
    Progress(u8),
    /// Coarse progress through the between-scan interval, in [0, 100].
    IntervalProgress(u8),
    /// The matched-email list grew.
    MatchesUpdated {
        new_matches: usize,
        total: usize,
    },
    /// A run reached its end, successfully or not. Always emitted for manual
    /// runs so the caller can re-enable controls.
    RunFinished {
        mode: RunMode,
    },
}

/// Sending half of the event queue, shared by all workers. Every log event is
/// mirrored onto `tracing` so diagnostics exist even with no consumer attached.
#[derive(Clone)]
pub struct EventBus {
    tx: Sender<ScanEvent>,
}

impl EventBus {
    pub fn new() -> (Self, Receiver<ScanEvent>) {
        let (tx, rx) = async_channel::unbounded();
        (Self { tx }, rx)
    }

    fn emit(&self, event: ScanEvent) {
        // Consumer may have gone away; events are advisory.
        let _ = self.tx.try_send(event);
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            LogLevel::Error => error!("{}", message),
            LogLevel::Warning => warn!("{}", message),
            LogLevel::Debug => debug!("{}", message),
            LogLevel::Info | LogLevel::Success => info!("{}", message),
        }
        self.emit(ScanEvent::Log { level, message });
    }

    pub fn progress(&self, value: u8) {
        self.emit(ScanEvent::Progress(value.min(100)));
    }

    pub fn interval_progress(&self, value: u8) {
        self.emit(ScanEvent::IntervalProgress(value.min(100)));
    }

    pub fn matches_updated(&self, new_matches: usize, total: usize) {
        self.emit(ScanEvent::MatchesUpdated { new_matches, total });
    }

    pub fn run_finished(&self, mode: RunMode) {
        self.emit(ScanEvent::RunFinished { mode });
    }
}
