pub mod body;
pub mod extractor;
pub mod fetcher;
pub mod matcher;
pub mod run;
pub mod scheduler;
pub mod tracker;

pub use extractor::AttachmentExtractor;
pub use matcher::KeywordMatcher;
pub use run::{ProgressStyle, RunSummary, ScanRun};
pub use scheduler::Scheduler;
pub use tracker::MatchTracker;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation flag, polled at defined points rather than
/// interrupting in-flight work. Each run mode owns an independent flag.
#[derive(Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
