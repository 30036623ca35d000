use crate::core::config::ScanConfig;
use crate::core::error::AppResult;
use crate::core::events::{EventBus, LogLevel};
use crate::core::models::{collect_attachments, MatchedEmail};
use crate::infrastructure::gmail::MailClient;
use crate::infrastructure::notification::NotificationSink;
use crate::services::scan::body::extract_body;
use crate::services::scan::extractor::AttachmentExtractor;
use crate::services::scan::fetcher::fetch_candidates;
use crate::services::scan::matcher::KeywordMatcher;
use crate::services::scan::tracker::MatchTracker;
use crate::services::scan::CancelFlag;
use chrono::Local;
use std::sync::Arc;

/// Manual runs report the proportional progress formula; background runs
/// stay silent and leave progress to the interval ticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStyle {
    Manual,
    Background,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub candidates: usize,
    pub processed: usize,
    pub new_matches: usize,
}

/// One execution of the pipeline: fetch candidates, filter against the
/// tracker, process each remaining message, aggregate.
///
/// Per-message and per-attachment failures never escape a run; only the
/// initial fetch can fail scan-level, and that surfaces as the returned
/// error rather than a panic or partial state.
pub struct ScanRun {
    client: Arc<dyn MailClient>,
    tracker: MatchTracker,
    extractor: AttachmentExtractor,
    notifier: Arc<dyn NotificationSink>,
    events: EventBus,
    config: ScanConfig,
    cancel: CancelFlag,
    progress: ProgressStyle,
}

impl ScanRun {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        client: Arc<dyn MailClient>,
        tracker: MatchTracker,
        notifier: Arc<dyn NotificationSink>,
        events: EventBus,
        config: ScanConfig,
        cancel: CancelFlag,
        progress: ProgressStyle,
    ) -> Self {
        Self {
            client,
            tracker,
            extractor: AttachmentExtractor::new(),
            notifier,
            events,
            config,
            cancel,
            progress,
        }
    }

    pub async fn execute(&self) -> AppResult<RunSummary> {
        let query = self.config.query();
        self.events
            .log(LogLevel::Info, format!("Executing query: {}", query));

        let candidates = fetch_candidates(
            self.client.as_ref(),
            &query,
            self.config.page_size,
            &self.cancel,
            &self.events,
        )
        .await?;

        let total = candidates.len();
        if total == 0 {
            self.events.log(
                LogLevel::Info,
                "No emails with attachments found matching criteria",
            );
            if self.progress == ProgressStyle::Manual {
                self.events.progress(100);
            }
            return Ok(RunSummary::default());
        }

        self.events.log(
            LogLevel::Info,
            format!("Found {} potential emails with attachments to check", total),
        );

        let matcher = KeywordMatcher::new(&self.config.keyword);
        let mut processed = 0usize;
        let mut new_matches = 0usize;

        for candidate in &candidates {
            if self.cancel.is_cancelled() {
                self.events.log(LogLevel::Info, "Scan stopped during check");
                break;
            }

            let id = candidate.id.as_str();
            if self.tracker.is_processed(id) {
                // Skipped candidates still count toward the denominator.
                processed += 1;
                self.emit_progress(processed, total);
                continue;
            }

            if self.process_message(id, &matcher).await {
                new_matches += 1;
            }
            // Marked exactly once per enqueued id, success or not.
            self.tracker.mark_processed(id);
            processed += 1;
            self.emit_progress(processed, total);
        }

        self.aggregate(new_matches, processed, total);

        Ok(RunSummary {
            candidates: total,
            processed,
            new_matches,
        })
    }

    /// Per-message isolation boundary: any failure is logged and the message
    /// counts as processed without a match.
    async fn process_message(&self, id: &str, matcher: &KeywordMatcher) -> bool {
        match self.try_process_message(id, matcher).await {
            Ok(matched) => matched,
            Err(e) => {
                self.events.log(
                    LogLevel::Error,
                    format!("Error processing message {}: {}", id, e),
                );
                false
            }
        }
    }

    async fn try_process_message(&self, id: &str, matcher: &KeywordMatcher) -> AppResult<bool> {
        let message = self.client.get_message(id).await?;

        let Some(payload) = &message.payload else {
            self.events
                .log(LogLevel::Warning, format!("No payload found for message {}", id));
            return Ok(false);
        };

        let attachments = collect_attachments(payload.parts.as_ref());
        if attachments.is_empty() {
            // Inconsistency between the query filter and the parsed tree.
            self.events.log(
                LogLevel::Warning,
                format!(
                    "Message {} matched the attachment filter but no attachments were found via parsing",
                    id
                ),
            );
            return Ok(false);
        }

        let mut matched_filenames = Vec::new();
        for descriptor in &attachments {
            self.events.log(
                LogLevel::Debug,
                format!(
                    "Checking attachment: {} ({}) in message {}",
                    descriptor.filename, descriptor.mime_type, id
                ),
            );

            let data = match self
                .client
                .get_attachment(id, &descriptor.attachment_id)
                .await
            {
                Ok(data) => data,
                Err(e) => {
                    self.events.log(
                        LogLevel::Error,
                        format!(
                            "Error downloading attachment {} for message {}: {}",
                            descriptor.attachment_id, id, e
                        ),
                    );
                    continue;
                }
            };

            let text = self
                .extractor
                .extract(&data, &descriptor.mime_type, &descriptor.filename);

            if matcher.evaluate(descriptor, &text, &mut matched_filenames) {
                self.events.log(
                    LogLevel::Success,
                    format!(
                        "Keyword '{}' found in attachment: {}",
                        self.config.keyword, descriptor.filename
                    ),
                );
            }
        }

        if matched_filenames.is_empty() {
            return Ok(false);
        }

        let record = MatchedEmail {
            id: id.to_string(),
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            sender: message.sender(),
            subject: message.subject(),
            date: message.date_header(),
            body: extract_body(&message),
            match_type: "Attachment".to_string(),
            attachments_info: attachments,
            matched_filenames,
        };
        Ok(self.tracker.record_match(record))
    }

    fn aggregate(&self, new_matches: usize, processed: usize, total: usize) {
        if new_matches > 0 {
            self.events.log(
                LogLevel::Success,
                format!("Found {} new emails with matching attachments", new_matches),
            );
            self.events
                .matches_updated(new_matches, self.tracker.matched_count());

            let title = format!("{} new emails found", new_matches);
            let body = format!(
                "Found {} emails with attachments containing '{}'",
                new_matches, self.config.keyword
            );
            if let Err(e) = self.notifier.notify(&title, &body) {
                self.events.log(
                    LogLevel::Warning,
                    format!("Failed to send notification: {}", e),
                );
            }
        } else {
            self.events.log(
                LogLevel::Info,
                format!(
                    "Checked {}/{} emails, no new matches found for '{}'",
                    processed, total, self.config.keyword
                ),
            );
        }
    }

    /// First 10% is a fixed pre-roll; the rest tracks processed candidates.
    fn emit_progress(&self, processed: usize, total: usize) {
        if self.progress == ProgressStyle::Manual && total > 0 {
            let value = (10 + processed * 90 / total) as u8;
            self.events.progress(value);
        }
    }
}
