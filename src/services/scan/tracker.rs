use crate::core::models::MatchedEmail;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

struct TrackerState {
    processed_ids: HashSet<String>,
    matched_emails: Vec<MatchedEmail>,
}

/// Process-lifetime record of evaluated message ids plus the matched-email
/// list, behind a single lock. Both grow monotonically; `clear_all` is the
/// only reset path.
#[derive(Clone)]
pub struct MatchTracker {
    state: Arc<Mutex<TrackerState>>,
}

impl Default for MatchTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchTracker {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(TrackerState {
                processed_ids: HashSet::new(),
                matched_emails: Vec::new(),
            })),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// A candidate already present in the matched list is treated as
    /// processed even if the id set has drifted.
    pub fn is_processed(&self, id: &str) -> bool {
        let state = self.lock_state();
        state.processed_ids.contains(id) || state.matched_emails.iter().any(|e| e.id == id)
    }

    pub fn mark_processed(&self, id: &str) {
        self.lock_state().processed_ids.insert(id.to_string());
    }

    /// Append a matched email unless its id is already recorded. Returns
    /// whether the record was added.
    pub fn record_match(&self, email: MatchedEmail) -> bool {
        let mut state = self.lock_state();
        if state.matched_emails.iter().any(|e| e.id == email.id) {
            return false;
        }
        state.processed_ids.insert(email.id.clone());
        state.matched_emails.push(email);
        true
    }

    pub fn matched_emails(&self) -> Vec<MatchedEmail> {
        self.lock_state().matched_emails.clone()
    }

    pub fn matched_count(&self) -> usize {
        self.lock_state().matched_emails.len()
    }

    pub fn processed_count(&self) -> usize {
        self.lock_state().processed_ids.len()
    }

    /// Drop everything: matched list and processed-id set together, so the
    /// subset invariant between them is preserved trivially.
    pub fn clear_all(&self) {
        let mut state = self.lock_state();
        state.matched_emails.clear();
        state.processed_ids.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matched(id: &str) -> MatchedEmail {
        MatchedEmail {
            id: id.to_string(),
            timestamp: "2026-08-25 10:00:00".to_string(),
            sender: "a@example.com".to_string(),
            subject: "subject".to_string(),
            date: "Mon, 24 Aug 2026 10:00:00 +0000".to_string(),
            body: String::new(),
            match_type: "Attachment".to_string(),
            attachments_info: vec![],
            matched_filenames: vec!["file.txt".to_string()],
        }
    }

    #[test]
    fn test_mark_and_contains() {
        let tracker = MatchTracker::new();
        assert!(!tracker.is_processed("m1"));
        tracker.mark_processed("m1");
        assert!(tracker.is_processed("m1"));
    }

    #[test]
    fn test_record_match_is_idempotent() {
        let tracker = MatchTracker::new();
        assert!(tracker.record_match(matched("m1")));
        assert!(!tracker.record_match(matched("m1")));
        assert_eq!(tracker.matched_count(), 1);
    }

    #[test]
    fn test_matched_ids_are_subset_of_processed() {
        let tracker = MatchTracker::new();
        tracker.record_match(matched("m1"));
        assert!(tracker.is_processed("m1"));
        assert_eq!(tracker.processed_count(), 1);
    }

    #[test]
    fn test_matched_entry_counts_as_processed_without_set_entry() {
        let tracker = MatchTracker::new();
        // Simulate drift between the two collections.
        tracker.lock_state().matched_emails.push(matched("m2"));
        assert!(tracker.is_processed("m2"));
    }

    #[test]
    fn test_clear_all_resets_both() {
        let tracker = MatchTracker::new();
        tracker.record_match(matched("m1"));
        tracker.mark_processed("m2");
        tracker.clear_all();
        assert_eq!(tracker.matched_count(), 0);
        assert_eq!(tracker.processed_count(), 0);
        assert!(!tracker.is_processed("m1"));
    }
}
