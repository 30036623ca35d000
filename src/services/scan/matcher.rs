use crate::core::models::AttachmentDescriptor;

/// Case-insensitive substring test against extracted attachment text.
#[derive(Clone, Debug)]
pub struct KeywordMatcher {
    keyword_lower: String,
}

impl KeywordMatcher {
    pub fn new(keyword: &str) -> Self {
        Self {
            keyword_lower: keyword.to_lowercase(),
        }
    }

    pub fn matches(&self, text: &str) -> bool {
        text.to_lowercase().contains(&self.keyword_lower)
    }

    /// Record a filename as matched when its extracted text contains the
    /// keyword. Attachments are checked exhaustively so every matched
    /// filename is collected, not just the first.
    pub fn evaluate(
        &self,
        descriptor: &AttachmentDescriptor,
        extracted_text: &str,
        matched_filenames: &mut Vec<String>,
    ) -> bool {
        if self.matches(extracted_text) {
            matched_filenames.push(descriptor.filename.clone());
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_match() {
        let matcher = KeywordMatcher::new("Varun");
        assert!(matcher.matches("contact: varun@example.com"));
        assert!(matcher.matches("REPORT BY VARUN"));
        assert!(!matcher.matches("nobody here"));
    }

    #[test]
    fn test_keyword_inside_sentinel_counts_as_match() {
        // Documented edge case: sentinels are ordinary text to the matcher.
        let matcher = KeywordMatcher::new("pdf");
        assert!(matcher.matches(crate::services::scan::extractor::SENTINEL_ENCRYPTED_PDF));
    }

    #[test]
    fn test_evaluate_collects_filenames() {
        let matcher = KeywordMatcher::new("varun");
        let descriptor = AttachmentDescriptor {
            filename: "file.txt".to_string(),
            mime_type: "text/plain".to_string(),
            attachment_id: "a1".to_string(),
            size: 10,
        };
        let mut matched = Vec::new();
        assert!(matcher.evaluate(&descriptor, "varun lives here", &mut matched));
        assert!(!matcher.evaluate(&descriptor, "nothing", &mut matched));
        assert_eq!(matched, vec!["file.txt".to_string()]);
    }
}
