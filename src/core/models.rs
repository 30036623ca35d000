use serde::{Deserialize, Serialize};

/// Minimal message reference returned by the list query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageSummary {
    pub id: String,
}

/// One page of list-query results.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageListPage {
    #[serde(default)]
    pub messages: Vec<MessageSummary>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageHeader {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PartBody {
    pub attachment_id: Option<String>,
    #[serde(default)]
    pub size: u64,
    pub data: Option<String>,
}

/// One node of a message's MIME part tree. Parts nest arbitrarily.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MessagePart {
    #[serde(default)]
    pub filename: String,
    pub mime_type: Option<String>,
    #[serde(default)]
    pub headers: Vec<MessageHeader>,
    pub body: Option<PartBody>,
    pub parts: Option<Vec<MessagePart>>,
}

/// Full message as returned by the get-by-id call.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDetail {
    pub id: String,
    pub payload: Option<MessagePart>,
}

impl MessageDetail {
    /// Case-insensitive header lookup on the top-level payload.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.payload.as_ref().and_then(|p| {
            p.headers
                .iter()
                .find(|h| h.name.eq_ignore_ascii_case(name))
                .map(|h| h.value.as_str())
        })
    }

    pub fn subject(&self) -> String {
        self.header("Subject").unwrap_or("No Subject").to_string()
    }

    pub fn sender(&self) -> String {
        self.header("From").unwrap_or_default().to_string()
    }

    pub fn date_header(&self) -> String {
        self.header("Date").unwrap_or_default().to_string()
    }
}

/// Attachment reference derived from the part tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttachmentDescriptor {
    pub filename: String,
    pub mime_type: String,
    pub attachment_id: String,
    pub size: u64,
}

/// Walk a message's part tree depth-first and collect attachment references.
///
/// A part counts as an attachment iff it carries a non-empty filename and a
/// body with an attachment id. Nested parts are visited before the part
/// itself, preserving discovery order.
pub fn collect_attachments(parts: Option<&Vec<MessagePart>>) -> Vec<AttachmentDescriptor> {
    let mut attachments = Vec::new();
    let Some(parts) = parts else {
        return attachments;
    };
    for part in parts {
        attachments.extend(collect_attachments(part.parts.as_ref()));

        if part.filename.is_empty() {
            continue;
        }
        if let Some(body) = &part.body {
            if let Some(attachment_id) = &body.attachment_id {
                attachments.push(AttachmentDescriptor {
                    filename: part.filename.clone(),
                    mime_type: part
                        .mime_type
                        .clone()
                        .unwrap_or_else(|| "application/octet-stream".to_string()),
                    attachment_id: attachment_id.clone(),
                    size: body.size,
                });
            }
        }
    }
    attachments
}

/// A message whose attachment content matched the keyword. Created once by a
/// scan run and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchedEmail {
    pub id: String,
    /// Scan time, not the message date.
    pub timestamp: String,
    pub sender: String,
    pub subject: String,
    /// Raw Date header value.
    pub date: String,
    /// Best-effort plain-text body, stored for display only.
    pub body: String,
    pub match_type: String,
    pub attachments_info: Vec<AttachmentDescriptor>,
    pub matched_filenames: Vec<String>,
}

/// Reduce `"Display Name" <addr@example.com>` to the display name. Falls back
/// to the raw header value when no angle-bracket address is present.
pub fn format_sender(sender: &str) -> String {
    let trimmed = sender.trim();
    if trimmed.is_empty() {
        return "Unknown Sender".to_string();
    }
    if let Some(lt) = trimmed.find('<') {
        let addr = &trimmed[lt..];
        if addr.contains('@') && addr.ends_with('>') {
            let name = trimmed[..lt].trim().trim_matches('"').trim();
            if !name.is_empty() {
                return name.to_string();
            }
        }
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attachment_part(filename: &str, mime: &str, att_id: &str, size: u64) -> MessagePart {
        MessagePart {
            filename: filename.to_string(),
            mime_type: Some(mime.to_string()),
            body: Some(PartBody {
                attachment_id: Some(att_id.to_string()),
                size,
                data: None,
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_collect_attachments_nested() {
        let inner = MessagePart {
            parts: Some(vec![attachment_part("inner.pdf", "application/pdf", "a1", 10)]),
            ..Default::default()
        };
        let parts = vec![inner, attachment_part("outer.txt", "text/plain", "a2", 5)];

        let found = collect_attachments(Some(&parts));
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].filename, "inner.pdf");
        assert_eq!(found[1].filename, "outer.txt");
    }

    #[test]
    fn test_collect_attachments_requires_filename_and_id() {
        let no_filename = MessagePart {
            body: Some(PartBody {
                attachment_id: Some("a1".to_string()),
                size: 1,
                data: None,
            }),
            ..Default::default()
        };
        let no_attachment_id = MessagePart {
            filename: "inline.png".to_string(),
            body: Some(PartBody::default()),
            ..Default::default()
        };
        let parts = vec![no_filename, no_attachment_id];
        assert!(collect_attachments(Some(&parts)).is_empty());
    }

    #[test]
    fn test_format_sender() {
        assert_eq!(
            format_sender("\"Jane Doe\" <jane@example.com>"),
            "Jane Doe"
        );
        assert_eq!(format_sender("Jane Doe <jane@example.com>"), "Jane Doe");
        assert_eq!(format_sender("jane@example.com"), "jane@example.com");
        assert_eq!(format_sender(""), "Unknown Sender");
    }

    #[test]
    fn test_message_detail_from_provider_json() {
        let raw = r#"{
            "id": "m1",
            "payload": {
                "mimeType": "multipart/mixed",
                "headers": [{"name": "Subject", "value": "weekly files"}],
                "parts": [{
                    "filename": "report.pdf",
                    "mimeType": "application/pdf",
                    "body": {"attachmentId": "a1", "size": 1234}
                }]
            }
        }"#;
        let msg: MessageDetail = serde_json::from_str(raw).unwrap();
        assert_eq!(msg.subject(), "weekly files");

        let found = collect_attachments(msg.payload.as_ref().unwrap().parts.as_ref());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].attachment_id, "a1");
        assert_eq!(found[0].size, 1234);
    }

    #[test]
    fn test_list_page_tolerates_missing_fields() {
        let page: MessageListPage = serde_json::from_str(r#"{"resultSizeEstimate": 0}"#).unwrap();
        assert!(page.messages.is_empty());
        assert!(page.next_page_token.is_none());
    }

    #[test]
    fn test_header_lookup_case_insensitive() {
        let msg = MessageDetail {
            id: "m1".to_string(),
            payload: Some(MessagePart {
                headers: vec![MessageHeader {
                    name: "subject".to_string(),
                    value: "Weekly report".to_string(),
                }],
                ..Default::default()
            }),
        };
        assert_eq!(msg.subject(), "Weekly report");
        assert_eq!(msg.sender(), "");
    }
}
