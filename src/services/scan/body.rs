use crate::core::models::{MessageDetail, MessagePart};
use crate::infrastructure::gmail::decode_base64_url;
use tracing::warn;

pub const SENTINEL_NO_BODY: &str = "[Body content not found or could not be decoded]";

/// Best-effort plain-text body for display. Prefers a `text/plain` part,
/// falls back to `text/html` rendered as text. Matching never runs against
/// the body; it exists only so the presentation layer has something to show.
pub fn extract_body(message: &MessageDetail) -> String {
    let Some(payload) = &message.payload else {
        return String::new();
    };

    let mut plain: Option<&str> = None;
    let mut html: Option<&str> = None;
    find_content_parts(payload, &mut plain, &mut html);

    if let Some(data) = plain {
        if let Some(text) = decode_part(data) {
            return text;
        }
    }
    if let Some(data) = html {
        if let Some(markup) = decode_part(data) {
            if let Ok(text) = html2text::from_read(markup.as_bytes(), 80) {
                return text;
            }
        }
    }

    warn!(
        "Could not find or decode a text body part for message {}",
        message.id
    );
    SENTINEL_NO_BODY.to_string()
}

/// Recursively record the first plain and html parts carrying inline data.
fn find_content_parts<'a>(
    part: &'a MessagePart,
    plain: &mut Option<&'a str>,
    html: &mut Option<&'a str>,
) {
    let mime = part.mime_type.as_deref().unwrap_or("").to_lowercase();
    let data = part.body.as_ref().and_then(|b| b.data.as_deref());

    match data {
        Some(data) => {
            if mime == "text/plain" && plain.is_none() {
                *plain = Some(data);
            } else if mime == "text/html" && html.is_none() {
                *html = Some(data);
            }
        }
        None => {
            if let Some(children) = &part.parts {
                for child in children {
                    find_content_parts(child, plain, html);
                }
            }
        }
    }
}

fn decode_part(data: &str) -> Option<String> {
    let bytes = decode_base64_url(data).ok()?;
    match String::from_utf8(bytes) {
        Ok(text) => Some(text),
        Err(e) => {
            let (decoded, _, had_errors) = encoding_rs::WINDOWS_1252.decode(e.as_bytes());
            if had_errors {
                None
            } else {
                Some(decoded.into_owned())
            }
        }
    }
}
