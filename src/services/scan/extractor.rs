use calamine::Reader;
use quick_xml::events::Event;
use std::io::{Cursor, Read};
use tracing::{info, warn};

pub const SENTINEL_UNDECODABLE_TEXT: &str = "[Could not decode text]";
pub const SENTINEL_ENCRYPTED_PDF: &str = "[Encrypted PDF - Cannot Extract Text]";
pub const SENTINEL_IMAGE_PDF: &str = "[Could not extract text from PDF - Image Based?]";
pub const SENTINEL_INVALID_PDF: &str = "[Invalid or Corrupted PDF]";
pub const SENTINEL_DOCX: &str = "[Error reading DOCX file]";
pub const SENTINEL_CSV: &str = "[Error reading CSV file]";
pub const SENTINEL_WORKBOOK: &str = "[Error reading workbook file]";
pub const SENTINEL_SHEET: &str = "[Error reading sheet]";
pub const SENTINEL_ZIP: &str = "[Invalid ZIP file]";

const RAW_PREVIEW_LIMIT: usize = 1000;

type MatchFn = fn(mime: &str, filename_lower: &str) -> bool;
type ExtractFn = fn(data: &[u8], mime: &str, filename: &str) -> String;

/// Per-format text extraction with graceful degradation. Dispatch is a
/// first-match-wins registry over (MIME type, filename extension); every
/// failure collapses to a bracketed sentinel string, so `extract` always
/// yields a searchable text value.
pub struct AttachmentExtractor {
    handlers: Vec<(MatchFn, ExtractFn)>,
}

impl Default for AttachmentExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl AttachmentExtractor {
    pub fn new() -> Self {
        // Registration order defines precedence.
        let handlers: Vec<(MatchFn, ExtractFn)> = vec![
            (
                |mime, name| mime.starts_with("text/plain") || name.ends_with(".txt"),
                extract_plain_text,
            ),
            (
                |mime, name| mime == "application/pdf" || name.ends_with(".pdf"),
                extract_pdf,
            ),
            (
                |mime, name| {
                    mime == "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
                        || name.ends_with(".docx")
                },
                extract_docx,
            ),
            (
                |mime, name| mime == "text/csv" || name.ends_with(".csv"),
                extract_csv,
            ),
            (
                |mime, name| {
                    mime == "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
                        || mime == "application/vnd.ms-excel"
                        || name.ends_with(".xlsx")
                        || name.ends_with(".xls")
                },
                extract_workbook,
            ),
            (
                |mime, name| {
                    mime == "application/zip"
                        || mime == "application/x-zip-compressed"
                        || name.ends_with(".zip")
                },
                extract_zip,
            ),
        ];
        Self { handlers }
    }

    pub fn extract(&self, data: &[u8], mime_type: &str, filename: &str) -> String {
        let filename_lower = filename.to_lowercase();
        for (matches, extract) in &self.handlers {
            if matches(mime_type, &filename_lower) {
                return extract(data, mime_type, filename);
            }
        }
        extract_unsupported(data, mime_type, filename)
    }
}

/// UTF-8 strict first, then windows-1252 (which subsumes latin-1).
fn decode_text(data: &[u8]) -> Option<String> {
    if let Ok(text) = std::str::from_utf8(data) {
        return Some(text.to_string());
    }
    let (decoded, _, had_errors) = encoding_rs::WINDOWS_1252.decode(data);
    if had_errors {
        return None;
    }
    Some(decoded.into_owned())
}

fn extract_plain_text(data: &[u8], _mime: &str, filename: &str) -> String {
    match decode_text(data) {
        Some(text) => text,
        None => {
            warn!("Could not decode text file {} with known encodings", filename);
            SENTINEL_UNDECODABLE_TEXT.to_string()
        }
    }
}

fn extract_pdf(data: &[u8], _mime: &str, filename: &str) -> String {
    let doc = match lopdf::Document::load_mem(data) {
        Ok(doc) => doc,
        Err(e) => {
            warn!("Error reading PDF file {}: {}", filename, e);
            return SENTINEL_INVALID_PDF.to_string();
        }
    };

    if doc.is_encrypted() {
        warn!("Skipping encrypted PDF: {}", filename);
        return SENTINEL_ENCRYPTED_PDF.to_string();
    }

    let pages = doc.get_pages();
    let mut text = String::new();
    for (&page_number, _) in pages.iter() {
        match doc.extract_text(&[page_number]) {
            Ok(page_text) => {
                if !page_text.trim().is_empty() {
                    text.push_str(&page_text);
                    text.push('\n');
                }
            }
            Err(e) => {
                warn!(
                    "Error extracting text from page {} of PDF {}: {}",
                    page_number, filename, e
                );
                continue;
            }
        }
    }

    if text.is_empty() && !pages.is_empty() {
        warn!("Could not extract text from PDF {} (possibly image-based)", filename);
        return SENTINEL_IMAGE_PDF.to_string();
    }
    text
}

fn extract_docx(data: &[u8], _mime: &str, filename: &str) -> String {
    // All-or-nothing: partial paragraph text is discarded on failure.
    match read_docx_paragraphs(data) {
        Ok(paragraphs) => paragraphs.join("\n"),
        Err(e) => {
            warn!("Error reading DOCX file {}: {}", filename, e);
            SENTINEL_DOCX.to_string()
        }
    }
}

fn read_docx_paragraphs(data: &[u8]) -> anyhow::Result<Vec<String>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data))?;
    let mut document = archive.by_name("word/document.xml")?;
    let mut xml = String::new();
    document.read_to_string(&mut xml)?;

    let mut reader = quick_xml::Reader::from_str(&xml);
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"t" => in_text = true,
            Event::End(e) if e.local_name().as_ref() == b"t" => in_text = false,
            Event::End(e) if e.local_name().as_ref() == b"p" => {
                paragraphs.push(std::mem::take(&mut current));
            }
            Event::Text(t) if in_text => current.push_str(&t.unescape()?),
            Event::Eof => break,
            _ => {}
        }
    }
    if !current.is_empty() {
        paragraphs.push(current);
    }
    Ok(paragraphs)
}

fn extract_csv(data: &[u8], _mime: &str, filename: &str) -> String {
    let Some(decoded) = decode_text(data) else {
        warn!("Could not decode CSV file {} with known encodings", filename);
        return SENTINEL_CSV.to_string();
    };

    match render_csv(&decoded) {
        Ok(table) => table,
        Err(e) => {
            warn!("Error reading CSV file {}: {}", filename, e);
            // Keep a capped raw preview for diagnostics when decoding worked.
            let preview: String = decoded.chars().take(RAW_PREVIEW_LIMIT).collect();
            format!("{}\n[Raw Decoded Content:\n{}...]", SENTINEL_CSV, preview)
        }
    }
}

/// Parse as all-string tabular data and render the table as searchable text.
/// Missing cells become empty strings; no type inference.
fn render_csv(text: &str) -> anyhow::Result<String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(|cell| cell.to_string()).collect());
    }

    let width = rows.iter().map(|row| row.len()).max().unwrap_or(0);
    let lines: Vec<String> = rows
        .into_iter()
        .map(|mut row| {
            row.resize(width, String::new());
            row.join("  ")
        })
        .collect();
    Ok(lines.join("\n"))
}

fn extract_workbook(data: &[u8], _mime: &str, filename: &str) -> String {
    let cursor = Cursor::new(data.to_vec());
    let mut workbook = match calamine::open_workbook_auto_from_rs(cursor) {
        Ok(workbook) => workbook,
        Err(e) => {
            warn!("Error reading workbook file {}: {}", filename, e);
            return SENTINEL_WORKBOOK.to_string();
        }
    };

    let mut sections = Vec::new();
    for sheet_name in workbook.sheet_names().to_owned() {
        // One bad sheet never aborts the rest.
        let content = match workbook.worksheet_range(&sheet_name) {
            Ok(range) => {
                let lines: Vec<String> = range
                    .rows()
                    .map(|row| {
                        row.iter()
                            .map(|cell| cell.to_string())
                            .collect::<Vec<_>>()
                            .join("  ")
                    })
                    .collect();
                lines.join("\n")
            }
            Err(e) => {
                warn!(
                    "Error reading sheet {} in workbook {}: {}",
                    sheet_name, filename, e
                );
                SENTINEL_SHEET.to_string()
            }
        };
        sections.push(format!("--- Sheet: {} ---\n{}", sheet_name, content));
    }
    sections.join("\n\n")
}

fn extract_zip(data: &[u8], _mime: &str, filename: &str) -> String {
    // Members are listed, never decompressed; no recursive scanning.
    let mut archive = match zip::ZipArchive::new(Cursor::new(data)) {
        Ok(archive) => archive,
        Err(e) => {
            warn!("Could not read ZIP file {} (corrupted?): {}", filename, e);
            return SENTINEL_ZIP.to_string();
        }
    };

    let mut lines = vec![format!("--- ZIP Contents ({}) ---", filename)];
    for index in 0..archive.len() {
        match archive.by_index(index) {
            Ok(entry) => lines.push(format!("- {} ({} bytes)", entry.name(), entry.size())),
            Err(e) => warn!("Error reading ZIP entry {} in {}: {}", index, filename, e),
        }
    }
    lines.join("\n")
}

fn extract_unsupported(_data: &[u8], mime: &str, filename: &str) -> String {
    // Images and opaque binaries are expected non-text attachments.
    if !mime.starts_with("image/") && mime != "application/octet-stream" {
        info!("Skipping unsupported attachment type: {} ({})", filename, mime);
    }
    format!("[Unsupported attachment type: {}]", mime)
}
