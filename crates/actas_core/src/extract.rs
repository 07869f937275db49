use crate::error::ExtractError;
use lopdf::Document;
use tracing::debug;

/// Turns raw document bytes into plain text.
pub trait TextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractError>;
}

/// Extracts PDF text page by page, joined with newlines in page order.
/// Pages without text (scans, blank pages) are skipped.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractError> {
        let doc = Document::load_mem(bytes).map_err(|e| ExtractError::Malformed(e.to_string()))?;

        let mut pages = Vec::new();
        for page_number in doc.get_pages().keys() {
            match doc.extract_text(&[*page_number]) {
                Ok(text) if !text.trim().is_empty() => pages.push(text),
                Ok(_) => debug!(page = page_number, "page has no text"),
                Err(err) => debug!(page = page_number, error = %err, "skipping unreadable page"),
            }
        }

        join_pages(pages)
    }
}

/// Joins per-page text, failing when nothing usable remains.
pub fn join_pages<I>(pages: I) -> Result<String, ExtractError>
where
    I: IntoIterator<Item = String>,
{
    let text = pages
        .into_iter()
        .filter(|page| !page.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    if text.is_empty() {
        Err(ExtractError::NoText)
    } else {
        Ok(text)
    }
}
