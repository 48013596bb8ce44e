//! PDF text extraction.

use std::path::Path;

use lopdf::Document;

use crate::{Error, Result};

/// Shortest extraction accepted as a text PDF.
pub const MIN_EXTRACTED_CHARS: usize = 40;

/// Reads every page of the PDF at `path` and returns the joined text.
pub fn load_pdf(path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(Error::config(format!("PDF not found: {}", path.display())));
    }
    let document = Document::load(path).map_err(|err| {
        Error::Extraction(format!("failed to open {}: {err}", path.display()))
    })?;

    let mut pages = Vec::new();
    for page_number in document.get_pages().into_keys() {
        match document.extract_text(&[page_number]) {
            Ok(text) => pages.push(text),
            Err(err) => {
                tracing::warn!(
                    "page {page_number} of {} has no extractable text: {err}",
                    path.display()
                );
            }
        }
    }

    let text = join_pages(pages)?;
    tracing::info!(
        "extracted {} characters from {}",
        text.chars().count(),
        path.display()
    );
    Ok(text)
}

/// Joins page texts in order and rejects extractions too short to be real text.
pub fn join_pages<I, S>(pages: I) -> Result<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut joined = String::new();
    for page in pages {
        let page = page.as_ref();
        if page.is_empty() {
            continue;
        }
        joined.push_str(page);
        joined.push('\n');
    }
    let text = joined.replace('\r', "").trim().to_string();

    let extracted = text.chars().count();
    if extracted < MIN_EXTRACTED_CHARS {
        return Err(Error::Extraction(format!(
            "only {extracted} characters extracted; the PDF is probably scanned images"
        )));
    }
    Ok(text)
}
