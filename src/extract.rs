//! Turns vault files into plain text for indexing.
//!
//! Text and markdown are read as UTF-8 and read errors propagate to the
//! caller. PDFs go through a page-based reader; each page's text is
//! followed by a newline. A PDF that cannot be parsed yields an empty
//! document rather than an error.

use crate::error::ExtractError;
use lopdf::Document;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Pdf,
    Text,
}

impl ContentKind {
    pub fn for_path(path: &Path) -> Self {
        let is_pdf = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if is_pdf { Self::Pdf } else { Self::Text }
    }
}

pub async fn extract(path: &Path) -> Result<String, ExtractError> {
    match ContentKind::for_path(path) {
        ContentKind::Text => tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ExtractError::Read {
                path: path.to_path_buf(),
                source,
            }),
        ContentKind::Pdf => Ok(extract_pdf(path.to_path_buf()).await),
    }
}

async fn extract_pdf(path: PathBuf) -> String {
    let shown = path.display().to_string();
    match tokio::task::spawn_blocking(move || pdf_text(&path)).await {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            warn!(path = %shown, error = %e, "PDF extraction failed, indexing empty text");
            String::new()
        }
        Err(e) => {
            warn!(path = %shown, error = %e, "PDF extraction task failed");
            String::new()
        }
    }
}

fn pdf_text(path: &Path) -> Result<String, lopdf::Error> {
    let doc = Document::load(path)?;
    let mut text = String::new();

    for page in doc.get_pages().into_keys() {
        text.push_str(&doc.extract_text(&[page])?);
        text.push('\n');
    }

    debug!(path = %path.display(), chars = text.len(), "extracted PDF text");
    Ok(text)
}
