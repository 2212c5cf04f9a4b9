//! PDF location, loading and text extraction.

use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};

/// Turns document bytes into ordered text.
pub trait TextExtractor: Send + Sync {
    /// Extract text; pages are separated by form feeds.
    fn extract(&self, name: &str, bytes: &[u8]) -> Result<String>;
}

/// [`TextExtractor`] backed by `pdf-extract`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    fn extract(&self, name: &str, bytes: &[u8]) -> Result<String> {
        // pdf-extract panics on some malformed documents
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem_by_pages(bytes)
        }));
        match result {
            Ok(Ok(pages)) => Ok(pages.join("\u{c}")),
            Ok(Err(e)) => Err(AppError::extraction(name, e)),
            Err(_) => Err(AppError::extraction(name, "malformed PDF")),
        }
    }
}

/// Extract text and reject documents without any.
pub fn extract_text(extractor: &dyn TextExtractor, name: &str, bytes: &[u8]) -> Result<String> {
    let text = extractor.extract(name, bytes)?;
    if text.trim().is_empty() {
        return Err(AppError::extraction(name, "no text could be extracted"));
    }
    log::debug!("Extracted {} chars from {}", text.len(), name);
    Ok(text)
}

/// Read a PDF from disk, enforcing the size limit.
pub async fn read_pdf(path: &Path, max_size_mb: u64) -> Result<Vec<u8>> {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::input(format!(
                "Arquivo PDF não encontrado: {}",
                path.display()
            )));
        }
        Err(e) => return Err(AppError::Io(e)),
    };
    if !metadata.is_file() {
        return Err(AppError::input(format!(
            "Caminho não é um arquivo: {}",
            path.display()
        )));
    }

    let limit = max_size_mb.saturating_mul(1024 * 1024);
    if metadata.len() > limit {
        return Err(AppError::input(format!(
            "PDF muito grande: {} ({:.1}MB, máximo {}MB)",
            path.display(),
            metadata.len() as f64 / (1024.0 * 1024.0),
            max_size_mb
        )));
    }

    Ok(tokio::fs::read(path).await?)
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// First PDF in `folder`, by file name. `Ok(None)` when there is none.
///
/// A missing folder is an input error.
pub async fn find_pdf(folder: &Path) -> Result<Option<PathBuf>> {
    let mut entries = match tokio::fs::read_dir(folder).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::input(format!(
                "Pasta não encontrada: {}",
                folder.display()
            )));
        }
        Err(e) => return Err(AppError::Io(e)),
    };

    let mut pdfs = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if is_pdf(&path) && entry.file_type().await?.is_file() {
            pdfs.push(path);
        }
    }
    pdfs.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    log::debug!("Found {} PDF(s) in {}", pdfs.len(), folder.display());
    Ok(pdfs.into_iter().next())
}
