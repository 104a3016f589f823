//! Text extraction for uploaded documents.
//!
//! [`extract_text`] turns file bytes plus a content type into plain UTF-8
//! text. [`extract_files`] applies it to a list of paths and builds the
//! [`DocumentSet`] for an upload: every file keeps its slot, and a file
//! that yields no text gets an empty string plus a warning.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use docubot_core::models::DocumentSet;
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_TEXT: &str = "text/plain";
pub const MIME_MARKDOWN: &str = "text/markdown";

/// File extensions picked up when a directory is uploaded.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "txt", "md"];

/// Why a file produced no text. Never fatal for an upload.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported content-type: {0}")]
    UnsupportedContentType(String),
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("no extractable text")]
    NoText,
    #[error("file is {size} bytes, over the {limit} byte limit")]
    TooLarge { size: u64, limit: u64 },
    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),
}

/// Content type for a path, by extension.
pub fn content_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "pdf" => Some(MIME_PDF),
        "txt" => Some(MIME_TEXT),
        "md" | "markdown" => Some(MIME_MARKDOWN),
        _ => None,
    }
}

/// Extract plain text from `bytes`.
///
/// Whitespace-only output is reported as [`ExtractError::NoText`].
pub fn extract_text(bytes: &[u8], content_type: &str) -> Result<String, ExtractError> {
    let text = match content_type {
        MIME_PDF => extract_pdf(bytes)?,
        MIME_TEXT | MIME_MARKDOWN => String::from_utf8_lossy(bytes).into_owned(),
        _ => {
            return Err(ExtractError::UnsupportedContentType(
                content_type.to_string(),
            ))
        }
    };
    if text.trim().is_empty() {
        return Err(ExtractError::NoText);
    }
    Ok(text)
}

fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    // pdf-extract panics on some malformed inputs
    match std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes)) {
        Ok(result) => result.map_err(|e| ExtractError::Pdf(e.to_string())),
        Err(_) => Err(ExtractError::Pdf("malformed PDF".to_string())),
    }
}

/// Read and extract one file, enforcing `max_bytes`.
pub fn extract_file(path: &Path, max_bytes: u64) -> Result<String, ExtractError> {
    let content_type = content_type_for(path).ok_or_else(|| {
        ExtractError::UnsupportedContentType(
            path.extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_else(|| "unknown".to_string()),
        )
    })?;
    let size = std::fs::metadata(path)?.len();
    if size > max_bytes {
        return Err(ExtractError::TooLarge {
            size,
            limit: max_bytes,
        });
    }
    let bytes = std::fs::read(path)?;
    extract_text(&bytes, content_type)
}

/// The result of extracting an upload batch.
#[derive(Debug, Default)]
pub struct Extracted {
    pub documents: DocumentSet,
    /// One user-facing message per file that yielded no text.
    pub warnings: Vec<String>,
}

/// Expand directories and check that every path exists.
///
/// Directories contribute their supported files in sorted order; explicit
/// file paths are kept as given, whatever their extension.
pub fn resolve_paths(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().is_file())
                .map(|entry| entry.into_path())
                .filter(|p| {
                    p.extension()
                        .and_then(|e| e.to_str())
                        .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
                        .unwrap_or(false)
                })
                .collect();
            found.sort();
            debug!(dir = %path.display(), files = found.len(), "expanded directory");
            files.extend(found);
        } else if path.is_file() {
            files.push(path.clone());
        } else {
            bail!("No such file or directory: {}", path.display());
        }
    }
    Ok(files)
}

/// Extract every file in `paths` into a new document set.
pub fn extract_files(paths: &[PathBuf], max_bytes: u64) -> Result<Extracted> {
    let mut extracted = Extracted::default();
    for path in resolve_paths(paths)? {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        match extract_file(&path, max_bytes) {
            Ok(text) => {
                debug!(file = %name, chars = text.len(), "extracted text");
                extracted.documents.push(name, text);
            }
            Err(e) => {
                warn!(file = %name, error = %e, "extraction failed");
                extracted
                    .warnings
                    .push(format!("Could not extract text from {} ({})", name, e));
                extracted.documents.push(name, String::new());
            }
        }
    }
    Ok(extracted)
}
