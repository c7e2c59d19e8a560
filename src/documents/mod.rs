
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors raised while reading a directory of PDF files
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Document directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid PDF {}: {message}", path.display())]
    InvalidPdf { path: PathBuf, message: String },
}

/// What to do when one file in the directory cannot be read as a PDF
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadPolicy {
    /// Log the file, record it in [`LoadedDocuments::skipped`] and keep going
    #[default]
    SkipInvalid,
    /// Abort the whole load on the first bad file
    FailFast,
}

/// A single page of extracted text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub text: String,
    pub source: PathBuf,
    /// 1-based page number within the source file
    pub number: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub path: PathBuf,
    pub pages: Vec<Page>,
}

/// A file that was left out of the load under [`LoadPolicy::SkipInvalid`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedDocuments {
    pub documents: Vec<Document>,
    pub skipped: Vec<SkippedFile>,
}

impl LoadedDocuments {
    /// All pages in file-then-page order
    #[inline]
    pub fn pages(&self) -> impl Iterator<Item = &Page> {
        self.documents.iter().flat_map(|doc| doc.pages.iter())
    }

    #[inline]
    pub fn page_count(&self) -> usize {
        self.documents.iter().map(|doc| doc.pages.len()).sum()
    }

    #[inline]
    pub fn into_pages(self) -> Vec<Page> {
        self.documents
            .into_iter()
            .flat_map(|doc| doc.pages)
            .collect()
    }
}

/// Load every PDF directly inside `dir`, sorted by file name
#[inline]
pub fn load_directory(dir: &Path, policy: LoadPolicy) -> Result<LoadedDocuments, LoadError> {
    let metadata = match fs::metadata(dir) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(LoadError::DirectoryNotFound(dir.to_path_buf()));
        }
        Err(source) => {
            return Err(LoadError::Io {
                path: dir.to_path_buf(),
                source,
            });
        }
    };
    if !metadata.is_dir() {
        return Err(LoadError::NotADirectory(dir.to_path_buf()));
    }

    let files = list_pdf_files(dir)?;
    debug!("Found {} PDF files in {}", files.len(), dir.display());

    let mut loaded = LoadedDocuments::default();
    for path in files {
        match load_pdf(&path) {
            Ok(document) => {
                debug!(
                    "Loaded {} ({} pages)",
                    document.path.display(),
                    document.pages.len()
                );
                loaded.documents.push(document);
            }
            Err(e) if policy == LoadPolicy::SkipInvalid => {
                warn!("Skipping {}: {}", path.display(), e);
                loaded.skipped.push(SkippedFile {
                    path,
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        }
    }

    info!(
        "Loaded {} pages from {} documents ({} skipped)",
        loaded.page_count(),
        loaded.documents.len(),
        loaded.skipped.len()
    );
    Ok(loaded)
}

fn list_pdf_files(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let io_error = |source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();
        if path.is_file() && is_pdf(&path) {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// Read one PDF into page records
#[inline]
pub fn load_pdf(path: &Path) -> Result<Document, LoadError> {
    let pdf = lopdf::Document::load(path).map_err(|e| LoadError::InvalidPdf {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let pages = pdf
        .get_pages()
        .into_keys()
        .map(|number| {
            let text = pdf.extract_text(&[number]).unwrap_or_else(|e| {
                warn!(
                    "No text extracted from page {} of {}: {}",
                    number,
                    path.display(),
                    e
                );
                String::new()
            });
            Page {
                text,
                source: path.to_path_buf(),
                number,
            }
        })
        .collect();

    Ok(Document {
        path: path.to_path_buf(),
        pages,
    })
}
