//! Document loading seam.
//!
//! Text extraction for office formats lives behind this trait; the pipeline
//! ships a plain-text loader for `.txt` and `.md` files. The loader contract is
//! a pure path-to-text mapping so richer extractors (PDF, Word, slides) can
//! plug in without touching the ingestion service.

use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while extracting text from a document.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Filesystem access failed.
    #[error("failed to read document: {0}")]
    Io(#[from] std::io::Error),
    /// Loader was asked for an extension it does not handle.
    #[error("unsupported document extension: {0}")]
    Unsupported(String),
}

/// Interface implemented by per-format text extractors.
pub trait DocumentLoader: Send + Sync {
    /// Whether the loader can extract text for a dot-prefixed lowercase extension.
    fn supports(&self, ext: &str) -> bool;

    /// Extract the full text of the document at `path`.
    fn load(&self, path: &Path) -> Result<String, LoadError>;
}

/// Loader for plain-text formats, decoding bytes lossily like the rest of the
/// pipeline tolerates imperfect input.
pub struct PlainTextLoader;

const PLAIN_TEXT_EXTENSIONS: &[&str] = &[".txt", ".md"];

impl DocumentLoader for PlainTextLoader {
    fn supports(&self, ext: &str) -> bool {
        PLAIN_TEXT_EXTENSIONS.contains(&ext)
    }

    fn load(&self, path: &Path) -> Result<String, LoadError> {
        let ext = extension_of(path);
        if !self.supports(&ext) {
            return Err(LoadError::Unsupported(ext));
        }
        let bytes = std::fs::read(path)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Build the default loader for the pipeline.
pub fn default_loader() -> Arc<dyn DocumentLoader> {
    Arc::new(PlainTextLoader)
}

/// Dot-prefixed lowercase extension of a path, empty when absent.
pub(crate) fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|value| value.to_str())
        .map(|value| format!(".{}", value.to_lowercase()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn plain_text_loader_supports_txt_and_md() {
        let loader = PlainTextLoader;
        assert!(loader.supports(".txt"));
        assert!(loader.supports(".md"));
        assert!(!loader.supports(".pdf"));
    }

    #[test]
    fn extension_is_lowercased_and_dot_prefixed() {
        assert_eq!(extension_of(&PathBuf::from("a/b/Nota.TXT")), ".txt");
        assert_eq!(extension_of(&PathBuf::from("a/b/sin_extension")), "");
    }

    #[test]
    fn unsupported_extension_is_reported() {
        let loader = PlainTextLoader;
        let error = loader
            .load(&PathBuf::from("docs/presentacion.pptx"))
            .expect_err("unsupported");
        assert!(matches!(error, LoadError::Unsupported(ext) if ext == ".pptx"));
    }
}
