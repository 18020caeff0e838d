use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::SessionError;

pub const DEFAULT_EXPORT_FILENAME: &str = "business-plan.md";
pub const MARKDOWN_MEDIA_TYPE: &str = "text/markdown";

/// The downloadable form of the current document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub filename: String,
    pub media_type: &'static str,
    pub contents: String,
}

impl ExportArtifact {
    pub fn markdown(filename: impl Into<String>, contents: impl Into<String>) -> Self {
        ExportArtifact {
            filename: filename.into(),
            media_type: MARKDOWN_MEDIA_TYPE,
            contents: contents.into(),
        }
    }

    /// Write the artifact into `dir`, returning the written path.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, SessionError> {
        let path = dir.join(&self.filename);
        std::fs::write(&path, &self.contents).map_err(|source| SessionError::Export {
            path: path.clone(),
            source,
        })?;
        info!(path = %path.display(), bytes = self.contents.len(), "exported document");
        Ok(path)
    }
}
