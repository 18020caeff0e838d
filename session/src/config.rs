use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::catalog::{BUSINESS_PLAN_SECTIONS, SectionCatalog};
use crate::error::SessionError;
use crate::export::DEFAULT_EXPORT_FILENAME;
use crate::lock::{DEFAULT_LOCK_WINDOW, LockPolicy};

/// Session settings, read from TOML. Missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// How long a user edit keeps its section locked against rewrites.
    pub lock_window_secs: u64,
    /// File name offered for the exported document.
    pub export_filename: String,
    /// Expected section titles, in suggested writing order.
    pub catalog: Vec<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            lock_window_secs: DEFAULT_LOCK_WINDOW.as_secs(),
            export_filename: DEFAULT_EXPORT_FILENAME.to_string(),
            catalog: BUSINESS_PLAN_SECTIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl SessionConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, SessionError> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: &Path) -> Result<Self, SessionError> {
        let source = std::fs::read_to_string(path).map_err(|source| SessionError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    pub fn lock_policy(&self) -> LockPolicy {
        LockPolicy::new(Duration::from_secs(self.lock_window_secs))
    }

    pub fn section_catalog(&self) -> SectionCatalog {
        SectionCatalog::new(self.catalog.iter().cloned())
    }
}
