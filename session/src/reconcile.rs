use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::time::Timestamp;

/// Per-section state, keyed by the section's title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionMeta {
    pub id: String,
    pub edited_at: Timestamp,
    pub locked: bool,
}

impl SectionMeta {
    pub fn new(id: impl Into<String>, edited_at: Timestamp) -> Self {
        SectionMeta {
            id: id.into(),
            edited_at,
            locked: false,
        }
    }
}

/// Who produced the document change being reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOrigin {
    /// Typed through the editing surface. Bumps edit times.
    User,
    /// Loaded from outside, e.g. a rewrite. Edit times are left alone so
    /// the rewrite does not lock its own sections.
    External,
}

/// Merge previous section metadata with a freshly extracted title list.
///
/// One entry per distinct title, in first-occurrence order. Existing
/// entries carry forward (with `edited_at = now` for user edits), new titles
/// get a fresh unlocked entry stamped `now`. Entries whose title is gone are
/// not carried into the result.
pub fn reconcile(
    previous: &[SectionMeta],
    titles: &[String],
    now: Timestamp,
    origin: EditOrigin,
) -> Vec<SectionMeta> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut next = Vec::with_capacity(titles.len());

    for title in titles {
        if !seen.insert(title.as_str()) {
            continue;
        }
        let meta = match previous.iter().find(|meta| meta.id == *title) {
            Some(existing) => {
                let mut meta = existing.clone();
                if origin == EditOrigin::User {
                    meta.edited_at = now;
                }
                meta
            }
            None => SectionMeta::new(title.clone(), now),
        };
        next.push(meta);
    }

    let dropped: Vec<&str> = previous
        .iter()
        .map(|meta| meta.id.as_str())
        .filter(|id| !seen.contains(id))
        .collect();
    if !dropped.is_empty() {
        warn!(?dropped, "section metadata dropped for headings no longer present");
    }
    debug!(sections = next.len(), ?origin, "reconciled sections");

    next
}
