use std::time::Duration;

use crate::reconcile::SectionMeta;
use crate::time::Timestamp;

pub const DEFAULT_LOCK_WINDOW: Duration = Duration::from_secs(120);

/// Decides which sections the rewrite collaborator should leave alone.
///
/// Locks are advisory: they are handed to the collaborator, nothing here
/// enforces them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockPolicy {
    window: Duration,
}

impl Default for LockPolicy {
    fn default() -> Self {
        LockPolicy {
            window: DEFAULT_LOCK_WINDOW,
        }
    }
}

impl LockPolicy {
    pub fn new(window: Duration) -> Self {
        LockPolicy { window }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Locked explicitly, or edited within the recency window. A zero
    /// `edited_at` never counts as recent.
    pub fn is_locked(&self, meta: &SectionMeta, now: Timestamp) -> bool {
        if meta.locked {
            return true;
        }
        !meta.edited_at.is_zero() && now.since(meta.edited_at) < self.window
    }

    pub fn locked_titles(&self, sections: &[SectionMeta], now: Timestamp) -> Vec<String> {
        sections
            .iter()
            .filter(|meta| self.is_locked(meta, now))
            .map(|meta| meta.id.clone())
            .collect()
    }
}
