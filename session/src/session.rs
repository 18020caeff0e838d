use planmd::section::{SectionBody, split_sections};
use planmd::{Block, parse, serialize};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::catalog::SectionCatalog;
use crate::collaborator::{
    CollaboratorError, Finding, RewriteCollaborator, RewriteReply, RewriteRequest,
};
use crate::config::SessionConfig;
use crate::export::ExportArtifact;
use crate::lock::LockPolicy;
use crate::reconcile::{EditOrigin, SectionMeta, reconcile};
use crate::time::Timestamp;

/// One consistent view of the document: the blocks, their Markdown mirror,
/// and per-section state. Always replaced as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DocumentSnapshot {
    pub markdown: String,
    pub blocks: Vec<Block>,
    pub sections: Vec<SectionMeta>,
    pub last_updated: Timestamp,
}

/// Whether an operation replaced the snapshot. The editing surface uses
/// this to decide whether to refresh and restore its selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Applied,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteOutcome {
    Applied {
        change: Change,
        /// Locked sections whose content the collaborator changed anyway.
        touched_locked: Vec<String>,
    },
    /// The collaborator failed; the session is exactly as before.
    Failed { status: String },
}

/// Owns the document and routes every change through the converter,
/// the section extractor and the reconciler.
#[derive(Debug, Clone)]
pub struct Session {
    snapshot: DocumentSnapshot,
    lock_policy: LockPolicy,
    catalog: SectionCatalog,
    export_filename: String,
    findings: Vec<Finding>,
    next_question: Option<String>,
    status: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Session::new(&SessionConfig::default())
    }
}

impl Session {
    pub fn new(config: &SessionConfig) -> Self {
        Session {
            snapshot: DocumentSnapshot::default(),
            lock_policy: config.lock_policy(),
            catalog: config.section_catalog(),
            export_filename: config.export_filename.clone(),
            findings: Vec::new(),
            next_question: None,
            status: None,
        }
    }

    pub fn snapshot(&self) -> &DocumentSnapshot {
        &self.snapshot
    }

    pub fn markdown(&self) -> &str {
        &self.snapshot.markdown
    }

    pub fn blocks(&self) -> &[Block] {
        &self.snapshot.blocks
    }

    pub fn sections(&self) -> &[SectionMeta] {
        &self.snapshot.sections
    }

    pub fn last_updated(&self) -> Timestamp {
        self.snapshot.last_updated
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn next_question(&self) -> Option<&str> {
        self.next_question.as_deref()
    }

    /// Human-readable result of the last rewrite, if any.
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Replace the document with Markdown from outside the editor.
    ///
    /// Skipped when the normalized form equals the current mirror. Section
    /// edit times are not bumped.
    pub fn load_external(&mut self, markdown: &str, now: Timestamp) -> Change {
        let blocks = parse(markdown);
        let normalized = serialize(&blocks);
        if normalized == self.snapshot.markdown {
            debug!("external markdown matches current document, skipping");
            return Change::Unchanged;
        }

        self.replace(normalized, blocks, now, EditOrigin::External);
        info!(
            sections = self.snapshot.sections.len(),
            "loaded external markdown"
        );
        Change::Applied
    }

    /// Take a snapshot emitted by the editing surface.
    ///
    /// A no-op, including the timestamp, when the blocks serialize to the
    /// current mirror.
    pub fn apply_user_edit(&mut self, blocks: Vec<Block>, now: Timestamp) -> Change {
        let markdown = serialize(&blocks);
        if markdown == self.snapshot.markdown {
            return Change::Unchanged;
        }

        self.replace(markdown, blocks, now, EditOrigin::User);
        debug!(
            sections = self.snapshot.sections.len(),
            "applied user edit"
        );
        Change::Applied
    }

    fn replace(&mut self, markdown: String, blocks: Vec<Block>, now: Timestamp, origin: EditOrigin) {
        let titles = planmd::extract(&markdown);
        let sections = reconcile(&self.snapshot.sections, &titles, now, origin);
        self.snapshot = DocumentSnapshot {
            markdown,
            blocks,
            sections,
            last_updated: now,
        };
    }

    /// Titles the collaborator must not rewrite, as of `now`.
    pub fn locked_sections(&self, now: Timestamp) -> Vec<String> {
        self.lock_policy.locked_titles(&self.snapshot.sections, now)
    }

    pub fn is_locked(&self, title: &str, now: Timestamp) -> bool {
        self.snapshot
            .sections
            .iter()
            .find(|meta| meta.id == title)
            .is_some_and(|meta| self.lock_policy.is_locked(meta, now))
    }

    /// Set or clear the explicit lock flag. Returns false if no section has
    /// that title.
    pub fn set_locked(&mut self, title: &str, locked: bool) -> bool {
        match self.snapshot.sections.iter_mut().find(|meta| meta.id == title) {
            Some(meta) => {
                meta.locked = locked;
                true
            }
            None => false,
        }
    }

    /// Append an empty `# title` section that is immediately open to
    /// drafting. Unchanged if the title already exists.
    pub fn scaffold_section(&mut self, title: &str, now: Timestamp) -> Change {
        let title = title.trim();
        if self.snapshot.sections.iter().any(|meta| meta.id == title) {
            return Change::Unchanged;
        }

        let mut blocks = self.snapshot.blocks.clone();
        blocks.push(Block::heading(1, title));
        let markdown = serialize(&blocks);
        self.replace(markdown, blocks, now, EditOrigin::External);

        if let Some(meta) = self.snapshot.sections.iter_mut().find(|meta| meta.id == title) {
            meta.edited_at = Timestamp::ZERO;
        }
        info!(title, "scaffolded section");
        Change::Applied
    }

    /// The first catalog section the document does not have yet.
    pub fn next_suggested_section(&self) -> Option<&str> {
        let present: Vec<String> = self
            .snapshot
            .sections
            .iter()
            .map(|meta| meta.id.clone())
            .collect();
        self.catalog.next_suggested(&present)
    }

    /// Snapshot what a rewrite needs. Locks are evaluated now, not when the
    /// reply arrives.
    pub fn begin_rewrite(&self, instruction: &str, now: Timestamp) -> RewriteRequest {
        RewriteRequest {
            markdown: self.snapshot.markdown.clone(),
            instruction: instruction.to_string(),
            locked_sections: self.locked_sections(now),
        }
    }

    /// Apply the collaborator's answer to `request` on top of the current
    /// state, whatever happened since the request was made.
    ///
    /// Failures leave the document, findings and next question as they
    /// were and come back as a status message.
    pub fn complete_rewrite(
        &mut self,
        request: &RewriteRequest,
        result: Result<RewriteReply, CollaboratorError>,
        now: Timestamp,
    ) -> RewriteOutcome {
        let reply = match result {
            Ok(reply) => reply,
            Err(err) => {
                warn!(error = %err, "rewrite failed, document left unchanged");
                let status = format!("The assistant could not update the plan: {}", err);
                self.status = Some(status.clone());
                return RewriteOutcome::Failed { status };
            }
        };

        let touched_locked = touched_locked_sections(request, &reply.markdown);
        if !touched_locked.is_empty() {
            warn!(sections = ?touched_locked, "rewrite changed locked sections");
        }

        let change = self.load_external(&reply.markdown, now);
        self.findings = reply.findings;
        self.next_question = Some(reply.next_question).filter(|q| !q.trim().is_empty());
        self.status = Some(match change {
            Change::Applied => "Plan updated.".to_string(),
            Change::Unchanged => "No changes to the plan.".to_string(),
        });

        RewriteOutcome::Applied {
            change,
            touched_locked,
        }
    }

    /// Run a whole rewrite round trip against `collaborator`.
    pub fn request_rewrite(
        &mut self,
        collaborator: &dyn RewriteCollaborator,
        instruction: &str,
        now: Timestamp,
    ) -> RewriteOutcome {
        let request = self.begin_rewrite(instruction, now);
        info!(
            locked = request.locked_sections.len(),
            "requesting rewrite"
        );
        let result = collaborator.rewrite(&request);
        self.complete_rewrite(&request, result, now)
    }

    pub fn export(&self) -> ExportArtifact {
        ExportArtifact::markdown(self.export_filename.clone(), self.snapshot.markdown.clone())
    }
}

/// Locked sections whose body differs between the request and the reply,
/// or which the reply dropped.
fn touched_locked_sections(request: &RewriteRequest, rewritten: &str) -> Vec<String> {
    if request.locked_sections.is_empty() {
        return Vec::new();
    }
    let before = split_sections(&request.markdown);
    let after = split_sections(rewritten);

    request
        .locked_sections
        .iter()
        .filter(|title| body_of(&before, title) != body_of(&after, title))
        .cloned()
        .collect()
}

fn body_of(sections: &[SectionBody], title: &str) -> Option<String> {
    sections
        .iter()
        .find(|section| section.title == title)
        .map(|section| normalize_body(&section.body))
}

/// Compare bodies the way the mirror would store them.
fn normalize_body(body: &str) -> String {
    serialize(&parse(body))
}
