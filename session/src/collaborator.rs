use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingKind {
    Weakness,
    Missing,
    Verification,
}

/// A side remark returned with a rewrite: something weak, missing, or in
/// need of checking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub kind: FindingKind,
    pub text: String,
}

/// What the collaborator is asked to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteRequest {
    pub markdown: String,
    pub instruction: String,
    /// Titles of sections that must come back unchanged.
    pub locked_sections: Vec<String>,
}

/// A successful rewrite: the full replacement document plus side channels.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RewriteReply {
    pub markdown: String,
    #[serde(default)]
    pub findings: Vec<Finding>,
    #[serde(default)]
    pub next_question: String,
}

#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
    /// The request never reached the collaborator, or the reply never came back.
    #[error("transport error: {0}")]
    Transport(String),

    /// The collaborator answered with a failure.
    #[error("remote service error: {0}")]
    Remote(String),

    /// The reply could not be read as a rewrite at all.
    #[error("malformed reply: {0}")]
    MalformedReply(String),
}

/// The out-of-process rewrite call. Implementations own prompt building,
/// transport and timeouts.
pub trait RewriteCollaborator {
    fn rewrite(&self, request: &RewriteRequest) -> Result<RewriteReply, CollaboratorError>;
}

impl<F> RewriteCollaborator for F
where
    F: Fn(&RewriteRequest) -> Result<RewriteReply, CollaboratorError>,
{
    fn rewrite(&self, request: &RewriteRequest) -> Result<RewriteReply, CollaboratorError> {
        self(request)
    }
}

#[derive(Deserialize)]
struct WireReply {
    markdown: String,
    #[serde(default)]
    findings: Value,
    #[serde(default)]
    next_question: Option<String>,
}

/// Decode a JSON reply. The document is required; a findings payload of
/// the wrong shape degrades to no findings instead of failing the reply.
pub fn decode_reply(raw: &[u8]) -> Result<RewriteReply, CollaboratorError> {
    let wire: WireReply = serde_json::from_slice(raw)
        .map_err(|e| CollaboratorError::MalformedReply(e.to_string()))?;
    Ok(RewriteReply {
        markdown: wire.markdown,
        findings: findings_from_value(&wire.findings),
        next_question: wire.next_question.unwrap_or_default(),
    })
}

/// Leniently parse a findings list from text, tolerating a surrounding
/// code fence.
pub fn parse_findings(raw: &str) -> Vec<Finding> {
    let body = strip_code_fence(raw.trim());
    match serde_json::from_str::<Value>(body) {
        Ok(value) => findings_from_value(&value),
        Err(e) => {
            debug!(error = %e, "findings payload is not JSON");
            Vec::new()
        }
    }
}

/// Anything other than a list of well-formed findings yields no findings.
pub fn findings_from_value(value: &Value) -> Vec<Finding> {
    if value.is_null() {
        return Vec::new();
    }
    match Vec::<Finding>::deserialize(value) {
        Ok(findings) => findings,
        Err(e) => {
            debug!(error = %e, "findings payload has unexpected shape");
            Vec::new()
        }
    }
}

fn strip_code_fence(raw: &str) -> &str {
    let Some(rest) = raw.strip_prefix("```") else {
        return raw;
    };
    // Drop the info string (e.g. `json`) on the opening line.
    let rest = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}
