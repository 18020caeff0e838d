pub mod diagnostic;

use std::collections::HashMap;
use std::ops::Range;

pub use diagnostic::SectionWarning;

const SECTION_PREFIX: &str = "# ";

/// A top-level `# ` heading found in raw Markdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionHeading {
    /// Heading text after `# `, trimmed. This is the section's identity.
    pub title: String,
    /// 1-based line number.
    pub line: usize,
    /// Byte span of the heading line (without its newline).
    pub span: Range<usize>,
}

/// A section title together with the Markdown that follows it up to the
/// next section heading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionBody {
    pub title: String,
    pub body: String,
}

/// Ordered section titles of a Markdown document.
///
/// Scans raw lines, not parsed blocks: only lines starting with exactly
/// `# ` count, deeper headings do not. Duplicates are kept.
pub fn extract(markdown: &str) -> Vec<String> {
    headings(markdown).into_iter().map(|h| h.title).collect()
}

/// Like [`extract`], with line and span information for each heading.
pub fn headings(markdown: &str) -> Vec<SectionHeading> {
    let mut found = Vec::new();
    let mut offset = 0;

    for (index, raw) in markdown.split_inclusive('\n').enumerate() {
        let line = raw.trim_end_matches(['\n', '\r']);
        if let Some(title) = line.strip_prefix(SECTION_PREFIX) {
            found.push(SectionHeading {
                title: title.trim().to_string(),
                line: index + 1,
                span: offset..offset + line.len(),
            });
        }
        offset += raw.len();
    }

    found
}

/// Split a document into its sections. Text before the first section
/// heading belongs to no section and is skipped.
pub fn split_sections(markdown: &str) -> Vec<SectionBody> {
    let mut sections: Vec<(String, Vec<&str>)> = Vec::new();

    for line in markdown.lines() {
        if let Some(title) = line.strip_prefix(SECTION_PREFIX) {
            sections.push((title.trim().to_string(), Vec::new()));
        } else if let Some((_, body)) = sections.last_mut() {
            body.push(line);
        }
    }

    sections
        .into_iter()
        .map(|(title, body)| SectionBody {
            title,
            body: body.join("\n").trim().to_string(),
        })
        .collect()
}

/// Report every repeated section title. Sections are identified by title
/// alone, so repeats cannot be told apart downstream.
pub fn duplicate_sections(markdown: &str, file_id: usize) -> Vec<SectionWarning> {
    let mut first_seen: HashMap<String, usize> = HashMap::new();
    let mut warnings = Vec::new();

    for heading in headings(markdown) {
        match first_seen.get(&heading.title) {
            Some(&first_line) => warnings.push(SectionWarning::duplicate(
                &heading.title,
                heading.span,
                first_line,
                file_id,
            )),
            None => {
                first_seen.insert(heading.title, heading.line);
            }
        }
    }

    warnings
}
