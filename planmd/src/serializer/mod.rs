use std::fmt;

use tracing::debug;

use crate::document::{Block, InlineRun, first_text};

/// Serialize a structured document to Markdown text.
///
/// Total: block kinds without a Markdown form contribute nothing. Each block
/// carries its own trailing newlines, and the joined output is trimmed.
pub fn serialize(blocks: &[Block]) -> String {
    let mut out = String::new();
    for block in blocks {
        out.push_str(&block.to_string());
    }
    debug!(blocks = blocks.len(), bytes = out.len(), "serialized document");
    out.trim().to_string()
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Block::Heading { level, text } => {
                // Level 0 has no Markdown form; the nearest one is a top-level heading.
                write!(f, "{} {}", "#".repeat((*level).max(1)), text)?;
                write!(f, "\n\n")
            }
            Block::Paragraph { content } => {
                if content.iter().all(|run| run.text.is_empty()) {
                    return writeln!(f);
                }
                for run in content {
                    write!(f, "{}", run)?;
                }
                write!(f, "\n\n")
            }
            Block::BulletList { items } => {
                for item in items {
                    writeln!(f, "- {}", item.first_text())?;
                }
                writeln!(f)
            }
            Block::OrderedList { items } => {
                for (i, item) in items.iter().enumerate() {
                    writeln!(f, "{}. {}", i + 1, item.first_text())?;
                }
                writeln!(f)
            }
            Block::CodeBlock { text } => {
                writeln!(f, "```")?;
                writeln!(f, "{}", text)?;
                write!(f, "```\n\n")
            }
            Block::Blockquote { content } => write!(f, "> {}\n\n", first_text(content)),
            Block::Divider => write!(f, "---\n\n"),
            Block::Unsupported { .. } => Ok(()),
        }
    }
}

impl fmt::Display for InlineRun {
    /// Marks wrap in a fixed order (bold, then italic, then code), whatever
    /// order the editor applied them in.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut text = self.text.clone();
        if self.marks.bold {
            text = format!("**{}**", text);
        }
        if self.marks.italic {
            text = format!("*{}*", text);
        }
        if self.marks.code {
            text = format!("`{}`", text);
        }
        write!(f, "{}", text)
    }
}
