use std::str::Lines;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::document::{Block, InlineRun, ListItem};

static ORDERED_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+\. ").expect("invalid ordered item regex"));

const FENCE: &str = "```";

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parse Markdown text into a structured document.
///
/// Line-oriented and total: every line lands somewhere, and anything not
/// recognised becomes a paragraph holding the raw line. Inline markup is not
/// interpreted.
pub fn parse(markdown: &str) -> Vec<Block> {
    let mut state = ParseState::new();
    let mut lines = markdown.lines();
    while let Some(line) = lines.next() {
        state.process_line(line, &mut lines);
    }
    debug!(blocks = state.blocks.len(), "parsed markdown");
    state.blocks
}

// ---------------------------------------------------------------------------
// Parse state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Bullet,
    Ordered,
}

struct ParseState {
    blocks: Vec<Block>,
    /// The list the previous line was appended to, if any. Scoped to one
    /// `parse` call.
    open_list: Option<ListKind>,
}

impl ParseState {
    fn new() -> Self {
        ParseState {
            blocks: Vec::new(),
            open_list: None,
        }
    }

    fn process_line(&mut self, line: &str, rest: &mut Lines<'_>) {
        if line.trim().is_empty() {
            self.open_list = None;
            return;
        }

        if line.starts_with('#') {
            self.open_list = None;
            self.blocks.push(parse_heading(line));
            return;
        }

        if let Some(text) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
            self.push_item(ListKind::Bullet, text);
            return;
        }

        if let Some(marker) = ORDERED_ITEM.find(line) {
            self.push_item(ListKind::Ordered, &line[marker.end()..]);
            return;
        }

        self.open_list = None;

        if let Some(text) = line.strip_prefix("> ") {
            self.blocks.push(Block::Blockquote {
                content: vec![InlineRun::plain(text)],
            });
        } else if line.starts_with(FENCE) {
            self.blocks.push(collect_code_block(rest));
        } else if line == "---" || line == "***" {
            self.blocks.push(Block::Divider);
        } else {
            self.blocks.push(Block::Paragraph {
                content: vec![InlineRun::plain(line)],
            });
        }
    }

    /// Append to the open list of the same kind, or open a new one.
    fn push_item(&mut self, kind: ListKind, text: &str) {
        let item = ListItem::text(text);
        if self.open_list == Some(kind) {
            if let Some(Block::BulletList { items } | Block::OrderedList { items }) =
                self.blocks.last_mut()
            {
                items.push(item);
                return;
            }
        }

        self.open_list = Some(kind);
        self.blocks.push(match kind {
            ListKind::Bullet => Block::BulletList { items: vec![item] },
            ListKind::Ordered => Block::OrderedList { items: vec![item] },
        });
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Level is the length of the leading `#` run, unclamped.
fn parse_heading(line: &str) -> Block {
    let rest = line.trim_start_matches('#');
    let hashes = line.len() - rest.len();
    let text = rest.strip_prefix(' ').unwrap_or(rest);
    Block::Heading {
        level: hashes,
        text: text.to_string(),
    }
}

/// Consume lines up to the closing fence. An unterminated fence closes at
/// end of input.
fn collect_code_block(rest: &mut Lines<'_>) -> Block {
    let mut body: Vec<&str> = Vec::new();
    for line in rest.by_ref() {
        if line.starts_with(FENCE) {
            break;
        }
        body.push(line);
    }
    Block::CodeBlock {
        text: body.join("\n").trim().to_string(),
    }
}
