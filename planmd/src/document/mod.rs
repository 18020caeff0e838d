use serde::{Deserialize, Serialize};

/// A single document-level unit, as handed over by the editing surface.
/// A structured document is a `Vec<Block>`; its order is the section order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Heading {
        level: usize,
        text: String,
    },
    Paragraph {
        content: Vec<InlineRun>,
    },
    BulletList {
        items: Vec<ListItem>,
    },
    OrderedList {
        items: Vec<ListItem>,
    },
    CodeBlock {
        text: String,
    },
    Blockquote {
        content: Vec<InlineRun>,
    },
    Divider,
    /// A block kind the Markdown mirror cannot express (tables, images, ...).
    /// Kept so the editor's snapshot survives, dropped on serialize.
    Unsupported {
        kind: String,
    },
}

impl Block {
    pub fn heading(level: usize, text: impl Into<String>) -> Self {
        Block::Heading {
            level,
            text: text.into(),
        }
    }

    /// A paragraph holding one unmarked run.
    pub fn paragraph(text: impl Into<String>) -> Self {
        Block::Paragraph {
            content: vec![InlineRun::plain(text)],
        }
    }

    pub fn bullet_list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Block::BulletList {
            items: items.into_iter().map(ListItem::text).collect(),
        }
    }

    pub fn ordered_list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Block::OrderedList {
            items: items.into_iter().map(ListItem::text).collect(),
        }
    }

    pub fn code_block(text: impl Into<String>) -> Self {
        Block::CodeBlock { text: text.into() }
    }

    pub fn blockquote(text: impl Into<String>) -> Self {
        Block::Blockquote {
            content: vec![InlineRun::plain(text)],
        }
    }

    /// Stable lowercase name of the block kind.
    pub fn kind_name(&self) -> &str {
        match self {
            Block::Heading { .. } => "heading",
            Block::Paragraph { .. } => "paragraph",
            Block::BulletList { .. } => "bullet_list",
            Block::OrderedList { .. } => "ordered_list",
            Block::CodeBlock { .. } => "code_block",
            Block::Blockquote { .. } => "blockquote",
            Block::Divider => "divider",
            Block::Unsupported { kind } => kind,
        }
    }
}

/// Emphasis marks applied to an inline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Marks {
    pub bold: bool,
    pub italic: bool,
    pub code: bool,
}

impl Marks {
    pub const NONE: Marks = Marks {
        bold: false,
        italic: false,
        code: false,
    };

    pub fn is_empty(&self) -> bool {
        *self == Marks::NONE
    }
}

/// A run of text sharing one set of marks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineRun {
    pub text: String,
    #[serde(default)]
    pub marks: Marks,
}

impl InlineRun {
    pub fn plain(text: impl Into<String>) -> Self {
        InlineRun {
            text: text.into(),
            marks: Marks::NONE,
        }
    }

    pub fn marked(text: impl Into<String>, marks: Marks) -> Self {
        InlineRun {
            text: text.into(),
            marks,
        }
    }
}

/// One list entry. The editor may nest blocks under an item; only the
/// first run of `content` reaches the Markdown mirror.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItem {
    pub content: Vec<InlineRun>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Block>,
}

impl ListItem {
    pub fn text(text: impl Into<String>) -> Self {
        ListItem {
            content: vec![InlineRun::plain(text)],
            children: Vec::new(),
        }
    }

    pub fn first_text(&self) -> &str {
        first_text(&self.content)
    }
}

/// Text of the first inline run, or `""` when there is none.
pub fn first_text(runs: &[InlineRun]) -> &str {
    runs.first().map(|run| run.text.as_str()).unwrap_or("")
}
