//! Block classification driven by a table of pattern block types.
//!
//! Each pattern block type is a row in [`PatternTypeTable`]: a tag, the
//! artifact dimensions, whether its source is retained for the page's copy /
//! open actions, and the container layout used to present it. Adding a visual
//! variant is a new row plus a layout, never a new branch here.

use std::{fmt, str::FromStr};

use super::{document::RawBlock, error::DomainError};

/// Container layout used when presenting a pattern block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternLayout {
    /// Code, preview and an action row.
    Example,
    /// Preview only, inline.
    Thumbnail,
    /// Compact side-by-side code and preview.
    Small,
}

impl PatternLayout {
    pub fn as_str(self) -> &'static str {
        match self {
            PatternLayout::Example => "example",
            PatternLayout::Thumbnail => "thumbnail",
            PatternLayout::Small => "small",
        }
    }
}

impl fmt::Display for PatternLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PatternLayout {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "example" => Ok(PatternLayout::Example),
            "thumbnail" => Ok(PatternLayout::Thumbnail),
            "small" => Ok(PatternLayout::Small),
            other => Err(DomainError::validation(format!(
                "unknown pattern layout `{other}`"
            ))),
        }
    }
}

/// One row of the pattern type table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternBlockType {
    pub tag: String,
    pub width: u32,
    pub height: u32,
    pub retain_source: bool,
    pub layout: PatternLayout,
}

impl PatternBlockType {
    pub fn new(
        tag: impl Into<String>,
        (width, height): (u32, u32),
        retain_source: bool,
        layout: PatternLayout,
    ) -> Self {
        Self {
            tag: tag.into(),
            width,
            height,
            retain_source,
            layout,
        }
    }
}

/// Lookup table from first-line tag to pattern block type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternTypeTable {
    entries: Vec<PatternBlockType>,
}

impl Default for PatternTypeTable {
    /// The reference configuration: full examples, thumbnails and small cards.
    fn default() -> Self {
        Self {
            entries: vec![
                PatternBlockType::new(":patterning", (400, 400), true, PatternLayout::Example),
                PatternBlockType::new(
                    ":patterning-thumbnail",
                    (200, 200),
                    false,
                    PatternLayout::Thumbnail,
                ),
                PatternBlockType::new(":patterning-small", (200, 200), true, PatternLayout::Small),
            ],
        }
    }
}

impl PatternTypeTable {
    /// Register an additional pattern block type.
    pub fn register(&mut self, entry: PatternBlockType) -> Result<(), DomainError> {
        let tag = entry.tag.trim();
        if tag.is_empty() || tag != entry.tag || tag.contains(char::is_whitespace) {
            return Err(DomainError::validation(format!(
                "pattern tag `{}` must be a single non-empty token",
                entry.tag
            )));
        }
        if entry.width == 0 || entry.height == 0 {
            return Err(DomainError::validation(format!(
                "pattern tag `{tag}` must have non-zero dimensions"
            )));
        }
        if self.get(tag).is_some() {
            return Err(DomainError::validation(format!(
                "pattern tag `{tag}` is already registered"
            )));
        }
        self.entries.push(entry);
        Ok(())
    }

    pub fn with(mut self, entry: PatternBlockType) -> Result<Self, DomainError> {
        self.register(entry)?;
        Ok(self)
    }

    pub fn get(&self, tag: &str) -> Option<&PatternBlockType> {
        self.entries.iter().find(|entry| entry.tag == tag)
    }

    /// Classify a raw block by its first line.
    pub fn classify(&self, block: &RawBlock) -> Block {
        let mut lines = block.text.split('\n');
        let first = lines.next().unwrap_or_default().trim();

        match self.get(first) {
            Some(entry) => {
                let rest: Vec<&str> = lines.collect();
                Block {
                    sequence_index: block.sequence_index,
                    kind: BlockKind::Pattern {
                        tag: entry.tag.clone(),
                    },
                    raw_text: block.text.clone(),
                    body: rest.join("\n").trim().to_string(),
                }
            }
            None => Block {
                sequence_index: block.sequence_index,
                kind: BlockKind::Prose,
                raw_text: block.text.clone(),
                body: block.text.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind {
    Prose,
    Pattern { tag: String },
}

/// Classified block. `body` excludes the tag line for pattern blocks and is
/// the whole block text for prose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub sequence_index: usize,
    pub kind: BlockKind,
    pub raw_text: String,
    pub body: String,
}

impl Block {
    pub fn pattern_tag(&self) -> Option<&str> {
        match &self.kind {
            BlockKind::Pattern { tag } => Some(tag.as_str()),
            BlockKind::Prose => None,
        }
    }

    pub fn is_pattern(&self) -> bool {
        self.pattern_tag().is_some()
    }
}
