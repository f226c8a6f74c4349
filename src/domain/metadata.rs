//! Header comment metadata and the copyable code region of pattern source.
//!
//! Headers are `;;`-prefixed lines (`;; Title: ...`, `;; Description: ...`,
//! `;; Tags: a, b`) found anywhere in the source; the first match wins per
//! field. `;; PATTERN START` / `;; PATTERN END` marker lines scope the code
//! that is embedded and offered for copying.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

pub const DEFAULT_TITLE: &str = "Untitled Pattern";

static TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m);;[ \t]*Title:[ \t]*(.+)$").expect("valid title pattern"));
static DESCRIPTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m);;[ \t]*Description:[ \t]*(.+)$").expect("valid description pattern")
});
static TAGS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m);;[ \t]*Tags:[ \t]*(.+)$").expect("valid tags pattern"));
static START_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^;;[ \t]*PATTERN START.*$").expect("valid start marker"));
static END_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^;;[ \t]*PATTERN END.*$").expect("valid end marker"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub title: String,
    pub description: String,
    pub tags: BTreeSet<String>,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            description: String::new(),
            tags: BTreeSet::new(),
        }
    }
}

impl Metadata {
    pub fn tags_joined(&self) -> String {
        self.tags.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
    }
}

/// Metadata plus the effective (embeddable, copyable) code of a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternSource {
    pub metadata: Metadata,
    pub code: String,
}

impl PatternSource {
    pub fn extract(source: &str) -> Self {
        Self {
            metadata: extract_metadata(source),
            code: effective_code(source),
        }
    }
}

pub fn extract_metadata(source: &str) -> Metadata {
    let mut metadata = Metadata::default();

    if let Some(title) = first_capture(&TITLE_RE, source) {
        metadata.title = title;
    }
    if let Some(description) = first_capture(&DESCRIPTION_RE, source) {
        metadata.description = description;
    }
    if let Some(tags) = first_capture(&TAGS_RE, source) {
        metadata.tags = tags
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect();
    }

    metadata
}

/// Text strictly between the marker lines when both exist, else the whole
/// source.
pub fn effective_code(source: &str) -> String {
    let Some(start) = START_RE.find(source) else {
        return source.to_string();
    };
    let Some(end) = END_RE.find_at(source, start.end()) else {
        return source.to_string();
    };

    trim_blank_lines(&source[start.end()..end.start()]).to_string()
}

fn first_capture(re: &Regex, source: &str) -> Option<String> {
    re.captures(source)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|value| !value.is_empty())
}

fn trim_blank_lines(text: &str) -> &str {
    let lines: Vec<&str> = text.split('\n').collect();
    let Some(first) = lines.iter().position(|line| !line.trim().is_empty()) else {
        return "";
    };
    let last = lines
        .iter()
        .rposition(|line| !line.trim().is_empty())
        .unwrap_or(first);

    let start: usize = lines[..first].iter().map(|line| line.len() + 1).sum();
    let end: usize = start
        + lines[first..=last]
            .iter()
            .map(|line| line.len() + 1)
            .sum::<usize>()
        - 1;
    &text[start..end]
}
