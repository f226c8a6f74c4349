//! Ordered re-assembly of per-block fragments into one document body.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::domain::{document::Envelope, error::DomainError};

/// Page shape for the assembled document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageLayout {
    #[default]
    Article,
    /// Every fragment becomes its own `<section>` slide.
    Deck,
}

impl PageLayout {
    pub fn as_str(self) -> &'static str {
        match self {
            PageLayout::Article => "article",
            PageLayout::Deck => "deck",
        }
    }
}

impl fmt::Display for PageLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PageLayout {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "article" => Ok(PageLayout::Article),
            "deck" => Ok(PageLayout::Deck),
            other => Err(DomainError::validation(format!(
                "unknown page layout `{other}` (expected `article` or `deck`)"
            ))),
        }
    }
}

/// Markup produced for one block, keyed by its position in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub sequence_index: usize,
    pub html: String,
}

impl Fragment {
    pub fn new(sequence_index: usize, html: impl Into<String>) -> Self {
        Self {
            sequence_index,
            html: html.into(),
        }
    }
}

/// Join fragments in `sequence_index` order and re-apply the envelope.
pub fn assemble(
    mut fragments: Vec<Fragment>,
    envelope: Option<&Envelope>,
    layout: PageLayout,
) -> String {
    fragments.sort_by_key(|fragment| fragment.sequence_index);

    let body = fragments
        .iter()
        .map(|fragment| match layout {
            PageLayout::Article => fragment.html.trim_end().to_string(),
            PageLayout::Deck => format!("<section>\n{}\n</section>", fragment.html.trim_end()),
        })
        .collect::<Vec<_>>()
        .join("\n");

    match envelope {
        Some(envelope) => envelope.wrap(&body),
        None => body,
    }
}

/// Title from a leading `# ` heading on the first line, else `default`.
pub fn page_title<'a>(raw: &'a str, default: &'a str) -> &'a str {
    raw.lines()
        .next()
        .and_then(|line| line.strip_prefix("# "))
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_by_sequence_index() {
        let fragments = vec![
            Fragment::new(2, "<p>c</p>\n"),
            Fragment::new(0, "<p>a</p>\n"),
            Fragment::new(1, "<div>b</div>"),
        ];
        assert_eq!(
            assemble(fragments, None, PageLayout::Article),
            "<p>a</p>\n<div>b</div>\n<p>c</p>"
        );
    }

    #[test]
    fn rewraps_envelope_verbatim() {
        let envelope = Envelope {
            prefix: "<div class=\"tutorial\">".into(),
            suffix: "</div>".into(),
        };
        let body = assemble(
            vec![Fragment::new(0, "<p>x</p>")],
            Some(&envelope),
            PageLayout::Article,
        );
        assert_eq!(body, "<div class=\"tutorial\">\n<p>x</p>\n</div>");
    }

    #[test]
    fn deck_wraps_each_fragment() {
        let body = assemble(
            vec![Fragment::new(1, "<p>two</p>"), Fragment::new(0, "<p>one</p>")],
            None,
            PageLayout::Deck,
        );
        assert_eq!(
            body,
            "<section>\n<p>one</p>\n</section>\n<section>\n<p>two</p>\n</section>"
        );
    }

    #[test]
    fn title_comes_from_leading_heading() {
        assert_eq!(page_title("# Intro\n\nHello", "Default"), "Intro");
        assert_eq!(page_title("#  Spaced  \nbody", "Default"), "Spaced");
        assert_eq!(page_title("\n\n# Late\nbody", "Default"), "Default");
        assert_eq!(page_title("## Sub\nbody", "Default"), "Default");
        assert_eq!(page_title("Plain text", "Default"), "Default");
        assert_eq!(page_title("", "Default"), "Default");
    }

    #[test]
    fn parses_layouts() {
        assert_eq!("Deck".parse::<PageLayout>().expect("deck"), PageLayout::Deck);
        assert_eq!("article".parse::<PageLayout>().expect("article"), PageLayout::Article);
        assert!("slides".parse::<PageLayout>().is_err());
    }
}
