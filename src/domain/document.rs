//! Block segmentation for hybrid prose/pattern documents.
//!
//! A document is split on runs of four or more hyphens. There is no escape
//! mechanism: a literal `----` inside prose or pattern source always starts a
//! new block. When the whole document is wrapped in a single outer tag, the
//! tag is peeled off and remembered so the assembled output can be re-wrapped
//! without the segmenter having to understand HTML.

use once_cell::sync::Lazy;
use regex::Regex;

static DELIMITER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"-{4,}").expect("valid delimiter"));
static OPEN_TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^<([A-Za-z][A-Za-z0-9-]*)(?:\s[^<>]*)?>").expect("valid open tag pattern")
});

/// Outer wrapping tag detected around the whole document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Opening tag text, verbatim.
    pub prefix: String,
    /// Closing tag text, verbatim.
    pub suffix: String,
}

impl Envelope {
    /// Re-apply the envelope around an assembled body.
    pub fn wrap(&self, body: &str) -> String {
        format!("{}\n{}\n{}", self.prefix, body, self.suffix)
    }
}

/// Delimiter-separated unit of a document before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBlock {
    /// Zero-based position in the document; the sole ordering key downstream.
    pub sequence_index: usize,
    /// Trimmed block text.
    pub text: String,
}

/// Segmented document. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub envelope: Option<Envelope>,
    pub blocks: Vec<RawBlock>,
}

impl Document {
    /// Segment raw document text into ordered blocks.
    pub fn segment(text: &str) -> Self {
        let trimmed = text.trim();
        let (envelope, body) = match detect_envelope(trimmed) {
            Some((envelope, body)) => (Some(envelope), body),
            None => (None, trimmed),
        };

        let blocks = DELIMITER_RE
            .split(body)
            .map(str::trim)
            .filter(|piece| !piece.is_empty())
            .enumerate()
            .map(|(sequence_index, piece)| RawBlock {
                sequence_index,
                text: piece.to_string(),
            })
            .collect();

        Self { envelope, blocks }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Best-effort detection of a single outer tag enclosing everything else.
///
/// Only a wrapper around delimited content counts: a document that is a
/// single element such as `<p>..</p>` is left whole. Returns `None` (no
/// envelope) whenever the shape is ambiguous, for example when the same
/// closing tag also appears inside the body.
pub fn detect_envelope(trimmed: &str) -> Option<(Envelope, &str)> {
    let captures = OPEN_TAG_RE.captures(trimmed)?;
    let open = captures.get(0)?;
    let name = captures.get(1)?.as_str();

    let closing = format!("</{name}>");
    if !trimmed.ends_with(&closing) || trimmed.len() < open.end() + closing.len() {
        return None;
    }

    let body = &trimmed[open.end()..trimmed.len() - closing.len()];
    if body.contains(&closing) || !DELIMITER_RE.is_match(body) {
        return None;
    }

    Some((
        Envelope {
            prefix: open.as_str().to_string(),
            suffix: closing,
        },
        body,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(document: &Document) -> Vec<&str> {
        document.blocks.iter().map(|b| b.text.as_str()).collect()
    }

    #[test]
    fn splits_on_four_or_more_hyphens() {
        let document = Document::segment("one\n----\ntwo\n--------\nthree");
        assert_eq!(texts(&document), vec!["one", "two", "three"]);
        assert!(document.envelope.is_none());
    }

    #[test]
    fn three_hyphens_do_not_split() {
        let document = Document::segment("one\n---\ntwo");
        assert_eq!(document.len(), 1);
    }

    #[test]
    fn drops_empty_pieces_and_numbers_contiguously() {
        let document = Document::segment("----\n\n----\nfirst\n----\n   \n----\nsecond\n----");
        assert_eq!(texts(&document), vec!["first", "second"]);
        let indices: Vec<usize> = document.blocks.iter().map(|b| b.sequence_index).collect();
        assert_eq!(indices, vec![0, 1]);
    }

    #[test]
    fn document_without_delimiters_is_one_block() {
        let document = Document::segment("# Title\n\nJust prose.");
        assert_eq!(texts(&document), vec!["# Title\n\nJust prose."]);
    }

    #[test]
    fn empty_document_has_no_blocks() {
        assert!(Document::segment("  \n ").is_empty());
    }

    #[test]
    fn detects_outer_envelope() {
        let document =
            Document::segment("<div class=\"slides\">\nintro\n----\n:patterning\n(circle)\n</div>");
        let envelope = document.envelope.as_ref().expect("envelope detected");
        assert_eq!(envelope.prefix, "<div class=\"slides\">");
        assert_eq!(envelope.suffix, "</div>");
        assert_eq!(texts(&document), vec!["intro", ":patterning\n(circle)"]);
    }

    #[test]
    fn sibling_tags_are_not_an_envelope() {
        let document = Document::segment("<p>a</p>\n----\n<p>b</p>");
        assert!(document.envelope.is_none());
        assert_eq!(texts(&document), vec!["<p>a</p>", "<p>b</p>"]);
    }

    #[test]
    fn mismatched_closing_tag_falls_back_to_no_envelope() {
        assert!(detect_envelope("<section>body</div>").is_none());
        assert!(detect_envelope("plain text").is_none());
    }

    #[test]
    fn single_element_document_is_not_an_envelope() {
        let document = Document::segment("<p>Hello <b>x</b></p>");
        assert!(document.envelope.is_none());
        assert_eq!(texts(&document), vec!["<p>Hello <b>x</b></p>"]);
    }

    #[test]
    fn envelope_wrap_is_verbatim() {
        let envelope = Envelope {
            prefix: "<main id=\"x\">".into(),
            suffix: "</main>".into(),
        };
        assert_eq!(envelope.wrap("<p>hi</p>"), "<main id=\"x\">\n<p>hi</p>\n</main>");
    }
}
