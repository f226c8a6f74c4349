use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::application::render::types::MarkdownConverter;

use super::config::default_options;

static WIKI_LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[([^\]]+)\]\]").expect("valid wiki link pattern"));

/// Comrak-backed converter for prose blocks.
pub struct ComrakMarkdown {
    options: comrak::Options<'static>,
}

impl ComrakMarkdown {
    pub fn new() -> Self {
        Self {
            options: default_options(),
        }
    }
}

impl Default for ComrakMarkdown {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownConverter for ComrakMarkdown {
    fn to_html(&self, markdown: &str) -> String {
        let linked = rewrite_wiki_links(markdown);
        comrak::markdown_to_html(&linked, &self.options)
    }
}

/// `[[Page Name]]` → `<a href="Page Name.html">Page Name</a>`.
pub fn rewrite_wiki_links(markdown: &str) -> Cow<'_, str> {
    WIKI_LINK_RE.replace_all(markdown, |caps: &Captures<'_>| {
        let page = &caps[1];
        format!("<a href=\"{page}.html\">{page}</a>")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_prose_to_html() {
        let html = ComrakMarkdown::new().to_html("# Intro\n\nHello");
        assert!(html.contains("<h1>Intro</h1>"), "{html}");
        assert!(html.contains("<p>Hello</p>"), "{html}");
    }

    #[test]
    fn rewrites_wiki_links() {
        assert_eq!(
            rewrite_wiki_links("See [[Hello World]] and [[Grids]]."),
            "See <a href=\"Hello World.html\">Hello World</a> and <a href=\"Grids.html\">Grids</a>."
        );
    }

    #[test]
    fn wiki_links_survive_conversion() {
        let html = ComrakMarkdown::new().to_html("Next: [[Stripes]]");
        assert!(html.contains("<a href=\"Stripes.html\">Stripes</a>"), "{html}");
    }

    #[test]
    fn text_without_links_is_borrowed() {
        assert!(matches!(rewrite_wiki_links("plain"), Cow::Borrowed(_)));
    }
}
