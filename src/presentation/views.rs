use askama::Template;

use crate::application::render::{
    DocumentTemplater, PageContent, PageLayout, PatternRecord, PipelineError,
};

pub const DEFAULT_WORKBENCH_URL: &str = "workbench/index.html";

/// One `patterns['pattern{id}'] = "..."` line of the page script.
pub struct PatternEntryView {
    pub key: String,
    /// JSON string literal, safe to place inside a `<script>` element.
    pub code_json: String,
}

#[derive(Template)]
#[template(path = "page/article.html")]
struct ArticleTemplate<'a> {
    title: &'a str,
    body: &'a str,
    patterns: Vec<PatternEntryView>,
    workbench_json: String,
}

#[derive(Template)]
#[template(path = "page/deck.html")]
struct DeckTemplate<'a> {
    title: &'a str,
    body: &'a str,
    patterns: Vec<PatternEntryView>,
    workbench_json: String,
}

/// Askama-backed page templater for both article and deck layouts.
#[derive(Debug, Clone)]
pub struct AskamaTemplater {
    layout: PageLayout,
    workbench_url: String,
}

impl AskamaTemplater {
    pub fn new(layout: PageLayout, workbench_url: impl Into<String>) -> Self {
        Self {
            layout,
            workbench_url: workbench_url.into(),
        }
    }
}

impl Default for AskamaTemplater {
    fn default() -> Self {
        Self::new(PageLayout::Article, DEFAULT_WORKBENCH_URL)
    }
}

impl DocumentTemplater for AskamaTemplater {
    fn render_page(&self, page: &PageContent<'_>) -> Result<String, PipelineError> {
        let patterns = page
            .patterns
            .iter()
            .map(pattern_entry)
            .collect::<Result<Vec<_>, _>>()?;
        let workbench_json = script_literal(&self.workbench_url)?;

        let html = match self.layout {
            PageLayout::Article => ArticleTemplate {
                title: page.title,
                body: page.body,
                patterns,
                workbench_json,
            }
            .render()?,
            PageLayout::Deck => DeckTemplate {
                title: page.title,
                body: page.body,
                patterns,
                workbench_json,
            }
            .render()?,
        };
        Ok(html)
    }
}

fn pattern_entry(record: &PatternRecord) -> Result<PatternEntryView, PipelineError> {
    Ok(PatternEntryView {
        key: record.key(),
        code_json: script_literal(&record.source_code)?,
    })
}

/// JSON string literal with `</` broken up so it cannot close the script.
fn script_literal(value: &str) -> Result<String, PipelineError> {
    let json = serde_json::to_string(value)
        .map_err(|err| PipelineError::template(format!("failed to encode script data: {err}")))?;
    Ok(json.replace("</", "<\\/"))
}
