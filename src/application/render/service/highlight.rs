use once_cell::sync::Lazy;
use syntect::{
    html::{ClassStyle, ClassedHTMLGenerator},
    parsing::{SyntaxReference, SyntaxSet},
    util::LinesWithEndings,
};

use crate::application::render::types::PipelineError;

const PATTERN_LANGUAGE: &str = "clojure";
const CLASS_STYLE: ClassStyle = ClassStyle::SpacedPrefixed { prefix: "syntax-" };

static SYNTAX_SET: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);

/// Highlight pattern source into `syntax-` classed spans. The result is
/// already escaped and safe to embed inside `<code>`.
pub(crate) fn highlight_pattern_code(code: &str) -> Result<String, PipelineError> {
    let syntax_set = &*SYNTAX_SET;
    let syntax = find_syntax(syntax_set, PATTERN_LANGUAGE)
        .unwrap_or_else(|| syntax_set.find_syntax_plain_text());

    let mut code_with_newline = code.to_string();
    if !code_with_newline.ends_with('\n') {
        code_with_newline.push('\n');
    }

    let mut generator = ClassedHTMLGenerator::new_with_class_style(syntax, syntax_set, CLASS_STYLE);
    for line in LinesWithEndings::from(code_with_newline.as_str()) {
        generator
            .parse_html_for_line_which_includes_newline(line)
            .map_err(|err| {
                PipelineError::template(format!("highlighting {PATTERN_LANGUAGE} failed: {err}"))
            })?;
    }

    Ok(generator.finalize())
}

fn find_syntax<'a>(syntax_set: &'a SyntaxSet, token: &str) -> Option<&'a SyntaxReference> {
    syntax_set
        .find_syntax_by_token(token)
        .or_else(|| syntax_set.find_syntax_by_extension("clj"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highlights_with_prefixed_classes() {
        let html = highlight_pattern_code("(circle 1 \"<red>\")").expect("highlighted");
        assert!(html.contains("syntax-"), "missing classes: {html}");
        assert!(!html.contains("<red>"), "source must be escaped: {html}");
    }
}
