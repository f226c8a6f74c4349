use std::{
    collections::BTreeSet,
    fs,
    path::PathBuf,
    sync::{Arc, Mutex},
};

use patternbook::{
    application::render::{
        ComrakMarkdown, PageLayout, PatternRenderer, Pipeline, PipelineError, PipelineOptions,
        RenderInvocation, RendererError,
    },
    domain::blocks::PatternTypeTable,
    presentation::views::AskamaTemplater,
};
use tempfile::TempDir;

const INTRO: &str = "# Intro\n\nHello\n\n----\n\n:patterning\n(circle)\n\n----\n\nBye";

/// In-process renderer that writes an SVG naming the source it was given,
/// or fails for any source containing `fail`.
#[derive(Default)]
struct FakeRenderer {
    invocations: Mutex<Vec<PathBuf>>,
    missing_artifact: bool,
}

impl PatternRenderer for FakeRenderer {
    fn render(&self, invocation: &RenderInvocation<'_>) -> Result<(), RendererError> {
        assert!(
            !invocation.target_path.exists(),
            "stale artifact must be removed before rendering"
        );
        let source = fs::read_to_string(invocation.source_path).map_err(RendererError::Io)?;
        self.invocations
            .lock()
            .expect("invocations")
            .push(invocation.target_path.to_path_buf());

        if source.contains("fail") {
            return Err(RendererError::Failed {
                exit_code: Some(1),
                diagnostic: format!("Syntax error compiling {}", source.trim()),
            });
        }
        if self.missing_artifact {
            return Ok(());
        }
        let svg = format!(
            "<svg width=\"{}\" height=\"{}\"><!-- {} --></svg>",
            invocation.width,
            invocation.height,
            source.trim()
        );
        fs::write(invocation.target_path, svg).map_err(RendererError::Io)
    }
}

struct Unavailable;

impl PatternRenderer for Unavailable {
    fn render(&self, _: &RenderInvocation<'_>) -> Result<(), RendererError> {
        Err(RendererError::Unavailable(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "lein: command not found",
        )))
    }
}

fn pipeline(renderer: Arc<dyn PatternRenderer>) -> Pipeline {
    Pipeline::new(
        PatternTypeTable::default(),
        renderer,
        Arc::new(ComrakMarkdown::new()),
        Arc::new(AskamaTemplater::default()),
    )
}

fn options(dir: &TempDir) -> PipelineOptions {
    PipelineOptions {
        document_name: "intro".into(),
        output_dir: dir.path().join("site"),
        workspace_dir: dir.path().join("scratch"),
        format: "svg".into(),
        default_title: "Pattern Tutorial".into(),
        layout: PageLayout::Article,
        highlight: false,
    }
}

fn positions(haystack: &str, needles: &[&str]) -> Vec<usize> {
    needles
        .iter()
        .map(|needle| {
            haystack
                .find(needle)
                .unwrap_or_else(|| panic!("`{needle}` missing from output:\n{haystack}"))
        })
        .collect()
}

#[test]
fn successful_document_keeps_block_order() {
    let dir = TempDir::new().expect("temp dir");
    let output = pipeline(Arc::new(FakeRenderer::default()))
        .run(INTRO, &options(&dir))
        .expect("run");

    assert_eq!(output.block_count, 3);
    assert_eq!(output.title, "Intro");
    assert!(output.failures.is_empty());

    let order = positions(
        &output.document,
        &["<p>Hello</p>", "<!-- (circle) -->", "<p>Bye</p>"],
    );
    assert!(order.windows(2).all(|pair| pair[0] < pair[1]), "{order:?}");

    assert_eq!(output.patterns.len(), 1);
    assert_eq!(output.patterns[0].id, 1);
    assert_eq!(output.patterns[0].source_code, "(circle)");
    assert!(output.document.contains("patterns['pattern1'] = \"(circle)\";"));
    assert!(output.document.contains("copyCode('pattern1')"));
    assert!(dir.path().join("site/intro-pattern-1.svg").is_file());
}

#[test]
fn failed_block_is_isolated_and_reported() {
    let dir = TempDir::new().expect("temp dir");
    let document = INTRO.replace("(circle)", "(fail circle)");
    let output = pipeline(Arc::new(FakeRenderer::default()))
        .run(&document, &options(&dir))
        .expect("run");

    assert_eq!(output.block_count, 3);
    let order = positions(
        &output.document,
        &[
            "<p>Hello</p>",
            "Syntax error compiling (fail circle)",
            "<p>Bye</p>",
        ],
    );
    assert!(order.windows(2).all(|pair| pair[0] < pair[1]), "{order:?}");

    let failures = output.failures.records();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].block_id, 1);
    assert_eq!(
        failures[0].expected_artifact_path,
        dir.path().join("site/intro-pattern-1.svg")
    );
    assert_eq!(failures[0].truncated_source, "(fail circle)");
    assert!(output.artifacts[0].is_failure());
    assert!(!dir.path().join("site/intro-pattern-1.svg").exists());
}

#[test]
fn missing_artifact_after_success_is_a_failure() {
    let dir = TempDir::new().expect("temp dir");
    let renderer = FakeRenderer {
        missing_artifact: true,
        ..Default::default()
    };
    let output = pipeline(Arc::new(renderer))
        .run(INTRO, &options(&dir))
        .expect("run");

    assert_eq!(output.failures.len(), 1);
    assert!(
        output
            .document
            .contains("artifact not found after renderer reported success"),
        "{}",
        output.document
    );
}

#[test]
fn unavailable_renderer_aborts_the_run() {
    let dir = TempDir::new().expect("temp dir");
    let result = pipeline(Arc::new(Unavailable)).run(INTRO, &options(&dir));
    assert!(matches!(result, Err(PipelineError::Environment { .. })));
}

#[test]
fn prose_only_document_never_invokes_the_renderer() {
    let dir = TempDir::new().expect("temp dir");
    let output = pipeline(Arc::new(Unavailable))
        .run("Just prose, no delimiters.", &options(&dir))
        .expect("run");
    assert_eq!(output.block_count, 1);
    assert_eq!(output.title, "Pattern Tutorial");
    assert!(output.document.contains("<p>Just prose, no delimiters.</p>"));
}

#[test]
fn unknown_tag_is_converted_as_prose() {
    let dir = TempDir::new().expect("temp dir");
    let renderer = Arc::new(FakeRenderer::default());
    let output = pipeline(renderer.clone())
        .run(":unknown-type\n(circle)", &options(&dir))
        .expect("run");

    assert!(renderer.invocations.lock().expect("invocations").is_empty());
    assert!(output.document.contains(":unknown-type"), "{}", output.document);
    assert!(output.patterns.is_empty());
}

#[test]
fn record_ids_count_only_retained_pattern_blocks() {
    let dir = TempDir::new().expect("temp dir");
    let document = [
        "Prose one",
        ":patterning-thumbnail\n(thumb)",
        ":patterning\n(first)",
        "Prose two",
        ":patterning-thumbnail\n(thumb again)",
        ":patterning-small\n(second)",
        ":patterning\n(third)",
    ]
    .join("\n\n----\n\n");

    let output = pipeline(Arc::new(FakeRenderer::default()))
        .run(&document, &options(&dir))
        .expect("run");

    let ids: Vec<usize> = output.patterns.iter().map(|record| record.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    let codes: Vec<&str> = output
        .patterns
        .iter()
        .map(|record| record.source_code.as_str())
        .collect();
    assert_eq!(codes, vec!["(first)", "(second)", "(third)"]);

    // Artifacts are named by ordinal among all pattern blocks.
    let names: BTreeSet<String> = fs::read_dir(dir.path().join("site"))
        .expect("site dir")
        .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
        .collect();
    let expected: BTreeSet<String> = (1..=5).map(|n| format!("intro-pattern-{n}.svg")).collect();
    assert_eq!(names, expected);

    assert_eq!(output.artifacts.len(), 5);
    assert!(output.document.contains("openInWorkbench('pattern3')"));
    assert!(!output.document.contains("pattern4'"));
}

#[test]
fn rerun_overwrites_the_same_artifacts() {
    let dir = TempDir::new().expect("temp dir");
    let renderer = Arc::new(FakeRenderer::default());
    let pipeline = pipeline(renderer.clone());
    let document = INTRO.replace("Bye", "Bye\n\n----\n\n:patterning-small\n(fail later)");

    let first = pipeline.run(&document, &options(&dir)).expect("first run");
    let second = pipeline.run(&document, &options(&dir)).expect("second run");

    let invocations = renderer.invocations.lock().expect("invocations");
    assert_eq!(invocations.len(), 4);
    assert_eq!(invocations[0], invocations[2]);
    assert_eq!(invocations[1], invocations[3]);
    assert_eq!(first.failures, second.failures);
    assert_eq!(first.document, second.document);
}

#[test]
fn envelope_is_reapplied_around_the_body() {
    let dir = TempDir::new().expect("temp dir");
    let document = "<div class=\"tutorial\">\nHello\n----\n:patterning\n(circle)\n</div>";
    let output = pipeline(Arc::new(FakeRenderer::default()))
        .run(document, &options(&dir))
        .expect("run");

    let body_start = output
        .document
        .find("<div class=\"tutorial\">")
        .expect("envelope prefix");
    let hello = output.document.find("<p>Hello</p>").expect("prose");
    assert!(body_start < hello);
    assert!(output.document.contains("</div>"));
    assert_eq!(output.block_count, 2);
}

#[test]
fn deck_layout_wraps_each_block_in_a_section() {
    let dir = TempDir::new().expect("temp dir");
    let mut options = options(&dir);
    options.layout = PageLayout::Deck;
    let pipeline = Pipeline::new(
        PatternTypeTable::default(),
        Arc::new(FakeRenderer::default()),
        Arc::new(ComrakMarkdown::new()),
        Arc::new(AskamaTemplater::new(PageLayout::Deck, "workbench/index.html")),
    );

    let output = pipeline.run(INTRO, &options).expect("run");
    assert_eq!(output.document.matches("<section>").count(), 3);
    assert!(output.document.contains("class=\"slides\""));
}

#[test]
fn metadata_and_marked_region_reach_the_container() {
    let dir = TempDir::new().expect("temp dir");
    let document = ":patterning\n;; Title: Spiral\n;; Tags: curves, art\n(def harness 1)\n;; PATTERN START\n(spiral 12)\n;; PATTERN END\n(preview harness)";
    let output = pipeline(Arc::new(FakeRenderer::default()))
        .run(document, &options(&dir))
        .expect("run");

    assert!(output.document.contains("data-title=\"Spiral\""), "{}", output.document);
    assert!(output.document.contains("data-tags=\"art, curves\""), "{}", output.document);
    assert_eq!(output.patterns[0].source_code, "(spiral 12)");
    // The renderer saw the harness code too.
    assert!(output.document.contains("(preview harness)"));
}
