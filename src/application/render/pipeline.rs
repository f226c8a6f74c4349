//! One synchronous run of the document pipeline.
//!
//! Blocks are processed strictly in source order with one renderer
//! invocation at a time. Per-block render problems become failed artifacts
//! and in-place error previews; only an unavailable renderer or an I/O
//! failure on the output side aborts the run.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::Instant,
};

use tracing::{info, warn};

use crate::domain::{
    blocks::{Block, PatternTypeTable},
    document::{Document, Envelope},
    metadata::PatternSource,
};

use super::{
    adapter::{ArtifactTarget, RenderAdapter},
    assemble::{Fragment, PageLayout, assemble, page_title},
    container::{ContainerRenderer, ContainerRequest, Preview},
    failures::FailureReport,
    types::{
        DocumentTemplater, MarkdownConverter, PageContent, PatternRecord, PatternRenderer,
        PipelineError, RenderedArtifact,
    },
};

/// Per-document parameters. Nothing is read from ambient process state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Stem used in artifact file names.
    pub document_name: String,
    /// Directory receiving artifacts; the assembled document lives beside them.
    pub output_dir: PathBuf,
    /// Scratch directory for staged pattern sources.
    pub workspace_dir: PathBuf,
    /// Artifact format handed to the renderer and used as file extension.
    pub format: String,
    pub default_title: String,
    pub layout: PageLayout,
    pub highlight: bool,
}

/// Segmented and classified document, before any rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedDocument {
    pub envelope: Option<Envelope>,
    pub blocks: Vec<Block>,
}

/// Everything one run produced.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub title: String,
    /// Final document text returned by the templater.
    pub document: String,
    pub block_count: usize,
    pub patterns: Vec<PatternRecord>,
    pub artifacts: Vec<RenderedArtifact>,
    pub failures: FailureReport,
}

#[derive(Clone)]
pub struct Pipeline {
    table: PatternTypeTable,
    renderer: Arc<dyn PatternRenderer>,
    markdown: Arc<dyn MarkdownConverter>,
    templater: Arc<dyn DocumentTemplater>,
}

impl Pipeline {
    pub fn new(
        table: PatternTypeTable,
        renderer: Arc<dyn PatternRenderer>,
        markdown: Arc<dyn MarkdownConverter>,
        templater: Arc<dyn DocumentTemplater>,
    ) -> Self {
        Self {
            table,
            renderer,
            markdown,
            templater,
        }
    }

    /// Segment and classify without rendering anything.
    pub fn classify(&self, text: &str) -> ClassifiedDocument {
        let document = Document::segment(text);
        let blocks = document
            .blocks
            .iter()
            .map(|raw| self.table.classify(raw))
            .collect();
        ClassifiedDocument {
            envelope: document.envelope,
            blocks,
        }
    }

    pub fn run(&self, text: &str, options: &PipelineOptions) -> Result<BuildOutput, PipelineError> {
        let started_at = Instant::now();
        prepare_dir(&options.output_dir)?;
        prepare_dir(&options.workspace_dir)?;

        let classified = self.classify(text);
        let target = ArtifactTarget::new(
            options.output_dir.clone(),
            options.document_name.clone(),
            options.format.clone(),
        );
        let adapter = RenderAdapter::new(
            self.renderer.as_ref(),
            options.workspace_dir.clone(),
            target,
        );
        let containers = ContainerRenderer::new(options.highlight);

        let mut fragments = Vec::with_capacity(classified.blocks.len());
        let mut patterns = Vec::new();
        let mut artifacts = Vec::new();
        let mut failures = FailureReport::new();
        let mut pattern_ordinal = 0usize;

        for block in &classified.blocks {
            let Some(block_type) = block.pattern_tag().and_then(|tag| self.table.get(tag)) else {
                fragments.push(Fragment::new(
                    block.sequence_index,
                    self.markdown.to_html(&block.body),
                ));
                continue;
            };

            pattern_ordinal += 1;
            let block_id = pattern_ordinal;
            let source = PatternSource::extract(&block.body);

            let mut artifact =
                adapter.render(&block.body, block_id, block_type.width, block_type.height)?;
            let preview = Preview::resolve(
                &artifact,
                &options.format,
                block_type.width,
                block_type.height,
            );
            if let Some(message) = preview.error() {
                let artifact_path = adapter.target().artifact_path(block_id);
                if !artifact.is_failure() {
                    warn!(
                        target = "application::render::pipeline",
                        op = "pipeline::preview",
                        result = "error",
                        block = block_id,
                        artifact = %artifact_path.display(),
                        error_code = "artifact_read",
                        error = %message,
                        "Rendered artifact could not be read"
                    );
                    artifact = RenderedArtifact::failed(block_id, message);
                }
                failures.record(block_id, artifact_path, &block.body, message);
            }

            let record_id = block_type.retain_source.then(|| patterns.len() + 1);
            let html = containers.render(&ContainerRequest {
                code: &source.code,
                block_id,
                record_id,
                block_type,
                preview: &preview,
                metadata: &source.metadata,
            })?;
            fragments.push(Fragment::new(block.sequence_index, html));

            if let Some(id) = record_id {
                patterns.push(PatternRecord {
                    id,
                    source_code: source.code,
                });
            }
            artifacts.push(artifact);
        }

        let block_count = fragments.len();
        let body = assemble(fragments, classified.envelope.as_ref(), options.layout);
        let title = page_title(text, &options.default_title).to_string();
        let document = self.templater.render_page(&PageContent {
            title: &title,
            body: &body,
            patterns: &patterns,
        })?;

        let elapsed_ms = started_at.elapsed().as_millis() as u64;
        if failures.is_empty() {
            info!(
                target = "application::render::pipeline",
                op = "pipeline::run",
                result = "ok",
                document = %options.document_name,
                blocks = block_count,
                patterns = pattern_ordinal,
                elapsed_ms,
                "Document assembled"
            );
        } else {
            warn!(
                target = "application::render::pipeline",
                op = "pipeline::run",
                result = "partial",
                document = %options.document_name,
                blocks = block_count,
                patterns = pattern_ordinal,
                failed = failures.len(),
                elapsed_ms,
                "Document assembled with failed pattern blocks"
            );
        }

        Ok(BuildOutput {
            title,
            document,
            block_count,
            patterns,
            artifacts,
            failures,
        })
    }
}

fn prepare_dir(path: &Path) -> Result<(), PipelineError> {
    fs::create_dir_all(path).map_err(|err| PipelineError::io(path, err))
}
