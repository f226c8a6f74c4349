//! Block rendering and document assembly.
//!
//! The pipeline is pure apart from the filesystem it is pointed at: it
//! accepts document text plus explicit [`PipelineOptions`], writes pattern
//! artifacts through the render collaborator and returns the assembled
//! document together with a failure report. Writing the document itself is
//! left to the caller.

mod adapter;
mod assemble;
mod container;
mod failures;
mod pipeline;
mod service;
mod types;

pub use adapter::{ArtifactTarget, RenderAdapter};
pub use assemble::{Fragment, PageLayout, assemble, page_title};
pub use container::{ContainerRenderer, ContainerRequest, Preview};
pub use failures::{FailureRecord, FailureReport, FailureSummary, truncate_source};
pub use pipeline::{BuildOutput, ClassifiedDocument, Pipeline, PipelineOptions};
pub use service::{CliPatternRenderer, ComrakMarkdown, rewrite_wiki_links};
pub use types::{
    ArtifactOutcome, DocumentTemplater, MarkdownConverter, PageContent, PatternRecord,
    PatternRenderer, PipelineError, RenderInvocation, RenderedArtifact, RendererError,
    pattern_key,
};
