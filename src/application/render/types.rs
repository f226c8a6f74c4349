use std::{
    io,
    path::{Path, PathBuf},
};

use serde::Serialize;
use thiserror::Error;

/// Outcome of rendering one pattern block. Exactly one of artifact path or
/// error message exists; the enum makes the other state unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ArtifactOutcome {
    Rendered { artifact_path: PathBuf },
    Failed { error_message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedArtifact {
    /// 1-based ordinal of the block among pattern blocks.
    pub block_id: usize,
    #[serde(flatten)]
    pub outcome: ArtifactOutcome,
}

impl RenderedArtifact {
    pub fn rendered(block_id: usize, artifact_path: impl Into<PathBuf>) -> Self {
        Self {
            block_id,
            outcome: ArtifactOutcome::Rendered {
                artifact_path: artifact_path.into(),
            },
        }
    }

    pub fn failed(block_id: usize, error_message: impl Into<String>) -> Self {
        Self {
            block_id,
            outcome: ArtifactOutcome::Failed {
                error_message: error_message.into(),
            },
        }
    }

    pub fn artifact_path(&self) -> Option<&Path> {
        match &self.outcome {
            ArtifactOutcome::Rendered { artifact_path } => Some(artifact_path.as_path()),
            ArtifactOutcome::Failed { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.outcome {
            ArtifactOutcome::Rendered { .. } => None,
            ArtifactOutcome::Failed { error_message } => Some(error_message.as_str()),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error_message().is_some()
    }
}

/// Retained pattern source exposed to the page script as `pattern{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternRecord {
    pub id: usize,
    #[serde(rename = "code")]
    pub source_code: String,
}

impl PatternRecord {
    /// Key used by the client-side lookup table and action controls.
    pub fn key(&self) -> String {
        pattern_key(self.id)
    }
}

pub fn pattern_key(id: usize) -> String {
    format!("pattern{id}")
}

/// Arguments handed to the render collaborator for one invocation.
#[derive(Debug, Clone, Copy)]
pub struct RenderInvocation<'a> {
    pub source_path: &'a Path,
    pub target_path: &'a Path,
    pub format: &'a str,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Error)]
pub enum RendererError {
    /// The renderer cannot be invoked at all; no block can ever succeed.
    #[error("pattern renderer unavailable: {0}")]
    Unavailable(#[source] io::Error),
    #[error("pattern renderer failed (exit {exit_code:?}): {diagnostic}")]
    Failed {
        exit_code: Option<i32>,
        diagnostic: String,
    },
    #[error("pattern renderer i/o failure: {0}")]
    Io(#[source] io::Error),
}

impl RendererError {
    /// Text shown in place of the preview for this failure.
    pub fn diagnostic(&self) -> String {
        match self {
            RendererError::Failed { diagnostic, .. } => diagnostic.clone(),
            other => other.to_string(),
        }
    }
}

/// Black-box capability that turns a staged pattern source into an artifact
/// at the target path. Implementations may be a subprocess, an in-process
/// library or a remote service.
pub trait PatternRenderer: Send + Sync {
    fn render(&self, invocation: &RenderInvocation<'_>) -> Result<(), RendererError>;
}

/// Pure markdown → HTML fragment conversion.
pub trait MarkdownConverter: Send + Sync {
    fn to_html(&self, markdown: &str) -> String;
}

/// Everything the page template needs from the pipeline.
#[derive(Debug, Clone, Copy)]
pub struct PageContent<'a> {
    pub title: &'a str,
    pub body: &'a str,
    pub patterns: &'a [PatternRecord],
}

/// Final page templating: embeds the body and the `pattern{id}` data table.
pub trait DocumentTemplater: Send + Sync {
    fn render_page(&self, page: &PageContent<'_>) -> Result<String, PipelineError>;
}

/// Errors that abort a whole document run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("render environment unavailable: {source}")]
    Environment {
        #[source]
        source: RendererError,
    },
    #[error("i/o failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("template rendering failed: {message}")]
    Template { message: String },
}

impl PipelineError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn template(message: impl Into<String>) -> Self {
        Self::Template {
            message: message.into(),
        }
    }
}

impl From<askama::Error> for PipelineError {
    fn from(error: askama::Error) -> Self {
        Self::template(error.to_string())
    }
}
