//! Markup fragments for pattern blocks, one askama layout per
//! [`PatternLayout`].

use std::fs;

use askama::Template;

use crate::domain::{
    blocks::{PatternBlockType, PatternLayout},
    metadata::Metadata,
};

use super::{
    service::highlight_pattern_code,
    types::{ArtifactOutcome, PipelineError, RenderedArtifact, pattern_key},
};

/// What the preview area shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preview {
    /// Trusted markup: inlined SVG or an image reference.
    Markup(String),
    /// Literal error text, escaped on output.
    Error(String),
}

impl Preview {
    /// Resolve the preview for a rendered or failed artifact.
    ///
    /// SVG artifacts are inlined; other formats are referenced by file name,
    /// which resolves next to the assembled document.
    pub fn resolve(artifact: &RenderedArtifact, format: &str, width: u32, height: u32) -> Self {
        let path = match &artifact.outcome {
            ArtifactOutcome::Rendered { artifact_path } => artifact_path,
            ArtifactOutcome::Failed { error_message } => {
                return Preview::Error(error_message.clone());
            }
        };

        if format.eq_ignore_ascii_case("svg") {
            match fs::read_to_string(path) {
                Ok(svg) => Preview::Markup(svg),
                Err(err) => Preview::Error(format!("Error reading SVG file: {err}")),
            }
        } else {
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            Preview::Markup(image_markup(&file_name, width, height))
        }
    }

    pub fn markup(&self) -> Option<&str> {
        match self {
            Preview::Markup(markup) => Some(markup.as_str()),
            Preview::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Preview::Markup(_) => None,
            Preview::Error(message) => Some(message.as_str()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error().is_some()
    }
}

fn image_markup(src: &str, width: u32, height: u32) -> String {
    format!("<img src=\"{src}\" width=\"{width}\" height=\"{height}\" alt=\"\">")
}

/// Inputs for one pattern container.
#[derive(Debug, Clone, Copy)]
pub struct ContainerRequest<'a> {
    /// Effective code shown and copied.
    pub code: &'a str,
    /// 1-based ordinal among pattern blocks.
    pub block_id: usize,
    /// Id in the page's `pattern{id}` table, for retained blocks only.
    pub record_id: Option<usize>,
    pub block_type: &'a PatternBlockType,
    pub preview: &'a Preview,
    pub metadata: &'a Metadata,
}

pub struct ContainerView<'a> {
    pub block_id: usize,
    pub code: &'a str,
    pub highlighted: Option<String>,
    pub show_code: bool,
    pub action_key: Option<String>,
    /// Set only when the preview rendered and actions are wired.
    pub preview_link: Option<String>,
    pub preview: &'a Preview,
    pub metadata: &'a Metadata,
    pub tags: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Template)]
#[template(path = "pattern/example.html")]
struct ExampleContainer<'a> {
    view: &'a ContainerView<'a>,
}

#[derive(Template)]
#[template(path = "pattern/thumbnail.html")]
struct ThumbnailContainer<'a> {
    view: &'a ContainerView<'a>,
}

#[derive(Template)]
#[template(path = "pattern/small.html")]
struct SmallContainer<'a> {
    view: &'a ContainerView<'a>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ContainerRenderer {
    highlight: bool,
}

impl ContainerRenderer {
    pub fn new(highlight: bool) -> Self {
        Self { highlight }
    }

    pub fn render(&self, request: &ContainerRequest<'_>) -> Result<String, PipelineError> {
        let block_type = request.block_type;
        let show_code = block_type.retain_source;
        let highlighted = if self.highlight && show_code {
            Some(highlight_pattern_code(request.code)?)
        } else {
            None
        };
        let action_key = request.record_id.map(pattern_key);
        let preview_link = action_key
            .clone()
            .filter(|_| !request.preview.is_error());

        let view = ContainerView {
            block_id: request.block_id,
            code: request.code,
            highlighted,
            show_code,
            action_key,
            preview_link,
            preview: request.preview,
            metadata: request.metadata,
            tags: request.metadata.tags_joined(),
            width: block_type.width,
            height: block_type.height,
        };

        let html = match block_type.layout {
            PatternLayout::Example => ExampleContainer { view: &view }.render()?,
            PatternLayout::Thumbnail => ThumbnailContainer { view: &view }.render()?,
            PatternLayout::Small => SmallContainer { view: &view }.render()?,
        };
        Ok(html)
    }
}
