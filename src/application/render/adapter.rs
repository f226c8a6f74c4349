//! Pattern render adapter: stages a block's source, invokes the render
//! collaborator and converts every per-block problem into data.

use std::{
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    time::Instant,
};

use tempfile::NamedTempFile;
use tracing::{info, warn};

use super::types::{
    PatternRenderer, PipelineError, RenderInvocation, RenderedArtifact, RendererError,
};

const SCRATCH_PREFIX: &str = "pattern-";
const SCRATCH_SUFFIX: &str = ".clj";

/// Where artifacts for one document go and how they are named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactTarget {
    pub output_dir: PathBuf,
    pub document_name: String,
    pub format: String,
}

impl ArtifactTarget {
    pub fn new(
        output_dir: impl Into<PathBuf>,
        document_name: impl Into<String>,
        format: impl Into<String>,
    ) -> Self {
        Self {
            output_dir: output_dir.into(),
            document_name: document_name.into(),
            format: format.into(),
        }
    }

    /// `{output_dir}/{document_name}-pattern-{n}.{format}`; stable across runs.
    pub fn artifact_path(&self, block_id: usize) -> PathBuf {
        self.output_dir.join(self.file_name(block_id))
    }

    pub fn file_name(&self, block_id: usize) -> String {
        format!("{}-pattern-{block_id}.{}", self.document_name, self.format)
    }
}

pub struct RenderAdapter<'a> {
    renderer: &'a dyn PatternRenderer,
    workspace_dir: PathBuf,
    target: ArtifactTarget,
}

impl<'a> RenderAdapter<'a> {
    pub fn new(
        renderer: &'a dyn PatternRenderer,
        workspace_dir: impl Into<PathBuf>,
        target: ArtifactTarget,
    ) -> Self {
        Self {
            renderer,
            workspace_dir: workspace_dir.into(),
            target,
        }
    }

    pub fn target(&self) -> &ArtifactTarget {
        &self.target
    }

    /// Render one pattern block.
    ///
    /// Only an unavailable renderer escapes as `Err`; every other problem is
    /// returned as a failed [`RenderedArtifact`]. The scratch file is removed
    /// on every path when the staged handle drops.
    pub fn render(
        &self,
        source: &str,
        block_id: usize,
        width: u32,
        height: u32,
    ) -> Result<RenderedArtifact, PipelineError> {
        let started_at = Instant::now();
        let target_path = self.target.artifact_path(block_id);

        let staged = match self.stage(source) {
            Ok(staged) => staged,
            Err(err) => {
                let message = format!("failed to stage pattern source: {err}");
                log_failure(block_id, &target_path, started_at, "stage", &message);
                return Ok(RenderedArtifact::failed(block_id, message));
            }
        };

        if let Err(err) = remove_stale_artifact(&target_path) {
            let message = format!(
                "failed to remove stale artifact {}: {err}",
                target_path.display()
            );
            log_failure(block_id, &target_path, started_at, "stale_artifact", &message);
            return Ok(RenderedArtifact::failed(block_id, message));
        }

        let invocation = RenderInvocation {
            source_path: staged.path(),
            target_path: &target_path,
            format: &self.target.format,
            width,
            height,
        };

        match self.renderer.render(&invocation) {
            Ok(()) if target_path.is_file() => {
                info!(
                    target = "application::render::adapter",
                    op = "adapter::render",
                    result = "rendered",
                    block = block_id,
                    elapsed_ms = started_at.elapsed().as_millis() as u64,
                    artifact = %target_path.display(),
                    "Pattern rendered"
                );
                Ok(RenderedArtifact::rendered(block_id, target_path))
            }
            Ok(()) => {
                let message = format!(
                    "artifact not found after renderer reported success: {}",
                    target_path.display()
                );
                log_failure(block_id, &target_path, started_at, "artifact_missing", &message);
                Ok(RenderedArtifact::failed(block_id, message))
            }
            Err(err @ RendererError::Unavailable(_)) => {
                warn!(
                    target = "application::render::adapter",
                    op = "adapter::render",
                    result = "fatal",
                    block = block_id,
                    error = %err,
                    "Pattern renderer cannot be invoked"
                );
                Err(PipelineError::Environment { source: err })
            }
            Err(err) => {
                let message = err.diagnostic();
                log_failure(block_id, &target_path, started_at, "renderer", &message);
                Ok(RenderedArtifact::failed(block_id, message))
            }
        }
    }

    fn stage(&self, source: &str) -> std::io::Result<NamedTempFile> {
        let mut staged = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .suffix(SCRATCH_SUFFIX)
            .tempfile_in(&self.workspace_dir)?;
        staged.write_all(source.as_bytes())?;
        staged.flush()?;
        Ok(staged)
    }
}

fn remove_stale_artifact(path: &Path) -> std::io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err),
    }
}

fn log_failure(
    block_id: usize,
    target_path: &Path,
    started_at: Instant,
    error_code: &'static str,
    message: &str,
) {
    warn!(
        target = "application::render::adapter",
        op = "adapter::render",
        result = "error",
        block = block_id,
        elapsed_ms = started_at.elapsed().as_millis() as u64,
        artifact = %target_path.display(),
        error_code,
        error = %message,
        "Pattern render failed"
    );
}
