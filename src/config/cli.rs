use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the patternbook binary.
#[derive(Debug, Parser)]
#[command(
    name = "patternbook",
    version,
    about = "Build pattern tutorial pages from hybrid markdown documents"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "PATTERNBOOK_CONFIG_FILE",
        value_name = "PATH",
        global = true
    )]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Render every pattern block and write the assembled document.
    Build(Box<BuildArgs>),
    /// Segment and classify a document without rendering anything.
    Blocks(BlocksArgs),
}

#[derive(Debug, Args, Clone)]
pub struct BuildArgs {
    /// Hybrid markdown document to read.
    #[arg(value_name = "INPUT", value_hint = ValueHint::FilePath)]
    pub input: PathBuf,

    /// Assembled document to write; artifacts are written next to it.
    #[arg(value_name = "OUTPUT", value_hint = ValueHint::FilePath)]
    pub output: PathBuf,

    #[command(flatten)]
    pub overrides: BuildOverrides,

    /// Also write failed blocks as a JSON manifest.
    #[arg(long = "failure-manifest", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub failure_manifest: Option<PathBuf>,

    /// Exit with status 2 when any pattern block failed to render.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub strict: bool,
}

#[derive(Debug, Args, Clone)]
pub struct BlocksArgs {
    /// Hybrid markdown document to inspect.
    #[arg(value_name = "INPUT", value_hint = ValueHint::FilePath)]
    pub input: PathBuf,

    #[command(flatten)]
    pub logging: LoggingOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct LoggingOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct RenderOverrides {
    /// Override the pattern renderer executable.
    #[arg(long = "render-program", value_name = "PATH", value_hint = ValueHint::CommandName)]
    pub program: Option<PathBuf>,

    /// Replace the arguments placed before the positional render arguments.
    #[arg(long = "render-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub args: Vec<String>,

    /// Override the artifact format (e.g. svg, png).
    #[arg(long = "render-format", value_name = "FORMAT")]
    pub format: Option<String>,

    /// Override the working directory the renderer runs in.
    #[arg(long = "render-working-dir", value_name = "PATH", value_hint = ValueHint::DirPath)]
    pub working_dir: Option<PathBuf>,

    /// Override the scratch directory for staged pattern sources.
    #[arg(long = "render-workspace-dir", value_name = "PATH", value_hint = ValueHint::DirPath)]
    pub workspace_dir: Option<PathBuf>,

    /// Add a `KEY=VALUE` environment override for the renderer.
    #[arg(long = "render-env", value_name = "KEY=VALUE")]
    pub env: Vec<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct BuildOverrides {
    #[command(flatten)]
    pub render: RenderOverrides,

    #[command(flatten)]
    pub logging: LoggingOverrides,

    /// Override the page layout (article|deck).
    #[arg(long = "layout", value_name = "LAYOUT")]
    pub layout: Option<String>,

    /// Toggle syntax highlighting of pattern code.
    #[arg(
        long = "highlight",
        value_name = "BOOL",
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub highlight: Option<bool>,

    /// Override the title used when the document has no leading heading.
    #[arg(long = "default-title", value_name = "TITLE")]
    pub default_title: Option<String>,

    /// Override the workbench page opened by the pattern actions.
    #[arg(long = "workbench-url", value_name = "URL")]
    pub workbench_url: Option<String>,
}
