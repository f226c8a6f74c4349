//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{collections::BTreeMap, env, path::PathBuf, str::FromStr};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::{application::render::PageLayout, presentation::views::DEFAULT_WORKBENCH_URL};

mod cli;

pub use cli::{
    BlocksArgs, BuildArgs, BuildOverrides, CliArgs, Command, LoggingOverrides, RenderOverrides,
};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "patternbook";
const ENV_PREFIX: &str = "PATTERNBOOK";
const DEFAULT_RENDER_PROGRAM: &str = "lein";
const DEFAULT_RENDER_ARGS: [&str; 3] = ["run", "-m", "patterning.cli"];
const DEFAULT_RENDER_FORMAT: &str = "svg";
const DEFAULT_TITLE: &str = "Pattern Tutorial";

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub render: RenderSettings,
    pub output: OutputSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub program: PathBuf,
    /// Arguments placed before `<source> <target> <format> <width> <height>`.
    pub args: Vec<String>,
    pub format: String,
    pub working_dir: Option<PathBuf>,
    pub workspace_dir: PathBuf,
    pub env: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct OutputSettings {
    pub default_title: String,
    pub workbench_url: String,
    pub highlight: bool,
    pub layout: PageLayout,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(environment());

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match &cli.command {
        Command::Build(args) => raw.apply_build_overrides(&args.overrides),
        Command::Blocks(args) => raw.apply_logging_overrides(&args.logging),
    }

    Settings::from_raw(raw)
}

/// `PATTERNBOOK__SECTION__KEY` variables. List keys split on commas, so a
/// single renderer argument cannot itself contain one.
fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("render.args")
        .with_list_parse_key("render.env")
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    render: RawRenderSettings,
    output: RawOutputSettings,
}

impl RawSettings {
    fn apply_build_overrides(&mut self, overrides: &BuildOverrides) {
        self.apply_logging_overrides(&overrides.logging);
        self.apply_render_overrides(&overrides.render);

        if let Some(layout) = overrides.layout.as_ref() {
            self.output.layout = Some(layout.clone());
        }
        if let Some(highlight) = overrides.highlight {
            self.output.highlight = Some(highlight);
        }
        if let Some(title) = overrides.default_title.as_ref() {
            self.output.default_title = Some(title.clone());
        }
        if let Some(url) = overrides.workbench_url.as_ref() {
            self.output.workbench_url = Some(url.clone());
        }
    }

    fn apply_logging_overrides(&mut self, overrides: &LoggingOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
    }

    fn apply_render_overrides(&mut self, overrides: &RenderOverrides) {
        if let Some(program) = overrides.program.as_ref() {
            self.render.program = Some(program.clone());
        }
        if !overrides.args.is_empty() {
            self.render.args = Some(overrides.args.clone());
        }
        if let Some(format) = overrides.format.as_ref() {
            self.render.format = Some(format.clone());
        }
        if let Some(dir) = overrides.working_dir.as_ref() {
            self.render.working_dir = Some(dir.clone());
        }
        if let Some(dir) = overrides.workspace_dir.as_ref() {
            self.render.workspace_dir = Some(dir.clone());
        }
        if !overrides.env.is_empty() {
            self.render
                .env
                .get_or_insert_with(Vec::new)
                .extend(overrides.env.iter().cloned());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        Ok(Self {
            logging: build_logging_settings(raw.logging)?,
            render: build_render_settings(raw.render)?,
            output: build_output_settings(raw.output)?,
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_render_settings(render: RawRenderSettings) -> Result<RenderSettings, LoadError> {
    let program = render
        .program
        .unwrap_or_else(|| PathBuf::from(DEFAULT_RENDER_PROGRAM));
    if program.as_os_str().is_empty() {
        return Err(LoadError::invalid("render.program", "must not be empty"));
    }

    let args = render
        .args
        .unwrap_or_else(|| DEFAULT_RENDER_ARGS.iter().map(|arg| arg.to_string()).collect());

    let format = non_empty(render.format, "render.format")?
        .unwrap_or_else(|| DEFAULT_RENDER_FORMAT.to_string());
    if !format.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(LoadError::invalid(
            "render.format",
            "must be a plain file extension such as `svg` or `png`",
        ));
    }

    let workspace_dir = render.workspace_dir.unwrap_or_else(env::temp_dir);

    let env = render
        .env
        .unwrap_or_default()
        .iter()
        .map(|pair| parse_env_pair(pair))
        .collect::<Result<BTreeMap<_, _>, _>>()?;

    Ok(RenderSettings {
        program,
        args,
        format: format.to_ascii_lowercase(),
        working_dir: render.working_dir,
        workspace_dir,
        env,
    })
}

fn build_output_settings(output: RawOutputSettings) -> Result<OutputSettings, LoadError> {
    let default_title = non_empty(output.default_title, "output.default_title")?
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());
    let workbench_url = non_empty(output.workbench_url, "output.workbench_url")?
        .unwrap_or_else(|| DEFAULT_WORKBENCH_URL.to_string());

    let layout = match output.layout {
        Some(layout) => PageLayout::from_str(&layout)
            .map_err(|err| LoadError::invalid("output.layout", err.to_string()))?,
        None => PageLayout::Article,
    };

    Ok(OutputSettings {
        default_title,
        workbench_url,
        highlight: output.highlight.unwrap_or(false),
        layout,
    })
}

fn non_empty(value: Option<String>, key: &'static str) -> Result<Option<String>, LoadError> {
    match value {
        Some(value) if value.trim().is_empty() => {
            Err(LoadError::invalid(key, "must not be empty"))
        }
        Some(value) => Ok(Some(value.trim().to_string())),
        None => Ok(None),
    }
}

fn parse_env_pair(pair: &str) -> Result<(String, String), LoadError> {
    match pair.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(LoadError::invalid(
            "render.env",
            format!("expected KEY=VALUE, got `{pair}`"),
        )),
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRenderSettings {
    program: Option<PathBuf>,
    args: Option<Vec<String>>,
    format: Option<String>,
    working_dir: Option<PathBuf>,
    workspace_dir: Option<PathBuf>,
    env: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawOutputSettings {
    default_title: Option<String>,
    workbench_url: Option<String>,
    highlight: Option<bool>,
    layout: Option<String>,
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}
