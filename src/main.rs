use std::{fs, path::Path, process, sync::Arc};

use patternbook::{
    application::{
        error::AppError,
        render::{
            BuildOutput, CliPatternRenderer, ClassifiedDocument, ComrakMarkdown, Pipeline,
            PipelineOptions,
        },
    },
    config::{self, BlocksArgs, BuildArgs, Settings},
    domain::{blocks::PatternTypeTable, metadata::PatternSource},
    infra::{
        error::InfraError,
        telemetry,
        workspace::{OutputLocation, write_failure_manifest},
    },
    presentation::views::AskamaTemplater,
};
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

const EXIT_FAILURE: i32 = 1;
const EXIT_BLOCKS_FAILED: i32 = 2;

/// How a successful run ended.
enum Outcome {
    Clean,
    /// Some pattern blocks failed and `--strict` was requested.
    BlocksFailed,
}

fn main() {
    match run() {
        Ok(Outcome::Clean) => {}
        Ok(Outcome::BlocksFailed) => process::exit(EXIT_BLOCKS_FAILED),
        Err(error) => {
            report_application_error(&error);
            process::exit(EXIT_FAILURE);
        }
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_max_level(Level::ERROR)
        .with_writer(std::io::stderr)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

fn run() -> Result<Outcome, AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match cli_args.command {
        config::Command::Build(args) => run_build(&settings, &args),
        config::Command::Blocks(args) => run_blocks(&settings, &args),
    }
}

fn run_build(settings: &Settings, args: &BuildArgs) -> Result<Outcome, AppError> {
    let text = read_input(&args.input)?;
    let location = OutputLocation::for_document(&args.output)?;
    location.ensure_output_dir()?;

    let pipeline = build_pipeline(settings);
    let options = PipelineOptions {
        document_name: location.document_name.clone(),
        output_dir: location.output_dir.clone(),
        workspace_dir: settings.render.workspace_dir.clone(),
        format: settings.render.format.clone(),
        default_title: settings.output.default_title.clone(),
        layout: settings.output.layout,
        highlight: settings.output.highlight,
    };

    let output = pipeline.run(&text, &options)?;
    location.write_document(&output.document)?;

    if let Some(path) = args.failure_manifest.as_ref() {
        let json = output
            .failures
            .to_json()
            .map_err(|err| AppError::unexpected(format!("failed to encode failures: {err}")))?;
        write_failure_manifest(path, &json)?;
    }

    report_build(&location, &output);

    if args.strict && !output.failures.is_empty() {
        Ok(Outcome::BlocksFailed)
    } else {
        Ok(Outcome::Clean)
    }
}

fn report_build(location: &OutputLocation, output: &BuildOutput) {
    let document = location.document_path.display().to_string();
    let result = if output.failures.is_empty() {
        "ok"
    } else {
        "partial"
    };
    info!(
        target = "patternbook::build",
        op = "build",
        result,
        document = %document,
        title = %output.title,
        blocks = output.block_count,
        patterns = output.artifacts.len(),
        failed = output.failures.len(),
        "Document written"
    );
    eprintln!("{}", output.failures.summary(&document));
}

fn run_blocks(settings: &Settings, args: &BlocksArgs) -> Result<Outcome, AppError> {
    let text = read_input(&args.input)?;
    let classified = build_pipeline(settings).classify(&text);
    print!("{}", describe_blocks(&classified));
    Ok(Outcome::Clean)
}

/// One tab-separated line per block: index, kind, tag, title, tags.
fn describe_blocks(classified: &ClassifiedDocument) -> String {
    let mut listing = String::new();
    for block in &classified.blocks {
        let line = match block.pattern_tag() {
            Some(tag) => {
                let metadata = PatternSource::extract(&block.body).metadata;
                format!(
                    "{}\tpattern\t{}\t{}\t{}",
                    block.sequence_index,
                    tag,
                    metadata.title,
                    metadata.tags_joined()
                )
            }
            None => format!("{}\tprose\t-\t-\t", block.sequence_index),
        };
        listing.push_str(line.trim_end());
        listing.push('\n');
    }
    listing
}

fn build_pipeline(settings: &Settings) -> Pipeline {
    let render = &settings.render;
    let renderer = CliPatternRenderer::new(render.program.clone())
        .with_args(render.args.iter().cloned())
        .with_working_dir(render.working_dir.clone())
        .with_env(render.env.clone());
    let templater =
        AskamaTemplater::new(settings.output.layout, settings.output.workbench_url.clone());

    Pipeline::new(
        PatternTypeTable::default(),
        Arc::new(renderer),
        Arc::new(ComrakMarkdown::new()),
        Arc::new(templater),
    )
}

fn read_input(path: &Path) -> Result<String, AppError> {
    fs::read_to_string(path)
        .map_err(|err| InfraError::read(path, err))
        .map_err(AppError::from)
}
