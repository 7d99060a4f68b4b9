use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::builder::BoolishValueParser;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;

use apk_select::artifact::error::SelectError;
use apk_select::artifact::load_resolver;
use apk_select::artifact::resolver::{ArtifactResolver, SelectionResult};
use apk_select::artifact::source::{CandidateSource, JsonFileSource, LineListSource};
use apk_select::config::{
    ENV_CANDIDATES, ENV_NEW_REF, ENV_OLD_REF, ENV_OUTPUT, ENV_STRICT_PATHS, ENV_UPGRADE,
    ENV_VARIANT_TAGS, SelectionConfig, parse_variant_tags,
};
use apk_select::logging::{LoggingOptions, init_logging};
use apk_select::output::{FileSink, StdoutSink, emit_result};

#[derive(Parser)]
#[command(name = "apk-select")]
#[command(version, about = "Select APK build artifacts for CI test runs")]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    select: SelectArgs,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Log as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve the new (and old) build and emit the outputs (default)
    Select(SelectArgs),
    /// Print parsed candidates in version order
    List(InputArgs),
}

#[derive(Args)]
struct InputArgs {
    /// Candidate listing file, `-` for stdin
    #[arg(long, env = ENV_CANDIDATES)]
    candidates: Option<PathBuf>,

    /// Listing format; defaults to json for `.json` files, lines otherwise
    #[arg(long, value_enum)]
    format: Option<ListFormat>,

    /// Comma-separated variant tags accepted after the version
    #[arg(long, env = ENV_VARIANT_TAGS)]
    variant_tags: Option<String>,

    /// JSON file with selection settings; flags and env vars override it
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args)]
struct SelectArgs {
    #[command(flatten)]
    input: InputArgs,

    /// New build: path, file name, `latest`, or a token contained in the file name
    #[arg(long = "new", env = ENV_NEW_REF)]
    target: Option<String>,

    /// Also resolve an old build for upgrade testing
    #[arg(
        long,
        env = ENV_UPGRADE,
        value_parser = BoolishValueParser::new(),
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    upgrade: Option<bool>,

    /// Old build reference; defaults to the second latest version
    #[arg(long = "old", env = ENV_OLD_REF)]
    old_reference: Option<String>,

    /// Reject exact paths that are not in the listing
    #[arg(
        long,
        env = ENV_STRICT_PATHS,
        value_parser = BoolishValueParser::new(),
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    strict_paths: Option<bool>,

    /// Append `key=value` lines to this file instead of stdout
    #[arg(long, env = ENV_OUTPUT)]
    output: Option<PathBuf>,

    /// Print the outputs as a JSON object on stdout
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, ValueEnum)]
enum ListFormat {
    Json,
    Lines,
}

impl ListFormat {
    fn detect(path: &Path) -> Self {
        match path.extension() {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ListFormat::Json,
            _ => ListFormat::Lines,
        }
    }
}

impl InputArgs {
    fn candidates_path(&self) -> anyhow::Result<&Path> {
        self.candidates.as_deref().with_context(|| {
            format!("No candidate listing given, pass --candidates or set {ENV_CANDIDATES}")
        })
    }
}

impl Cli {
    fn logging_options(&self) -> LoggingOptions {
        LoggingOptions {
            verbosity: self.verbose,
            json: self.log_json,
            file: self.log_file.clone(),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let _guard = match init_logging(&cli.logging_options()) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("error: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        None => run_select(&cli.select),
        Some(Command::Select(args)) => run_select(&args),
        Some(Command::List(input)) => run_list(&input),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}

/// Selection errors keep their own status; anything else is a generic failure
fn exit_code(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<SelectError>()
        .map_or(1, SelectError::exit_code)
}

fn run_select(args: &SelectArgs) -> anyhow::Result<()> {
    let config = select_config(args)?;
    let resolver = load_candidates(&args.input, &config)?;

    let result = resolver.select(&config.request())?;

    let mut stdout = std::io::stdout().lock();
    write_outputs(&result, args.output.as_deref(), args.json, &mut stdout)?;

    info!(
        new = %result.new.name,
        old = result.old.as_ref().map(|c| c.name.as_str()).unwrap_or(""),
        "Selection written"
    );
    Ok(())
}

/// Write the file sink first so a failed write leaves stdout untouched
fn write_outputs<W: Write>(
    result: &SelectionResult,
    output: Option<&Path>,
    json: bool,
    stdout: &mut W,
) -> anyhow::Result<()> {
    let rendered_json = if json {
        Some(serde_json::to_string_pretty(&result.outputs())?)
    } else {
        None
    };

    match output {
        Some(path) => emit_result(&mut FileSink::new(path), result)
            .with_context(|| format!("Failed to write outputs to {}", path.display()))?,
        None if !json => emit_result(&mut StdoutSink, result)?,
        None => {}
    }

    if let Some(rendered) = rendered_json {
        writeln!(stdout, "{rendered}")?;
        stdout.flush()?;
    }
    Ok(())
}

fn run_list(input: &InputArgs) -> anyhow::Result<()> {
    let config = base_config(input)?;
    let resolver = load_candidates(input, &config)?;
    let naming = resolver.naming();

    let mut stdout = std::io::stdout().lock();
    for (candidate, version) in resolver.ordered() {
        let scheme = naming
            .scheme(&candidate.basename)
            .map_or("-", |s| s.as_str());
        writeln!(
            stdout,
            "{}\t{}\t{}\t{}",
            resolver.label(candidate),
            version,
            scheme,
            candidate.name
        )?;
    }
    for candidate in resolver.candidates() {
        if naming.parse(&candidate.basename).is_none() {
            writeln!(stdout, "-\t-\t-\t{}", candidate.name)?;
        }
    }
    Ok(())
}

/// Config file (if any) plus input-level overrides
fn base_config(input: &InputArgs) -> anyhow::Result<SelectionConfig> {
    let mut config = match &input.config {
        Some(path) => SelectionConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => SelectionConfig::default(),
    };
    if let Some(tags) = &input.variant_tags {
        config.variant_tags = parse_variant_tags(tags);
    }
    Ok(config)
}

fn select_config(args: &SelectArgs) -> anyhow::Result<SelectionConfig> {
    let mut config = base_config(&args.input)?;
    if let Some(target) = &args.target {
        config.target = target.clone();
    }
    if args.old_reference.is_some() {
        config.old_reference = args.old_reference.clone();
    }
    if let Some(upgrade) = args.upgrade {
        config.upgrade = upgrade;
    }
    if let Some(strict_paths) = args.strict_paths {
        config.strict_paths = strict_paths;
    }
    Ok(config)
}

fn load_candidates(
    input: &InputArgs,
    config: &SelectionConfig,
) -> anyhow::Result<ArtifactResolver> {
    let naming = config.naming().context("Invalid variant tags")?;
    let path = input.candidates_path()?;
    let format = input.format.unwrap_or_else(|| ListFormat::detect(path));

    let source: Box<dyn CandidateSource> = match format {
        ListFormat::Json => Box::new(JsonFileSource::new(path)),
        ListFormat::Lines => Box::new(LineListSource::new(path)),
    };

    let resolver = load_resolver(source.as_ref(), naming)
        .with_context(|| format!("Failed to load candidates from {}", path.display()))?;
    Ok(resolver.strict_paths(config.strict_paths))
}
