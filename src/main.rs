//! pipelint CLI - validate a pipeline description file.

use anyhow::Context;
use clap::Parser;
use pipelint::core::config::ValidatorConfig;
use pipelint::report::{self, LevelSelection};
use pipelint::validation::engine::Validator;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    name = "pipelint",
    version,
    about = "Validate RDF pipeline descriptions",
    after_help = "The report is printed to stdout grouped by subject. When stdout is not a \
                  terminal, a JSON array of the reported issues follows it on the last line."
)]
struct Args {
    /// Turtle document to validate
    file: PathBuf,

    /// Only validate this pipeline
    #[arg(short = 'p', long = "pipeline", value_name = "IRI")]
    pipeline: Option<String>,

    /// Do not report warnings
    #[arg(short, long)]
    quiet: bool,

    /// Also report info findings
    #[arg(short, long)]
    verbose: bool,

    /// Fail on warnings as well as errors
    #[arg(short, long)]
    strict: bool,

    /// Debug logging
    #[arg(short, long)]
    debug: bool,

    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    let mut logger = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if args.debug {
        logger.filter_level(log::LevelFilter::Debug);
    }
    logger.init();

    let validator = match &args.config {
        Some(path) => Validator::from_config_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => Validator::new(ValidatorConfig::default()),
    };
    log::debug!("configuration: {:?}", validator.config());

    let run = validator.validate_path(&args.file, args.pipeline.as_deref()).await;
    log::debug!("run statistics: {:?}", run.stats);

    let selection = LevelSelection::from_flags(args.quiet, args.verbose);
    let reported = selection.select(&run.issues);

    print!("{}", report::render_text(&reported));
    if std::io::stdout().is_terminal() {
        println!("{}", report::summary(&run.issues));
    } else {
        println!("{}", report::render_json(&reported)?);
    }

    Ok(if report::is_failure(&run.issues, args.strict) {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
