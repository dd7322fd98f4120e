// Command-line entry point for ctorprops.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use ctorprops::api::{start_server, ServerState};
use ctorprops::application::{analyzers_from, FixUsecase, Mode, Summary};
use ctorprops::config::Config;
use ctorprops::domain::fix::MemberPolicy;
use ctorprops::infrastructure::concurrency::init_thread_pool;
use ctorprops::infrastructure::{CSharpParser, JsonExporter, ProjectLoader, TextExporter, TextTarget};
use ctorprops::ports::OutcomeExporter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Expose C# constructor parameters as get-only properties", long_about = None)]
struct Cli {
    /// Input source file path (can specify multiple)
    #[arg(short, long)]
    input: Vec<PathBuf>,

    /// Input source folder(s), searched recursively
    #[arg(short = 'd', long)]
    folder: Vec<PathBuf>,

    /// What to do with the sources
    #[arg(short, long, value_enum, default_value_t = Mode::Analyze)]
    mode: Mode,

    /// Overwrite input files with the fixed sources (fix mode)
    #[arg(short, long, conflicts_with = "out_dir")]
    write: bool,

    /// Write fixed sources below this directory instead of stdout (fix mode)
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// How to treat members that already use a synthesized name (overrides the config file)
    #[arg(long, value_enum)]
    member_policy: Option<MemberPolicy>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// JSON report path (json format); stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Config file; defaults to ./ctorprops.toml when present
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Worker threads (default: half the cores)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Serve the JSON API on 127.0.0.1:<PORT> instead of processing files
    #[arg(long, value_name = "PORT")]
    serve: Option<u16>,

    /// More logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Errors only
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn init_tracing(verbose: u8, quiet: bool) {
    let default = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        _ => "trace",
    };
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::builder().parse_lossy(default)
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    let cwd = std::env::current_dir().context("Cannot determine the working directory")?;
    let config = Config::discover(cli.config.as_deref(), &cwd)?;
    let mut options = config.fix_options();
    if let Some(policy) = cli.member_policy {
        options.member_policy = policy;
    }
    let analyzers = analyzers_from(&config.analyzers, &options);

    if let Some(port) = cli.serve {
        start_server(port, ServerState::new(analyzers, options))?;
        return Ok(ExitCode::SUCCESS);
    }

    if cli.input.is_empty() && cli.folder.is_empty() {
        anyhow::bail!("Please provide at least one --input <file> or --folder <dir>");
    }
    if cli.format == Format::Json && (cli.write || cli.out_dir.is_some()) {
        anyhow::bail!("--write and --out-dir only apply to text output");
    }

    init_thread_pool(cli.jobs)?;

    let files = ProjectLoader::new(&config.input).load(&cli.input, &cli.folder)?;
    let usecase = FixUsecase {
        parser: &CSharpParser,
        analyzers: &analyzers,
        options,
        mode: cli.mode,
    };
    let outcomes = usecase.run(&files);

    let exporter: Box<dyn OutcomeExporter> = match cli.format {
        Format::Json => Box::new(JsonExporter {
            mode: cli.mode,
            output: cli.output,
        }),
        Format::Text => {
            let target = match (cli.write, cli.out_dir) {
                (true, _) => TextTarget::InPlace,
                (false, Some(dir)) => TextTarget::Directory(dir),
                (false, None) => TextTarget::Stdout,
            };
            Box::new(TextExporter {
                mode: cli.mode,
                target,
            })
        }
    };
    exporter.export(&outcomes)?;

    let summary = Summary::of(&outcomes);
    if summary.failed > 0 {
        return Ok(ExitCode::from(2));
    }
    if cli.mode == Mode::Check && summary.changed > 0 {
        return Ok(ExitCode::from(1));
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}
