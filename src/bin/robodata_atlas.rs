use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use robodata_atlas::app::Atlas;
use robodata_atlas::config::ConfigLoader;
use robodata_atlas::domain::DuplicateIdPolicy;
use robodata_atlas::error::AtlasError;
use robodata_atlas::output::{JsonOutput, OutputMode, TextOutput};
use robodata_atlas::session::default_navigator;
use robodata_atlas::tui::Tui;

#[derive(Parser)]
#[command(name = "robodata-atlas")]
#[command(about = "Browsable, filterable atlas of robotics datasets")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    non_interactive: bool,

    /// Config file (defaults to ./robodata-atlas.json, then the user config dir)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Dataset source (.json or tab-separated, optionally .gz); overrides the config
    #[arg(long, global = true)]
    source: Option<String>,

    /// How repeated dataset ids are resolved; overrides the config
    #[arg(long, global = true, value_enum)]
    duplicate_ids: Option<DuplicateIdPolicy>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Print the filtered atlas graph as JSON")]
    Graph(FilterArgs),
    #[command(about = "List the filtered datasets")]
    Table(FilterArgs),
    #[command(about = "List the robots and environments available for filtering")]
    Options,
    #[command(about = "Count datasets shown by a filter")]
    Summary(FilterArgs),
    #[command(about = "Show the detail of a dataset node")]
    Show(ShowArgs),
    #[command(about = "Write the normalized datasets as a JSON array")]
    Normalize(NormalizeArgs),
}

#[derive(Args, Clone)]
struct FilterArgs {
    /// Robot hardware to include (repeatable; default: all)
    #[arg(long = "robot")]
    robots: Vec<String>,

    /// Environment / scene to include (repeatable; default: all)
    #[arg(long = "env")]
    environments: Vec<String>,
}

#[derive(Args)]
struct ShowArgs {
    node_id: String,

    /// Open the dataset URL
    #[arg(long)]
    open: bool,
}

#[derive(Args)]
struct NormalizeArgs {
    #[arg(long, short)]
    output: Utf8PathBuf,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(atlas) = report.downcast_ref::<AtlasError>() {
            return ExitCode::from(map_exit_code(atlas));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &AtlasError) -> u8 {
    match error {
        AtlasError::DatasetNotFound(_) | AtlasError::MissingUrl(_) => 2,
        AtlasError::MissingConfig(_) | AtlasError::ConfigRead(_) | AtlasError::ConfigParse(_) => {
            2
        }
        AtlasError::Navigation(_) => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };

    let mut config = ConfigLoader::resolve(cli.config.as_deref())?;
    if let Some(source) = cli.source.as_deref() {
        config = config.with_source(source)?;
    }
    if let Some(policy) = cli.duplicate_ids {
        config.duplicate_ids = policy;
    }
    let mut atlas = Atlas::new(config, default_navigator());

    match cli.command {
        Some(Commands::Graph(args)) => {
            let selection = atlas.select(&args.robots, &args.environments)?;
            let document = atlas.graph(&selection)?;
            JsonOutput::print_graph(&document).into_diagnostic()
        }
        Some(Commands::Table(args)) => {
            let selection = atlas.select(&args.robots, &args.environments)?;
            let rows = atlas.table(&selection)?;
            match output_mode {
                OutputMode::NonInteractive => JsonOutput::print_table(&rows),
                OutputMode::Interactive => TextOutput::print_table(&rows),
            }
            .into_diagnostic()
        }
        Some(Commands::Options) => {
            let options = atlas.options()?;
            match output_mode {
                OutputMode::NonInteractive => JsonOutput::print_options(&options),
                OutputMode::Interactive => TextOutput::print_options(&options),
            }
            .into_diagnostic()
        }
        Some(Commands::Summary(args)) => {
            let selection = atlas.select(&args.robots, &args.environments)?;
            let summary = atlas.summary(&selection)?;
            match output_mode {
                OutputMode::NonInteractive => JsonOutput::print_summary(&summary),
                OutputMode::Interactive => TextOutput::print_summary(&summary),
            }
            .into_diagnostic()
        }
        Some(Commands::Show(args)) => {
            let detail = atlas.detail(&args.node_id)?;
            match output_mode {
                OutputMode::NonInteractive => JsonOutput::print_detail(&detail),
                OutputMode::Interactive => TextOutput::print_detail(&detail),
            }
            .into_diagnostic()?;
            if args.open {
                atlas.open(&args.node_id)?;
            }
            Ok(())
        }
        Some(Commands::Normalize(args)) => {
            let result = atlas.normalize(&args.output)?;
            JsonOutput::print_normalize(&result).into_diagnostic()
        }
        None => match output_mode {
            OutputMode::Interactive => Tui::new().run(&mut atlas),
            OutputMode::NonInteractive => Err(miette::Report::msg(
                "command required (try `robodata-atlas --help`)",
            )),
        },
    }
}
