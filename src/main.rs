use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use sheet_consolidator::error::Scope;
use sheet_consolidator::io::config;
use sheet_consolidator::io::excel_read::Workbook;
use sheet_consolidator::model::{RunConfig, SourceMapping};
use sheet_consolidator::run::{Consolidator, RunSummary};
use sheet_consolidator::{ConsolidateError, Result, logging};

fn main() {
    let cli = Cli::parse();
    if let Err(error) = logging::init(&cli.log_level).and_then(|()| run(cli)) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run(args) => execute_run(args),
        Command::Check(args) => execute_check(args),
        Command::Sheets(args) => execute_sheets(args),
        Command::Init(args) => execute_init(args),
    }
}

fn execute_run(args: RunArgs) -> Result<()> {
    let run_config = config::load(&args.config)?;
    let summary =
        Consolidator::new().run(&run_config, base_dir(&args.config), args.output.as_deref())?;

    let output = summary
        .output
        .as_deref()
        .map(|path| path.display().to_string())
        .unwrap_or_default();
    println!(
        "Consolidated {} row(s) from {} source(s) into {output}",
        summary.row_count,
        summary.sources.len()
    );
    Ok(())
}

fn execute_check(args: CheckArgs) -> Result<()> {
    let run_config = config::load(&args.config)?;
    let summary = Consolidator::new().check(&run_config, base_dir(&args.config))?;
    print_summary(&summary);
    Ok(())
}

fn execute_sheets(args: SheetsArgs) -> Result<()> {
    if !args.input.exists() {
        return Err(ConsolidateError::MissingInput(args.input));
    }
    let workbook = Workbook::open(&args.input)?;
    for name in workbook.sheet_names() {
        println!("{name}");
    }
    Ok(())
}

fn execute_init(args: InitArgs) -> Result<()> {
    if args.config.exists() && !args.force {
        return Err(ConsolidateError::Configuration {
            scope: Scope::Run,
            message: format!(
                "{} already exists; pass --force to overwrite it",
                args.config.display()
            ),
        });
    }

    let base = base_dir(&args.config);
    let sources = args
        .source
        .iter()
        .map(|path| {
            let mut mapping = SourceMapping::new(path.clone());
            // Preselect the first sheet when the workbook can already be read.
            if let Ok(workbook) = Workbook::open(&base.join(path)) {
                if let Some(first) = workbook.sheet_names().first() {
                    mapping.source_sheet = first.to_string();
                }
            }
            mapping
        })
        .collect();

    let run_config = RunConfig::new(args.output_file, sources);
    config::save(&args.config, &run_config)?;
    println!(
        "Wrote {} with {} source block(s)",
        args.config.display(),
        run_config.sources.len()
    );
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    for source in &summary.sources {
        println!(
            "source {}: {} [{}] {} row(s) from value {}x{} entity={} department={} date={}",
            source.position,
            source.source_file,
            source.sheet,
            source.rows,
            source.value_rows,
            source.value_cols,
            source.entity,
            source.department,
            source.date
        );
    }
    println!("{} row(s) would be written", summary.row_count);
}

/// Directory that relative paths in a configuration file resolve against.
fn base_dir(config_path: &Path) -> &Path {
    config_path.parent().unwrap_or(Path::new(""))
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Consolidate ranges from several workbooks into one normalized table."
)]
struct Cli {
    /// Default log level; RUST_LOG takes precedence.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Consolidate every configured source and write the output workbook.
    Run(RunArgs),
    /// Validate the configuration and report shapes without writing output.
    Check(CheckArgs),
    /// List the sheet names of a workbook.
    Sheets(SheetsArgs),
    /// Write a skeleton configuration file.
    Init(InitArgs),
}

#[derive(clap::Args)]
struct RunArgs {
    /// Run configuration file.
    #[arg(long)]
    config: PathBuf,

    /// Output workbook path, overriding the configured file name.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(clap::Args)]
struct CheckArgs {
    /// Run configuration file.
    #[arg(long)]
    config: PathBuf,
}

#[derive(clap::Args)]
struct SheetsArgs {
    /// Workbook to inspect.
    #[arg(long)]
    input: PathBuf,
}

#[derive(clap::Args)]
struct InitArgs {
    /// Configuration file to create.
    #[arg(long)]
    config: PathBuf,

    /// Output workbook file name recorded in the configuration.
    #[arg(long, default_value = "consolidated.xlsx")]
    output_file: String,

    /// Source workbook path; repeat for several sources.
    #[arg(long)]
    source: Vec<String>,

    /// Overwrite an existing configuration file.
    #[arg(long)]
    force: bool,
}
