use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use team_dashboard::config::{CliConfig, Config};
use team_dashboard::logging;
use team_dashboard::metrics::resolver::Strategy;
use team_dashboard::Dashboard;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Use specific config file
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Header matching strategy (default: keyword)
    #[arg(long, value_enum, global = true)]
    strategy: Option<Strategy>,

    /// Enable verbose logging
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Suppress all logging
    #[arg(short = 'q', long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the teams that can be selected
    Teams {
        /// Metrics workbook (.xlsx)
        file: PathBuf,
    },

    /// Print the metrics overview of one team
    Table {
        /// Metrics workbook (.xlsx)
        file: PathBuf,

        /// Team to show
        #[arg(short = 't', long)]
        team: String,
    },

    /// Write the PDF dashboard of one team
    Report {
        /// Metrics workbook (.xlsx)
        file: PathBuf,

        /// Team to export
        #[arg(short = 't', long)]
        team: String,

        /// Directory the report is written to (default: current directory)
        #[arg(short = 'o', long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Also write an SVG preview next to the PDF
        #[arg(long)]
        svg: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn cli_to_config(cli: &Cli) -> CliConfig {
    let output_dir = match &cli.command {
        Commands::Report { output_dir, .. } => output_dir.clone(),
        _ => None,
    };
    CliConfig {
        strategy: cli.strategy,
        output_dir,
        verbose: cli.verbose,
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::load_from_standard_locations(),
    };
    config.merge_with_cli(&cli_to_config(cli));
    Ok(config)
}

fn run(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    logging::init_logger(config.verbose.unwrap_or(false), cli.quiet);
    logging::log_config_info(&config);

    match &cli.command {
        Commands::Teams { file } => {
            let dashboard = Dashboard::load(file, &config)?;
            for team in dashboard.teams() {
                println!("{team}");
            }
        }
        Commands::Table { file, team } => {
            let dashboard = Dashboard::load(file, &config)?;
            let table = dashboard.table(team)?;
            println!("{} - Metrics Overview", table.team());
            print!("{table}");
        }
        Commands::Report { file, team, svg, .. } => {
            let dashboard = Dashboard::load(file, &config)?;
            let report = dashboard.select(team)?;
            let output_dir = config.output_dir();
            let path = report.save(&output_dir)?;
            println!("{}", path.display());

            if *svg {
                let svg_path = path.with_extension("svg");
                std::fs::write(&svg_path, report.svg()?)
                    .with_context(|| format!("Cannot write SVG preview '{}'", svg_path.display()))?;
                println!("{}", svg_path.display());
            }
        }
    }
    Ok(())
}
