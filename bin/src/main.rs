//! Treasury CLI binary.
//!
//! Runs the bitcoin treasury analysis pipeline for one company: load the
//! record table, clean and fit it, compute NAV metrics, write chart
//! artifacts and the metric CSV, and optionally upload the artifacts.

mod cmd;
mod data;
mod logging;

use std::{path::PathBuf, process};

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "treasury")]
#[command(about = "Bitcoin treasury power-law and NAV analysis", long_about = None)]
#[command(version)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Log format (pretty, json)
    #[arg(long, global = true, default_value = "pretty")]
    log_format: String,

    /// JSON file of company configurations, replacing the built-in presets
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List configured companies
    List {
        /// Show chart parameters
        #[arg(short, long)]
        verbose: bool,
    },

    /// Analyse a company and write its artifacts
    Analyze {
        /// Company identifier (e.g. H100, BLGV)
        company: String,

        /// Directory receiving one subdirectory of artifacts per company
        #[arg(short, long, default_value = "output")]
        output_dir: PathBuf,

        /// Date shown in chart subtitles (YYYY-MM-DD), defaults to today
        #[arg(long)]
        as_of: Option<String>,

        /// Chart artifact format
        #[arg(short, long, value_enum, default_value_t = cmd::analyze::ChartFormat::Png)]
        format: cmd::analyze::ChartFormat,

        /// Upload the chart artifacts after writing them
        #[arg(long)]
        upload: bool,

        /// Exit with an error if the upload cannot run or any file fails
        #[arg(long, requires = "upload")]
        fail_on_upload_error: bool,
    },

    /// Upload previously written artifacts
    Upload {
        /// Artifact directory, or the parent of per-company directories
        dir: PathBuf,

        /// Company identifier; without it every subdirectory is uploaded
        #[arg(short, long)]
        company: Option<String>,

        /// Artifact file extension
        #[arg(short, long, default_value = "png")]
        extension: String,

        /// Exit with an error if any upload fails
        #[arg(long)]
        fail_on_upload_error: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    // .env may carry RUST_LOG as well as credentials
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    logging::init_logging(&cli.log_level, &cli.log_format);

    let companies = cmd::companies(cli.config.as_deref())?;

    match cli.command {
        Commands::List { verbose } => {
            cmd::list::list_companies(&companies, verbose);
        }
        Commands::Analyze {
            company,
            output_dir,
            as_of,
            format,
            upload,
            fail_on_upload_error,
        } => {
            let company = cmd::find_company(&companies, &company)?;
            let options = cmd::analyze::AnalyzeOptions {
                output_dir,
                as_of: as_of.as_deref().map(treasury_core::parse_date).transpose()?,
                format,
                upload,
                fail_on_upload_error,
            };
            cmd::analyze::run_analysis(company, &options).await?;
        }
        Commands::Upload {
            dir,
            company,
            extension,
            fail_on_upload_error,
        } => {
            let company = company
                .map(|id| cmd::find_company(&companies, &id).map(|c| c.id.clone()))
                .transpose()?;
            let company = company.as_deref();
            cmd::upload::upload_artifacts(&dir, company, &extension, fail_on_upload_error).await?;
        }
    }

    Ok(())
}
