//! Analyze command implementation.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use chrono::Local;
use clap::ValueEnum;
use treasury_charts::{ChartContext, ChartRenderer, ChartRunner, JsonChartWriter, PngChartRenderer};
use treasury_core::{CompanyConfig, Date, RecordTable, analyze, frame, prepare};
use treasury_upload::{S3ObjectStore, UploadConfig, UploadReport, Uploader};

use super::{print_header, upload::print_upload_report};
use crate::data;

/// Artifact format for chart files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum ChartFormat {
    /// PNG images.
    #[default]
    Png,
    /// JSON chart documents.
    Json,
}

impl ChartFormat {
    fn renderer(self) -> Box<dyn ChartRenderer> {
        match self {
            Self::Png => Box::new(PngChartRenderer::default()),
            Self::Json => Box::new(JsonChartWriter),
        }
    }
}

/// Options for one analysis run.
#[derive(Debug)]
pub(crate) struct AnalyzeOptions {
    /// Parent directory of the company's artifact directory.
    pub(crate) output_dir: PathBuf,
    /// Subtitle date; today when unset.
    pub(crate) as_of: Option<Date>,
    /// Chart artifact format.
    pub(crate) format: ChartFormat,
    /// Upload artifacts after writing them.
    pub(crate) upload: bool,
    /// Treat any upload problem as an error.
    pub(crate) fail_on_upload_error: bool,
}

/// Run the full pipeline for one company.
pub(crate) async fn run_analysis(company: &CompanyConfig, options: &AnalyzeOptions) -> Result<()> {
    print_header(&format!("{} Analysis", company.name));

    // Only a failed load is fatal; everything after it degrades per step
    let table = data::load_table(company).await?;
    println!("Loaded {} records\n", table.len());

    let report = analyze(&company.name, &table, &company.charts);
    println!("{report}");

    let dir = options.output_dir.join(company.slug());
    std::fs::create_dir_all(&dir)?;

    println!("━━━ Charts ━━━\n");
    let as_of = options.as_of.unwrap_or_else(|| Local::now().date_naive());
    let ctx = ChartContext::new(company, &table, as_of);
    let runner = ChartRunner::new(options.format.renderer(), &dir);
    let outcomes = runner.run(&ctx);
    for outcome in &outcomes {
        match &outcome.result {
            Ok(path) => println!("  ✓ {:32} {}", outcome.kind.name(), path.display()),
            Err(e) => println!("  ✗ {:32} {e}", outcome.kind.name()),
        }
    }
    let written = outcomes.iter().filter(|o| o.is_success()).count();
    println!("\n{written}/{} charts written\n", outcomes.len());

    let csv_path = dir.join(company.metrics_file_name());
    match write_metrics(company, &table, &csv_path) {
        Ok(()) => println!("Metrics:  {}\n", csv_path.display()),
        Err(e) => {
            tracing::warn!(path = %csv_path.display(), error = %e, "metric table not written");
            println!("Metrics:  not written ({e})\n");
        }
    }

    if options.upload {
        println!("━━━ Upload ━━━\n");
        let extension = runner.renderer().extension();
        let outcome = upload_charts(company, &dir, extension).await;
        settle_upload(outcome, options.fail_on_upload_error)?;
    }

    Ok(())
}

fn write_metrics(company: &CompanyConfig, table: &RecordTable, path: &Path) -> Result<()> {
    let prepared = prepare(table, &company.charts);
    let mut df = frame::metric_frame(&prepared, &company.charts.nav_reference_levels)?;
    frame::write_csv(&mut df, path)?;
    Ok(())
}

async fn upload_charts(
    company: &CompanyConfig,
    dir: &Path,
    extension: &str,
) -> Result<UploadReport> {
    let config = UploadConfig::from_env()?;
    let store = S3ObjectStore::from_config(&config).await;
    let uploader = Uploader::new(store, config, extension);
    Ok(uploader.upload_company_charts(dir, &company.id).await?)
}

/// Decide whether an upload outcome fails the run.
///
/// Without `fail_on_upload_error` neither a setup error (no bucket, missing
/// directory) nor failed files stop the run: the analysis artifacts are
/// already on disk.
fn settle_upload(outcome: Result<UploadReport>, fail_on_upload_error: bool) -> Result<()> {
    match outcome {
        Ok(report) => {
            print_upload_report(&report);
            if fail_on_upload_error && report.has_failures() {
                bail!("{} uploads failed", report.failure_count());
            }
            Ok(())
        }
        Err(e) if fail_on_upload_error => Err(e.context("S3 upload failed")),
        Err(e) => {
            tracing::warn!(error = %e, "S3 upload skipped");
            println!("S3 upload skipped: {e:#}\n");
            Ok(())
        }
    }
}
