//! Upload command implementation.

use std::path::Path;

use anyhow::{Result, bail};
use treasury_upload::{S3ObjectStore, UploadConfig, UploadReport, Uploader};

use super::print_header;

/// Upload one company's directory, or every company directory under `dir`.
pub(crate) async fn upload_artifacts(
    dir: &Path,
    company: Option<&str>,
    extension: &str,
    fail_on_upload_error: bool,
) -> Result<()> {
    print_header("Artifact Upload");

    let config = UploadConfig::from_env()?;
    println!("Bucket:   {}", config.bucket);
    println!("Region:   {}", config.region);
    println!("Prefix:   {}\n", config.key_prefix);

    let store = S3ObjectStore::from_config(&config).await;
    let uploader = Uploader::new(store, config, extension);

    let failures = match company {
        Some(company) => {
            let report = uploader.upload_company_charts(dir, company).await?;
            print_upload_report(&report);
            report.failure_count()
        }
        None => {
            let result = uploader.upload_multiple(dir, None).await?;
            for report in &result.reports {
                print_upload_report(report);
            }
            for (company, error) in &result.errors {
                println!("  ✗ {company}: {error}");
            }
            println!(
                "Total: {} uploaded, {} failed across {} companies\n",
                result.total_success(),
                result.total_failure(),
                result.reports.len()
            );
            result.total_failure() + result.errors.len()
        }
    };

    if fail_on_upload_error && failures > 0 {
        bail!("{failures} uploads failed");
    }
    Ok(())
}

/// Print the per-file outcome of one company upload.
pub(crate) fn print_upload_report(report: &UploadReport) {
    println!("{} → s3://{} ({})", report.company, report.bucket, report.upload_date);
    println!("{}", "-".repeat(60));
    for file in &report.uploaded {
        println!("  ✓ {}", file.url);
    }
    for file in &report.failed {
        println!("  ✗ {}: {}", file.filename, file.error);
    }
    println!(
        "\n{} uploaded, {} failed\n",
        report.success_count(),
        report.failure_count()
    );
}
