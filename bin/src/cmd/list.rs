//! List command implementation.

use std::path::Path;

use treasury_core::{CompanyConfig, DataSource};
use treasury_feed::FeedClient;

use super::print_header;

/// Print every configured company.
pub(crate) fn list_companies(companies: &[CompanyConfig], verbose: bool) {
    print_header("Configured Companies");

    for company in companies {
        let source = match &company.source {
            DataSource::Feed { env_prefix, .. } => format!("feed ({env_prefix}_DATA_URL)"),
            DataSource::Sheet { range, .. } => format!("sheet '{range}'"),
        };
        println!("  {:12} {:24} {}", company.id, company.name, source);
        println!("      Data:          {}", source_requirement(&company.source));

        if verbose {
            let charts = &company.charts;
            let levels: Vec<String> = charts
                .nav_reference_levels
                .iter()
                .map(|k| format!("{k}x"))
                .collect();
            let kinds: Vec<&str> = company.chart_kinds.iter().map(|k| k.name()).collect();
            println!("      NAV multiples: {}", levels.join(", "));
            println!("      Projection:    {} months", charts.projection_months);
            println!("      Share basis:   {}", charts.share_type);
            if let Some(start) = charts.global_start_date {
                println!("      Data from:     {start}");
            }
            if let Some(start) = charts.mnav_start_date {
                println!("      mNAV from:     {start}");
            }
            println!("      Charts:        {}", kinds.join(", "));
            println!();
        }
    }

    if !verbose {
        println!("\nUse --verbose for chart parameters.\n");
    }
}

/// What must be in place before a company's data can be loaded.
///
/// Feed snapshots are not bundled: without a URL variable the snapshot file
/// has to be provided at the configured path.
fn source_requirement(source: &DataSource) -> String {
    match source {
        DataSource::Feed {
            url: Some(url),
            fallback_path,
            ..
        } => format!("{url}, falling back to {}", snapshot_state(fallback_path)),
        DataSource::Feed {
            env_prefix,
            url: None,
            fallback_path,
        } => format!(
            "set {} or provide snapshot {}",
            FeedClient::env_var(env_prefix),
            snapshot_state(fallback_path)
        ),
        DataSource::Sheet { .. } => "GOOGLE_API_KEY".to_string(),
    }
}

fn snapshot_state(path: &Path) -> String {
    let state = if path.is_file() { "present" } else { "missing" };
    format!("{} ({state})", path.display())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn feed(url: Option<&str>, fallback_path: PathBuf) -> DataSource {
        DataSource::Feed {
            env_prefix: "h100".to_string(),
            url: url.map(str::to_string),
            fallback_path,
        }
    }

    #[test]
    fn test_feed_requirement_names_variable_and_snapshot() {
        let text = source_requirement(&feed(None, PathBuf::from("data/no_such_snapshot.json")));
        assert_eq!(
            text,
            "set H100_DATA_URL or provide snapshot data/no_such_snapshot.json (missing)"
        );
    }

    #[test]
    fn test_present_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("h100.json");
        std::fs::write(&path, "{}").unwrap();

        let text = source_requirement(&feed(Some("https://example.com/h100.json"), path));
        assert!(text.starts_with("https://example.com/h100.json, falling back to "));
        assert!(text.ends_with("(present)"));
    }

    #[test]
    fn test_sheet_requirement() {
        let source = DataSource::Sheet {
            spreadsheet_id: "sheet".to_string(),
            range: "Tab".to_string(),
            columns: Default::default(),
        };
        assert_eq!(source_requirement(&source), "GOOGLE_API_KEY");
    }
}
