//! Data loading for the treasury CLI.

use anyhow::Result;
use treasury_core::{CompanyConfig, DataSource, RecordTable};
use treasury_feed::{FeedClient, LoadOrigin, SheetsClient};

/// Load a company's record table from its configured source.
///
/// Feed sources fall back to their local snapshot on any fetch failure;
/// only a missing or unreadable snapshot is an error.
pub(crate) async fn load_table(company: &CompanyConfig) -> Result<RecordTable> {
    match &company.source {
        DataSource::Feed {
            env_prefix,
            url,
            fallback_path,
        } => {
            let client = match url {
                Some(url) => FeedClient::new(Some(url.clone()), fallback_path.clone())?,
                None => FeedClient::from_env(env_prefix, fallback_path.clone())?,
            };
            let (table, origin) = client.load().await?;
            match origin {
                LoadOrigin::Remote(url) => println!("Source:   {url}"),
                LoadOrigin::Fallback(path) => {
                    println!("Source:   {} (local fallback)", path.display());
                }
            }
            Ok(table)
        }
        DataSource::Sheet {
            spreadsheet_id,
            range,
            columns,
        } => {
            println!("Source:   Google Sheets '{range}'");
            let client = SheetsClient::from_env()?;
            Ok(client.load_table(spreadsheet_id, range, columns).await?)
        }
    }
}
