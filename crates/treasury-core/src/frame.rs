//! Polars views of a record table and CSV export.

use std::{fs::File, path::Path};

use polars::prelude::*;

use crate::{
    Result,
    metrics::{fully_diluted_market_cap, mnav, nav, nav_multiple_per_share},
    types::{Observation, RecordTable},
};

/// Column name of the NAV multiple per share at `level`.
#[must_use]
pub fn nav_level_column(level: u32) -> String {
    format!("nav_{level}x_per_share")
}

/// The raw observation columns of `table` as a [`DataFrame`].
///
/// # Errors
///
/// Returns an error if Polars fails to assemble the frame.
pub fn record_frame(table: &RecordTable) -> Result<DataFrame> {
    let column = |f: fn(&Observation) -> f64| -> Vec<f64> { table.iter().map(f).collect() };

    let df = df! {
        "date" => table.dates(),
        "btc_balance" => column(|r| r.btc_balance),
        "diluted_shares_outstanding" => column(|r| r.diluted_shares_outstanding),
        "stock_price" => column(|r| r.stock_price),
        "btc_price" => column(|r| r.btc_price),
        "btc_per_diluted_share" => column(|r| r.btc_per_diluted_share),
        "market_cap_basic" => table.iter().map(|r| r.market_cap_basic).collect::<Vec<_>>(),
    }?;
    Ok(df)
}

/// The record frame enriched with every derived metric.
///
/// Adds `nav`, one `nav_{k}x_per_share` column per entry of `levels`,
/// `fully_diluted_market_cap` and `mnav`. `mnav` is null where NAV is zero or
/// missing.
///
/// # Errors
///
/// Returns an error if Polars fails to assemble the frame.
pub fn metric_frame(table: &RecordTable, levels: &[u32]) -> Result<DataFrame> {
    let mut df = record_frame(table)?;

    df.with_column(Series::new(
        "nav".into(),
        table.iter().map(nav).collect::<Vec<f64>>(),
    ))?;
    for &level in levels {
        df.with_column(Series::new(
            nav_level_column(level).as_str().into(),
            table
                .iter()
                .map(|r| nav_multiple_per_share(r, level))
                .collect::<Vec<f64>>(),
        ))?;
    }
    df.with_column(Series::new(
        "fully_diluted_market_cap".into(),
        table
            .iter()
            .map(fully_diluted_market_cap)
            .collect::<Vec<f64>>(),
    ))?;
    df.with_column(Series::new(
        "mnav".into(),
        table.iter().map(|r| mnav(r).ok()).collect::<Vec<Option<f64>>>(),
    ))?;

    Ok(df)
}

/// Write `df` to `path` as CSV with a header row.
///
/// # Errors
///
/// Returns an error if the file cannot be created or Polars fails to write.
pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(df)?;
    tracing::info!(path = %path.display(), rows = df.height(), "wrote metrics CSV");
    Ok(())
}
