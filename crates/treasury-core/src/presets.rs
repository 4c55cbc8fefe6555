//! Built-in company configurations.

use std::path::PathBuf;

use crate::{
    config::{ChartConfig, ChartKind, ColumnMapping, CompanyConfig, DataSource},
    types::Date,
};

const TRACKER_SHEET: &str = "1hyRTvjiXQbXU6UnPmZoRDF9Rs7vL8YYYfFsrqu6Jk8Q";
const BTC_PRICE_COLUMN: &str = "BTC Price (USD)";
const BLGV_SHEET: &str = "1tDNcdBkiQn8HJ-UkWDsKDlgeFwNa_ck3fiPPDtIVPlw";

fn feed(id: &str, name: &str, env_prefix: &str) -> CompanyConfig {
    CompanyConfig {
        id: id.to_string(),
        name: name.to_string(),
        source: DataSource::Feed {
            env_prefix: env_prefix.to_string(),
            url: None,
            fallback_path: PathBuf::from(format!(
                "companies/{}/fallback_data.json",
                id.to_lowercase()
            )),
        },
        charts: ChartConfig::default(),
        chart_kinds: ChartKind::ALL.to_vec(),
    }
}

fn sheet(
    id: &str,
    name: &str,
    spreadsheet_id: &str,
    range: &str,
    columns: ColumnMapping,
) -> CompanyConfig {
    CompanyConfig {
        id: id.to_string(),
        name: name.to_string(),
        source: DataSource::Sheet {
            spreadsheet_id: spreadsheet_id.to_string(),
            range: range.to_string(),
            columns,
        },
        charts: ChartConfig::default(),
        chart_kinds: ChartKind::ALL.to_vec(),
    }
}

fn columns(date: &str, balance: &str, shares: &str, price: &str) -> ColumnMapping {
    ColumnMapping {
        date: date.to_string(),
        btc_balance: balance.to_string(),
        diluted_shares: shares.to_string(),
        stock_price: price.to_string(),
        btc_per_share: None,
        btc_price: Some(BTC_PRICE_COLUMN.to_string()),
        forward_btc_per_share: None,
        forward_in_sats: false,
    }
}

/// Every built-in company.
#[must_use]
pub fn presets() -> Vec<CompanyConfig> {
    let mut h100 = feed("H100", "H100 Group", "H100");
    h100.charts.mnav_start_date = Date::from_ymd_opt(2025, 6, 16);

    let metaplanet = feed("Metaplanet", "Metaplanet", "METAPLANET");

    let mut lqwd = feed("LQWD", "LQWD Technologies", "LQWD");
    lqwd.charts.global_start_date = Date::from_ymd_opt(2025, 6, 17);

    let mut blgv = sheet(
        "BLGV",
        "Belgravia Hartford",
        BLGV_SHEET,
        "BLGV Historical",
        ColumnMapping {
            btc_per_share: Some("Equity Sats / Share".to_string()),
            ..columns("Date", "BTC Held", "FD Shares", "Closing Price (USD)")
        },
    );
    blgv.charts.nav_reference_levels = vec![2, 3, 4, 5];
    blgv.charts.nav_reference_colors = ["#800080", "#0000ff", "#008000", "#ff0000"]
        .map(String::from)
        .to_vec();
    blgv.charts.projection_months = 3;

    let mut coinsilium = sheet(
        "Coinsilium",
        "Coinsilium Group",
        TRACKER_SHEET,
        "Coinsilium|H",
        ColumnMapping {
            btc_per_share: Some("BTC / Share".to_string()),
            forward_btc_per_share: Some("Fwd BTC / Share".to_string()),
            ..columns("Date", "BTC Held", "Outstanding Shares", "Closing Price (USD)")
        },
    );
    coinsilium.charts.share_type = "Outstanding Share".to_string();
    coinsilium.charts.nav_reference_levels = vec![2, 4, 6];
    coinsilium.charts.projection_months = 1;
    coinsilium.chart_kinds = vec![
        ChartKind::PowerLaw,
        ChartKind::StockNav,
        ChartKind::StackedArea,
        ChartKind::BtcPerShare,
    ];

    let mut locate = sheet(
        "Locate",
        "Locate Technologies",
        TRACKER_SHEET,
        "Locate|H",
        ColumnMapping {
            btc_per_share: Some("BTC / FD Share".to_string()),
            forward_btc_per_share: Some("Fwd Sats / FD Share".to_string()),
            forward_in_sats: true,
            ..columns("Date", "BTC Held", "FD Shares", "Closing Price (USD)")
        },
    );
    locate.charts.share_type = "Fully Diluted Share".to_string();
    locate.chart_kinds = vec![ChartKind::PowerLaw];

    vec![h100, metaplanet, lqwd, blgv, coinsilium, locate]
}

/// Look up a preset by id, ignoring case.
#[must_use]
pub fn find_preset(id: &str) -> Option<CompanyConfig> {
    presets()
        .into_iter()
        .find(|c| c.id.eq_ignore_ascii_case(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid_and_unique() {
        let all = presets();
        assert_eq!(all.len(), 6);
        for company in &all {
            assert!(company.validate().is_ok(), "{} invalid", company.id);
        }

        let mut slugs: Vec<String> = all.iter().map(CompanyConfig::slug).collect();
        slugs.sort();
        slugs.dedup();
        assert_eq!(slugs.len(), 6);
    }

    #[test]
    fn test_find_preset_ignores_case() {
        let h100 = find_preset("h100").unwrap();
        assert_eq!(h100.id, "H100");
        assert_eq!(h100.charts.mnav_start_date, Date::from_ymd_opt(2025, 6, 16));
        assert!(find_preset("unknown").is_none());
    }

    #[test]
    fn test_sheet_presets_override_charts() {
        let blgv = find_preset("BLGV").unwrap();
        assert_eq!(blgv.charts.nav_reference_levels, vec![2, 3, 4, 5]);
        assert_eq!(blgv.charts.nav_reference_colors.len(), 4);
        assert_eq!(blgv.charts.projection_months, 3);

        let locate = find_preset("locate").unwrap();
        assert_eq!(locate.chart_kinds, vec![ChartKind::PowerLaw]);
        let DataSource::Sheet { columns, .. } = locate.source else {
            panic!("expected sheet source");
        };
        assert_eq!(columns.btc_per_share.as_deref(), Some("BTC / FD Share"));
        assert!(columns.forward_in_sats);
    }

    #[test]
    fn test_sheet_presets_map_btc_price() {
        let sheets: Vec<(String, ColumnMapping)> = presets()
            .into_iter()
            .filter_map(|c| match c.source {
                DataSource::Sheet { columns, .. } => Some((c.id, columns)),
                DataSource::Feed { .. } => None,
            })
            .collect();
        assert_eq!(sheets.len(), 3);
        for (id, columns) in sheets {
            assert_eq!(
                columns.btc_price.as_deref(),
                Some("BTC Price (USD)"),
                "{id} has no BTC price column"
            );
        }
    }

    #[test]
    fn test_forward_columns() {
        let DataSource::Sheet { columns, .. } = find_preset("Coinsilium").unwrap().source else {
            panic!("expected sheet source");
        };
        assert_eq!(columns.forward_btc_per_share.as_deref(), Some("Fwd BTC / Share"));
        assert!(!columns.forward_in_sats);
    }
}
