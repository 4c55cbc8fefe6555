//! Per-company configuration consumed by the shared pipeline.
//!
//! Every company is described by a [`CompanyConfig`]: where its data comes
//! from, which charts to produce and the [`ChartConfig`] they share.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    Result, TreasuryError,
    types::{Date, DateRange},
};

/// The chart kinds the pipeline can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    /// Log-log holdings vs btc-per-share with the fitted power law.
    PowerLaw,
    /// Stock price against NAV multiples per share, with projection.
    StockNav,
    /// mNAV over time with reference multiples.
    Mnav,
    /// Market cap stacked against NAV.
    StackedArea,
    /// BTC per share over time.
    BtcPerShare,
}

impl ChartKind {
    /// Every chart kind, in generation order.
    pub const ALL: [Self; 5] = [
        Self::PowerLaw,
        Self::StockNav,
        Self::Mnav,
        Self::StackedArea,
        Self::BtcPerShare,
    ];

    /// Short identifier used in logs and on the command line.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::PowerLaw => "power_law",
            Self::StockNav => "stock_nav",
            Self::Mnav => "mnav",
            Self::StackedArea => "stacked_area",
            Self::BtcPerShare => "btc_per_share",
        }
    }

    /// Artifact file stem, prefixed with the company slug on disk.
    #[must_use]
    pub const fn file_stem(&self) -> &'static str {
        match self {
            Self::PowerLaw => "log_log_btc_held_vs_btc_per_diluted_share",
            Self::StockNav => "time_vs_stock_price_and_nav_multiples",
            Self::Mnav => "time_vs_mnav",
            Self::StackedArea => "stacked_time_vs_mc_and_nav",
            Self::BtcPerShare => "time_vs_btc_per_share",
        }
    }
}

impl std::fmt::Display for ChartKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Shared chart parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// NAV multiples drawn as reference levels.
    pub nav_reference_levels: Vec<u32>,
    /// Colors paired with `nav_reference_levels` by position.
    pub nav_reference_colors: Vec<String>,
    /// Months of forward projection.
    pub projection_months: u32,
    /// First date shown on the mNAV chart.
    pub mnav_start_date: Option<Date>,
    /// First date considered by every chart.
    pub global_start_date: Option<Date>,
    /// Label for the share basis, e.g. "Diluted Share".
    pub share_type: String,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            nav_reference_levels: vec![3, 5, 7],
            nav_reference_colors: vec![
                "#0000ff".to_string(),
                "#008000".to_string(),
                "#ff0000".to_string(),
            ],
            projection_months: 2,
            mnav_start_date: None,
            global_start_date: None,
            share_type: "Diluted Share".to_string(),
        }
    }
}

impl ChartConfig {
    /// Color for the `idx`-th reference level, cycling when fewer colors than
    /// levels are configured.
    #[must_use]
    pub fn color_for(&self, idx: usize) -> &str {
        if self.nav_reference_colors.is_empty() {
            return "#000000";
        }
        &self.nav_reference_colors[idx % self.nav_reference_colors.len()]
    }

    /// Date filter applied to every chart.
    #[must_use]
    pub const fn global_range(&self) -> DateRange {
        DateRange::starting(self.global_start_date)
    }

    /// Date filter for the mNAV chart, which never starts before the global
    /// start.
    #[must_use]
    pub fn mnav_range(&self) -> DateRange {
        let start = match (self.global_start_date, self.mnav_start_date) {
            (Some(g), Some(m)) => Some(g.max(m)),
            (g, m) => g.or(m),
        };
        DateRange::starting(start)
    }

    /// Check the parameters are usable.
    ///
    /// # Errors
    ///
    /// Returns [`TreasuryError::InvalidConfig`] for empty or zero multiples
    /// or a zero projection horizon.
    pub fn validate(&self) -> Result<()> {
        if self.nav_reference_levels.is_empty() {
            return Err(TreasuryError::InvalidConfig(
                "nav_reference_levels must not be empty".to_string(),
            ));
        }
        if self.nav_reference_levels.contains(&0) {
            return Err(TreasuryError::InvalidConfig(
                "nav_reference_levels must be positive".to_string(),
            ));
        }
        if self.projection_months == 0 {
            return Err(TreasuryError::InvalidConfig(
                "projection_months must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Maps sheet header names onto observation fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMapping {
    /// Date column, as a spreadsheet serial day number.
    pub date: String,
    /// Bitcoin balance column.
    pub btc_balance: String,
    /// Share count column.
    pub diluted_shares: String,
    /// Stock price column.
    pub stock_price: String,
    /// Optional btc-per-share column, trusted as-is when present.
    pub btc_per_share: Option<String>,
    /// Optional bitcoin price column.
    pub btc_price: Option<String>,
    /// Optional forward bitcoin-per-share column. Missing from the sheet is
    /// tolerated.
    pub forward_btc_per_share: Option<String>,
    /// Whether the forward column is expressed in satoshis.
    pub forward_in_sats: bool,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            date: "date".to_string(),
            btc_balance: "btc_balance".to_string(),
            diluted_shares: "diluted_shares_outstanding".to_string(),
            stock_price: "stock_price".to_string(),
            btc_per_share: None,
            btc_price: None,
            forward_btc_per_share: None,
            forward_in_sats: false,
        }
    }
}

impl ColumnMapping {
    /// Header names that must be present in the sheet.
    #[must_use]
    pub fn required(&self) -> Vec<&str> {
        vec![
            self.date.as_str(),
            self.btc_balance.as_str(),
            self.diluted_shares.as_str(),
            self.stock_price.as_str(),
        ]
    }
}

/// Where a company's record table comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataSource {
    /// A JSON feed with a local snapshot to fall back on.
    Feed {
        /// Prefix of the `{PREFIX}_DATA_URL` environment variable.
        env_prefix: String,
        /// Explicit URL, taking precedence over the environment.
        #[serde(default)]
        url: Option<String>,
        /// Local JSON snapshot used when the fetch fails.
        fallback_path: PathBuf,
    },
    /// A Google Sheets range.
    Sheet {
        /// Spreadsheet identifier.
        spreadsheet_id: String,
        /// A1-notation range, usually just the tab name.
        range: String,
        /// Header-to-field mapping.
        #[serde(default)]
        columns: ColumnMapping,
    },
}

fn all_chart_kinds() -> Vec<ChartKind> {
    ChartKind::ALL.to_vec()
}

/// One company handled by the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyConfig {
    /// Short identifier, e.g. `H100`.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Data source.
    pub source: DataSource,
    /// Chart parameters.
    #[serde(default)]
    pub charts: ChartConfig,
    /// Charts to generate, in order.
    #[serde(default = "all_chart_kinds")]
    pub chart_kinds: Vec<ChartKind>,
}

impl CompanyConfig {
    /// Lowercase identifier used in file names and object keys.
    #[must_use]
    pub fn slug(&self) -> String {
        self.id.to_lowercase()
    }

    /// Artifact file name for a chart kind, without extension.
    #[must_use]
    pub fn chart_file_stem(&self, kind: ChartKind) -> String {
        format!("{}_{}", self.slug(), kind.file_stem())
    }

    /// File name of the metric CSV.
    #[must_use]
    pub fn metrics_file_name(&self) -> String {
        format!("{}_metrics.csv", self.slug())
    }

    /// Check the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns [`TreasuryError::InvalidConfig`] for an empty id or an invalid
    /// [`ChartConfig`].
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(TreasuryError::InvalidConfig(
                "company id must not be empty".to_string(),
            ));
        }
        self.charts
            .validate()
            .map_err(|e| TreasuryError::InvalidConfig(format!("{}: {e}", self.id)))
    }
}

/// Read a JSON array of company configurations and validate each one.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or any entry fails
/// validation.
pub fn load_companies(path: &Path) -> Result<Vec<CompanyConfig>> {
    let content = std::fs::read_to_string(path)?;
    let companies: Vec<CompanyConfig> = serde_json::from_str(&content)?;
    for company in &companies {
        company.validate()?;
    }
    tracing::debug!(path = %path.display(), count = companies.len(), "loaded company configs");
    Ok(companies)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_chart_config_defaults() {
        let config = ChartConfig::default();
        assert_eq!(config.nav_reference_levels, vec![3, 5, 7]);
        assert_eq!(config.nav_reference_colors.len(), 3);
        assert_eq!(config.projection_months, 2);
        assert_eq!(config.share_type, "Diluted Share");
        assert!(config.global_range().is_unbounded());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_color_cycles() {
        let config = ChartConfig {
            nav_reference_levels: vec![2, 3, 4, 5],
            ..ChartConfig::default()
        };
        assert_eq!(config.color_for(3), "#0000ff");
    }

    #[test]
    fn test_mnav_range_never_precedes_global_start() {
        let config = ChartConfig {
            global_start_date: Some(d(2025, 6, 17)),
            mnav_start_date: Some(d(2025, 6, 1)),
            ..ChartConfig::default()
        };
        assert_eq!(config.mnav_range().start, Some(d(2025, 6, 17)));

        let config = ChartConfig {
            mnav_start_date: Some(d(2025, 6, 16)),
            ..ChartConfig::default()
        };
        assert_eq!(config.mnav_range().start, Some(d(2025, 6, 16)));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let empty = ChartConfig {
            nav_reference_levels: vec![],
            ..ChartConfig::default()
        };
        assert!(matches!(empty.validate(), Err(TreasuryError::InvalidConfig(_))));

        let zero = ChartConfig {
            nav_reference_levels: vec![0, 3],
            ..ChartConfig::default()
        };
        assert!(zero.validate().is_err());

        let no_projection = ChartConfig {
            projection_months: 0,
            ..ChartConfig::default()
        };
        assert!(no_projection.validate().is_err());
    }

    #[test]
    fn test_company_config_from_json_defaults() {
        let json = r#"{
            "id": "ACME",
            "name": "Acme Treasury",
            "source": {"kind": "feed", "env_prefix": "ACME", "fallback_path": "data/acme.json"},
            "charts": {"projection_months": 3}
        }"#;
        let company: CompanyConfig = serde_json::from_str(json).unwrap();

        assert_eq!(company.slug(), "acme");
        assert_eq!(company.chart_kinds, ChartKind::ALL.to_vec());
        assert_eq!(company.charts.projection_months, 3);
        assert_eq!(company.charts.nav_reference_levels, vec![3, 5, 7]);
        assert_eq!(company.metrics_file_name(), "acme_metrics.csv");
        assert_eq!(
            company.chart_file_stem(ChartKind::Mnav),
            "acme_time_vs_mnav"
        );
        assert!(matches!(company.source, DataSource::Feed { url: None, .. }));
    }

    #[test]
    fn test_sheet_source_mapping() {
        let json = r#"{
            "kind": "sheet",
            "spreadsheet_id": "abc",
            "range": "Tab",
            "columns": {"date": "Date", "btc_balance": "BTC Held", "btc_price": "BTC Price"}
        }"#;
        let source: DataSource = serde_json::from_str(json).unwrap();
        let DataSource::Sheet { columns, .. } = source else {
            panic!("expected sheet source");
        };
        assert_eq!(columns.btc_balance, "BTC Held");
        assert_eq!(columns.stock_price, "stock_price");
        assert_eq!(columns.btc_price.as_deref(), Some("BTC Price"));
        assert_eq!(columns.required().len(), 4);
    }

    #[test]
    fn test_load_companies() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("companies.json");
        std::fs::write(
            &path,
            r#"[{"id": "X", "name": "X Corp",
                 "source": {"kind": "feed", "env_prefix": "X", "fallback_path": "x.json"},
                 "chart_kinds": ["power_law", "mnav"]}]"#,
        )
        .unwrap();

        let companies = load_companies(&path).unwrap();
        assert_eq!(companies.len(), 1);
        assert_eq!(
            companies[0].chart_kinds,
            vec![ChartKind::PowerLaw, ChartKind::Mnav]
        );

        let blank = r#"[{"id": " ", "name": "",
            "source": {"kind": "feed", "env_prefix": "", "fallback_path": ""}}]"#;
        std::fs::write(&path, blank).unwrap();
        assert!(matches!(
            load_companies(&path),
            Err(TreasuryError::InvalidConfig(_))
        ));
    }
}
