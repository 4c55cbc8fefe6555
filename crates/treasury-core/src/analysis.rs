//! End-to-end analysis of one company's record table.
//!
//! [`analyze`] runs clean → fit → metrics and collects the results into an
//! [`AnalysisReport`]. A failed regression does not abort the analysis; it is
//! recorded in the report so the remaining metrics are still available.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    clean::{CleanedData, clean},
    config::ChartConfig,
    fit::{FitResult, fit},
    metrics::{Crossing, daily_btc_yield, market_cap_nav_crossing, mnav_series},
    types::{Date, RecordTable},
};

/// Label for the strength of a correlation coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CorrelationStrength {
    /// `|r| >= 0.95`
    ExtremelyStrong,
    /// `|r| >= 0.8`
    VeryStrong,
    /// `|r| >= 0.6`
    Strong,
    /// `|r| >= 0.4`
    Moderate,
    /// `|r| >= 0.2`
    Weak,
    /// Anything lower, including `NaN`.
    VeryWeak,
}

impl CorrelationStrength {
    /// Classify a correlation by its absolute value.
    #[must_use]
    pub fn from_correlation(r: f64) -> Self {
        let abs = r.abs();
        if abs >= 0.95 {
            Self::ExtremelyStrong
        } else if abs >= 0.8 {
            Self::VeryStrong
        } else if abs >= 0.6 {
            Self::Strong
        } else if abs >= 0.4 {
            Self::Moderate
        } else if abs >= 0.2 {
            Self::Weak
        } else {
            Self::VeryWeak
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::ExtremelyStrong => "Extremely Strong",
            Self::VeryStrong => "Very Strong",
            Self::Strong => "Strong",
            Self::Moderate => "Moderate",
            Self::Weak => "Weak",
            Self::VeryWeak => "Very Weak",
        }
    }
}

/// Quality label for a coefficient of determination.
#[must_use]
pub fn fit_quality(r_squared: f64) -> &'static str {
    if r_squared > 0.95 {
        "excellent"
    } else if r_squared > 0.8 {
        "good"
    } else {
        "moderate"
    }
}

/// Range of a series and its growth from minimum to maximum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeStats {
    /// Smallest value.
    pub min: f64,
    /// Largest value.
    pub max: f64,
    /// `(max - min) / min * 100`.
    pub growth_percent: f64,
}

impl RangeStats {
    /// Statistics over `values`, or `None` when empty.
    #[must_use]
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        let mut iter = values.into_iter();
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
        Some(Self {
            min,
            max,
            growth_percent: (max - min) / min * 100.0,
        })
    }
}

/// Everything computed for one company in a single run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Company display name.
    pub company: String,
    /// Rows after the global date filter.
    pub total_records: usize,
    /// Rows passing validity.
    pub valid_records: usize,
    /// Rows used for the regression.
    pub unique_records: usize,
    /// `valid_records - unique_records`.
    pub duplicates_removed: usize,
    /// First and last date of the analysed table.
    pub date_range: Option<(Date, Date)>,
    /// Bitcoin holdings over the valid view.
    pub holdings: Option<RangeStats>,
    /// BTC per share over the valid view.
    pub btc_per_share: Option<RangeStats>,
    /// Power-law fit, when the regression succeeded.
    pub fit: Option<FitResult>,
    /// Why the regression failed, when it did.
    pub fit_error: Option<String>,
    /// mNAV of the latest row with a defined NAV.
    pub current_mnav: Option<f64>,
    /// Rows whose mNAV is undefined.
    pub undefined_mnav_rows: usize,
    /// Most recent market-cap/NAV crossing.
    pub crossing: Option<Crossing>,
    /// Average daily change in holdings over the trailing window.
    pub daily_btc_yield: f64,
}

impl AnalysisReport {
    /// Quality label of the fit, if any.
    #[must_use]
    pub fn fit_quality(&self) -> Option<&'static str> {
        self.fit.as_ref().map(|f| fit_quality(f.r_squared))
    }

    /// Correlation strength of the fit, if any.
    #[must_use]
    pub fn correlation_strength(&self) -> Option<CorrelationStrength> {
        self.fit
            .as_ref()
            .map(|f| CorrelationStrength::from_correlation(f.pearson_correlation))
    }
}

/// Sort `table` by date and apply the global start filter.
#[must_use]
pub fn prepare(table: &RecordTable, config: &ChartConfig) -> RecordTable {
    table.sorted_by_date().filter_dates(&config.global_range())
}

/// Analyse one company's record table.
///
/// The table is prepared with [`prepare`] first. Cleaning and fitting run on
/// the prepared table; time-series metrics use its date order.
#[must_use]
pub fn analyze(company: &str, table: &RecordTable, config: &ChartConfig) -> AnalysisReport {
    let prepared = prepare(table, config);
    let CleanedData {
        valid,
        unique,
        duplicates_removed,
    } = clean(&prepared);

    let (fit, fit_error) = match fit(&unique) {
        Ok(result) => (Some(result), None),
        Err(e) => {
            tracing::warn!(company, error = %e, "power-law regression skipped");
            (None, Some(e.to_string()))
        }
    };

    let mnav = mnav_series(&prepared);

    tracing::info!(
        company,
        total = prepared.len(),
        valid = valid.len(),
        unique = unique.len(),
        "analysis complete"
    );

    AnalysisReport {
        company: company.to_string(),
        total_records: prepared.len(),
        valid_records: valid.len(),
        unique_records: unique.len(),
        duplicates_removed,
        date_range: prepared.date_span(),
        holdings: RangeStats::from_values(valid.iter().map(|r| r.btc_balance)),
        btc_per_share: RangeStats::from_values(valid.iter().map(|r| r.btc_per_diluted_share)),
        fit,
        fit_error,
        current_mnav: mnav.latest().map(|(_, v)| v),
        undefined_mnav_rows: mnav.undefined_rows,
        crossing: market_cap_nav_crossing(&prepared),
        daily_btc_yield: daily_btc_yield(&prepared),
    }
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "DETAILED ANALYSIS SUMMARY FOR {}", self.company)?;
        writeln!(f, "{}", "=".repeat(50))?;
        writeln!(
            f,
            "Dataset: {} total records, {} valid for analysis",
            self.total_records, self.valid_records
        )?;
        writeln!(f, "Unique datapoints: {} (used for regression)", self.unique_records)?;
        writeln!(f, "Duplicate removal: {} duplicates removed", self.duplicates_removed)?;
        if let Some((start, end)) = self.date_range {
            writeln!(f, "Date range: {start} to {end}")?;
        }
        writeln!(f)?;

        match &self.fit {
            Some(fit) => {
                writeln!(f, "POWER LAW RELATIONSHIP:")?;
                writeln!(f, "  Equation:    {}", fit.equation())?;
                writeln!(
                    f,
                    "  R²:          {:.6} ({} fit)",
                    fit.r_squared,
                    fit_quality(fit.r_squared)
                )?;
                writeln!(
                    f,
                    "  Correlation: {:.6} ({})",
                    fit.pearson_correlation,
                    CorrelationStrength::from_correlation(fit.pearson_correlation).label()
                )?;
                writeln!(
                    f,
                    "  Exponent:    {:.3} ({})",
                    fit.slope,
                    fit.interpretation().description()
                )?;
            }
            None => {
                let reason = self.fit_error.as_deref().unwrap_or("unknown");
                writeln!(f, "POWER LAW RELATIONSHIP: not available ({reason})")?;
            }
        }
        writeln!(f)?;

        if let Some(h) = self.holdings {
            writeln!(
                f,
                "Bitcoin holdings: {:.2} to {:.2} BTC ({:.1}% growth)",
                h.min, h.max, h.growth_percent
            )?;
        }
        if let Some(p) = self.btc_per_share {
            writeln!(
                f,
                "BTC per share:    {:.8} to {:.8} ({:.1}% growth)",
                p.min, p.max, p.growth_percent
            )?;
        }
        writeln!(f, "Daily BTC yield:  {:.4} BTC/day", self.daily_btc_yield)?;
        match self.current_mnav {
            Some(mnav) => writeln!(f, "Current mNAV:     {mnav:.2}x")?,
            None => writeln!(f, "Current mNAV:     undefined")?,
        }
        match &self.crossing {
            Some(c) => writeln!(
                f,
                "Market cap crossed current NAV on {} ({} days ago, market cap ${:.0})",
                c.date, c.days_difference, c.market_cap
            ),
            None => writeln!(f, "Market cap/NAV crossing: not found"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Observation;
    use approx::assert_relative_eq;

    fn d(day: u32) -> Date {
        Date::from_ymd_opt(2025, 5, day).unwrap()
    }

    fn table() -> RecordTable {
        RecordTable::from(vec![
            Observation::new(d(4), 400.0, 1000.0, 3_000.0, 100_000.0),
            Observation::new(d(1), 100.0, 1000.0, 2_000.0, 100_000.0),
            Observation::new(d(2), 100.0, 1000.0, 2_500.0, 100_000.0),
            Observation::new(d(3), 200.0, 1000.0, 2_800.0, 100_000.0),
        ])
    }

    #[test]
    fn test_correlation_strength_thresholds() {
        assert_eq!(
            CorrelationStrength::from_correlation(0.97),
            CorrelationStrength::ExtremelyStrong
        );
        assert_eq!(
            CorrelationStrength::from_correlation(-0.85),
            CorrelationStrength::VeryStrong
        );
        assert_eq!(
            CorrelationStrength::from_correlation(0.6),
            CorrelationStrength::Strong
        );
        assert_eq!(
            CorrelationStrength::from_correlation(0.4),
            CorrelationStrength::Moderate
        );
        assert_eq!(
            CorrelationStrength::from_correlation(0.2),
            CorrelationStrength::Weak
        );
        assert_eq!(
            CorrelationStrength::from_correlation(f64::NAN),
            CorrelationStrength::VeryWeak
        );
    }

    #[test]
    fn test_fit_quality_labels() {
        assert_eq!(fit_quality(0.99), "excellent");
        assert_eq!(fit_quality(0.95), "good");
        assert_eq!(fit_quality(0.5), "moderate");
    }

    #[test]
    fn test_range_stats() {
        let stats = RangeStats::from_values([200.0, 100.0, 400.0]).unwrap();
        assert_relative_eq!(stats.min, 100.0);
        assert_relative_eq!(stats.max, 400.0);
        assert_relative_eq!(stats.growth_percent, 300.0);
        assert!(RangeStats::from_values(std::iter::empty()).is_none());
    }

    #[test]
    fn test_analyze_sorts_before_cleaning() {
        let report = analyze("Test", &table(), &ChartConfig::default());

        assert_eq!(report.total_records, 4);
        assert_eq!(report.valid_records, 4);
        assert_eq!(report.unique_records, 3);
        assert_eq!(report.duplicates_removed, 1);
        assert_eq!(report.date_range, Some((d(1), d(4))));

        // Per-share is exactly proportional to holdings
        let fit = report.fit.unwrap();
        assert_relative_eq!(fit.slope, 1.0, epsilon = 1e-9);
        assert_eq!(report.fit_quality(), Some("excellent"));

        // Daily yield over sorted balances 100, 100, 200, 400
        assert_relative_eq!(report.daily_btc_yield, 100.0);
        // Last NAV 4e7, last market cap 3e6
        assert_relative_eq!(report.current_mnav.unwrap(), 0.075);
        assert!(report.crossing.is_none());
    }

    #[test]
    fn test_analyze_applies_global_start() {
        let config = ChartConfig {
            global_start_date: Some(d(3)),
            ..ChartConfig::default()
        };
        let report = analyze("Test", &table(), &config);
        assert_eq!(report.total_records, 2);
        assert_eq!(report.date_range, Some((d(3), d(4))));
    }

    #[test]
    fn test_analyze_records_fit_failure() {
        let single = RecordTable::from(vec![Observation::new(d(1), 10.0, 100.0, 1.0, 1.0)]);
        let report = analyze("Solo", &single, &ChartConfig::default());

        assert!(report.fit.is_none());
        assert!(report.fit_error.unwrap().contains("at least 2"));
        assert_eq!(report.daily_btc_yield, 0.0);
    }

    #[test]
    fn test_report_display() {
        let report = analyze("Test", &table(), &ChartConfig::default());
        let text = report.to_string();
        assert!(text.starts_with("DETAILED ANALYSIS SUMMARY FOR Test"));
        assert!(text.contains("excellent fit"));
        assert!(text.contains("Market cap/NAV crossing: not found"));
    }
}
