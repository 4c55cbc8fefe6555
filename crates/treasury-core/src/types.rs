//! Observation rows and the per-company record table.
//!
//! Missing numeric values are carried as `NaN` so a table can hold rows
//! straight from a source before any cleaning happens.

use serde::{Deserialize, Serialize};

use crate::{Result, TreasuryError};

// Re-export date type from chrono
pub use chrono::NaiveDate as Date;

/// One dated observation of a treasury company.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Observation date. Not guaranteed unique within a table.
    pub date: Date,
    /// Bitcoin held as of `date`.
    pub btc_balance: f64,
    /// Fully diluted share count.
    pub diluted_shares_outstanding: f64,
    /// Market price per share in USD.
    pub stock_price: f64,
    /// Bitcoin market price in USD.
    pub btc_price: f64,
    /// Bitcoin per diluted share, derived or supplied by the source.
    pub btc_per_diluted_share: f64,
    /// Basic market cap as reported by the feed, when present.
    #[serde(default)]
    pub market_cap_basic: Option<f64>,
    /// Forward (pro forma) bitcoin per share reported by the source, when
    /// present.
    #[serde(default)]
    pub forward_btc_per_share: Option<f64>,
}

impl Observation {
    /// Create an observation, deriving `btc_per_diluted_share` from the
    /// balance and share count.
    #[must_use]
    pub fn new(
        date: Date,
        btc_balance: f64,
        diluted_shares_outstanding: f64,
        stock_price: f64,
        btc_price: f64,
    ) -> Self {
        Self {
            date,
            btc_balance,
            diluted_shares_outstanding,
            stock_price,
            btc_price,
            btc_per_diluted_share: btc_balance / diluted_shares_outstanding,
            market_cap_basic: None,
            forward_btc_per_share: None,
        }
    }

    /// Replace the derived btc-per-share with a value supplied by the source.
    #[must_use]
    pub const fn with_btc_per_diluted_share(mut self, value: f64) -> Self {
        self.btc_per_diluted_share = value;
        self
    }

    /// Attach the feed's basic market cap.
    #[must_use]
    pub const fn with_market_cap_basic(mut self, value: Option<f64>) -> Self {
        self.market_cap_basic = value;
        self
    }

    /// Attach a forward bitcoin-per-share value.
    #[must_use]
    pub const fn with_forward_btc_per_share(mut self, value: Option<f64>) -> Self {
        self.forward_btc_per_share = value;
        self
    }

    /// Whether the row can enter a log-log regression.
    ///
    /// Both `btc_balance` and `btc_per_diluted_share` must be present, finite
    /// and strictly positive.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.btc_balance.is_finite()
            && self.btc_per_diluted_share.is_finite()
            && self.btc_balance > 0.0
            && self.btc_per_diluted_share > 0.0
    }
}

/// Half-open date interval `[start, end)`; either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// Inclusive lower bound.
    pub start: Option<Date>,
    /// Exclusive upper bound.
    pub end: Option<Date>,
}

impl DateRange {
    /// A range with no bounds.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            start: None,
            end: None,
        }
    }

    /// A range that only has a lower bound.
    #[must_use]
    pub const fn starting(start: Option<Date>) -> Self {
        Self { start, end: None }
    }

    /// Whether `date` falls inside the range.
    #[must_use]
    pub fn contains(&self, date: Date) -> bool {
        self.start.is_none_or(|s| date >= s) && self.end.is_none_or(|e| date < e)
    }

    /// Whether neither bound is set.
    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

/// Ordered collection of observations for one company.
///
/// Row order is the order rows arrived from the source, which is not
/// necessarily chronological. Use [`RecordTable::sorted_by_date`] before any
/// time-series metric.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordTable {
    rows: Vec<Observation>,
}

impl RecordTable {
    /// Create a table from rows in source order.
    #[must_use]
    pub const fn new(rows: Vec<Observation>) -> Self {
        Self { rows }
    }

    /// Rows in table order.
    #[must_use]
    pub fn rows(&self) -> &[Observation] {
        &self.rows
    }

    /// Consume the table, returning its rows.
    #[must_use]
    pub fn into_rows(self) -> Vec<Observation> {
        self.rows
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate over rows in table order.
    pub fn iter(&self) -> std::slice::Iter<'_, Observation> {
        self.rows.iter()
    }

    /// Last row in table order.
    #[must_use]
    pub fn last(&self) -> Option<&Observation> {
        self.rows.last()
    }

    /// Copy of the table sorted by date. The sort is stable, so rows sharing
    /// a date keep their source order.
    #[must_use]
    pub fn sorted_by_date(&self) -> Self {
        let mut rows = self.rows.clone();
        rows.sort_by_key(|r| r.date);
        Self { rows }
    }

    /// Copy of the table restricted to rows whose date is inside `range`.
    #[must_use]
    pub fn filter_dates(&self, range: &DateRange) -> Self {
        self.rows
            .iter()
            .filter(|r| range.contains(r.date))
            .copied()
            .collect()
    }

    /// Earliest and latest date in the table.
    #[must_use]
    pub fn date_span(&self) -> Option<(Date, Date)> {
        let min = self.rows.iter().map(|r| r.date).min()?;
        let max = self.rows.iter().map(|r| r.date).max()?;
        Some((min, max))
    }

    /// Dates in table order.
    #[must_use]
    pub fn dates(&self) -> Vec<Date> {
        self.rows.iter().map(|r| r.date).collect()
    }
}

impl From<Vec<Observation>> for RecordTable {
    fn from(rows: Vec<Observation>) -> Self {
        Self::new(rows)
    }
}

impl FromIterator<Observation> for RecordTable {
    fn from_iter<I: IntoIterator<Item = Observation>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a RecordTable {
    type Item = &'a Observation;
    type IntoIter = std::slice::Iter<'a, Observation>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Parse a `YYYY-MM-DD` date, tolerating a trailing time component such as
/// `2025-06-16T00:00:00` or `2025-06-16 00:00:00`.
pub fn parse_date(value: &str) -> Result<Date> {
    let head = value.trim().split(['T', ' ']).next().unwrap_or_default();
    Date::parse_from_str(head, "%Y-%m-%d")
        .map_err(|e| TreasuryError::InvalidDate(format!("'{value}': {e}")))
}
