//! Net asset value metrics, accumulation projections and the market-cap/NAV
//! crossing.
//!
//! Every function here is a pure projection of a date-sorted record table;
//! none of them mutates the underlying observations.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::{
    Result, TreasuryError,
    types::{Date, Observation, RecordTable},
};

/// Trailing window, in rows, for the average daily accumulation rate.
pub const YIELD_WINDOW: usize = 30;

/// Days per projected month. Deliberately calendar-agnostic.
pub const DAYS_PER_MONTH: u32 = 30;

/// Bitcoin net asset value: `btc_balance * btc_price`.
#[must_use]
pub fn nav(row: &Observation) -> f64 {
    row.btc_balance * row.btc_price
}

/// NAV scaled by `multiple` and spread over the diluted share count.
#[must_use]
pub fn nav_multiple_per_share(row: &Observation, multiple: u32) -> f64 {
    nav(row) * f64::from(multiple) / row.diluted_shares_outstanding
}

/// `diluted_shares_outstanding * stock_price`.
#[must_use]
pub fn fully_diluted_market_cap(row: &Observation) -> f64 {
    row.diluted_shares_outstanding * row.stock_price
}

/// Multiple of NAV: fully diluted market cap divided by NAV.
///
/// # Errors
///
/// Returns [`TreasuryError::DivisionUndefined`] when NAV is zero or missing.
pub fn mnav(row: &Observation) -> Result<f64> {
    let nav = nav(row);
    if nav == 0.0 || !nav.is_finite() {
        return Err(TreasuryError::DivisionUndefined(format!(
            "NAV is {nav} on {}",
            row.date
        )));
    }
    Ok(fully_diluted_market_cap(row) / nav)
}

/// mNAV over time, with rows where it is undefined left out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MnavSeries {
    /// `(date, mnav)` for every row with a defined NAV.
    pub points: Vec<(Date, f64)>,
    /// Rows skipped because NAV was zero or missing.
    pub undefined_rows: usize,
}

impl MnavSeries {
    /// Most recent defined point.
    #[must_use]
    pub fn latest(&self) -> Option<(Date, f64)> {
        self.points.last().copied()
    }

    /// Smallest and largest mNAV in the series.
    #[must_use]
    pub fn range(&self) -> Option<(f64, f64)> {
        let mut values = self.points.iter().map(|(_, v)| *v);
        let first = values.next()?;
        Some(values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }
}

/// Compute mNAV for every row of `table`.
#[must_use]
pub fn mnav_series(table: &RecordTable) -> MnavSeries {
    let mut series = MnavSeries::default();
    for row in table {
        match mnav(row) {
            Ok(value) => series.points.push((row.date, value)),
            Err(_) => series.undefined_rows += 1,
        }
    }
    if series.undefined_rows > 0 {
        tracing::warn!(
            undefined_rows = series.undefined_rows,
            "skipped rows with zero or missing NAV in mNAV series"
        );
    }
    series
}

/// Average daily change in bitcoin balance over the trailing window.
///
/// Uses the last [`YIELD_WINDOW`] rows, or every row when fewer are
/// available. Differences that are not finite are ignored. With fewer than two
/// rows, or no finite difference, the yield is zero rather than `NaN`.
#[must_use]
pub fn daily_btc_yield(table: &RecordTable) -> f64 {
    let rows = table.rows();
    let window = &rows[rows.len().saturating_sub(YIELD_WINDOW)..];

    let diffs: Vec<f64> = window
        .windows(2)
        .map(|w| w[1].btc_balance - w[0].btc_balance)
        .filter(|d| d.is_finite())
        .collect();

    if diffs.is_empty() {
        return 0.0;
    }
    diffs.iter().sum::<f64>() / diffs.len() as f64
}

/// NAV multiple per share at one reference level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelValue {
    /// The NAV multiple.
    pub level: u32,
    /// Value per share in USD.
    pub value: f64,
}

/// One projected day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedPoint {
    /// Calendar date of the projection.
    pub date: Date,
    /// Days after the last observation.
    pub days_ahead: u32,
    /// Projected bitcoin balance.
    pub btc_balance: f64,
    /// Projected NAV at the last observed bitcoin price.
    pub nav: f64,
    /// NAV multiples per share, one per configured level.
    pub nav_per_share: Vec<LevelValue>,
}

/// Forward projection of NAV multiples per share.
///
/// Bitcoin price and diluted share count are held at their last observed
/// values; only the balance grows, linearly at [`daily_btc_yield`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    /// Average daily balance change used for the projection.
    pub daily_btc_yield: f64,
    /// Date of the last observation.
    pub start: Date,
    /// One point per projected day.
    pub points: Vec<ProjectedPoint>,
}

impl Projection {
    /// Projected values for one level, as `(date, value)` pairs.
    #[must_use]
    pub fn level_series(&self, level: u32) -> Vec<(Date, f64)> {
        self.points
            .iter()
            .filter_map(|p| {
                p.nav_per_share
                    .iter()
                    .find(|lv| lv.level == level)
                    .map(|lv| (p.date, lv.value))
            })
            .collect()
    }
}

/// Project NAV multiples per share `projection_months * 30` days forward.
///
/// `table` must be sorted by date.
///
/// # Errors
///
/// Returns [`TreasuryError::InsufficientData`] for an empty table.
pub fn project_nav_per_share(
    table: &RecordTable,
    levels: &[u32],
    projection_months: u32,
) -> Result<Projection> {
    let last = table.last().ok_or_else(|| {
        TreasuryError::InsufficientData("cannot project from an empty table".to_string())
    })?;

    let daily_btc_yield = daily_btc_yield(table);
    let days = projection_months * DAYS_PER_MONTH;

    let points = (1..=days)
        .map(|day| {
            let btc_balance = last.btc_balance + daily_btc_yield * f64::from(day);
            let nav = btc_balance * last.btc_price;
            ProjectedPoint {
                date: last.date + Duration::days(i64::from(day)),
                days_ahead: day,
                btc_balance,
                nav,
                nav_per_share: levels
                    .iter()
                    .map(|&level| LevelValue {
                        level,
                        value: nav * f64::from(level) / last.diluted_shares_outstanding,
                    })
                    .collect(),
            }
        })
        .collect();

    tracing::debug!(daily_btc_yield, days, "projected NAV per share");

    Ok(Projection {
        daily_btc_yield,
        start: last.date,
        points,
    })
}

/// Most recent upward crossing of the current NAV by the market cap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Crossing {
    /// Row index of the crossing in the scanned table.
    pub index: usize,
    /// Date of the crossing row.
    pub date: Date,
    /// Market cap on the crossing row.
    pub market_cap: f64,
    /// NAV of the last row, the level being crossed.
    pub current_nav: f64,
    /// Days between the crossing row and the last row.
    pub days_difference: i64,
}

/// Find the most recent index `i` with
/// `market_caps[i - 1] < current_nav <= market_caps[i]`, scanning backward.
///
/// Returns `None` when no upward crossing exists; callers decide how to
/// present that. `dates` and `market_caps` are parallel and date-sorted.
#[must_use]
pub fn find_crossing(dates: &[Date], market_caps: &[f64], current_nav: f64) -> Option<Crossing> {
    let n = dates.len().min(market_caps.len());
    if n < 2 {
        return None;
    }
    let last_date = dates[n - 1];

    (1..n)
        .rev()
        .find(|&i| market_caps[i - 1] < current_nav && current_nav <= market_caps[i])
        .map(|i| Crossing {
            index: i,
            date: dates[i],
            market_cap: market_caps[i],
            current_nav,
            days_difference: (last_date - dates[i]).num_days(),
        })
}

/// [`find_crossing`] over a date-sorted table, using the last row's NAV.
#[must_use]
pub fn market_cap_nav_crossing(table: &RecordTable) -> Option<Crossing> {
    let current_nav = nav(table.last()?);
    let dates = table.dates();
    let caps: Vec<f64> = table.iter().map(fully_diluted_market_cap).collect();
    find_crossing(&dates, &caps, current_nav)
}
