//! Power-law regression of btc-per-share on bitcoin holdings.
//!
//! The relationship `btc_per_diluted_share = a * btc_balance^b` becomes linear
//! after a base-10 log transform of both sides, so `b` and `log10(a)` are the
//! slope and intercept of an ordinary least squares line in log-log space.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::{
    Result, TreasuryError,
    types::{Observation, RecordTable},
};

/// Number of samples in the plotting line produced by [`fit_line`].
pub const FIT_LINE_POINTS: usize = 100;

/// How the fitted exponent relates holdings growth to per-share growth.
///
/// Classification compares the slope against exactly `1.0`, so [`Linear`]
/// only appears for slopes that are bit-for-bit one.
///
/// [`Linear`]: ExponentInterpretation::Linear
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExponentInterpretation {
    /// Exponent below one.
    DiminishingReturns,
    /// Exponent exactly one.
    Linear,
    /// Exponent above one.
    IncreasingReturns,
}

impl ExponentInterpretation {
    /// Human-readable description.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::DiminishingReturns => "diminishing returns",
            Self::Linear => "linear relationship",
            Self::IncreasingReturns => "increasing returns",
        }
    }
}

/// Coefficients and goodness of fit of the log-log regression.
///
/// All statistics are computed over the unique (deduplicated) points only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    /// Power-law exponent.
    pub slope: f64,
    /// Intercept in log10 space.
    pub intercept: f64,
    /// `10^intercept`, the power-law prefactor.
    pub a_coeff: f64,
    /// Coefficient of determination over the training points.
    pub r_squared: f64,
    /// Pearson correlation of the log-transformed points.
    pub pearson_correlation: f64,
    /// Number of training points.
    pub n_points: usize,
}

impl FitResult {
    /// Classify the exponent.
    ///
    /// The comparison against `1.0` is exact: no tolerance band is applied.
    #[must_use]
    pub fn interpretation(&self) -> ExponentInterpretation {
        if self.slope < 1.0 {
            ExponentInterpretation::DiminishingReturns
        } else if self.slope > 1.0 {
            ExponentInterpretation::IncreasingReturns
        } else {
            ExponentInterpretation::Linear
        }
    }

    /// Fitted `log10(btc_per_diluted_share)` at a `log10(btc_balance)`.
    #[must_use]
    pub fn predict_log(&self, log_btc_balance: f64) -> f64 {
        self.slope.mul_add(log_btc_balance, self.intercept)
    }

    /// Fitted btc-per-share at a holdings level.
    #[must_use]
    pub fn predict(&self, btc_balance: f64) -> f64 {
        self.a_coeff * btc_balance.powf(self.slope)
    }

    /// Equation in the `y = a × x^b` form.
    #[must_use]
    pub fn equation(&self) -> String {
        format!("y = {:.2e} × x^{:.3}", self.a_coeff, self.slope)
    }

    /// Sum of squared log-space residuals over `points`.
    #[must_use]
    pub fn residual_sum_of_squares(&self, points: &RecordTable) -> f64 {
        points
            .iter()
            .map(|r| {
                let predicted = self.predict_log(r.btc_balance.log10());
                let resid = r.btc_per_diluted_share.log10() - predicted;
                resid * resid
            })
            .sum()
    }
}

/// Fit the power law over the unique view.
///
/// # Errors
///
/// Returns [`TreasuryError::InsufficientData`] when fewer than two points are
/// supplied, when any balance or btc-per-share is non-positive (the log is
/// undefined), or when every point has the same holdings level.
pub fn fit(unique: &RecordTable) -> Result<FitResult> {
    let n = unique.len();
    if n < 2 {
        return Err(TreasuryError::InsufficientData(format!(
            "power-law regression needs at least 2 unique points, got {n}"
        )));
    }

    if let Some(bad) = unique.iter().find(|r| !loggable(r)) {
        return Err(TreasuryError::InsufficientData(format!(
            "non-positive value on {} (btc_balance={}, btc_per_diluted_share={}), log undefined",
            bad.date, bad.btc_balance, bad.btc_per_diluted_share
        )));
    }

    let x: Array1<f64> = unique.iter().map(|r| r.btc_balance.log10()).collect();
    let y: Array1<f64> = unique
        .iter()
        .map(|r| r.btc_per_diluted_share.log10())
        .collect();

    let x_mean = x.sum() / n as f64;
    let y_mean = y.sum() / n as f64;
    let dx = &x - x_mean;
    let dy = &y - y_mean;

    let sxx = dx.dot(&dx);
    let syy = dy.dot(&dy);
    let sxy = dx.dot(&dy);

    if sxx == 0.0 {
        return Err(TreasuryError::InsufficientData(
            "all points share the same holdings level".to_string(),
        ));
    }

    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;

    let residuals = &y - &x.mapv(|xi| slope.mul_add(xi, intercept));
    let ss_res = residuals.dot(&residuals);
    let r_squared = if syy > 0.0 {
        1.0 - ss_res / syy
    } else if ss_res == 0.0 {
        1.0
    } else {
        0.0
    };

    let pearson_correlation = if syy > 0.0 {
        sxy / (sxx * syy).sqrt()
    } else {
        f64::NAN
    };

    let result = FitResult {
        slope,
        intercept,
        a_coeff: 10f64.powf(intercept),
        r_squared,
        pearson_correlation,
        n_points: n,
    };

    tracing::info!(
        n_points = n,
        slope = result.slope,
        r_squared = result.r_squared,
        "fitted power law"
    );

    Ok(result)
}

/// Sample the fitted line across the log-holdings range of `valid`.
///
/// The regression is trained on the unique view, but the line is drawn over
/// every valid row so it spans the full holdings history. Returns
/// `(log10(btc_balance), fitted log10(btc_per_diluted_share))` pairs, or an
/// empty vector when `valid` has no rows.
#[must_use]
pub fn fit_line(valid: &RecordTable, fit: &FitResult) -> Vec<(f64, f64)> {
    let logs = valid.iter().map(|r| r.btc_balance.log10());
    let (min, max) = logs.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !min.is_finite() || !max.is_finite() {
        return Vec::new();
    }

    Array1::linspace(min, max, FIT_LINE_POINTS)
        .iter()
        .map(|&x| (x, fit.predict_log(x)))
        .collect()
}

fn loggable(row: &Observation) -> bool {
    row.btc_balance > 0.0 && row.btc_per_diluted_share > 0.0
}
