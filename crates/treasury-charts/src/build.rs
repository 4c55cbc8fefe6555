//! Builders turning a prepared record table into chart documents.

use treasury_core::{
    ChartConfig, ChartKind, CleanedData, CompanyConfig, Date, FitResult, RecordTable, clean, fit,
    fit_line,
    metrics::{
        fully_diluted_market_cap, market_cap_nav_crossing, mnav_series, nav,
        nav_multiple_per_share, project_nav_per_share,
    },
    prepare,
};

use crate::{
    chart::{Annotation, Axis, ChartDocument, Point, ReferenceLine, Series, SeriesStyle},
    error::{ChartError, Result},
};

/// Satoshis per bitcoin.
pub const SATS_PER_BTC: f64 = 100_000_000.0;

const BLUE: &str = "#0000ff";
const RED: &str = "#ff0000";
const DARK_RED: &str = "#8b0a1a";
const BLACK: &str = "#000000";
const ORANGE: &str = "#f7931a";
const FORWARD_ORANGE: &str = "#ff6600";

/// Inputs shared by every chart of one company.
#[derive(Debug)]
pub struct ChartContext<'a> {
    /// Company being charted.
    pub company: &'a CompanyConfig,
    /// Date-sorted table after the global start filter.
    pub table: RecordTable,
    /// Cleaned views of `table`.
    pub cleaned: CleanedData,
    /// Power-law fit over the unique view.
    pub fit: Result<FitResult>,
    /// Date stamped in subtitles.
    pub as_of: Date,
}

impl<'a> ChartContext<'a> {
    /// Prepare, clean and fit `table` once for all charts.
    #[must_use]
    pub fn new(company: &'a CompanyConfig, table: &RecordTable, as_of: Date) -> Self {
        let table = prepare(table, &company.charts);
        let cleaned = clean(&table);
        let fit = fit(&cleaned.unique).map_err(ChartError::from);
        Self {
            company,
            table,
            cleaned,
            fit,
            as_of,
        }
    }

    const fn config(&self) -> &ChartConfig {
        &self.company.charts
    }

    fn subtitle(&self) -> String {
        format!("As of {}", self.as_of)
    }

    fn require_rows(&self, kind: ChartKind) -> Result<()> {
        if self.table.is_empty() {
            return Err(ChartError::InsufficientData {
                chart: kind.name(),
                reason: "no rows after date filtering".to_string(),
            });
        }
        Ok(())
    }
}

/// Build the document for `kind`.
///
/// # Errors
///
/// Returns [`ChartError::InsufficientData`] when the table cannot support
/// the chart, e.g. a failed regression for the power-law chart.
pub fn build(kind: ChartKind, ctx: &ChartContext<'_>) -> Result<ChartDocument> {
    match kind {
        ChartKind::PowerLaw => power_law(ctx),
        ChartKind::StockNav => stock_nav(ctx),
        ChartKind::Mnav => mnav_chart(ctx),
        ChartKind::StackedArea => stacked_area(ctx),
        ChartKind::BtcPerShare => btc_per_share(ctx),
    }
}

/// Log-log scatter of the unique points with the fitted power law.
///
/// # Errors
///
/// Returns [`ChartError::InsufficientData`] when the regression failed.
pub fn power_law(ctx: &ChartContext<'_>) -> Result<ChartDocument> {
    let fit = match &ctx.fit {
        Ok(fit) => *fit,
        Err(e) => {
            return Err(ChartError::InsufficientData {
                chart: ChartKind::PowerLaw.name(),
                reason: e.to_string(),
            });
        }
    };
    let name = &ctx.company.name;
    let share_type = &ctx.config().share_type;

    // Both axes are logarithmic, so points carry data-space values
    let updates = ctx
        .cleaned
        .unique
        .iter()
        .map(|r| Point::new(r.btc_balance, r.btc_per_diluted_share))
        .collect();
    let line = fit_line(&ctx.cleaned.valid, &fit)
        .into_iter()
        .map(|(x, y)| Point::new(10f64.powf(x), 10f64.powf(y)))
        .collect();

    Ok(ChartDocument {
        kind: ChartKind::PowerLaw,
        company: name.clone(),
        title: format!("{name} Holdings vs Bitcoin per {share_type} (Log-Log Scale)"),
        subtitle: format!("Power Law Relationship Analysis | {}", ctx.subtitle()),
        x_axis: Axis::log("Bitcoin Holdings (BTC)"),
        y_axis: Axis::log(format!("Bitcoin per {share_type}")),
        series: vec![
            Series::new(
                format!("{name} Treasury Updates ({})", fit.n_points),
                DARK_RED,
                SeriesStyle::Scatter,
                updates,
            ),
            Series::new("Fitted Power Law", RED, SeriesStyle::Line, line),
        ],
        reference_lines: Vec::new(),
        annotations: vec![Annotation {
            text: format!(
                "Power Law: {}\nR² = {:.6} | Correlation = {:.6}",
                fit.equation(),
                fit.r_squared,
                fit.pearson_correlation
            ),
            at: None,
        }],
    })
}

/// Stock price against NAV multiples per share, extended with the
/// accumulation projection.
///
/// # Errors
///
/// Returns [`ChartError::InsufficientData`] for an empty table.
pub fn stock_nav(ctx: &ChartContext<'_>) -> Result<ChartDocument> {
    ctx.require_rows(ChartKind::StockNav)?;
    let config = ctx.config();
    let projection = project_nav_per_share(
        &ctx.table,
        &config.nav_reference_levels,
        config.projection_months,
    )?;

    let mut series = vec![Series::new(
        "Stock Price",
        BLACK,
        SeriesStyle::Dashed,
        ctx.table
            .iter()
            .map(|r| Point::new(r.date, r.stock_price))
            .collect(),
    )];

    for (idx, &level) in config.nav_reference_levels.iter().enumerate() {
        let color = config.color_for(idx);
        series.push(Series::new(
            format!("{level}x NAV per Share"),
            color,
            SeriesStyle::Line,
            ctx.table
                .iter()
                .map(|r| Point::new(r.date, nav_multiple_per_share(r, level)))
                .collect(),
        ));
        series.push(Series::new(
            format!("{level}x NAV per Share (Projected)"),
            color,
            SeriesStyle::Dashed,
            projection
                .level_series(level)
                .into_iter()
                .map(|(date, value)| Point::new(date, value))
                .collect(),
        ));
    }

    Ok(ChartDocument {
        kind: ChartKind::StockNav,
        company: ctx.company.name.clone(),
        title: format!("{} Stock Price vs NAV Multiples", ctx.company.name),
        subtitle: format!(
            "Extended {} Months with Projected BTC Accumulation | {}",
            config.projection_months,
            ctx.subtitle()
        ),
        x_axis: Axis::linear("Date"),
        y_axis: Axis::linear(format!("Price per {} (USD)", config.share_type)),
        series,
        reference_lines: Vec::new(),
        annotations: vec![Annotation {
            text: format!(
                "Projected daily BTC yield: {:.4} BTC/day",
                projection.daily_btc_yield
            ),
            at: None,
        }],
    })
}

/// mNAV over time with reference lines at the configured multiples.
///
/// # Errors
///
/// Returns [`ChartError::InsufficientData`] when no row in the mNAV window
/// has a defined NAV.
pub fn mnav_chart(ctx: &ChartContext<'_>) -> Result<ChartDocument> {
    let config = ctx.config();
    let window = ctx.table.filter_dates(&config.mnav_range());
    let series = mnav_series(&window);
    let Some((latest_date, latest)) = series.latest() else {
        return Err(ChartError::InsufficientData {
            chart: ChartKind::Mnav.name(),
            reason: "no rows with a defined NAV".to_string(),
        });
    };

    let from = config
        .mnav_range()
        .start
        .map_or_else(|| "beginning".to_string(), |d| d.to_string());

    Ok(ChartDocument {
        kind: ChartKind::Mnav,
        company: ctx.company.name.clone(),
        title: format!(
            "{} Market Valuation vs Bitcoin Holdings (from {from})",
            ctx.company.name
        ),
        subtitle: format!("Current mNAV: {latest:.2}x | {}", ctx.subtitle()),
        x_axis: Axis::linear("Date"),
        y_axis: Axis::linear("Multiple of NAV (mNAV)"),
        series: vec![Series::new(
            "mNAV",
            BLUE,
            SeriesStyle::Line,
            series
                .points
                .iter()
                .map(|&(date, value)| Point::new(date, value))
                .collect(),
        )],
        reference_lines: config
            .nav_reference_levels
            .iter()
            .enumerate()
            .map(|(idx, &level)| ReferenceLine {
                label: format!("{level}x NAV"),
                value: f64::from(level),
                color: config.color_for(idx).to_string(),
            })
            .collect(),
        annotations: vec![Annotation {
            text: format!("{latest:.2}x"),
            at: Some(Point::new(latest_date, latest)),
        }],
    })
}

/// Fully diluted market cap stacked against bitcoin NAV, with the most
/// recent crossing when one exists.
///
/// # Errors
///
/// Returns [`ChartError::InsufficientData`] for an empty table.
pub fn stacked_area(ctx: &ChartContext<'_>) -> Result<ChartDocument> {
    ctx.require_rows(ChartKind::StackedArea)?;

    let mut annotations = Vec::new();
    match market_cap_nav_crossing(&ctx.table) {
        Some(crossing) => {
            tracing::info!(
                days = crossing.days_difference,
                market_cap = crossing.market_cap,
                current_nav = crossing.current_nav,
                "market cap/NAV crossing found"
            );
            annotations.push(Annotation {
                text: format!("{} days", crossing.days_difference),
                at: Some(Point::new(crossing.date, crossing.market_cap)),
            });
        }
        None => tracing::debug!("no market cap/NAV crossing"),
    }

    Ok(ChartDocument {
        kind: ChartKind::StackedArea,
        company: ctx.company.name.clone(),
        title: format!("{} Market Cap vs Bitcoin NAV", ctx.company.name),
        subtitle: ctx.subtitle(),
        x_axis: Axis::linear("Date"),
        y_axis: Axis::log("Value (USD)"),
        series: vec![
            Series::new(
                "Fully Diluted Market Cap",
                BLUE,
                SeriesStyle::Area,
                ctx.table
                    .iter()
                    .map(|r| Point::new(r.date, fully_diluted_market_cap(r)))
                    .collect(),
            ),
            Series::new(
                "Bitcoin NAV",
                RED,
                SeriesStyle::Area,
                ctx.table
                    .iter()
                    .map(|r| Point::new(r.date, nav(r)))
                    .collect(),
            ),
        ],
        reference_lines: Vec::new(),
        annotations,
    })
}

/// BTC per share over time, in satoshis, with the source's forward
/// btc-per-share as a second line when any row carries one.
///
/// # Errors
///
/// Returns [`ChartError::InsufficientData`] when no row is valid.
pub fn btc_per_share(ctx: &ChartContext<'_>) -> Result<ChartDocument> {
    if ctx.cleaned.valid.is_empty() {
        return Err(ChartError::InsufficientData {
            chart: ChartKind::BtcPerShare.name(),
            reason: "no valid rows".to_string(),
        });
    }
    let share_type = &ctx.config().share_type;

    let mut series = vec![Series::new(
        format!("Sats per {share_type}"),
        ORANGE,
        SeriesStyle::Line,
        ctx.cleaned
            .valid
            .iter()
            .map(|r| Point::new(r.date, r.btc_per_diluted_share * SATS_PER_BTC))
            .collect(),
    )];

    let forward: Vec<Point> = ctx
        .cleaned
        .valid
        .iter()
        .filter_map(|r| {
            r.forward_btc_per_share
                .filter(|v| v.is_finite())
                .map(|v| Point::new(r.date, v * SATS_PER_BTC))
        })
        .collect();
    if !forward.is_empty() {
        series.push(Series::new(
            format!("Fwd Sats per {share_type}"),
            FORWARD_ORANGE,
            SeriesStyle::Line,
            forward,
        ));
    }

    Ok(ChartDocument {
        kind: ChartKind::BtcPerShare,
        company: ctx.company.name.clone(),
        title: format!("{} Bitcoin per {share_type}", ctx.company.name),
        subtitle: ctx.subtitle(),
        x_axis: Axis::linear("Date"),
        y_axis: Axis::linear(format!("Sats per {share_type}")),
        series,
        reference_lines: Vec::new(),
        annotations: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::XValue;
    use approx::assert_relative_eq;
    use treasury_core::{Observation, find_preset, metrics::DAYS_PER_MONTH};

    fn d(day: u32) -> Date {
        Date::from_ymd_opt(2025, 6, day).unwrap()
    }

    fn table() -> RecordTable {
        RecordTable::from(vec![
            Observation::new(d(20), 300.0, 1000.0, 25_000.0, 100_000.0),
            Observation::new(d(10), 100.0, 1000.0, 5_000.0, 100_000.0),
            Observation::new(d(15), 200.0, 1000.0, 30_000.0, 100_000.0),
        ])
    }

    fn company() -> CompanyConfig {
        find_preset("Metaplanet").unwrap()
    }

    #[test]
    fn test_context_prepares_table() {
        let company = company();
        let ctx = ChartContext::new(&company, &table(), d(30));
        assert_eq!(ctx.table.dates(), vec![d(10), d(15), d(20)]);
        assert_eq!(ctx.cleaned.unique.len(), 3);
        assert!(ctx.fit.is_ok());
    }

    #[test]
    fn test_power_law_document() {
        let company = company();
        let ctx = ChartContext::new(&company, &table(), d(30));
        let doc = build(ChartKind::PowerLaw, &ctx).unwrap();

        assert_eq!(doc.series.len(), 2);
        assert_eq!(doc.series[0].points.len(), 3);
        assert_eq!(doc.series[1].points.len(), 100);
        assert!(doc.annotations[0].text.contains("R² = 1.000000"));

        // Log axes: values stay in data space
        assert_eq!(doc.x_axis.scale, crate::chart::Scale::Log);
        assert_eq!(doc.series[0].points[0].x, XValue::Number(100.0));
        let line = &doc.series[1].points;
        let XValue::Number(x0) = line[0].x else {
            panic!("expected numeric x");
        };
        assert_relative_eq!(x0, 100.0, max_relative = 1e-9);
        assert_relative_eq!(line[0].y, 0.1, max_relative = 1e-9);
    }

    #[test]
    fn test_power_law_skipped_without_fit() {
        let company = company();
        let single = RecordTable::from(vec![table().rows()[0]]);
        let ctx = ChartContext::new(&company, &single, d(30));
        assert!(matches!(
            power_law(&ctx),
            Err(ChartError::InsufficientData { chart: "power_law", .. })
        ));
    }

    #[test]
    fn test_stock_nav_has_projection_per_level() {
        let company = company();
        let ctx = ChartContext::new(&company, &table(), d(30));
        let doc = stock_nav(&ctx).unwrap();

        // Stock price + (history, projection) for 3, 5 and 7
        assert_eq!(doc.series.len(), 7);
        let projected = doc.series_named("5x NAV per Share (Projected)").unwrap();
        assert_eq!(projected.points.len(), (2 * DAYS_PER_MONTH) as usize);
        assert_eq!(projected.style, SeriesStyle::Dashed);

        let history = doc.series_named("3x NAV per Share").unwrap();
        assert_relative_eq!(history.points[0].y, 100.0 * 100_000.0 * 3.0 / 1000.0);
    }

    #[test]
    fn test_mnav_reference_lines_and_latest() {
        let company = company();
        let ctx = ChartContext::new(&company, &table(), d(30));
        let doc = mnav_chart(&ctx).unwrap();

        let levels: Vec<f64> = doc.reference_lines.iter().map(|l| l.value).collect();
        assert_eq!(levels, vec![3.0, 5.0, 7.0]);
        // Last row: cap 2.5e7, NAV 3e7
        assert!(doc.subtitle.starts_with("Current mNAV: 0.83x"));
        assert_eq!(
            doc.annotations[0].at.unwrap().x,
            XValue::Date(d(20))
        );
    }

    #[test]
    fn test_mnav_window_respects_start_date() {
        let mut company = company();
        company.charts.mnav_start_date = Some(d(15));
        let ctx = ChartContext::new(&company, &table(), d(30));
        let doc = mnav_chart(&ctx).unwrap();
        assert_eq!(doc.series[0].points.len(), 2);

        company.charts.mnav_start_date = Some(d(25));
        let ctx = ChartContext::new(&company, &table(), d(30));
        assert!(mnav_chart(&ctx).is_err());
    }

    #[test]
    fn test_stacked_area_annotates_crossing() {
        let company = company();
        let ctx = ChartContext::new(&company, &table(), d(30));
        let doc = stacked_area(&ctx).unwrap();

        // Current NAV 3e7; caps 5e6 -> 3e7 crosses at index 1 (June 15)
        assert_eq!(doc.annotations.len(), 1);
        assert_eq!(doc.annotations[0].text, "5 days");
        assert_eq!(doc.series[1].name, "Bitcoin NAV");
    }

    #[test]
    fn test_btc_per_share_in_sats() {
        let company = company();
        let ctx = ChartContext::new(&company, &table(), d(30));
        let doc = btc_per_share(&ctx).unwrap();
        assert_relative_eq!(doc.series[0].points[0].y, 0.1 * SATS_PER_BTC);
        assert_eq!(doc.y_axis.label, "Sats per Diluted Share");
        assert_eq!(doc.series.len(), 1);
    }

    #[test]
    fn test_btc_per_share_draws_forward_series() {
        let company = company();
        let rows: Vec<Observation> = table()
            .iter()
            .enumerate()
            .map(|(i, r)| {
                let forward = (i != 1).then_some(0.5);
                r.with_forward_btc_per_share(forward)
            })
            .collect();
        let ctx = ChartContext::new(&company, &RecordTable::from(rows), d(30));
        let doc = btc_per_share(&ctx).unwrap();

        assert_eq!(doc.series.len(), 2);
        let forward = doc.series_named("Fwd Sats per Diluted Share").unwrap();
        assert_eq!(forward.points.len(), 2);
        assert_relative_eq!(forward.points[0].y, 0.5 * SATS_PER_BTC);
    }

    #[test]
    fn test_empty_table_charts_fail_cleanly() {
        let company = company();
        let ctx = ChartContext::new(&company, &RecordTable::default(), d(30));
        for kind in ChartKind::ALL {
            assert!(build(kind, &ctx).is_err(), "{kind} should fail on empty data");
        }
    }
}
