//! Chart generation for treasury analyses.
//!
//! Charts are built as renderer-agnostic [`ChartDocument`]s from a
//! [`ChartContext`] and written to disk by a [`ChartRenderer`]: PNG images
//! through [`PngChartRenderer`], or JSON documents for a front-end plotting
//! library through [`JsonChartWriter`]. The
//! [`ChartRunner`] drives the configured chart kinds for one company and
//! keeps going when a single chart fails.

mod build;
mod chart;
mod error;
mod png;
mod render;
mod runner;

pub use build::{
    ChartContext, SATS_PER_BTC, btc_per_share, build, mnav_chart, power_law, stacked_area,
    stock_nav,
};
pub use chart::{
    Annotation, Axis, ChartDocument, Point, ReferenceLine, Scale, Series, SeriesStyle, XValue,
};
pub use error::{ChartError, Result};
pub use png::{CHART_FONT_ENV, PNG_SIZE, PngChartRenderer};
pub use render::{ChartRenderer, JsonChartWriter};
pub use runner::{ChartOutcome, ChartRunner};
