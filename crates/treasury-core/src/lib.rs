#![doc(issue_tracker_base_url = "https://github.com/factordynamics/treasury/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core data model and analytics for bitcoin treasury companies.
//!
//! A run starts from a [`RecordTable`] of per-date observations and flows one
//! way through the pipeline:
//!
//! 1. [`clean()`] splits the table into the *valid* and *unique* views
//! 2. [`fit()`] regresses btc-per-share on holdings in log-log space
//! 3. [`metrics`] derives NAV, mNAV, projections and the market-cap/NAV crossing
//! 4. [`analysis`] packages everything into an [`AnalysisReport`]
//!
//! Company specific behaviour lives entirely in [`CompanyConfig`] values.

/// The version of the treasury-core crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod analysis;
pub mod clean;
pub mod config;
pub mod error;
pub mod fit;
pub mod frame;
pub mod metrics;
pub mod presets;
pub mod types;

pub use analysis::{AnalysisReport, CorrelationStrength, RangeStats, analyze, prepare};
pub use clean::{CleanedData, clean};
pub use config::{ChartConfig, ChartKind, ColumnMapping, CompanyConfig, DataSource, load_companies};
pub use error::{Result, TreasuryError};
pub use fit::{ExponentInterpretation, FitResult, fit, fit_line};
pub use metrics::{Crossing, MnavSeries, Projection};
pub use presets::{find_preset, presets};
pub use types::{Date, DateRange, Observation, RecordTable, parse_date};
