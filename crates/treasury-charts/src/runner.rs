//! Runs the configured chart kinds for one company.

use std::path::{Path, PathBuf};

use treasury_core::ChartKind;

use crate::{
    build::{ChartContext, build},
    error::Result,
    render::ChartRenderer,
};

/// Result of one chart step.
#[derive(Debug)]
pub struct ChartOutcome {
    /// Chart kind.
    pub kind: ChartKind,
    /// Artifact path, or the reason the step failed.
    pub result: Result<PathBuf>,
}

impl ChartOutcome {
    /// Whether the artifact was written.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Builds and renders charts into an output directory.
#[derive(Debug)]
pub struct ChartRunner<R> {
    renderer: R,
    output_dir: PathBuf,
}

impl<R: ChartRenderer> ChartRunner<R> {
    /// Create a runner writing into `output_dir`.
    pub fn new(renderer: R, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            renderer,
            output_dir: output_dir.into(),
        }
    }

    /// The renderer in use.
    pub const fn renderer(&self) -> &R {
        &self.renderer
    }

    /// The output directory.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Artifact path for `kind`: `{company_lower}_{chart_stem}.{ext}`.
    pub fn artifact_path(&self, ctx: &ChartContext<'_>, kind: ChartKind) -> PathBuf {
        self.output_dir.join(format!(
            "{}.{}",
            ctx.company.chart_file_stem(kind),
            self.renderer.extension()
        ))
    }

    fn run_one(&self, ctx: &ChartContext<'_>, kind: ChartKind) -> Result<PathBuf> {
        let doc = build(kind, ctx)?;
        let path = self.artifact_path(ctx, kind);
        self.renderer.render(&doc, &path)?;
        Ok(path)
    }

    /// Run every configured chart kind in order.
    ///
    /// A failing step is logged and recorded; the remaining steps still run
    /// and artifacts already written are kept.
    pub fn run(&self, ctx: &ChartContext<'_>) -> Vec<ChartOutcome> {
        ctx.company
            .chart_kinds
            .iter()
            .map(|&kind| {
                let result = self.run_one(ctx, kind);
                match &result {
                    Ok(path) => tracing::info!(
                        chart = %kind,
                        renderer = self.renderer.name(),
                        path = %path.display(),
                        "chart written"
                    ),
                    Err(e) => tracing::warn!(chart = %kind, error = %e, "chart skipped"),
                }
                ChartOutcome { kind, result }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        chart::ChartDocument,
        error::ChartError,
        render::JsonChartWriter,
    };
    use treasury_core::{Date, Observation, RecordTable, find_preset};

    fn d(day: u32) -> Date {
        Date::from_ymd_opt(2025, 6, day).unwrap()
    }

    #[derive(Debug)]
    struct FailingRenderer;

    impl ChartRenderer for FailingRenderer {
        fn name(&self) -> &str {
            "failing"
        }

        fn extension(&self) -> &str {
            "png"
        }

        fn render(&self, doc: &ChartDocument, _path: &Path) -> Result<()> {
            if doc.kind == ChartKind::Mnav {
                return Err(std::io::Error::other("disk full").into());
            }
            Ok(())
        }
    }

    #[test]
    fn test_runner_writes_all_charts() {
        let company = find_preset("H100").unwrap();
        let table = RecordTable::from(vec![
            Observation::new(d(17), 100.0, 1000.0, 5_000.0, 100_000.0),
            Observation::new(d(18), 200.0, 1000.0, 30_000.0, 100_000.0),
            Observation::new(d(19), 300.0, 1000.0, 25_000.0, 100_000.0),
        ]);
        let ctx = ChartContext::new(&company, &table, d(30));

        let dir = tempfile::tempdir().unwrap();
        let runner = ChartRunner::new(JsonChartWriter, dir.path());
        let outcomes = runner.run(&ctx);

        assert_eq!(outcomes.len(), 5);
        assert!(outcomes.iter().all(ChartOutcome::is_success));
        assert!(
            dir.path()
                .join("h100_log_log_btc_held_vs_btc_per_diluted_share.json")
                .exists()
        );
        assert!(dir.path().join("h100_time_vs_mnav.json").exists());
    }

    #[test]
    fn test_runner_isolates_failures() {
        let company = find_preset("Metaplanet").unwrap();
        // A single row: power law fails, the rest still run
        let table = RecordTable::from(vec![Observation::new(
            d(1),
            100.0,
            1000.0,
            5_000.0,
            100_000.0,
        )]);
        let ctx = ChartContext::new(&company, &table, d(30));

        let runner = ChartRunner::new(FailingRenderer, "/unused");
        let outcomes = runner.run(&ctx);

        let failed: Vec<ChartKind> = outcomes
            .iter()
            .filter(|o| !o.is_success())
            .map(|o| o.kind)
            .collect();
        assert_eq!(failed, vec![ChartKind::PowerLaw, ChartKind::Mnav]);
        assert!(matches!(
            outcomes[0].result,
            Err(ChartError::InsufficientData { .. })
        ));
        assert_eq!(
            runner.artifact_path(&ctx, ChartKind::StockNav),
            PathBuf::from("/unused/metaplanet_time_vs_stock_price_and_nav_multiples.png")
        );
    }
}
