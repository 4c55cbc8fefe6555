//! Chart renderers.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use crate::{chart::ChartDocument, error::Result};

/// Turns a chart document into an artifact on disk.
///
/// Implementations decide the file format; the runner asks for the
/// extension to name artifacts and the uploader uses it to select them.
pub trait ChartRenderer: Send + Sync {
    /// Renderer name for logs.
    fn name(&self) -> &str;

    /// Artifact file extension, without the dot.
    fn extension(&self) -> &str;

    /// Write `doc` to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the artifact cannot be written.
    fn render(&self, doc: &ChartDocument, path: &Path) -> Result<()>;
}

impl<R: ChartRenderer + ?Sized> ChartRenderer for Box<R> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn extension(&self) -> &str {
        (**self).extension()
    }

    fn render(&self, doc: &ChartDocument, path: &Path) -> Result<()> {
        (**self).render(doc, path)
    }
}

/// Writes chart documents as pretty-printed JSON, ready for a front-end
/// plotting library.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonChartWriter;

impl ChartRenderer for JsonChartWriter {
    fn name(&self) -> &str {
        "json"
    }

    fn extension(&self) -> &str {
        "json"
    }

    fn render(&self, doc: &ChartDocument, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, doc)?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{Axis, Point, Series, SeriesStyle};
    use treasury_core::ChartKind;

    #[test]
    fn test_json_writer_round_trips_document() {
        let doc = ChartDocument {
            kind: ChartKind::BtcPerShare,
            company: "Test".to_string(),
            title: "Test Bitcoin per Diluted Share".to_string(),
            subtitle: "As of 2025-06-30".to_string(),
            x_axis: Axis::linear("Date"),
            y_axis: Axis::linear("Sats per Diluted Share"),
            series: vec![Series::new(
                "Sats",
                "#f7931a",
                SeriesStyle::Line,
                vec![Point::new(1.0, 2.0)],
            )],
            reference_lines: vec![],
            annotations: vec![],
        };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test_time_vs_btc_per_share.json");
        JsonChartWriter.render(&doc, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let parsed: ChartDocument = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, doc);
        assert!(text.contains("\"kind\": \"btc_per_share\""));
    }
}
