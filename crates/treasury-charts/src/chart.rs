//! Renderer-agnostic chart documents.
//!
//! A [`ChartDocument`] carries everything a renderer needs: axes, series,
//! reference lines and annotations. Styling beyond a color and a line style
//! is left to the renderer.

use serde::{Deserialize, Serialize};
use treasury_core::{ChartKind, Date};

/// Axis scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scale {
    /// Linear scale.
    Linear,
    /// Base-10 logarithmic scale.
    Log,
}

/// One chart axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    /// Axis label.
    pub label: String,
    /// Axis scale.
    pub scale: Scale,
}

impl Axis {
    /// A linear axis.
    #[must_use]
    pub fn linear(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            scale: Scale::Linear,
        }
    }

    /// A logarithmic axis.
    #[must_use]
    pub fn log(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            scale: Scale::Log,
        }
    }
}

/// X coordinate: a number or a calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum XValue {
    /// Numeric coordinate.
    Number(f64),
    /// Date coordinate.
    Date(Date),
}

impl From<f64> for XValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<Date> for XValue {
    fn from(value: Date) -> Self {
        Self::Date(value)
    }
}

/// One data point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate.
    pub x: XValue,
    /// Y coordinate.
    pub y: f64,
}

impl Point {
    /// Create a point.
    #[must_use]
    pub fn new(x: impl Into<XValue>, y: f64) -> Self {
        Self { x: x.into(), y }
    }
}

/// How a series is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesStyle {
    /// Solid line.
    Line,
    /// Dashed line, used for projections and secondary series.
    Dashed,
    /// Markers only.
    Scatter,
    /// Filled area down to zero.
    Area,
}

/// A named sequence of points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    /// Legend label.
    pub name: String,
    /// Hex color.
    pub color: String,
    /// Drawing style.
    pub style: SeriesStyle,
    /// Points in drawing order.
    pub points: Vec<Point>,
}

impl Series {
    /// Create a series.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        color: impl Into<String>,
        style: SeriesStyle,
        points: Vec<Point>,
    ) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
            style,
            points,
        }
    }
}

/// Horizontal reference line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceLine {
    /// Legend label.
    pub label: String,
    /// Y value.
    pub value: f64,
    /// Hex color.
    pub color: String,
}

/// Free text, optionally anchored at a point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Annotation text.
    pub text: String,
    /// Anchor point; `None` places the text in the chart's info box.
    pub at: Option<Point>,
}

/// A complete chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDocument {
    /// Chart kind.
    pub kind: ChartKind,
    /// Company display name.
    pub company: String,
    /// Main title.
    pub title: String,
    /// Subtitle.
    pub subtitle: String,
    /// X axis.
    pub x_axis: Axis,
    /// Y axis.
    pub y_axis: Axis,
    /// Data series.
    pub series: Vec<Series>,
    /// Horizontal reference lines.
    #[serde(default)]
    pub reference_lines: Vec<ReferenceLine>,
    /// Text annotations.
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl ChartDocument {
    /// Series by legend label.
    #[must_use]
    pub fn series_named(&self, name: &str) -> Option<&Series> {
        self.series.iter().find(|s| s.name == name)
    }

    /// Total number of points across all series.
    #[must_use]
    pub fn point_count(&self) -> usize {
        self.series.iter().map(|s| s.points.len()).sum()
    }
}
