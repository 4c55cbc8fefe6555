//! PNG rendering through plotters' bitmap backend.
//!
//! Log axes are drawn by projecting values into log10 space and labelling
//! ticks with the original magnitudes; date axes use days since 1970-01-01.
//! Text needs a TrueType font, looked up once per process from
//! [`CHART_FONT_ENV`] and a list of common system locations. Without one the
//! chart is still drawn, only without titles, labels and legend.

use std::{
    ops::Range,
    path::{Path, PathBuf},
    sync::OnceLock,
};

use chrono::TimeDelta;
use plotters::{
    prelude::*,
    style::{FontStyle, register_font},
};
use treasury_core::Date;

use crate::{
    chart::{ChartDocument, Scale, SeriesStyle, XValue},
    error::{ChartError, Result},
    render::ChartRenderer,
};

/// Default image size in pixels.
pub const PNG_SIZE: (u32, u32) = (1200, 800);

/// Environment variable naming a TrueType font used for chart text.
pub const CHART_FONT_ENV: &str = "TREASURY_CHART_FONT";

const FONT_FAMILY: &str = "sans-serif";

const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

static TEXT_ENABLED: OnceLock<bool> = OnceLock::new();

fn text_enabled() -> bool {
    *TEXT_ENABLED.get_or_init(register_chart_font)
}

fn register_chart_font() -> bool {
    let configured = std::env::var_os(CHART_FONT_ENV).map(PathBuf::from);
    let candidates = configured
        .into_iter()
        .chain(FONT_CANDIDATES.iter().map(PathBuf::from));

    for path in candidates {
        let Ok(bytes) = std::fs::read(&path) else {
            continue;
        };
        // plotters keeps registered fonts for the life of the process
        let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
        if register_font(FONT_FAMILY, FontStyle::Normal, bytes).is_ok() {
            tracing::debug!(path = %path.display(), "registered chart font");
            return true;
        }
    }
    tracing::warn!(
        env = CHART_FONT_ENV,
        "no TrueType font found, PNG charts are drawn without text"
    );
    false
}

/// Writes chart documents as PNG images.
#[derive(Debug, Clone, Copy)]
pub struct PngChartRenderer {
    size: (u32, u32),
}

impl Default for PngChartRenderer {
    fn default() -> Self {
        Self { size: PNG_SIZE }
    }
}

impl PngChartRenderer {
    /// Renderer producing `width` x `height` images.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
        }
    }

    /// Image size in pixels.
    #[must_use]
    pub const fn size(&self) -> (u32, u32) {
        self.size
    }
}

impl ChartRenderer for PngChartRenderer {
    fn name(&self) -> &str {
        "png"
    }

    fn extension(&self) -> &str {
        "png"
    }

    fn render(&self, doc: &ChartDocument, path: &Path) -> Result<()> {
        draw(doc, path, self.size, text_enabled())
    }
}

fn render_error(e: impl std::fmt::Display) -> ChartError {
    ChartError::Render(e.to_string())
}

/// A series in drawing coordinates.
struct Projected {
    name: String,
    color: RGBColor,
    style: SeriesStyle,
    points: Vec<(f64, f64)>,
}

fn x_coord(x: XValue) -> f64 {
    match x {
        XValue::Number(v) => v,
        XValue::Date(d) => (d - Date::default()).num_days() as f64,
    }
}

/// Map a data value onto its axis; `None` when it cannot be drawn.
fn project(value: f64, scale: Scale) -> Option<f64> {
    let v = match scale {
        Scale::Linear => value,
        Scale::Log if value > 0.0 => value.log10(),
        Scale::Log => return None,
    };
    v.is_finite().then_some(v)
}

/// `#rrggbb` to a color; anything else is black.
fn parse_color(hex: &str) -> RGBColor {
    let hex = hex.trim_start_matches('#');
    let channel = |i: usize| hex.get(i..i + 2).and_then(|c| u8::from_str_radix(c, 16).ok());
    match (hex.len(), channel(0), channel(2), channel(4)) {
        (6, Some(r), Some(g), Some(b)) => RGBColor(r, g, b),
        _ => RGBColor(0, 0, 0),
    }
}

fn bounds(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

fn padded((lo, hi): (f64, f64)) -> Range<f64> {
    if hi - lo < 1e-12 {
        return (lo - 1.0)..(hi + 1.0);
    }
    let pad = (hi - lo) * 0.05;
    (lo - pad)..(hi + pad)
}

fn compact(v: f64) -> String {
    let a = v.abs();
    if a >= 1e9 {
        format!("{:.1}B", v / 1e9)
    } else if a >= 1e6 {
        format!("{:.1}M", v / 1e6)
    } else if a >= 1e3 {
        format!("{:.1}K", v / 1e3)
    } else if a >= 1.0 || a < 1e-12 {
        format!("{v:.2}")
    } else {
        format!("{v:.2e}")
    }
}

/// Tick label for a projected axis value.
fn tick_label(value: f64, scale: Scale, dates: bool) -> String {
    if dates {
        return TimeDelta::try_days(value.round() as i64)
            .and_then(|days| Date::default().checked_add_signed(days))
            .map_or_else(String::new, |d| d.format("%Y-%m-%d").to_string());
    }
    match scale {
        Scale::Linear => compact(value),
        Scale::Log => compact(10f64.powf(value)),
    }
}

fn draw(doc: &ChartDocument, path: &Path, size: (u32, u32), text: bool) -> Result<()> {
    let (x_scale, y_scale) = (doc.x_axis.scale, doc.y_axis.scale);
    let series: Vec<Projected> = doc
        .series
        .iter()
        .map(|s| Projected {
            name: s.name.clone(),
            color: parse_color(&s.color),
            style: s.style,
            points: s
                .points
                .iter()
                .filter_map(|p| Some((project(x_coord(p.x), x_scale)?, project(p.y, y_scale)?)))
                .collect(),
        })
        .collect();
    let reference: Vec<(f64, RGBColor, &str)> = doc
        .reference_lines
        .iter()
        .filter_map(|l| Some((project(l.value, y_scale)?, parse_color(&l.color), l.label.as_str())))
        .collect();

    let points = || series.iter().flat_map(|s| s.points.iter().copied());
    let (Some(x_bounds), Some(y_bounds)) = (
        bounds(points().map(|p| p.0)),
        bounds(
            points()
                .map(|p| p.1)
                .chain(reference.iter().map(|r| r.0))
                .chain(area_floor(&series, y_scale)),
        ),
    ) else {
        return Err(ChartError::InsufficientData {
            chart: doc.kind.name(),
            reason: "no drawable points".to_string(),
        });
    };
    let x_range = padded(x_bounds);
    let y_range = padded(y_bounds);
    let dates = doc
        .series
        .iter()
        .filter_map(|s| s.points.first())
        .any(|p| matches!(p.x, XValue::Date(_)));

    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE).map_err(render_error)?;

    let mut builder = ChartBuilder::on(&root);
    builder
        .margin(20)
        .x_label_area_size(if text { 60 } else { 10 })
        .y_label_area_size(if text { 90 } else { 10 });
    if text {
        builder.caption(doc.title.as_str(), (FONT_FAMILY, 26).into_font());
    }
    let mut chart = builder
        .build_cartesian_2d(x_range.clone(), y_range.clone())
        .map_err(render_error)?;

    {
        let x_fmt = move |v: &f64| tick_label(*v, x_scale, dates);
        let y_fmt = move |v: &f64| tick_label(*v, y_scale, false);
        let mut mesh = chart.configure_mesh();
        if text {
            mesh.x_desc(doc.x_axis.label.as_str())
                .y_desc(doc.y_axis.label.as_str())
                .x_labels(8)
                .y_labels(8)
                .x_label_formatter(&x_fmt)
                .y_label_formatter(&y_fmt)
                .label_style((FONT_FAMILY, 14).into_font());
        } else {
            mesh.x_labels(0).y_labels(0);
        }
        mesh.draw().map_err(render_error)?;
    }

    let baseline = if y_scale == Scale::Linear && y_range.start <= 0.0 {
        0.0
    } else {
        y_range.start
    };
    for s in &series {
        let color = s.color;
        let stroke = color.stroke_width(2);
        let points = s.points.iter().copied();
        let drawn = match s.style {
            SeriesStyle::Line => chart.draw_series(LineSeries::new(points, stroke)),
            SeriesStyle::Dashed => chart.draw_series(DashedLineSeries::new(points, 10, 6, stroke)),
            SeriesStyle::Scatter => {
                chart.draw_series(points.map(|p| Circle::new(p, 4, color.filled())))
            }
            SeriesStyle::Area => chart.draw_series(
                AreaSeries::new(points, baseline, &color.mix(0.35)).border_style(stroke),
            ),
        }
        .map_err(render_error)?;
        if text {
            drawn
                .label(s.name.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], stroke));
        }
    }

    for &(value, color, label) in &reference {
        let style = color.stroke_width(1);
        let line = vec![(x_range.start, value), (x_range.end, value)];
        let drawn = chart
            .draw_series(DashedLineSeries::new(line, 8, 6, style))
            .map_err(render_error)?;
        if text {
            drawn
                .label(label)
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
        }
    }

    if text {
        let font = (FONT_FAMILY, 16).into_font().color(&BLACK);
        let mut info_lines: Vec<&str> = vec![doc.subtitle.as_str()];
        for annotation in &doc.annotations {
            let anchor = annotation.at.and_then(|p| {
                Some((project(x_coord(p.x), x_scale)?, project(p.y, y_scale)?))
            });
            match anchor {
                Some(coord) => {
                    chart
                        .draw_series(std::iter::once(Text::new(
                            annotation.text.clone(),
                            coord,
                            font.clone(),
                        )))
                        .map_err(render_error)?;
                }
                None => info_lines.extend(annotation.text.lines()),
            }
        }
        for (i, line) in (0i32..).zip(info_lines) {
            root.draw(&Text::new(line.to_string(), (130, 80 + 20 * i), font.clone()))
                .map_err(render_error)?;
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .label_font((FONT_FAMILY, 14).into_font())
            .background_style(WHITE.mix(0.85))
            .border_style(BLACK)
            .draw()
            .map_err(render_error)?;
    }

    root.present().map_err(render_error)?;
    tracing::debug!(path = %path.display(), chart = %doc.kind, "rendered PNG");
    Ok(())
}

/// Area fills reach down to zero on linear axes.
fn area_floor(series: &[Projected], scale: Scale) -> Option<f64> {
    (scale == Scale::Linear && series.iter().any(|s| s.style == SeriesStyle::Area)).then_some(0.0)
}
