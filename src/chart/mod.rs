//! # Chart Module
//!
//! [`render`] turns a [`MetricTable`] into a [`Figure`]: a title and four
//! panels in a fixed order. A figure is plain data; [`draw_figure`] draws it
//! on any plotters backend, which is how both the SVG preview and the PDF
//! report are produced.
use crate::metrics::table::MetricTable;
use crate::metrics::Metric;
use plotters::chart::SeriesAnno;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{FontDesc, FontFamily, FontStyle};
use thiserror::Error;

/// Figure size in pixels, matching a 15 x 20 inch page at 100 dpi.
pub const DEFAULT_SIZE: (u32, u32) = (1500, 2000);

pub const VELOCITY_COLOR: RGBColor = RGBColor(0, 0, 255);
pub const RELEASES_COLOR: RGBColor = RGBColor(255, 165, 0);
pub const BUGS_CREATED_COLOR: RGBColor = RGBColor(31, 119, 180);
pub const BUGS_CLOSED_COLOR: RGBColor = RGBColor(255, 127, 14);
pub const SP_PER_HOUR_COLOR: RGBColor = RGBColor(128, 0, 128);

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Drawing failed: {0}")]
    Drawing(String),

    #[error("Invalid figure size {0}x{1}")]
    InvalidSize(u32, u32),
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for ChartError {
    fn from(error: DrawingAreaErrorKind<E>) -> Self {
        ChartError::Drawing(error.to_string())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Marker {
    Circle,
    Diamond,
}

/// One named run of values, one per sprint.
#[derive(Clone, Debug, PartialEq)]
pub struct Series {
    pub label: String,
    pub values: Vec<Option<f64>>,
    pub color: RGBColor,
}

impl Series {
    fn new(metric: Metric, values: &[Option<f64>], color: RGBColor) -> Self {
        Series {
            label: metric.to_string(),
            values: values.to_vec(),
            color,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum PanelKind {
    Line { series: Series, marker: Marker },
    Bar { series: Series },
    GroupedBar { series: Vec<Series> },
    /// Stands in for a chart whose metrics are absent
    Placeholder { message: String },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Panel {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub kind: PanelKind,
}

impl Panel {
    fn new(team: &str, label: &str, y_label: &str, kind: PanelKind) -> Self {
        Panel {
            title: format!("{team} - {label}"),
            x_label: "Sprint".to_owned(),
            y_label: y_label.to_owned(),
            kind,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.kind, PanelKind::Placeholder { .. })
    }
}

/// The four-panel dashboard of one team.
#[derive(Clone, Debug, PartialEq)]
pub struct Figure {
    pub title: String,
    pub sprints: Vec<String>,
    pub panels: [Panel; 4],
}

/// Lays out the dashboard panels of `team`. Never fails: absent metrics become placeholders.
pub fn render(table: &MetricTable, team: &str) -> Figure {
    let velocity = match table.get(Metric::Velocity) {
        Some(values) => PanelKind::Line {
            series: Series::new(Metric::Velocity, values, VELOCITY_COLOR),
            marker: Marker::Circle,
        },
        None => missing(&[Metric::Velocity]),
    };

    let releases = match table.get(Metric::Releases) {
        Some(values) => PanelKind::Bar {
            series: Series::new(Metric::Releases, values, RELEASES_COLOR),
        },
        None => missing(&[Metric::Releases]),
    };

    let bug_series: Vec<Series> = [(Metric::BugsCreated, BUGS_CREATED_COLOR), (Metric::BugsClosed, BUGS_CLOSED_COLOR)]
        .into_iter()
        .filter_map(|(metric, color)| Some(Series::new(metric, table.get(metric)?, color)))
        .collect();
    let bugs = if bug_series.is_empty() {
        missing(&[Metric::BugsCreated, Metric::BugsClosed])
    } else {
        PanelKind::GroupedBar { series: bug_series }
    };

    let sp_per_hour = match table.get(Metric::SpPerHour) {
        Some(values) => PanelKind::Line {
            series: Series::new(Metric::SpPerHour, values, SP_PER_HOUR_COLOR),
            marker: Marker::Diamond,
        },
        None => missing(&[Metric::SpPerHour]),
    };

    Figure {
        title: format!("{team} - Performance Dashboard"),
        sprints: table.sprints().to_vec(),
        panels: [
            Panel::new(team, "Velocity Trend", "Story Points", velocity),
            Panel::new(team, "Number of Releases per Sprint", "Number of Releases", releases),
            Panel::new(team, "Bugs Trend", "Count", bugs),
            Panel::new(team, "SP to Hour Ratio", "SP/Hour", sp_per_hour),
        ],
    }
}

fn missing(metrics: &[Metric]) -> PanelKind {
    let names: Vec<&str> = metrics.iter().map(Metric::as_str).collect();
    PanelKind::Placeholder {
        message: format!("{} missing", names.join(" and ")),
    }
}

/// Renders the figure as an SVG document.
pub fn render_svg(figure: &Figure, size: (u32, u32)) -> Result<String, ChartError> {
    check_size(size)?;
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
        draw_figure(root, figure)?;
    }
    Ok(svg)
}

pub(crate) fn check_size((width, height): (u32, u32)) -> Result<(), ChartError> {
    if width < 200 || height < 200 {
        return Err(ChartError::InvalidSize(width, height));
    }
    Ok(())
}

fn font(size: f64, style: FontStyle) -> FontDesc<'static> {
    FontDesc::new(FontFamily::SansSerif, size, style)
}

/// Draws the suptitle and the four panels stacked top to bottom.
pub fn draw_figure<DB: DrawingBackend>(root: DrawingArea<DB, Shift>, figure: &Figure) -> Result<(), ChartError> {
    root.fill(&WHITE)?;
    let body = root.titled(&figure.title, font(36.0, FontStyle::Bold))?;
    for (area, panel) in body.split_evenly((4, 1)).iter().zip(&figure.panels) {
        draw_panel(area, panel, &figure.sprints)?;
    }
    root.present()?;
    Ok(())
}

fn draw_panel<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, panel: &Panel, sprints: &[String]) -> Result<(), ChartError> {
    let series: Vec<&Series> = match &panel.kind {
        PanelKind::Placeholder { message } => return draw_placeholder(area, &panel.title, message),
        PanelKind::Line { series, .. } | PanelKind::Bar { series } => vec![series],
        PanelKind::GroupedBar { series } => series.iter().collect(),
    };
    let is_bar = !matches!(panel.kind, PanelKind::Line { .. });
    let (y_min, y_max) = value_range(series.iter().flat_map(|series| series.values.iter()), is_bar);
    let x_max = sprints.len().max(1) as f64 - 0.5;

    let mut chart = ChartBuilder::on(area)
        .margin(20)
        .caption(&panel.title, font(24.0, FontStyle::Normal))
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(-0.5..x_max, y_min..y_max)?;

    let sprint_label = |x: &f64| {
        let index = x.round();
        if (x - index).abs() > 1e-6 || index < 0.0 {
            return String::new();
        }
        sprints.get(index as usize).cloned().unwrap_or_default()
    };
    chart
        .configure_mesh()
        .x_labels(sprints.len().max(1))
        .x_label_formatter(&sprint_label)
        .y_label_formatter(&|y| format!("{y:.2}"))
        .light_line_style(RGBColor(235, 235, 235))
        .x_desc(panel.x_label.as_str())
        .y_desc(panel.y_label.as_str())
        .label_style(font(16.0, FontStyle::Normal))
        .axis_desc_style(font(18.0, FontStyle::Normal))
        .draw()?;

    match &panel.kind {
        PanelKind::Line { series, marker } => {
            let color = series.color;
            for segment in segments(&series.values) {
                chart.draw_series(LineSeries::new(segment, color.stroke_width(2)))?;
            }
            let points = series
                .values
                .iter()
                .enumerate()
                .filter_map(|(index, value)| Some((index as f64, (*value)?)));
            match marker {
                Marker::Circle => {
                    chart.draw_series(points.map(|point| Circle::new(point, 5, color.filled())))?;
                }
                Marker::Diamond => {
                    chart.draw_series(points.map(|point| {
                        EmptyElement::at(point) + Polygon::new(vec![(0, -7), (7, 0), (0, 7), (-7, 0)], color.filled())
                    }))?;
                }
            }
        }
        PanelKind::Bar { series } => {
            draw_bars(&mut chart, series, 0.8, -0.4)?;
        }
        PanelKind::GroupedBar { series } => {
            let width = 0.8 / series.len() as f64;
            for (position, series) in series.iter().enumerate() {
                let offset = -0.4 + width * position as f64;
                let color = series.color;
                draw_bars(&mut chart, series, width, offset)?
                    .label(series.label.as_str())
                    .legend(move |(x, y)| Rectangle::new([(x, y - 6), (x + 16, y + 6)], color.filled()));
            }
            chart
                .configure_series_labels()
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK.mix(0.3))
                .label_font(font(16.0, FontStyle::Normal))
                .position(SeriesLabelPosition::UpperRight)
                .draw()?;
        }
        PanelKind::Placeholder { .. } => {}
    }
    Ok(())
}

type PanelChart<'a, DB> = ChartContext<'a, DB, Cartesian2d<plotters::coord::types::RangedCoordf64, plotters::coord::types::RangedCoordf64>>;

/// Draws one bar per present value; `offset` is the left edge relative to the sprint center.
fn draw_bars<'a, 'b, DB: DrawingBackend + 'a>(
    chart: &'b mut PanelChart<'a, DB>,
    series: &Series,
    width: f64,
    offset: f64,
) -> Result<&'b mut SeriesAnno<'a, DB>, ChartError> {
    let color = series.color;
    let bars = series.values.iter().enumerate().filter_map(move |(index, value)| {
        let left = index as f64 + offset;
        Some(Rectangle::new([(left, 0.0), (left + width, (*value)?)], color.filled()))
    });
    Ok(chart.draw_series(bars)?)
}

fn draw_placeholder<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, title: &str, message: &str) -> Result<(), ChartError> {
    let body = area.titled(title, font(24.0, FontStyle::Normal))?;
    let (width, height) = body.dim_in_pixel();
    let style = TextStyle::from(font(22.0, FontStyle::Normal))
        .color(&RGBColor(110, 110, 110))
        .pos(Pos::new(HPos::Center, VPos::Center));
    body.draw(&Text::new(message.to_owned(), (width as i32 / 2, height as i32 / 2), style))?;
    Ok(())
}

/// Runs of consecutive present values as chart points; a missing value breaks the line.
fn segments(values: &[Option<f64>]) -> Vec<Vec<(f64, f64)>> {
    let mut segments = Vec::new();
    let mut current = Vec::new();
    for (index, value) in values.iter().enumerate() {
        match value {
            Some(value) => current.push((index as f64, *value)),
            None if !current.is_empty() => segments.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

/// Y range covering all present values; bar charts always include zero.
fn value_range<'a>(values: impl Iterator<Item = &'a Option<f64>>, from_zero: bool) -> (f64, f64) {
    let (mut low, mut high) = values
        .flatten()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(low, high), value| (low.min(*value), high.max(*value)));
    if !low.is_finite() || !high.is_finite() {
        return (0.0, 1.0);
    }
    if from_zero {
        low = low.min(0.0);
        high = high.max(0.0);
    }
    let span = high - low;
    let pad = if span > 0.0 { span * 0.1 } else { high.abs().max(1.0) * 0.1 };
    if !(from_zero && low == 0.0) {
        low -= pad;
    }
    high += pad;
    (low, high)
}
