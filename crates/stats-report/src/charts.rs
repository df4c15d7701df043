//! PNG charts of the monthly pivot: a stacked-area chart and a line chart.
//!
//! The x axis is the month index, padded by half a month on each side, and
//! the y axis is the selected metric. Default builds draw series and guide
//! lines only; captions, axis labels and the legend need the `labels`
//! feature, which pulls in system TrueType fonts.

use std::error::Error;
use std::path::Path;

use plotters::chart::SeriesAnno;
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use stats_data::aggregator::PivotTable;

use crate::error::{ReportError, Result};

type DrawResult<T> = std::result::Result<T, Box<dyn Error>>;
type Chart<'a, 'b> =
    ChartContext<'a, BitMapBackend<'b>, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

/// Pixel size of the rendered images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartOptions {
    pub width: u32,
    pub height: u32,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            width: 3000,
            height: 1500,
        }
    }
}

/// Stacked-area chart, one layer per column in column order from the bottom up.
pub fn render_stacked(path: &Path, pivot: &PivotTable, options: &ChartOptions) -> Result<()> {
    draw_stacked(path, pivot, options).map_err(|e| chart_error(path, e))
}

/// Line chart, one line per column.
pub fn render_lines(path: &Path, pivot: &PivotTable, options: &ChartOptions) -> Result<()> {
    draw_lines(path, pivot, options).map_err(|e| chart_error(path, e))
}

fn chart_error(path: &Path, err: Box<dyn Error>) -> ReportError {
    ReportError::Chart {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

// ── Drawing ───────────────────────────────────────────────────────────────────

/// Half a month of padding on each side so that a single month still spans
/// a visible band.
const X_PADDING: f64 = 0.5;

/// Horizontal extent for `months` points placed at `0..months`.
fn x_range(months: usize) -> (f64, f64) {
    let last = months.saturating_sub(1) as f64;
    (-X_PADDING, last + X_PADDING)
}

/// Outline of one stacked layer, carried flat into the padding on both ends.
fn area_points(layer: &[u64]) -> Vec<(f64, f64)> {
    let (Some(first), Some(last)) = (layer.first(), layer.last()) else {
        return Vec::new();
    };
    let (x_min, x_max) = x_range(layer.len());
    let mut points = Vec::with_capacity(layer.len() + 2);
    points.push((x_min, *first as f64));
    points.extend(layer.iter().enumerate().map(|(i, v)| (i as f64, *v as f64)));
    points.push((x_max, *last as f64));
    points
}

fn draw_stacked(path: &Path, pivot: &PivotTable, options: &ChartOptions) -> DrawResult<()> {
    let root = BitMapBackend::new(path, (options.width, options.height)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = build_chart(&root, "Messages per month (stacked)", pivot, pivot.max_stacked())?;

    let mut cumulative = vec![0u64; pivot.months.len()];
    let mut layers = Vec::with_capacity(pivot.columns.len());
    for column in 0..pivot.columns.len() {
        for (acc, value) in cumulative.iter_mut().zip(pivot.series(column)) {
            *acc += value;
        }
        layers.push(cumulative.clone());
    }

    // Tallest layer first so each lower layer paints over its share.
    for (column, layer) in layers.iter().enumerate().rev() {
        let color = series_color(column);
        let series =
            chart.draw_series(AreaSeries::new(area_points(layer), 0.0, color.filled()))?;
        annotate(series, &pivot.columns[column], color);
    }

    finish(&mut chart)?;
    root.present()?;
    Ok(())
}

fn draw_lines(path: &Path, pivot: &PivotTable, options: &ChartOptions) -> DrawResult<()> {
    let root = BitMapBackend::new(path, (options.width, options.height)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = build_chart(&root, "Messages per month", pivot, pivot.max_value())?;
    let marker = (options.height / 150).max(3);

    for (column, name) in pivot.columns.iter().enumerate() {
        let color = series_color(column);
        let points: Vec<(f64, f64)> = pivot
            .series(column)
            .into_iter()
            .enumerate()
            .map(|(i, v)| (i as f64, v as f64))
            .collect();
        let series =
            chart.draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(4)))?;
        annotate(series, name, color);
        chart.draw_series(
            points
                .into_iter()
                .map(|p| Circle::new(p, marker, color.filled())),
        )?;
    }

    finish(&mut chart)?;
    root.present()?;
    Ok(())
}

fn build_chart<'a, 'b>(
    root: &'a DrawingArea<BitMapBackend<'b>, Shift>,
    caption: &str,
    pivot: &PivotTable,
    y_peak: u64,
) -> DrawResult<Chart<'a, 'b>> {
    let (x_min, x_max) = x_range(pivot.months.len());
    let y_max = (y_peak as f64 * 1.05).max(1.0);

    let mut builder = ChartBuilder::on(root);
    builder.margin(40);
    #[cfg(feature = "labels")]
    {
        builder
            .caption(caption, ("sans-serif", 48))
            .x_label_area_size(80)
            .y_label_area_size(120);
    }
    #[cfg(not(feature = "labels"))]
    let _ = caption;

    let mut chart = builder.build_cartesian_2d(x_min..x_max, 0f64..y_max)?;

    #[cfg(feature = "labels")]
    {
        let months: Vec<String> = pivot.months.iter().map(|m| m.to_string()).collect();
        chart
            .configure_mesh()
            .x_labels((months.len() + 1).clamp(2, 25))
            .x_label_formatter(&|x| month_label(&months, *x))
            .y_desc(pivot.metric.to_string())
            .label_style(("sans-serif", 24))
            .draw()?;
    }
    #[cfg(not(feature = "labels"))]
    draw_guides(&mut chart, (x_min, x_max), y_max)?;

    Ok(chart)
}

/// The month under an x tick, or nothing between months and in the padding.
#[cfg(feature = "labels")]
fn month_label(months: &[String], x: f64) -> String {
    let index = x.round();
    if index < 0.0 || (x - index).abs() > 0.05 {
        return String::new();
    }
    months.get(index as usize).cloned().unwrap_or_default()
}

/// Axes plus four horizontal guide lines, drawn without any text.
#[cfg(not(feature = "labels"))]
fn draw_guides(chart: &mut Chart<'_, '_>, (x_min, x_max): (f64, f64), y_max: f64) -> DrawResult<()> {
    for step in 1..=4 {
        let y = y_max * step as f64 / 4.0;
        segment(chart, (x_min, y), (x_max, y), BLACK.mix(0.15).stroke_width(1))?;
    }
    segment(chart, (x_min, 0.0), (x_max, 0.0), BLACK.stroke_width(2))?;
    segment(chart, (x_min, 0.0), (x_min, y_max), BLACK.stroke_width(2))?;
    Ok(())
}

#[cfg(not(feature = "labels"))]
fn segment(
    chart: &mut Chart<'_, '_>,
    from: (f64, f64),
    to: (f64, f64),
    style: ShapeStyle,
) -> DrawResult<()> {
    chart.draw_series(std::iter::once(PathElement::new(vec![from, to], style)))?;
    Ok(())
}

fn series_color(index: usize) -> RGBAColor {
    Palette99::pick(index).to_rgba()
}

#[cfg(feature = "labels")]
fn annotate<'a, 'b: 'a>(
    series: &mut SeriesAnno<'a, BitMapBackend<'b>>,
    name: &str,
    color: RGBAColor,
) {
    series
        .label(name)
        .legend(move |(x, y)| Rectangle::new([(x, y - 8), (x + 20, y + 8)], color.filled()));
}

#[cfg(not(feature = "labels"))]
fn annotate(_series: &mut SeriesAnno<'_, BitMapBackend<'_>>, _name: &str, _color: RGBAColor) {}

#[cfg(feature = "labels")]
fn finish<'a, 'b: 'a>(chart: &mut Chart<'a, 'b>) -> DrawResult<()> {
    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .label_font(("sans-serif", 28))
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    Ok(())
}

#[cfg(not(feature = "labels"))]
fn finish(_chart: &mut Chart<'_, '_>) -> DrawResult<()> {
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
