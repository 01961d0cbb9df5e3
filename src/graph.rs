use crate::aggregate::{AggregateRow, AggregationView, DistributionView};
use crate::dashboard::{Chart, ChartData, ChartKind};
use crate::geo::country_centroid;
use crate::palette::{parse_color, ColorScale};
use crate::{OutputFormat, RenderOptions};
use anyhow::{Context, Result};
use image::ImageEncoder;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::f64::consts::PI;

const FONT: &str = "sans-serif";
const MAX_CANVAS_SIDE: u32 = 16_384;

/// How a geo chart marks each country
#[derive(Debug, Clone, Copy, PartialEq)]
enum GeoMarker {
    /// Fixed-size tile filled by value
    Filled,
    /// Circle sized and coloured by value
    Sized,
}

/// Render one chart to PNG or SVG bytes
pub fn render_chart(chart: &Chart, options: &RenderOptions) -> Result<Vec<u8>> {
    if options.width == 0 || options.height == 0 {
        anyhow::bail!(
            "Invalid canvas size {}x{}",
            options.width,
            options.height
        );
    }

    if options.width > MAX_CANVAS_SIDE || options.height > MAX_CANVAS_SIDE {
        anyhow::bail!(
            "Canvas size {}x{} exceeds the {} pixel limit per side",
            options.width,
            options.height,
            MAX_CANVAS_SIDE
        );
    }

    let background = parse_color(&options.background).unwrap_or_else(|| {
        log::warn!("Unknown background colour '{}', using white", options.background);
        WHITE
    });

    match options.format {
        OutputFormat::Png => render_png(chart, options.width, options.height, background),
        OutputFormat::Svg => render_svg(chart, options.width, options.height, background),
    }
}

/// RGB buffer length for a canvas, or an error if it does not fit in memory
fn rgb_buffer_len(width: u32, height: u32) -> Result<usize> {
    match (width as usize)
        .checked_mul(height as usize)
        .and_then(|pixels| pixels.checked_mul(3))
    {
        Some(len) => Ok(len),
        None => anyhow::bail!("Canvas size {}x{} is too large", width, height),
    }
}

fn render_png(chart: &Chart, width: u32, height: u32, background: RGBColor) -> Result<Vec<u8>> {
    let mut buffer = vec![0u8; rgb_buffer_len(width, height)?];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        draw_chart(&root, chart, background)?;
        root.present().context("Failed to present drawing")?;
    }

    let mut png_bytes = Vec::new();
    {
        let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
        encoder
            .write_image(&buffer, width, height, image::ColorType::Rgb8)
            .context("Failed to encode PNG")?;
    }

    Ok(png_bytes)
}

fn render_svg(chart: &Chart, width: u32, height: u32, background: RGBColor) -> Result<Vec<u8>> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (width, height)).into_drawing_area();
        draw_chart(&root, chart, background)?;
        root.present().context("Failed to present drawing")?;
    }
    Ok(svg.into_bytes())
}

fn draw_chart<DB>(root: &DrawingArea<DB, Shift>, chart: &Chart, background: RGBColor) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&background).context("Failed to fill background")?;
    let area = root
        .titled(&chart.title, (FONT, 22.0))
        .context("Failed to draw title")?;

    if chart.data.is_empty() {
        return draw_notice(&area, "No listings match the current filters");
    }

    match (chart.kind, &chart.data) {
        (ChartKind::HorizontalBar, ChartData::Aggregate(view)) => {
            draw_horizontal_bars(&area, view, chart.scale)
        }
        (ChartKind::VerticalBar, ChartData::Aggregate(view)) => {
            draw_vertical_bars(&area, view, chart.scale)
        }
        (ChartKind::Pie, ChartData::Aggregate(view)) => draw_pie(&area, view, chart.scale),
        (ChartKind::Choropleth, ChartData::Aggregate(view)) => {
            draw_geo(&area, view, chart.scale, GeoMarker::Filled)
        }
        (ChartKind::ScatterGeo, ChartData::Aggregate(view)) => {
            draw_geo(&area, view, chart.scale, GeoMarker::Sized)
        }
        (ChartKind::Box, ChartData::Distribution(view)) => draw_box(&area, view, chart.scale),
        (kind, _) => anyhow::bail!("Chart '{}' has no data for a {:?} chart", chart.id, kind),
    }
}

/// Centered message in place of a plot
fn draw_notice<DB>(area: &DrawingArea<DB, Shift>, message: &str) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let (w, h) = area.dim_in_pixel();
    let style = (FONT, 18.0)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Center));
    area.draw(&Text::new(message, (w as i32 / 2, h as i32 / 2), style))
        .context("Failed to draw notice")?;
    Ok(())
}

/// Label for a categorical axis tick at `v`; ticks between categories stay blank
fn category_label(labels: &[String], v: f64) -> String {
    let idx = v.round();
    if (v - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    labels.get(idx as usize).cloned().unwrap_or_default()
}

fn format_value(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{:.0}", v)
    } else {
        format!("{:.2}", v)
    }
}

fn value_bounds(values: &[f64]) -> (f64, f64) {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    (min, max)
}

/// Axis end for values starting at zero, with headroom for value labels
fn padded_max(max: f64) -> f64 {
    if max > 0.0 {
        max * 1.15
    } else {
        1.0
    }
}

fn draw_horizontal_bars<DB>(
    area: &DrawingArea<DB, Shift>,
    view: &AggregationView,
    scale: ColorScale,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    // First row on top
    let rows: Vec<&AggregateRow> = view.rows.iter().rev().collect();
    let labels: Vec<String> = rows.iter().map(|r| r.key.clone()).collect();
    let n = rows.len();
    let (lo, hi) = value_bounds(&view.values());

    let (w, _) = area.dim_in_pixel();
    let longest = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0) as u32;
    let label_area = (longest * 8 + 16).clamp(60, (w / 3).max(60));

    let mut chart = ChartBuilder::on(area)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(label_area)
        .build_cartesian_2d(0.0..padded_max(hi), -0.5..(n as f64 - 0.5))
        .context("Failed to build chart")?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(n * 2 + 1)
        .y_label_formatter(&|y| category_label(&labels, *y))
        .x_desc(view.value_column.as_str())
        .draw()
        .context("Failed to draw mesh")?;

    chart
        .draw_series(rows.iter().enumerate().map(|(i, row)| {
            let y = i as f64;
            Rectangle::new(
                [(0.0, y - 0.4), (row.value, y + 0.4)],
                scale.color_for(row.value, lo, hi).filled(),
            )
        }))
        .context("Failed to draw bars")?;

    let value_style = (FONT, 13.0)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Left, VPos::Center));
    chart
        .draw_series(rows.iter().enumerate().map(|(i, row)| {
            Text::new(format_value(row.value), (row.value, i as f64), value_style.clone())
        }))
        .context("Failed to draw bar labels")?;

    Ok(())
}

fn draw_vertical_bars<DB>(
    area: &DrawingArea<DB, Shift>,
    view: &AggregationView,
    scale: ColorScale,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let labels: Vec<String> = view.rows.iter().map(|r| r.key.clone()).collect();
    let n = labels.len();
    let (lo, hi) = value_bounds(&view.values());

    let mut chart = ChartBuilder::on(area)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(-0.5..(n as f64 - 0.5), 0.0..padded_max(hi))
        .context("Failed to build chart")?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n * 2 + 1)
        .x_label_formatter(&|x| category_label(&labels, *x))
        .x_desc(view.key_column.as_str())
        .y_desc(view.value_column.as_str())
        .draw()
        .context("Failed to draw mesh")?;

    chart
        .draw_series(view.rows.iter().enumerate().map(|(i, row)| {
            let x = i as f64;
            Rectangle::new(
                [(x - 0.4, 0.0), (x + 0.4, row.value)],
                scale.color_for(row.value, lo, hi).filled(),
            )
        }))
        .context("Failed to draw bars")?;

    let value_style = (FONT, 13.0)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Bottom));
    chart
        .draw_series(view.rows.iter().enumerate().map(|(i, row)| {
            Text::new(format_value(row.value), (i as f64, row.value), value_style.clone())
        }))
        .context("Failed to draw bar labels")?;

    Ok(())
}

fn draw_pie<DB>(area: &DrawingArea<DB, Shift>, view: &AggregationView, scale: ColorScale) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let total = view.total();
    if total <= 0.0 {
        return draw_notice(area, "Nothing to show");
    }

    let (w, h) = area.dim_in_pixel();
    let (cx, cy) = (w as f64 / 2.0, h as f64 / 2.0);
    let radius = w.min(h) as f64 * 0.4;
    let colors = scale.sample(view.len());

    let key_style = (FONT, 14.0)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Bottom));
    let value_style = (FONT, 13.0)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Top));

    // Clockwise from twelve o'clock
    let mut start = -PI / 2.0;
    for (row, color) in view.rows.iter().zip(colors) {
        let sweep = row.value / total * 2.0 * PI;
        let steps = (sweep.to_degrees().ceil() as usize).max(2);

        let mut points = Vec::with_capacity(steps + 2);
        points.push((cx as i32, cy as i32));
        for s in 0..=steps {
            let angle = start + sweep * s as f64 / steps as f64;
            points.push((
                (cx + radius * angle.cos()).round() as i32,
                (cy + radius * angle.sin()).round() as i32,
            ));
        }
        area.draw(&Polygon::new(points, color.filled()))
            .context("Failed to draw pie slice")?;

        let mid = start + sweep / 2.0;
        let anchor = (
            (cx + radius * 0.65 * mid.cos()) as i32,
            (cy + radius * 0.65 * mid.sin()) as i32,
        );
        let share = row.value / total * 100.0;
        area.draw(&Text::new(row.key.as_str(), anchor, key_style.clone()))
            .context("Failed to draw pie label")?;
        area.draw(&Text::new(
            format!("{} ({:.1}%)", format_value(row.value), share),
            anchor,
            value_style.clone(),
        ))
        .context("Failed to draw pie label")?;

        start += sweep;
    }

    Ok(())
}

fn draw_box<DB>(area: &DrawingArea<DB, Shift>, view: &DistributionView, scale: ColorScale) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let labels: Vec<String> = view.groups.iter().map(|g| g.key.clone()).collect();
    let n = labels.len();

    let extents: Vec<f64> = view
        .groups
        .iter()
        .flat_map(|g| {
            [g.lower_whisker, g.upper_whisker]
                .into_iter()
                .chain(g.outliers.iter().copied())
        })
        .collect();
    let (lo, hi) = value_bounds(&extents);
    let pad = if hi > lo { (hi - lo) * 0.05 } else { 1.0 };

    let mut chart = ChartBuilder::on(area)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(-0.5..(n as f64 - 0.5), (lo - pad)..(hi + pad))
        .context("Failed to build chart")?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n * 2 + 1)
        .x_label_formatter(&|x| category_label(&labels, *x))
        .x_desc(view.key_column.as_str())
        .y_desc(view.value_column.as_str())
        .draw()
        .context("Failed to draw mesh")?;

    let colors = scale.sample(n);
    for (i, (group, color)) in view.groups.iter().zip(colors).enumerate() {
        let x = i as f64;
        let half = 0.3;
        let cap = 0.12;

        chart
            .draw_series([
                Rectangle::new([(x - half, group.q3), (x + half, group.q1)], color.mix(0.35).filled()),
                Rectangle::new([(x - half, group.q3), (x + half, group.q1)], color.stroke_width(2)),
            ])
            .context("Failed to draw box")?;

        chart
            .draw_series([
                PathElement::new(vec![(x - half, group.median), (x + half, group.median)], color.stroke_width(3)),
                PathElement::new(vec![(x, group.q3), (x, group.upper_whisker)], color.stroke_width(2)),
                PathElement::new(vec![(x, group.q1), (x, group.lower_whisker)], color.stroke_width(2)),
                PathElement::new(
                    vec![(x - cap, group.upper_whisker), (x + cap, group.upper_whisker)],
                    color.stroke_width(2),
                ),
                PathElement::new(
                    vec![(x - cap, group.lower_whisker), (x + cap, group.lower_whisker)],
                    color.stroke_width(2),
                ),
            ])
            .context("Failed to draw whiskers")?;

        chart
            .draw_series(group.outliers.iter().map(|&v| Circle::new((x, v), 3, color.filled())))
            .context("Failed to draw outliers")?;
    }

    Ok(())
}

fn draw_geo<DB>(
    area: &DrawingArea<DB, Shift>,
    view: &AggregationView,
    scale: ColorScale,
    marker: GeoMarker,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let located: Vec<(&AggregateRow, (f64, f64))> = view
        .rows
        .iter()
        .filter_map(|row| match country_centroid(&row.key) {
            Some(pos) => Some((row, pos)),
            None => {
                log::warn!("No map location for country '{}', skipping", row.key);
                None
            }
        })
        .collect();

    if located.is_empty() {
        return draw_notice(area, "No known country locations");
    }

    let (lo, hi) = value_bounds(&view.values());

    let mut chart = ChartBuilder::on(area)
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(40)
        .build_cartesian_2d(-180.0..180.0, -60.0..85.0)
        .context("Failed to build chart")?;

    chart
        .configure_mesh()
        .x_labels(13)
        .y_labels(8)
        .x_desc("Longitude")
        .y_desc("Latitude")
        .draw()
        .context("Failed to draw mesh")?;

    match marker {
        GeoMarker::Filled => {
            chart
                .draw_series(located.iter().map(|(row, (lon, lat))| {
                    Rectangle::new(
                        [(lon - 5.0, lat - 4.0), (lon + 5.0, lat + 4.0)],
                        scale.color_for(row.value, lo, hi).filled(),
                    )
                }))
                .context("Failed to draw country tiles")?;
        }
        GeoMarker::Sized => {
            let max = hi.max(f64::EPSILON);
            chart
                .draw_series(located.iter().map(|(row, (lon, lat))| {
                    let radius = 4.0 + 18.0 * (row.value.max(0.0) / max).sqrt();
                    Circle::new(
                        (*lon, *lat),
                        radius as i32,
                        scale.color_for(row.value, lo, hi).mix(0.85).filled(),
                    )
                }))
                .context("Failed to draw country markers")?;
        }
    }

    let label_style = (FONT, 12.0)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Bottom));
    chart
        .draw_series(located.iter().map(|(row, (lon, lat))| {
            Text::new(
                format!("{}: {}", row.key, format_value(row.value)),
                (*lon, lat + 5.0),
                label_style.clone(),
            )
        }))
        .context("Failed to draw country labels")?;

    Ok(())
}
