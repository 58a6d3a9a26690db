//! Rasterisation of a `RenderedFigure`
//!
//! Draws with plotters into an in-memory RGB buffer, optionally crops to the
//! drawn content (tight bounding box), then encodes a PNG carrying the DPI in
//! its pHYs chunk. Nothing touches the output path until the image is fully
//! encoded, so a failed render leaves no file behind.

use super::error::{ReportError, Result};
use super::figure::{LineStyle, RenderedFigure, Stroke};
use super::theme::Theme;
use crate::config::BoundingBox;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::Path;

type DrawResult<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Padding kept around content by the tight bounding box, in inches
const TIGHT_PAD_INCHES: f64 = 0.1;

/// Legend spacing in units of the legend font size
const LEGEND_BORDER_PAD: f64 = 0.4;
const LEGEND_LABEL_SPACING: f64 = 0.5;
const LEGEND_HANDLE_LENGTH: f64 = 2.0;
const LEGEND_HANDLE_TEXT_PAD: f64 = 0.8;
const LEGEND_AXES_PAD: f64 = 0.5;

/// Tick label size in points
const TICK_LABEL_SIZE: f64 = 10.0;

/// RGB image buffer
#[derive(Debug, Clone)]
pub struct Raster {
    pub width: u32,
    pub height: u32,
    /// Row-major RGB, 3 bytes per pixel
    pub pixels: Vec<u8>,
}

impl Raster {
    fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let i = ((y as usize) * (self.width as usize) + x as usize) * 3;
        [self.pixels[i], self.pixels[i + 1], self.pixels[i + 2]]
    }

    /// Smallest rectangle holding every non-background pixel, as
    /// `(x0, y0, x1, y1)` with exclusive upper bounds
    pub fn content_bounds(&self, background: [u8; 3]) -> Option<(u32, u32, u32, u32)> {
        let mut bounds: Option<(u32, u32, u32, u32)> = None;

        for y in 0..self.height {
            for x in 0..self.width {
                if self.pixel(x, y) == background {
                    continue;
                }
                bounds = Some(match bounds {
                    None => (x, y, x + 1, y + 1),
                    Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x + 1), y1.max(y + 1)),
                });
            }
        }

        bounds
    }

    /// Copy out the `(x0, y0, x1, y1)` region
    pub fn crop(&self, (x0, y0, x1, y1): (u32, u32, u32, u32)) -> Raster {
        let x1 = x1.min(self.width);
        let y1 = y1.min(self.height);
        let width = x1.saturating_sub(x0);
        let height = y1.saturating_sub(y0);

        let mut pixels = Vec::with_capacity((width as usize) * (height as usize) * 3);
        for y in y0..y1 {
            let start = ((y as usize) * (self.width as usize) + x0 as usize) * 3;
            let end = start + (width as usize) * 3;
            pixels.extend_from_slice(&self.pixels[start..end]);
        }

        Raster {
            width,
            height,
            pixels,
        }
    }

    /// Crop to content plus `pad` pixels on each side, clamped to the canvas
    pub fn tight(&self, background: [u8; 3], pad: u32) -> Raster {
        match self.content_bounds(background) {
            Some((x0, y0, x1, y1)) => self.crop((
                x0.saturating_sub(pad),
                y0.saturating_sub(pad),
                x1.saturating_add(pad).min(self.width),
                y1.saturating_add(pad).min(self.height),
            )),
            None => self.clone(),
        }
    }
}

/// Draw the figure and apply its bounding box policy
pub fn rasterize(fig: &RenderedFigure, theme: &Theme) -> Result<Raster> {
    let (width, height) = fig.pixel_size();
    let mut pixels = vec![0u8; (width as usize) * (height as usize) * 3];

    {
        let root = BitMapBackend::with_buffer(&mut pixels, (width, height)).into_drawing_area();
        draw_figure(&root, fig, theme).map_err(|e| ReportError::Render(e.to_string()))?;
        root.present()
            .map_err(|e| ReportError::Render(e.to_string()))?;
    }

    let raster = Raster {
        width,
        height,
        pixels,
    };

    Ok(match fig.bbox {
        BoundingBox::Tight => {
            let pad = (TIGHT_PAD_INCHES * fig.dpi).round() as u32;
            raster.tight(theme.figure_background, pad)
        }
        BoundingBox::Standard => raster,
    })
}

/// Encode a raster as PNG with `dpi` recorded in the pHYs chunk
pub fn encode_png(raster: &Raster, dpi: f64) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut bytes, raster.width, raster.height);
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);

        // pHYs is pixels per metre
        let ppm = (dpi / 0.0254).round() as u32;
        encoder.set_pixel_dims(Some(png::PixelDimensions {
            xppu: ppm,
            yppu: ppm,
            unit: png::Unit::Meter,
        }));

        let mut writer = encoder.write_header()?;
        writer.write_image_data(&raster.pixels)?;
        writer.finish()?;
    }
    Ok(bytes)
}

/// Encode and write the PNG in one step
pub fn save_png(raster: &Raster, dpi: f64, path: &Path) -> Result<()> {
    let bytes = encode_png(raster, dpi)?;
    std::fs::write(path, bytes).map_err(|source| ReportError::OutputWrite {
        path: path.to_path_buf(),
        source,
    })
}

fn rgb(c: [u8; 3]) -> RGBColor {
    RGBColor(c[0], c[1], c[2])
}

fn stroke_px(fig: &RenderedFigure, points: f64) -> u32 {
    fig.pt_to_px(points).round().max(1.0) as u32
}

fn font(theme: &Theme, size_px: f64) -> FontDesc<'static> {
    FontDesc::new(FontFamily::from(theme.font_family), size_px, FontStyle::Normal)
}

fn line_style(fig: &RenderedFigure, stroke: &Stroke) -> ShapeStyle {
    rgb(stroke.color).stroke_width(stroke_px(fig, stroke.width))
}

fn draw_figure(
    root: &DrawingArea<BitMapBackend<'_>, Shift>,
    fig: &RenderedFigure,
    theme: &Theme,
) -> DrawResult<()> {
    let px = |points: f64| fig.pt_to_px(points);
    let text_color = rgb(theme.text);

    root.fill(&rgb(theme.figure_background))?;

    let outer = px(8.0).round() as u32;
    let area = root.margin(outer, outer, outer, outer);

    let title_style = font(theme, px(fig.title.size)).color(&text_color);
    let area = area
        .titled(&fig.title.text, title_style)?
        .margin(px(fig.title_pad).round() as u32, 0, 0, 0);

    let (x0, x1) = fig.x_range;
    let (y0, y1) = fig.y_range;

    let mut chart = ChartBuilder::on(&area)
        .margin_right(px(12.0).round() as u32)
        .x_label_area_size(px(3.6 * fig.x_label.size).round() as u32)
        .y_label_area_size(px(4.4 * fig.y_label.size).round() as u32)
        .build_cartesian_2d(x0..x1, y0..y1)?;

    chart
        .plotting_area()
        .fill(&rgb(theme.panel_background))?;

    let axis_desc_style = font(theme, px(fig.x_label.size)).color(&text_color);
    let tick_style = font(theme, px(TICK_LABEL_SIZE)).color(&text_color);
    let grid_width = stroke_px(fig, 0.8);

    let y_formatter = |v: &f64| format!("{:.1}", v);
    let mut mesh = chart.configure_mesh();
    mesh.x_desc(fig.x_label.text.as_str())
        .y_desc(fig.y_label.text.as_str())
        .axis_desc_style(axis_desc_style)
        .label_style(tick_style)
        .x_labels(8)
        .y_labels(8)
        .y_label_formatter(&y_formatter)
        .set_all_tick_mark_size(0)
        .light_line_style(TRANSPARENT.stroke_width(0))
        .axis_style(TRANSPARENT.stroke_width(0));
    match theme.grid {
        Some(color) => {
            mesh.bold_line_style(rgb(color).stroke_width(grid_width));
        }
        None => {
            mesh.disable_mesh();
        }
    }
    mesh.draw()?;

    for series in &fig.series {
        let style = line_style(fig, &series.stroke);
        let width_px = fig.pt_to_px(series.stroke.width);
        for segment in series.segments() {
            match series.stroke.style.pattern() {
                None => {
                    chart.draw_series(LineSeries::new(segment, style))?;
                }
                Some((dash, gap)) => {
                    chart.draw_series(DashedLineSeries::new(
                        segment,
                        (dash * width_px).round().max(1.0) as u32,
                        (gap * width_px).round().max(1.0) as u32,
                        style,
                    ))?;
                }
            }
        }
    }

    let reference = &fig.reference;
    if reference.x >= x0 && reference.x <= x1 {
        let width_px = fig.pt_to_px(reference.stroke.width);
        let (dash, gap) = reference.stroke.style.pattern().unwrap_or((1.0, 0.0));
        chart.draw_series(DashedLineSeries::new(
            vec![(reference.x, y0), (reference.x, y1)],
            (dash * width_px).round().max(1.0) as u32,
            (gap * width_px).round().max(1.0) as u32,
            line_style(fig, &reference.stroke),
        ))?;
    } else {
        log::debug!(
            "Threshold {} outside x range [{}, {}], line not drawn",
            reference.x,
            x0,
            x1
        );
    }

    if let Some(border) = theme.panel_border {
        chart.plotting_area().draw(&Rectangle::new(
            [(x0, y0), (x1, y1)],
            rgb(border).stroke_width(stroke_px(fig, 1.25)),
        ))?;
    }

    let plot_area = chart.plotting_area().strip_coord_spec();
    draw_legend(&plot_area, fig, theme)?;

    Ok(())
}

/// Positions inside the legend box, in pixels relative to its top-left
#[derive(Debug, Clone, PartialEq)]
pub struct LegendLayout {
    pub width: f64,
    pub height: f64,
    /// Vertical centre of each entry
    pub rows: Vec<f64>,
    /// Horizontal extent of the line sample
    pub handle: (f64, f64),
    /// Left edge of the label text
    pub text_x: f64,
}

impl LegendLayout {
    /// Layout for entries whose labels measure `text_widths` pixels, with
    /// `em` the legend font size in pixels
    pub fn new(em: f64, text_widths: &[f64]) -> Self {
        let pad = LEGEND_BORDER_PAD * em;
        let spacing = LEGEND_LABEL_SPACING * em;
        let handle_len = LEGEND_HANDLE_LENGTH * em;
        let max_text = text_widths.iter().copied().fold(0.0, f64::max);
        let n = text_widths.len() as f64;

        let rows = (0..text_widths.len())
            .map(|i| pad + em * 0.5 + i as f64 * (em + spacing))
            .collect();

        Self {
            width: 2.0 * pad + handle_len + LEGEND_HANDLE_TEXT_PAD * em + max_text,
            height: 2.0 * pad + n * em + (n - 1.0).max(0.0) * spacing,
            rows,
            handle: (pad, pad + handle_len),
            text_x: pad + handle_len + LEGEND_HANDLE_TEXT_PAD * em,
        }
    }
}

/// Legend anchor inside the plot panel, in preference order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegendCorner {
    UpperRight,
    UpperLeft,
    LowerLeft,
    LowerRight,
}

impl LegendCorner {
    pub const ALL: [LegendCorner; 4] = [
        LegendCorner::UpperRight,
        LegendCorner::UpperLeft,
        LegendCorner::LowerLeft,
        LegendCorner::LowerRight,
    ];

    /// Top-left of a `size` box in an `area`, `inset` pixels from the edges
    pub fn origin(&self, area: (f64, f64), size: (f64, f64), inset: f64) -> (f64, f64) {
        let left = inset;
        let right = area.0 - inset - size.0;
        let top = inset;
        let bottom = area.1 - inset - size.1;
        match self {
            LegendCorner::UpperRight => (right, top),
            LegendCorner::UpperLeft => (left, top),
            LegendCorner::LowerLeft => (left, bottom),
            LegendCorner::LowerRight => (right, bottom),
        }
    }
}

/// Corner whose legend box covers the fewest of `points` (pixel coordinates,
/// y down); ties go to the earlier corner in `LegendCorner::ALL`
pub fn best_legend_corner(
    points: &[(f64, f64)],
    area: (f64, f64),
    size: (f64, f64),
    inset: f64,
) -> LegendCorner {
    let covered = |corner: &LegendCorner| {
        let (left, top) = corner.origin(area, size, inset);
        points
            .iter()
            .filter(|(x, y)| *x >= left && *x <= left + size.0 && *y >= top && *y <= top + size.1)
            .count()
    };

    LegendCorner::ALL
        .iter()
        .copied()
        .min_by_key(|corner| covered(corner))
        .unwrap_or(LegendCorner::UpperRight)
}

/// Dash intervals `(start, end)` along a sample line of `length` pixels
pub fn dash_intervals(length: f64, style: LineStyle, width_px: f64) -> Vec<(f64, f64)> {
    let Some((dash, gap)) = style.pattern() else {
        return vec![(0.0, length)];
    };
    let dash = (dash * width_px).max(1.0);
    let gap = (gap * width_px).max(1.0);

    let mut intervals = Vec::new();
    let mut start = 0.0;
    while start < length {
        intervals.push((start, (start + dash).min(length)));
        start += dash + gap;
    }
    intervals
}

/// Sample a series in panel pixel coordinates for legend placement
fn panel_points(fig: &RenderedFigure, area: (f64, f64)) -> Vec<(f64, f64)> {
    const SAMPLES_PER_SEGMENT: usize = 16;

    let (x0, x1) = fig.x_range;
    let (y0, y1) = fig.y_range;
    let to_px = |(x, y): (f64, f64)| {
        (
            (x - x0) / (x1 - x0) * area.0,
            (1.0 - (y - y0) / (y1 - y0)) * area.1,
        )
    };

    let mut lines: Vec<Vec<(f64, f64)>> = fig.series.iter().flat_map(|s| s.segments()).collect();
    lines.push(vec![(fig.reference.x, y0), (fig.reference.x, y1)]);

    let mut points = Vec::new();
    for line in lines {
        let pixels: Vec<(f64, f64)> = line.into_iter().map(to_px).collect();
        if let [single] = pixels.as_slice() {
            points.push(*single);
        }
        for pair in pixels.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            for i in 0..=SAMPLES_PER_SEGMENT {
                let t = i as f64 / SAMPLES_PER_SEGMENT as f64;
                points.push((a.0 + (b.0 - a.0) * t, a.1 + (b.1 - a.1) * t));
            }
        }
    }
    points
}

fn draw_legend(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    fig: &RenderedFigure,
    theme: &Theme,
) -> DrawResult<()> {
    let mut entries: Vec<(&str, &Stroke)> = fig
        .series
        .iter()
        .map(|s| (s.label.as_str(), &s.stroke))
        .collect();
    entries.push((fig.reference.label.as_str(), &fig.reference.stroke));

    let em = fig.pt_to_px(fig.legend_size);
    let text_style = font(theme, em)
        .color(&rgb(theme.text))
        .pos(Pos::new(HPos::Left, VPos::Center));

    let mut text_widths = Vec::with_capacity(entries.len());
    for (label, _) in &entries {
        let (w, _) = area.estimate_text_size(label, &text_style)?;
        text_widths.push(w as f64);
    }
    let layout = LegendLayout::new(em, &text_widths);

    let (area_w, area_h) = area.dim_in_pixel();
    let area_size = (area_w as f64, area_h as f64);
    let inset = LEGEND_AXES_PAD * em;
    let corner = best_legend_corner(
        &panel_points(fig, area_size),
        area_size,
        (layout.width, layout.height),
        inset,
    );
    let (left, top) = corner.origin(area_size, (layout.width, layout.height), inset);
    log::debug!("Legend placed {:?} at ({:.0}, {:.0})", corner, left, top);

    let box_min = (left.round() as i32, top.round() as i32);
    let box_max = (
        (left + layout.width).round() as i32,
        (top + layout.height).round() as i32,
    );
    area.draw(&Rectangle::new(
        [box_min, box_max],
        rgb(theme.legend_background)
            .mix(theme.legend_alpha)
            .filled(),
    ))?;
    if fig.legend_frame {
        area.draw(&Rectangle::new(
            [box_min, box_max],
            rgb(theme.legend_border).stroke_width(stroke_px(fig, 0.8)),
        ))?;
    }

    for ((label, stroke), row_y) in entries.iter().zip(&layout.rows) {
        let y = (top + row_y).round() as i32;
        let style = line_style(fig, stroke);
        let handle_len = layout.handle.1 - layout.handle.0;
        for (start, end) in dash_intervals(handle_len, stroke.style, fig.pt_to_px(stroke.width)) {
            let xs = (left + layout.handle.0 + start).round() as i32;
            let xe = (left + layout.handle.0 + end).round() as i32;
            area.draw(&PathElement::new(vec![(xs, y), (xe, y)], style))?;
        }
        area.draw_text(label, &text_style, ((left + layout.text_x).round() as i32, y))?;
    }

    Ok(())
}
