//! Report configuration from properties
//!
//! All default values come from report.json via `PropertyReader`. Command-line
//! `--set name=value` overrides are the only way to change them for a run.

use crate::report::error::{ReportError, Result};
use crate::report::palettes::resolve_color;
use crate::report::properties::PropertyReader;
use crate::report::theme::Theme;
use std::path::PathBuf;

/// Largest canvas, in pixels, that will be rasterised (3 bytes each)
pub const MAX_CANVAS_PIXELS: f64 = 100_000_000.0;

/// How the saved image is bounded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundingBox {
    /// Crop outer whitespace, keeping a small pad (matplotlib's bbox_inches="tight")
    #[default]
    Tight,
    /// Keep the full canvas
    Standard,
}

impl BoundingBox {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "standard" => Self::Standard,
            _ => Self::Tight,
        }
    }
}

/// Style of one plotted line
#[derive(Debug, Clone, PartialEq)]
pub struct LineConfig {
    /// Legend label
    pub label: String,
    pub color: [u8; 3],
    /// Line width in points
    pub width: f64,
}

#[derive(Debug, Clone)]
pub struct ReportConfig {
    /// Simulation results CSV
    pub input_path: PathBuf,

    /// PNG output
    pub output_path: PathBuf,

    /// Theme name: "whitegrid", "white", "darkgrid"
    pub theme: String,

    /// Canvas size in inches
    pub figure_width: f64,
    pub figure_height: f64,

    /// Output resolution
    pub dpi: f64,

    pub bbox: BoundingBox,

    pub title: String,
    /// Title font size in points
    pub title_size: f64,
    /// Gap between title and panel in points
    pub title_pad: f64,

    pub x_axis_label: String,
    pub y_axis_label: String,
    /// Axis label font size in points
    pub axis_label_size: f64,

    /// Fixed y range
    pub y_limits: (f64, f64),

    /// Legend font size in points
    pub legend_size: f64,
    pub legend_frame: bool,

    /// Synchronous update series (solid)
    pub sync_series: LineConfig,

    /// Asynchronous update series (dashed)
    pub async_series: LineConfig,

    /// Threshold line (dotted); label may contain `{threshold}`
    pub threshold_line: LineConfig,
}

impl ReportConfig {
    /// Create config from report properties
    pub fn from_properties(props: &PropertyReader) -> Result<Self> {
        let theme = props.get_enum("theme")?;

        let figure_width = props.get_f64_in_range("figure.width", 1.0, 100.0)?;
        let figure_height = props.get_f64_in_range("figure.height", 1.0, 100.0)?;
        let dpi = props.get_f64_in_range("figure.dpi", 10.0, 1200.0)?;
        let pixels = (figure_width * dpi).round() * (figure_height * dpi).round();
        if pixels > MAX_CANVAS_PIXELS {
            return Err(ReportError::InvalidProperty {
                name: "figure.dpi".to_string(),
                value: dpi.to_string(),
                reason: format!(
                    "{}x{} in at this resolution exceeds {} pixels",
                    figure_width, figure_height, MAX_CANVAS_PIXELS
                ),
            });
        }
        let bbox = BoundingBox::parse(&props.get_enum("figure.bbox")?);

        let (y_low, y_high) = props.get_coords("axis.y.limits")?;
        if !(y_low < y_high) {
            return Err(ReportError::InvalidProperty {
                name: "axis.y.limits".to_string(),
                value: format!("{},{}", y_low, y_high),
                reason: "low must be below high".to_string(),
            });
        }

        Ok(Self {
            input_path: PathBuf::from(props.get_string("input.path")),
            output_path: PathBuf::from(props.get_string("output.path")),
            theme,
            figure_width,
            figure_height,
            dpi,
            bbox,
            title: props.get_string("plot.title"),
            title_size: props.get_f64_in_range("plot.title.size", 1.0, 200.0)?,
            title_pad: props.get_f64_in_range("plot.title.pad", 0.0, 500.0)?,
            x_axis_label: props.get_string("axis.x.label"),
            y_axis_label: props.get_string("axis.y.label"),
            axis_label_size: props.get_f64_in_range("axis.label.size", 1.0, 200.0)?,
            y_limits: (y_low, y_high),
            legend_size: props.get_f64_in_range("legend.size", 1.0, 200.0)?,
            legend_frame: props.get_bool("legend.frame")?,
            sync_series: line_config(props, "series.sync")?,
            async_series: line_config(props, "series.async")?,
            threshold_line: line_config(props, "threshold")?,
        })
    }

    /// Convert theme config to a Theme
    pub fn to_theme(&self) -> Theme {
        Theme::from_name(&self.theme)
    }
}

impl Default for ReportConfig {
    /// Defaults from report.json, no overrides
    fn default() -> Self {
        Self::from_properties(&PropertyReader::new()).expect("report.json defaults are valid")
    }
}

fn line_config(props: &PropertyReader, prefix: &str) -> Result<LineConfig> {
    let color_name = format!("{}.color", prefix);
    let color_value = props.get_string(&color_name);
    let color = resolve_color(&color_value).ok_or_else(|| ReportError::InvalidProperty {
        name: color_name.clone(),
        value: color_value.clone(),
        reason: "expected #RRGGBB or palette:index".to_string(),
    })?;

    Ok(LineConfig {
        label: props.get_string(&format!("{}.label", prefix)),
        color,
        width: props.get_f64_in_range(&format!("{}.width", prefix), 0.1, 50.0)?,
    })
}
