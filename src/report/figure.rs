//! In-memory chart model
//!
//! A `RenderedFigure` holds everything the canvas needs to draw: canvas size,
//! the two convergence series, the threshold line, text and fixed limits. It
//! is built from an `InputTable` and a `ReportConfig`, drawn once, then dropped.

use super::error::Result;
use super::table::{InputTable, Threshold, COL_ASYNC, COL_SYNC, COL_W};
use crate::config::{BoundingBox, LineConfig, ReportConfig};

/// Stroke pattern of a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Solid,
    Dashed,
    Dotted,
}

impl LineStyle {
    /// Dash and gap lengths as multiples of the line width (matplotlib's
    /// scaled dash patterns), None for a solid line
    pub fn pattern(&self) -> Option<(f64, f64)> {
        match self {
            LineStyle::Solid => None,
            LineStyle::Dashed => Some((3.7, 1.6)),
            LineStyle::Dotted => Some((1.0, 1.65)),
        }
    }
}

/// How a line is stroked
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    pub color: [u8; 3],
    /// Width in points
    pub width: f64,
    pub style: LineStyle,
}

/// A labelled data series
#[derive(Debug, Clone)]
pub struct Series {
    pub label: String,
    pub points: Vec<(f64, f64)>,
    pub stroke: Stroke,
}

impl Series {
    /// Contiguous runs of finite points; a NaN in either coordinate breaks
    /// the line
    pub fn segments(&self) -> Vec<Vec<(f64, f64)>> {
        let mut segments = Vec::new();
        let mut current = Vec::new();

        for &(x, y) in &self.points {
            if x.is_finite() && y.is_finite() {
                current.push((x, y));
            } else if !current.is_empty() {
                segments.push(std::mem::take(&mut current));
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }

        segments
    }
}

/// Vertical marker line spanning the y range
#[derive(Debug, Clone)]
pub struct ReferenceLine {
    pub x: f64,
    pub label: String,
    pub stroke: Stroke,
}

/// A piece of text and its size in points
#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    pub text: String,
    pub size: f64,
}

#[derive(Debug, Clone)]
pub struct RenderedFigure {
    /// Canvas size in inches
    pub width: f64,
    pub height: f64,
    pub dpi: f64,
    pub bbox: BoundingBox,

    pub title: Text,
    /// Title padding in points
    pub title_pad: f64,
    pub x_label: Text,
    pub y_label: Text,

    /// Legend font size in points
    pub legend_size: f64,
    pub legend_frame: bool,

    pub series: Vec<Series>,
    pub reference: ReferenceLine,
    pub threshold: Threshold,

    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
}

impl RenderedFigure {
    /// Build the figure model from a validated table
    pub fn build(table: &InputTable, config: &ReportConfig) -> Result<Self> {
        let threshold = table.threshold()?;

        let w = table.numeric_column(COL_W)?;
        let sync = table.numeric_column(COL_SYNC)?;
        let asynchronous = table.numeric_column(COL_ASYNC)?;

        let series = vec![
            series_from(&config.sync_series, LineStyle::Solid, &w, &sync),
            series_from(&config.async_series, LineStyle::Dashed, &w, &asynchronous),
        ];

        let reference = ReferenceLine {
            x: threshold.value(),
            label: threshold_label(&config.threshold_line.label, threshold),
            stroke: Stroke {
                color: config.threshold_line.color,
                width: config.threshold_line.width,
                style: LineStyle::Dotted,
            },
        };

        Ok(Self {
            width: config.figure_width,
            height: config.figure_height,
            dpi: config.dpi,
            bbox: config.bbox,
            title: Text {
                text: config.title.clone(),
                size: config.title_size,
            },
            title_pad: config.title_pad,
            x_label: Text {
                text: config.x_axis_label.clone(),
                size: config.axis_label_size,
            },
            y_label: Text {
                text: config.y_axis_label.clone(),
                size: config.axis_label_size,
            },
            legend_size: config.legend_size,
            legend_frame: config.legend_frame,
            series,
            reference,
            threshold,
            x_range: x_limits(&w),
            y_range: config.y_limits,
        })
    }

    /// Canvas size in pixels
    pub fn pixel_size(&self) -> (u32, u32) {
        (
            (self.width * self.dpi).round() as u32,
            (self.height * self.dpi).round() as u32,
        )
    }

    pub fn pt_to_px(&self, points: f64) -> f64 {
        points * self.dpi / 72.0
    }
}

fn series_from(line: &LineConfig, style: LineStyle, xs: &[f64], ys: &[f64]) -> Series {
    Series {
        label: line.label.clone(),
        points: xs.iter().copied().zip(ys.iter().copied()).collect(),
        stroke: Stroke {
            color: line.color,
            width: line.width,
            style,
        },
    }
}

/// Substitute the threshold into a label template
pub fn threshold_label(template: &str, threshold: Threshold) -> String {
    template.replace("{threshold}", &threshold.to_string())
}

/// X axis runs from 0 to the largest W
///
/// Falls back to [0, 1] when there is no positive finite W.
pub fn x_limits(w: &[f64]) -> (f64, f64) {
    let max = w
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(f64::NEG_INFINITY, f64::max);

    if max > 0.0 {
        (0.0, max)
    } else {
        log::warn!("No positive W value (max = {}), x axis set to [0, 1]", max);
        (0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::df;

    fn example_table() -> InputTable {
        let df = df! {
            "W" => [0i64, 1, 2],
            "percent_glory_sync" => [0.1, 0.5, 0.9],
            "success_prob_async" => [0.2, 0.4, 0.8],
            "max_rest" => [1i64, 1, 1],
        }
        .unwrap();
        InputTable::from_dataframe(df)
    }

    #[test]
    fn test_build_example() {
        let fig = RenderedFigure::build(&example_table(), &ReportConfig::default()).unwrap();

        assert_eq!(fig.threshold, Threshold::Int(1));
        assert_eq!(fig.reference.x, 1.0);
        assert_eq!(fig.reference.label, "Phase Transition (max_rest = 1)");
        assert_eq!(fig.reference.stroke.style, LineStyle::Dotted);
        assert_eq!(fig.reference.stroke.width, 2.5);

        assert_eq!(fig.x_range, (0.0, 2.0));
        assert_eq!(fig.y_range, (-0.05, 1.05));
        assert_eq!(fig.pixel_size(), (3000, 1800));

        assert_eq!(fig.series.len(), 2);
        assert_eq!(fig.series[0].label, "Synchronous Update (% Glory)");
        assert_eq!(fig.series[0].stroke.style, LineStyle::Solid);
        assert_eq!(fig.series[0].points, vec![(0.0, 0.1), (1.0, 0.5), (2.0, 0.9)]);
        assert_eq!(fig.series[1].label, "Asynchronous Update (Success Rate)");
        assert_eq!(fig.series[1].stroke.style, LineStyle::Dashed);
        assert_eq!(fig.series[1].points, vec![(0.0, 0.2), (1.0, 0.4), (2.0, 0.8)]);
    }

    #[test]
    fn test_y_range_ignores_data() {
        let df = df! {
            "W" => [0.0, 10.0],
            "percent_glory_sync" => [-40.0, 75.0],
            "success_prob_async" => [3.0, 900.0],
            "max_rest" => [4i64, 4],
        }
        .unwrap();
        let fig =
            RenderedFigure::build(&InputTable::from_dataframe(df), &ReportConfig::default())
                .unwrap();
        assert_eq!(fig.y_range, (-0.05, 1.05));
        assert_eq!(fig.x_range, (0.0, 10.0));
    }

    #[test]
    fn test_x_limits() {
        assert_eq!(x_limits(&[0.0, 3.0, 1.5]), (0.0, 3.0));
        assert_eq!(x_limits(&[0.5, f64::NAN, 2.5]), (0.0, 2.5));
        assert_eq!(x_limits(&[0.0, 0.0]), (0.0, 1.0));
        assert_eq!(x_limits(&[]), (0.0, 1.0));
    }

    #[test]
    fn test_segments_break_at_nan() {
        let series = Series {
            label: "s".into(),
            points: vec![(0.0, 0.1), (1.0, f64::NAN), (2.0, 0.3), (3.0, 0.4), (f64::NAN, 0.5)],
            stroke: Stroke {
                color: [0, 0, 0],
                width: 1.0,
                style: LineStyle::Solid,
            },
        };
        assert_eq!(
            series.segments(),
            vec![vec![(0.0, 0.1)], vec![(2.0, 0.3), (3.0, 0.4)]]
        );
    }

    #[test]
    fn test_threshold_label_template() {
        assert_eq!(
            threshold_label("max_rest = {threshold}", Threshold::Float(2.0)),
            "max_rest = 2.0"
        );
        assert_eq!(threshold_label("fixed", Threshold::Int(3)), "fixed");
    }
}
