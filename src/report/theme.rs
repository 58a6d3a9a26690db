//! Named visual themes
//!
//! Modelled after seaborn's style presets. A theme is a plain value passed to
//! the canvas for one rendering call; nothing is installed globally.

/// Colors and switches that define the look of a chart
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub name: &'static str,
    /// Whole-figure background
    pub figure_background: [u8; 3],
    /// Plot panel background
    pub panel_background: [u8; 3],
    /// Major grid lines (None = no grid)
    pub grid: Option<[u8; 3]>,
    /// Panel border, drawn around the plotting area
    pub panel_border: Option<[u8; 3]>,
    /// Titles, axis labels, tick labels
    pub text: [u8; 3],
    /// Legend box fill
    pub legend_background: [u8; 3],
    /// Legend fill opacity
    pub legend_alpha: f64,
    /// Legend frame color when a frame is drawn
    pub legend_border: [u8; 3],
    pub font_family: &'static str,
}

const TEXT_DARK: [u8; 3] = [38, 38, 38]; // ".15"
const LIGHT_GRAY: [u8; 3] = [204, 204, 204]; // ".8"

impl Theme {
    /// White panel with light gray major grid
    pub fn whitegrid() -> Self {
        Self {
            name: "whitegrid",
            figure_background: [255, 255, 255],
            panel_background: [255, 255, 255],
            grid: Some([221, 221, 221]),
            panel_border: Some(LIGHT_GRAY),
            text: TEXT_DARK,
            legend_background: [255, 255, 255],
            legend_alpha: 0.8,
            legend_border: LIGHT_GRAY,
            font_family: "sans-serif",
        }
    }

    /// White panel, no grid
    pub fn white() -> Self {
        Self {
            name: "white",
            grid: None,
            ..Self::whitegrid()
        }
    }

    /// Blue-gray panel with white grid, no panel border
    pub fn darkgrid() -> Self {
        Self {
            name: "darkgrid",
            panel_background: [234, 234, 242],
            grid: Some([255, 255, 255]),
            panel_border: None,
            ..Self::whitegrid()
        }
    }

    /// Look up a theme by name; unknown names fall back to whitegrid
    pub fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "white" => Self::white(),
            "darkgrid" => Self::darkgrid(),
            "whitegrid" => Self::whitegrid(),
            other => {
                log::warn!("Unknown theme '{}', using whitegrid", other);
                Self::whitegrid()
            }
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::whitegrid()
    }
}
