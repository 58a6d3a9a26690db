//! Report rendering pipeline
//!
//! The pipeline:
//! 1. Loads and validates the results table
//! 2. Builds the figure model (threshold, series, limits)
//! 3. Rasterises it with the configured theme
//! 4. Writes the PNG

use crate::config::ReportConfig;
use crate::report::canvas;
use crate::report::error::{ReportError, Result};
use crate::report::figure::RenderedFigure;
use crate::report::table::{InputTable, Threshold};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// What a successful render produced
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSummary {
    pub output_path: PathBuf,
    pub rows: usize,
    pub threshold: Threshold,
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
    /// Pixel size of the written image
    pub width: u32,
    pub height: u32,
}

/// Render `input` to `output`
///
/// Returns `MissingInput` or `MalformedInput` before anything is drawn; the
/// output file is only created once the image is fully encoded.
pub fn render(input: &Path, output: &Path, config: &ReportConfig) -> Result<RenderSummary> {
    let t0 = Instant::now();

    log::info!("[1/4] Loading {}", input.display());
    let table = InputTable::load(input)?;
    table.validate(&input.display().to_string())?;

    log::info!("[2/4] Building figure from {} rows", table.height());
    let figure = RenderedFigure::build(&table, config)?;
    log::info!(
        "  threshold = {}, x = [{}, {}], y = [{}, {}]",
        figure.threshold,
        figure.x_range.0,
        figure.x_range.1,
        figure.y_range.0,
        figure.y_range.1
    );

    log::info!("[3/4] Rasterising ({} theme)", config.theme);
    let theme = config.to_theme();
    let raster = canvas::rasterize(&figure, &theme)?;

    log::info!(
        "[4/4] Writing {}x{} PNG at {} DPI",
        raster.width,
        raster.height,
        figure.dpi
    );
    canvas::save_png(&raster, figure.dpi, output)?;

    log::debug!("Rendered in {:.3}s", t0.elapsed().as_secs_f64());

    Ok(RenderSummary {
        output_path: output.to_path_buf(),
        rows: table.height(),
        threshold: figure.threshold,
        x_range: figure.x_range,
        y_range: figure.y_range,
        width: raster.width,
        height: raster.height,
    })
}

/// Render with the configured paths and print the user-facing outcome
///
/// Missing or malformed input is reported and yields `Ok(None)`; any other
/// error is returned to the caller.
pub fn run(config: &ReportConfig) -> Result<Option<RenderSummary>> {
    match render(&config.input_path, &config.output_path, config) {
        Ok(summary) => {
            println!("Plot saved as {}", summary.output_path.display());
            Ok(Some(summary))
        }
        Err(e) if e.is_graceful() => {
            println!("Error: {}", input_problem(&e));
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// User-facing text for a missing or malformed input
fn input_problem(e: &ReportError) -> String {
    match e {
        ReportError::MissingInput { path } => format!(
            "{} not found. Please run the simulation first.",
            path.display()
        ),
        ReportError::MalformedInput(message) => message.clone(),
        other => other.to_string(),
    }
}
