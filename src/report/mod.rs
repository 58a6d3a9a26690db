//! Convergence report rendering
//!
//! Structure:
//! - `table.rs`: Results CSV loading and shape validation
//! - `figure.rs`: In-memory chart model
//! - `canvas.rs`: plotters rasterisation and PNG output
//! - `theme.rs`: Named visual themes
//! - `palettes.rs`: Color palettes and hex parsing
//! - `properties.rs`: Property registry (report.json) and typed reader
//! - `error.rs`: Error types

pub mod canvas;
pub mod error;
pub mod figure;
pub mod palettes;
pub mod properties;
pub mod table;
pub mod theme;

pub use error::{ReportError, Result};
pub use figure::RenderedFigure;
pub use table::{InputTable, Threshold};
