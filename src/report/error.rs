use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while rendering a convergence report
#[derive(Debug, Error)]
pub enum ReportError {
    /// Input table does not exist
    #[error("{} not found", .path.display())]
    MissingInput { path: PathBuf },

    /// Input table exists but cannot be plotted (empty, missing columns)
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// CSV parsing or column conversion error
    #[error("Table error: {0}")]
    Table(#[from] polars::error::PolarsError),

    /// Property override that fails validation
    #[error("Invalid value '{value}' for property '{name}': {reason}")]
    InvalidProperty {
        name: String,
        value: String,
        reason: String,
    },

    /// Drawing error from the plotting backend
    #[error("Render error: {0}")]
    Render(String),

    /// Output image cannot be written
    #[error("Failed to write {}: {source}", .path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// PNG encoding error
    #[error("PNG encoding error: {0}")]
    Encode(#[from] png::EncodingError),
}

impl ReportError {
    /// True for input problems that are reported to the user and end the run
    /// without being treated as a failure.
    pub fn is_graceful(&self) -> bool {
        matches!(self, Self::MissingInput { .. } | Self::MalformedInput(_))
    }
}

/// Type alias for Results using ReportError
pub type Result<T> = std::result::Result<T, ReportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graceful_kinds() {
        let missing = ReportError::MissingInput {
            path: PathBuf::from("results.csv"),
        };
        assert!(missing.is_graceful());
        assert_eq!(missing.to_string(), "results.csv not found");

        assert!(ReportError::MalformedInput("empty".into()).is_graceful());
        assert!(!ReportError::Render("boom".into()).is_graceful());

        let write = ReportError::OutputWrite {
            path: PathBuf::from("/nope/plot.png"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert!(!write.is_graceful());
        assert!(write.to_string().starts_with("Failed to write /nope/plot.png"));
    }
}
