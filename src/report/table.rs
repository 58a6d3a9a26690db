//! Simulation results table
//!
//! Loads results.csv into a Polars DataFrame and exposes the handful of
//! columns the chart needs. Only shape is validated: the table must have rows
//! and the required columns. Value ranges and ordering of `W` are not checked.

use super::error::{ReportError, Result};
use polars::prelude::*;
use std::fmt;
use std::path::Path;

/// Hub broadcast weight (x axis)
pub const COL_W: &str = "W";
/// Fraction of nodes in "Glory" under synchronous update
pub const COL_SYNC: &str = "percent_glory_sync";
/// Success probability under asynchronous update
pub const COL_ASYNC: &str = "success_prob_async";
/// Theoretical phase transition, constant per graph
pub const COL_MAX_REST: &str = "max_rest";

/// Phase transition threshold read from the first `max_rest` cell
///
/// Keeps the column's numeric kind so that labels read `1` for an integer
/// column and `1.0` for a float column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Threshold {
    Int(i64),
    Float(f64),
}

impl Threshold {
    pub fn value(&self) -> f64 {
        match *self {
            Threshold::Int(v) => v as f64,
            Threshold::Float(v) => v,
        }
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Threshold::Int(v) => write!(f, "{}", v),
            Threshold::Float(v) => f.write_str(&float_repr(*v)),
        }
    }
}

/// Shortest round-trip form of a float, keeping ".0" on whole values and a
/// signed two-digit exponent (`1.0`, `2.5`, `1e+16`, `1e-07`)
fn float_repr(v: f64) -> String {
    let repr = format!("{:?}", v);
    match repr.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => repr,
    }
}

/// Input table loaded from the simulation CSV
#[derive(Debug, Clone)]
pub struct InputTable {
    df: DataFrame,
}

impl InputTable {
    /// Read a CSV file with a header row
    ///
    /// Column types are inferred from every row: the simulation writes whole
    /// numbers as `0` until a column first turns fractional, which can be well
    /// past the first hundred rows. A zero-byte file is reported as malformed
    /// (empty) rather than as a parse error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ReportError::MissingInput {
                path: path.to_path_buf(),
            });
        }

        let is_zero_bytes = std::fs::metadata(path)
            .map(|m| m.len() == 0)
            .unwrap_or(false);
        if is_zero_bytes {
            return Err(ReportError::MalformedInput(format!(
                "{} is empty",
                path.display()
            )));
        }

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(None)
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()
            .map_err(|e| match e {
                PolarsError::NoData(_) => {
                    ReportError::MalformedInput(format!("{} is empty", path.display()))
                }
                other => ReportError::Table(other),
            })?;

        log::debug!(
            "Loaded {}: {} rows, columns {:?}",
            path.display(),
            df.height(),
            df.get_column_names()
        );

        Ok(Self { df })
    }

    #[cfg(test)]
    pub fn from_dataframe(df: DataFrame) -> Self {
        Self { df }
    }

    /// Number of data rows
    pub fn height(&self) -> usize {
        self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.df.get_column_index(name).is_some()
    }

    /// Check that the table can be plotted
    ///
    /// `source` names the input in error messages.
    pub fn validate(&self, source: &str) -> Result<()> {
        if self.is_empty() || !self.has_column(COL_MAX_REST) {
            return Err(ReportError::MalformedInput(format!(
                "'{}' column not in {} or file is empty.",
                COL_MAX_REST, source
            )));
        }

        for name in [COL_W, COL_SYNC, COL_ASYNC] {
            if !self.has_column(name) {
                return Err(ReportError::MalformedInput(format!(
                    "'{}' column not in {}.",
                    name, source
                )));
            }
        }

        Ok(())
    }

    /// Column values as f64; missing or non-numeric cells become NaN
    pub fn numeric_column(&self, name: &str) -> Result<Vec<f64>> {
        let column = self
            .df
            .column(name)
            .map_err(|_| ReportError::MalformedInput(format!("'{}' column not found", name)))?;

        let series = column.as_materialized_series().cast(&DataType::Float64)?;
        let values = series
            .f64()?
            .into_iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect();

        Ok(values)
    }

    /// Threshold from the first row of `max_rest`; later rows are ignored
    pub fn threshold(&self) -> Result<Threshold> {
        let column = self.df.column(COL_MAX_REST).map_err(|_| {
            ReportError::MalformedInput(format!("'{}' column not found", COL_MAX_REST))
        })?;
        let series = column.as_materialized_series();

        let threshold = if series.dtype().is_integer() {
            series
                .cast(&DataType::Int64)?
                .i64()?
                .get(0)
                .map(Threshold::Int)
        } else {
            series
                .cast(&DataType::Float64)?
                .f64()?
                .get(0)
                .filter(|v| !v.is_nan())
                .map(Threshold::Float)
        };

        threshold.ok_or_else(|| {
            ReportError::MalformedInput(format!("'{}' has no value in the first row", COL_MAX_REST))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    const GOOD: &str = "W,max_rest,percent_glory_sync,success_prob_async\n\
                        0,1,0.1,0.2\n\
                        1,1,0.5,0.4\n\
                        2,1,0.9,0.8\n";

    #[test]
    fn test_load_well_formed() {
        let file = write_csv(GOOD);
        let table = InputTable::load(file.path()).unwrap();
        assert_eq!(table.height(), 3);
        table.validate("results.csv").unwrap();

        assert_eq!(table.numeric_column(COL_W).unwrap(), vec![0.0, 1.0, 2.0]);
        assert_eq!(table.numeric_column(COL_SYNC).unwrap(), vec![0.1, 0.5, 0.9]);
        assert_eq!(table.numeric_column(COL_ASYNC).unwrap(), vec![0.2, 0.4, 0.8]);
        assert_eq!(table.threshold().unwrap(), Threshold::Int(1));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = InputTable::load(&dir.path().join("results.csv")).unwrap_err();
        assert!(matches!(err, ReportError::MissingInput { .. }));
    }

    #[test]
    fn test_header_only_is_malformed() {
        let file = write_csv("W,max_rest,percent_glory_sync,success_prob_async\n");
        let table = InputTable::load(file.path()).unwrap();
        assert!(table.is_empty());
        assert!(matches!(
            table.validate("results.csv"),
            Err(ReportError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_zero_byte_file_is_malformed() {
        let file = write_csv("");
        let err = InputTable::load(file.path()).unwrap_err();
        assert!(matches!(err, ReportError::MalformedInput(_)));
    }

    #[test]
    fn test_missing_max_rest_is_malformed() {
        let file = write_csv("W,percent_glory_sync,success_prob_async\n0,0.1,0.2\n");
        let table = InputTable::load(file.path()).unwrap();
        let err = table.validate("results.csv").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Malformed input: 'max_rest' column not in results.csv or file is empty."
        );
    }

    #[test]
    fn test_missing_w_is_malformed() {
        let file = write_csv("max_rest,percent_glory_sync,success_prob_async\n1,0.1,0.2\n");
        let table = InputTable::load(file.path()).unwrap();
        let err = table.validate("results.csv").unwrap_err();
        assert!(err.to_string().contains("'W'"));
    }

    #[test]
    fn test_threshold_uses_first_row_only() {
        let file = write_csv(
            "W,max_rest,percent_glory_sync,success_prob_async\n\
             0,3,0.1,0.2\n\
             1,7,0.5,0.4\n\
             2,9,0.9,0.8\n",
        );
        let table = InputTable::load(file.path()).unwrap();
        assert_eq!(table.threshold().unwrap(), Threshold::Int(3));
    }

    #[test]
    fn test_float_threshold_formatting() {
        let file = write_csv("W,max_rest,percent_glory_sync,success_prob_async\n0,2.5,0.1,0.2\n");
        let table = InputTable::load(file.path()).unwrap();
        let t = table.threshold().unwrap();
        assert_eq!(t, Threshold::Float(2.5));
        assert_eq!(t.to_string(), "2.5");

        assert_eq!(Threshold::Float(1.0).to_string(), "1.0");
        assert_eq!(Threshold::Float(0.0001).to_string(), "0.0001");
        assert_eq!(Threshold::Float(1e16).to_string(), "1e+16");
        assert_eq!(Threshold::Float(1e-7).to_string(), "1e-07");
        assert_eq!(Threshold::Float(-2.5e-5).to_string(), "-2.5e-05");
        assert_eq!(Threshold::Float(1e100).to_string(), "1e+100");
        assert_eq!(Threshold::Int(1).to_string(), "1");
        assert_eq!(Threshold::Int(4).value(), 4.0);
    }

    #[test]
    fn test_blank_cells_become_nan() {
        let file = write_csv(
            "W,max_rest,percent_glory_sync,success_prob_async\n\
             0,1,0.1,0.2\n\
             1,1,,0.4\n",
        );
        let table = InputTable::load(file.path()).unwrap();
        let sync = table.numeric_column(COL_SYNC).unwrap();
        assert_eq!(sync[0], 0.1);
        assert!(sync[1].is_nan());
    }

    #[test]
    fn test_from_dataframe() {
        let df = df! {
            "W" => [0.0, 0.5],
            "max_rest" => [1i64, 1],
            "percent_glory_sync" => [0.0, 1.0],
            "success_prob_async" => [0.0, 1.0],
        }
        .unwrap();
        let table = InputTable::from_dataframe(df);
        table.validate("frame").unwrap();
        assert_eq!(table.threshold().unwrap(), Threshold::Int(1));
    }

    /// Simulation sweep: W = 0..150, whole-number cells until W = 120
    fn sweep_csv() -> String {
        let mut csv = String::from("W,max_rest,percent_glory_sync,success_prob_async\n");
        for w in 0..=150 {
            if w < 120 {
                csv.push_str(&format!("{},3,0,0\n", w));
            } else {
                csv.push_str(&format!("{},3,1,0.37\n", w));
            }
        }
        csv
    }

    #[test]
    fn test_late_fractional_cells_load_as_float() {
        let file = write_csv(&sweep_csv());
        let table = InputTable::load(file.path()).unwrap();
        assert_eq!(table.height(), 151);
        table.validate("results.csv").unwrap();

        let asynchronous = table.numeric_column(COL_ASYNC).unwrap();
        assert_eq!(asynchronous[0], 0.0);
        assert_eq!(asynchronous[119], 0.0);
        assert_eq!(asynchronous[120], 0.37);
        assert_eq!(asynchronous[150], 0.37);

        let sync = table.numeric_column(COL_SYNC).unwrap();
        assert_eq!(sync[150], 1.0);
        assert_eq!(table.numeric_column(COL_W).unwrap()[150], 150.0);

        // An all-integer max_rest keeps its integer label
        assert_eq!(table.threshold().unwrap(), Threshold::Int(3));
    }

    #[test]
    fn test_late_fractional_threshold_column() {
        let mut csv = String::from("W,max_rest,percent_glory_sync,success_prob_async\n");
        for w in 0..150 {
            csv.push_str(&format!("{},1,0.5,0.5\n", w));
        }
        csv.push_str("150,1.5,0.5,0.5\n");

        let file = write_csv(&csv);
        let table = InputTable::load(file.path()).unwrap();
        assert_eq!(table.threshold().unwrap(), Threshold::Float(1.0));
        assert_eq!(table.threshold().unwrap().to_string(), "1.0");
    }
}
