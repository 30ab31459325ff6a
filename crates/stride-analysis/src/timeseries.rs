//! Tabular per-frame output of the region analyses.
//!
//! The text form is a `#`-prefixed header naming the columns, then one
//! whitespace-delimited row per frame:
//!
//! ```text
//! # door exit
//! 0 0
//! 1 0
//! ```

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::error::AnalysisError;

/// Named columns of per-frame values.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TimeSeries {
    columns: Vec<String>,
    first_frame: usize,
    rows: Vec<Vec<f64>>,
}

impl TimeSeries {
    /// An empty series whose first row will stand for `first_frame`.
    pub fn new(columns: Vec<String>, first_frame: usize) -> Self {
        Self {
            columns,
            first_frame,
            rows: Vec::new(),
        }
    }

    /// Append a row.
    ///
    /// # Errors
    ///
    /// [`AnalysisError::InvalidParameter`] when the row width differs from
    /// the column count.
    pub fn push_row(&mut self, row: Vec<f64>) -> Result<(), AnalysisError> {
        if row.len() != self.columns.len() {
            return Err(AnalysisError::InvalidParameter {
                reason: format!(
                    "row has {} values for {} columns",
                    row.len(),
                    self.columns.len()
                ),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Frame index of the first row.
    pub fn first_frame(&self) -> usize {
        self.first_frame
    }

    /// All rows in frame order.
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one column, by name.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let c = self.columns.iter().position(|n| n == name)?;
        Some(self.rows.iter().map(|row| row[c]).collect())
    }

    /// Row for absolute frame `frame`.
    pub fn row_for_frame(&self, frame: usize) -> Option<&[f64]> {
        let k = frame.checked_sub(self.first_frame)?;
        self.rows.get(k).map(Vec::as_slice)
    }

    /// Write the text form.
    pub fn write_to(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(w, "# {}", self.columns.join(" "))?;
        for row in &self.rows {
            let mut line = String::new();
            for (k, v) in row.iter().enumerate() {
                if k > 0 {
                    line.push(' ');
                }
                line.push_str(&v.to_string());
            }
            writeln!(w, "{line}")?;
        }
        Ok(())
    }

    /// Write the text form to `path`, replacing any existing file.
    pub fn write_file(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let mut w = BufWriter::new(File::create(path)?);
        self.write_to(&mut w)?;
        w.flush()
    }

    /// Parse the text form. The first `#` line names the columns; later
    /// `#` lines and blank lines are skipped. Rows are numbered from frame
    /// zero.
    ///
    /// # Errors
    ///
    /// [`AnalysisError::Io`] with [`io::ErrorKind::InvalidData`] on a
    /// non-numeric value or a row of the wrong width.
    pub fn parse(text: &str) -> Result<Self, AnalysisError> {
        let mut columns: Option<Vec<String>> = None;
        let mut rows = Vec::new();
        for (n, line) in text.lines().enumerate() {
            let line = line.trim();
            if let Some(header) = line.strip_prefix('#') {
                if columns.is_none() {
                    columns = Some(header.split_whitespace().map(str::to_string).collect());
                }
                continue;
            }
            if line.is_empty() {
                continue;
            }
            let row = line
                .split_whitespace()
                .map(|tok| tok.parse::<f64>().map_err(|_| invalid(n + 1, tok)))
                .collect::<Result<Vec<f64>, _>>()?;
            rows.push(row);
        }

        let columns = match columns {
            Some(c) => c,
            None => {
                let width = rows.first().map_or(0, Vec::len);
                (0..width).map(|k| format!("c{k}")).collect()
            }
        };
        let mut series = Self::new(columns, 0);
        for row in rows {
            series.push_row(row).map_err(|e| {
                AnalysisError::Io(io::Error::new(io::ErrorKind::InvalidData, e.to_string()))
            })?;
        }
        Ok(series)
    }
}

fn invalid(line: usize, tok: &str) -> AnalysisError {
    AnalysisError::Io(io::Error::new(
        io::ErrorKind::InvalidData,
        format!("line {line}: not a number: {tok:?}"),
    ))
}
