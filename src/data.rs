//! Tabular observation data and the validation used when binding it to a model.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use serde::Serialize;

use crate::error::{ChoiceError, Result};

/// Wide-format observation data: one row per observation, one column per field.
///
/// Cells are kept as text so that the choice column can hold alternative labels
/// next to numeric variable columns. Row order is the observation index.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DataTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl DataTable {
    /// Creates a table after checking that every row matches the header width.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        for (row, cells) in rows.iter().enumerate() {
            if cells.len() != columns.len() {
                return Err(ChoiceError::RaggedRow {
                    row,
                    expected: columns.len(),
                    found: cells.len(),
                });
            }
        }
        Ok(Self { columns, rows })
    }

    /// Parses comma separated text with a header row.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let columns = reader
            .headers()?
            .iter()
            .map(str::to_string)
            .collect::<Vec<_>>();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        log::debug!(
            "parsed {} rows across {} columns of observation data",
            rows.len(),
            columns.len()
        );
        Self::new(columns, rows)
    }

    /// Reads a CSV file with a header row from disk.
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_csv_reader(file)
    }

    /// Column labels in header order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// All rows, each with one cell per column.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of observations.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Position of `name` in the header, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Returns whether the table has a column labelled `name`.
    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Iterates over the cells of column `name`.
    pub fn column(&self, name: &str) -> Result<impl Iterator<Item = &str> + '_> {
        let index = self
            .column_index(name)
            .ok_or_else(|| ChoiceError::MissingField(name.to_string()))?;
        Ok(self.rows.iter().map(move |row| row[index].as_str()))
    }

    /// Parses every cell of column `name` as a floating point number.
    pub fn numeric_column(&self, name: &str) -> Result<Vec<f64>> {
        self.column(name)?
            .enumerate()
            .map(|(row, cell)| parse_number(name, row, cell))
            .collect()
    }

    /// Fails with [`ChoiceError::MissingField`] for the first absent field.
    pub fn require_columns<'a, I>(&self, fields: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        for field in fields {
            if !self.has_column(field) {
                return Err(ChoiceError::MissingField(field.to_string()));
            }
        }
        Ok(())
    }

    /// Writes the table as CSV, optionally preceded by the header row.
    pub fn to_csv_writer<W: Write>(&self, writer: W, header: bool) -> Result<()> {
        let mut writer = csv::WriterBuilder::new().from_writer(writer);
        if header {
            writer.write_record(&self.columns)?;
        }
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Parses a single cell, naming the column and row on failure.
pub(crate) fn parse_number(column: &str, row: usize, cell: &str) -> Result<f64> {
    cell.trim()
        .parse::<f64>()
        .map_err(|_| ChoiceError::invalid_value(column, row, cell))
}
