#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Flat string relations shared by the pipeline stages.
//!
//! A [`Relation`] is a header plus rows of string cells, the on-disk shape
//! of the intermediate `sewik_*.csv` files. Missing values are stored as
//! empty strings, matching how they round-trip through CSV.

pub mod progress;

use std::path::Path;

/// A single extracted record: `(column, value)` pairs in source order.
pub type Record = Vec<(String, String)>;

/// Errors that can occur while reading or writing relations.
#[derive(Debug, thiserror::Error)]
pub enum RelationError {
    /// I/O error (file read/write).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV encoding or decoding failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A column required by a stage is absent from the header.
    #[error("Missing column {column:?} in {relation}")]
    MissingColumn {
        /// Name of the missing column.
        column: String,
        /// Which relation was being read.
        relation: String,
    },
}

/// A table of string cells with a header row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relation {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Relation {
    /// Creates an empty relation with the given header.
    #[must_use]
    pub const fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Builds a relation from records whose field sets may differ.
    ///
    /// The header is the union of all field names in first-seen order;
    /// records lacking a field get an empty cell.
    #[must_use]
    pub fn from_records(records: impl IntoIterator<Item = Record>) -> Self {
        let mut relation = Self::default();
        for record in records {
            let mut row = vec![String::new(); relation.columns.len()];
            for (name, value) in record {
                let idx = relation.ensure_column(&name, &mut row);
                row[idx] = value;
            }
            relation.rows.push(row);
        }
        relation.pad_rows();
        relation
    }

    /// Concatenates relations, unioning their headers in first-seen order.
    #[must_use]
    pub fn concat(parts: impl IntoIterator<Item = Self>) -> Self {
        let mut combined = Self::default();
        for part in parts {
            let mapping: Vec<usize> = part
                .columns
                .iter()
                .map(|name| combined.column_index(name).unwrap_or_else(|| {
                    combined.columns.push(name.clone());
                    combined.columns.len() - 1
                }))
                .collect();

            for row in part.rows {
                let mut out = vec![String::new(); combined.columns.len()];
                for (cell, &idx) in row.into_iter().zip(&mapping) {
                    out[idx] = cell;
                }
                combined.rows.push(out);
            }
        }
        combined.pad_rows();
        combined
    }

    /// Returns a copy of this relation with a constant-valued column
    /// appended (or overwritten, if it already exists).
    #[must_use]
    pub fn with_constant(mut self, column: &str, value: &str) -> Self {
        let idx = if let Some(idx) = self.column_index(column) {
            idx
        } else {
            self.columns.push(column.to_owned());
            self.pad_rows();
            self.columns.len() - 1
        };
        for row in &mut self.rows {
            value.clone_into(&mut row[idx]);
        }
        self
    }

    /// Applies `f` to every cell of `column`. No-op if the column is absent.
    #[must_use]
    pub fn map_column(mut self, column: &str, f: impl Fn(&str) -> String) -> Self {
        if let Some(idx) = self.column_index(column) {
            for row in &mut self.rows {
                row[idx] = f(&row[idx]);
            }
        }
        self
    }

    /// Appends a row. Short rows are padded, extra cells are dropped.
    pub fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.columns.len(), String::new());
        self.rows.push(row);
    }

    /// Column names in order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// All rows.
    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of rows.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether there are no rows.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of `name` in the header.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Index of `name` in the header, or [`RelationError::MissingColumn`].
    ///
    /// # Errors
    ///
    /// Returns an error if the column is absent.
    pub fn require_column(&self, name: &str, relation: &str) -> Result<usize, RelationError> {
        self.column_index(name)
            .ok_or_else(|| RelationError::MissingColumn {
                column: name.to_owned(),
                relation: relation.to_owned(),
            })
    }

    /// Index of the first of `names` present in the header.
    ///
    /// # Errors
    ///
    /// Returns [`RelationError::MissingColumn`] naming the first candidate
    /// if none is present.
    pub fn require_any_column(
        &self,
        names: &[&str],
        relation: &str,
    ) -> Result<usize, RelationError> {
        names
            .iter()
            .find_map(|name| self.column_index(name))
            .ok_or_else(|| RelationError::MissingColumn {
                column: names.first().copied().unwrap_or_default().to_owned(),
                relation: relation.to_owned(),
            })
    }

    /// Reads a relation from a CSV file with a header row.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or is not valid CSV.
    pub fn read_csv(path: &Path) -> Result<Self, RelationError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)?;

        let columns: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_owned())
            .collect();

        let mut relation = Self::new(columns);
        for result in reader.records() {
            let record = result?;
            relation.push_row(record.iter().map(str::to_owned).collect());
        }

        log::debug!("Read {} rows from {}", relation.len(), path.display());
        Ok(relation)
    }

    /// Writes the relation as a UTF-8 CSV file with a header row, creating
    /// parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written.
    pub fn write_csv(&self, path: &Path) -> Result<(), RelationError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;

        log::debug!("Wrote {} rows to {}", self.len(), path.display());
        Ok(())
    }

    fn ensure_column(&mut self, name: &str, row: &mut Vec<String>) -> usize {
        if let Some(idx) = self.column_index(name) {
            return idx;
        }
        self.columns.push(name.to_owned());
        row.push(String::new());
        self.columns.len() - 1
    }

    fn pad_rows(&mut self) {
        let width = self.columns.len();
        for row in &mut self.rows {
            row.resize(width, String::new());
        }
    }
}
