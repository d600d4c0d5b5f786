//! Data source collaborators feeding the pipeline.
//!
//! The pipeline asks a [`ScoreSource`] and a [`MetadataSource`] for freshly
//! loaded tables on every request; nothing is cached between requests.  The
//! CSV implementations read the spreadsheet exports the reports were built
//! around, and the table types themselves implement the traits so tests and
//! embedders can hand in prepared data.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::config::ReportConfig;
use crate::error::SourceError;
use crate::model::{MetadataTable, ScoreRow, ScoreTable};

/// Provides the score dataset.
pub trait ScoreSource {
    /// Loads the complete score table.
    fn load_scores(&self) -> Result<ScoreTable, SourceError>;
}

/// Provides the metadata dataset.
pub trait MetadataSource {
    /// Loads the complete metadata table.
    fn load_metadata(&self) -> Result<MetadataTable, SourceError>;
}

impl ScoreSource for ScoreTable {
    fn load_scores(&self) -> Result<ScoreTable, SourceError> {
        Ok(self.clone())
    }
}

impl MetadataSource for MetadataTable {
    fn load_metadata(&self) -> Result<MetadataTable, SourceError> {
        Ok(self.clone())
    }
}

fn csv_reader<R: io::Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader)
}

fn column_index(
    headers: &csv::StringRecord,
    dataset: &'static str,
    column: &str,
) -> Result<usize, SourceError> {
    headers
        .iter()
        .position(|header| header == column)
        .ok_or_else(|| SourceError::MissingColumn {
            dataset,
            column: column.to_owned(),
        })
}

/// Parses a score cell.
///
/// Empty cells and cells that are not finite numbers yield `None`.  A single
/// comma is accepted as decimal separator since spreadsheet exports in
/// Portuguese locales write `8,25`.
pub fn parse_score(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }

    let normalized;
    let candidate = if !cell.contains('.') && cell.matches(',').count() == 1 {
        normalized = cell.replace(',', ".");
        normalized.as_str()
    } else {
        cell
    };

    candidate.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Reads a score table from CSV data.
///
/// `lot_column` and every entry of `categories` must be present in the
/// header row; other columns are ignored.  Rows with an empty lot identifier
/// are skipped.
pub fn read_scores<R: io::Read>(
    reader: R,
    lot_column: &str,
    categories: &[String],
) -> Result<ScoreTable, SourceError> {
    let mut reader = csv_reader(reader);
    let headers = reader.headers()?.clone();
    let lot_index = column_index(&headers, "scores", lot_column)?;
    let category_indices = categories
        .iter()
        .map(|category| column_index(&headers, "scores", category))
        .collect::<Result<Vec<_>, _>>()?;

    let mut table = ScoreTable::new(categories.iter().cloned());
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        let lot_id = record.get(lot_index).unwrap_or_default();
        if lot_id.is_empty() {
            debug!("Skipping score row {} without a lot identifier", line + 1);
            continue;
        }

        let scores = category_indices
            .iter()
            .zip(categories)
            .map(|(&index, category)| {
                let cell = record.get(index).unwrap_or_default();
                let score = parse_score(cell);
                if score.is_none() && !cell.is_empty() {
                    warn!(
                        "Ignoring non-numeric '{}' score '{}' for lot '{}'",
                        category, cell, lot_id
                    );
                }
                score
            })
            .collect::<Vec<_>>();

        table.push_row(ScoreRow::new(lot_id, scores))?;
    }

    Ok(table)
}

/// Reads a metadata table from CSV data, keeping every column as text.
pub fn read_metadata<R: io::Read>(reader: R, lot_column: &str) -> Result<MetadataTable, SourceError> {
    let mut reader = csv_reader(reader);
    let headers = reader.headers()?.clone();
    let mut table = MetadataTable::new(lot_column, headers.iter())?;

    for record in reader.records() {
        let record = record?;
        table.push_record(record.iter())?;
    }

    Ok(table)
}

/// Score dataset stored as a CSV file.
#[derive(Clone, Debug)]
pub struct CsvScoreSource {
    path: PathBuf,
    lot_column: String,
    categories: Vec<String>,
}

impl CsvScoreSource {
    /// Creates a source reading `path` with the columns named in `config`.
    pub fn new(path: impl Into<PathBuf>, config: &ReportConfig) -> Self {
        Self {
            path: path.into(),
            lot_column: config.score_lot_column.clone(),
            categories: config.categories.clone(),
        }
    }

    /// Returns the CSV file location.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ScoreSource for CsvScoreSource {
    fn load_scores(&self) -> Result<ScoreTable, SourceError> {
        let file = File::open(&self.path)?;
        let table = read_scores(file, &self.lot_column, &self.categories)?;
        debug!(
            "Loaded {} score rows from {}",
            table.rows().len(),
            self.path.display()
        );
        Ok(table)
    }
}

/// Metadata dataset stored as a CSV file.
#[derive(Clone, Debug)]
pub struct CsvMetadataSource {
    path: PathBuf,
    lot_column: String,
}

impl CsvMetadataSource {
    /// Creates a source reading `path` with the lot column named in `config`.
    pub fn new(path: impl Into<PathBuf>, config: &ReportConfig) -> Self {
        Self {
            path: path.into(),
            lot_column: config.metadata_lot_column.clone(),
        }
    }

    /// Returns the CSV file location.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MetadataSource for CsvMetadataSource {
    fn load_metadata(&self) -> Result<MetadataTable, SourceError> {
        let file = File::open(&self.path)?;
        let table = read_metadata(file, &self.lot_column)?;
        debug!(
            "Loaded {} metadata rows from {}",
            table.records().len(),
            self.path.display()
        );
        Ok(table)
    }
}
