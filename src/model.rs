//! Data structures describing the datasets and intermediate values of a report.
//!
//! Score and metadata tables are the in-memory form of the two source
//! spreadsheets.  They carry no reference to how they were loaded so the
//! pipeline can be fed from CSV files, fixtures in tests, or any other
//! collaborator implementing the traits in [`crate::sources`].

use crate::error::SourceError;

/// Lot identifier column of the score dataset.
pub const DEFAULT_SCORE_LOT_COLUMN: &str = "Lote";

/// Lot identifier column of the metadata dataset.
///
/// Both columns name the same logical lot identifier.
pub const DEFAULT_METADATA_LOT_COLUMN: &str = "lote_prova";

/// The ten standard cupping categories in chart order.
pub const DEFAULT_CATEGORIES: &[&str] = &[
    "Fragrance",
    "Flavor",
    "Aftertaste",
    "Acidity",
    "Body",
    "Uniformity",
    "Clean Cup",
    "Sweetness",
    "Balance",
    "Overall",
];

/// Outcome of looking a lot up in one of the datasets.
///
/// Lookups never return an empty value in place of a missing lot; callers
/// have to handle [`Lookup::NotFound`] explicitly.
#[derive(Clone, Debug, PartialEq)]
pub enum Lookup<T> {
    /// The lot is present and the value was derived from its rows.
    Found(T),
    /// No row carries the requested lot identifier.
    NotFound,
}

impl<T> Lookup<T> {
    /// Converts the lookup into an [`Option`].
    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            Self::NotFound => None,
        }
    }
}

/// One sensory evaluation of a lot.
///
/// Scores are stored in the category order of the owning [`ScoreTable`].  A
/// cell that was empty or not a number in the source is kept as `None`.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoreRow {
    lot_id: String,
    scores: Vec<Option<f64>>,
}

impl ScoreRow {
    /// Creates a score row for `lot_id`.
    pub fn new(lot_id: impl Into<String>, scores: impl Into<Vec<Option<f64>>>) -> Self {
        Self {
            lot_id: lot_id.into(),
            scores: scores.into(),
        }
    }

    /// Creates a score row where every category has a value.
    pub fn complete(lot_id: impl Into<String>, scores: &[f64]) -> Self {
        Self::new(lot_id, scores.iter().copied().map(Some).collect::<Vec<_>>())
    }

    /// Returns the lot identifier.
    pub fn lot_id(&self) -> &str {
        &self.lot_id
    }

    /// Returns the per-category scores.
    pub fn scores(&self) -> &[Option<f64>] {
        &self.scores
    }
}

/// The score dataset: an ordered category list plus the rows scored against it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScoreTable {
    categories: Vec<String>,
    rows: Vec<ScoreRow>,
}

impl ScoreTable {
    /// Creates an empty table for the given categories.
    pub fn new<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            categories: categories.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Creates an empty table for [`DEFAULT_CATEGORIES`].
    pub fn with_default_categories() -> Self {
        Self::new(DEFAULT_CATEGORIES.iter().copied())
    }

    /// Appends a row, rejecting rows whose width differs from the category count.
    pub fn push_row(&mut self, row: ScoreRow) -> Result<(), SourceError> {
        if row.scores.len() != self.categories.len() {
            return Err(SourceError::RowWidth {
                dataset: "scores",
                expected: self.categories.len(),
                found: row.scores.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Appends a row and returns the updated table.
    pub fn with_row(mut self, row: ScoreRow) -> Result<Self, SourceError> {
        self.push_row(row)?;
        Ok(self)
    }

    /// Returns the category names in chart order.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Returns all rows in source order.
    pub fn rows(&self) -> &[ScoreRow] {
        &self.rows
    }

    /// Iterates over the rows of `lot_id`, compared case-sensitively.
    pub fn rows_for<'a>(&'a self, lot_id: &'a str) -> impl Iterator<Item = &'a ScoreRow> + 'a {
        self.rows.iter().filter(move |row| row.lot_id == lot_id)
    }
}

/// Per-category means of a single lot, in the category order of the source table.
#[derive(Clone, Debug, PartialEq)]
pub struct LotAggregate {
    lot_id: String,
    means: Vec<(String, f64)>,
    sample_count: usize,
}

impl LotAggregate {
    pub(crate) fn new(lot_id: impl Into<String>, means: Vec<(String, f64)>, sample_count: usize) -> Self {
        Self {
            lot_id: lot_id.into(),
            means,
            sample_count,
        }
    }

    /// Returns the lot identifier.
    pub fn lot_id(&self) -> &str {
        &self.lot_id
    }

    /// Returns `(category, mean)` pairs in category order.
    pub fn means(&self) -> &[(String, f64)] {
        &self.means
    }

    /// Returns the mean of `category`, if the category is known.
    pub fn mean(&self, category: &str) -> Option<f64> {
        self.means
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, value)| *value)
    }

    /// Returns the number of score rows that were averaged.
    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// Returns the number of categories.
    pub fn len(&self) -> usize {
        self.means.len()
    }

    /// Returns `true` when the aggregate holds no categories.
    pub fn is_empty(&self) -> bool {
        self.means.is_empty()
    }
}

/// The metadata dataset: a header row plus string records.
///
/// The name of the lot identifier column is part of the table because it
/// differs from the score dataset's column.
#[derive(Clone, Debug, PartialEq)]
pub struct MetadataTable {
    lot_column: String,
    lot_index: usize,
    headers: Vec<String>,
    records: Vec<Vec<String>>,
}

impl MetadataTable {
    /// Creates an empty table, failing when `lot_column` is not among `headers`.
    pub fn new<I, S>(lot_column: impl Into<String>, headers: I) -> Result<Self, SourceError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let lot_column = lot_column.into();
        let headers: Vec<String> = headers.into_iter().map(Into::into).collect();
        let lot_index = headers
            .iter()
            .position(|header| header == &lot_column)
            .ok_or_else(|| SourceError::MissingColumn {
                dataset: "metadata",
                column: lot_column.clone(),
            })?;

        Ok(Self {
            lot_column,
            lot_index,
            headers,
            records: Vec::new(),
        })
    }

    /// Appends a record, rejecting records whose width differs from the header.
    pub fn push_record<I, S>(&mut self, record: I) -> Result<(), SourceError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let record: Vec<String> = record.into_iter().map(Into::into).collect();
        if record.len() != self.headers.len() {
            return Err(SourceError::RowWidth {
                dataset: "metadata",
                expected: self.headers.len(),
                found: record.len(),
            });
        }
        self.records.push(record);
        Ok(())
    }

    /// Appends a record and returns the updated table.
    pub fn with_record<I, S>(mut self, record: I) -> Result<Self, SourceError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push_record(record)?;
        Ok(self)
    }

    /// Returns the name of the lot identifier column.
    pub fn lot_column(&self) -> &str {
        &self.lot_column
    }

    /// Returns the header row.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Returns the records in source order.
    pub fn records(&self) -> &[Vec<String>] {
        &self.records
    }

    /// Returns the lot identifier of `record`.
    pub(crate) fn lot_of<'a>(&self, record: &'a [String]) -> &'a str {
        &record[self.lot_index]
    }
}

/// The descriptive record of one lot, fields kept in source column order.
#[derive(Clone, Debug, PartialEq)]
pub struct LotMetadataRecord {
    lot_id: String,
    fields: Vec<(String, String)>,
}

impl LotMetadataRecord {
    /// Creates a record from `(column, value)` pairs.
    pub fn new<I, K, V>(lot_id: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            lot_id: lot_id.into(),
            fields: fields
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }

    /// Returns the lot identifier.
    pub fn lot_id(&self) -> &str {
        &self.lot_id
    }

    /// Returns all `(column, value)` pairs.
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// Returns the value stored under `column`.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_table_rejects_rows_of_wrong_width() {
        let mut table = ScoreTable::with_default_categories();
        let err = table
            .push_row(ScoreRow::complete("Lote - 1", &[8.0, 7.5]))
            .unwrap_err();

        assert!(matches!(
            err,
            SourceError::RowWidth {
                dataset: "scores",
                expected: 10,
                found: 2
            }
        ));
        assert!(table.rows().is_empty());
    }

    #[test]
    fn rows_for_matches_case_sensitively() {
        let table = ScoreTable::new(["Body"])
            .with_row(ScoreRow::complete("Lote - 1", &[8.0]))
            .and_then(|t| t.with_row(ScoreRow::complete("lote - 1", &[7.0])))
            .unwrap();

        assert_eq!(table.rows_for("Lote - 1").count(), 1);
        assert_eq!(table.rows_for("LOTE - 1").count(), 0);
    }

    #[test]
    fn metadata_table_requires_lot_column() {
        let err = MetadataTable::new("lote_prova", ["Lote", "Fazenda"]).unwrap_err();
        assert!(matches!(err, SourceError::MissingColumn { ref column, .. } if column == "lote_prova"));
    }

    #[test]
    fn lookup_converts_to_option() {
        let lookup: Lookup<u8> = Lookup::NotFound;
        assert_eq!(lookup.found(), None);
        assert_eq!(Lookup::Found(2).found(), Some(2));
    }
}
