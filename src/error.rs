//! Error types shared by the report pipeline.

use std::fmt;
use std::io;

use crate::config::ConfigError;

/// Errors raised while loading or shaping one of the source datasets.
#[derive(Debug)]
pub enum SourceError {
    /// Reading the underlying file or stream failed.
    Io(io::Error),
    /// The CSV reader rejected the input.
    Csv(csv::Error),
    /// A column required by the configuration is missing from the header row.
    MissingColumn {
        /// Dataset the column was expected in (`"scores"` or `"metadata"`).
        dataset: &'static str,
        /// Name of the missing column.
        column: String,
    },
    /// A row does not have as many cells as the table has columns.
    RowWidth {
        /// Dataset the row belongs to.
        dataset: &'static str,
        /// Number of cells the table expects.
        expected: usize,
        /// Number of cells the row carries.
        found: usize,
    },
}

impl From<io::Error> for SourceError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for SourceError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "Failed to read dataset: {err}"),
            Self::Csv(err) => write!(f, "Failed to parse CSV dataset: {err}"),
            Self::MissingColumn { dataset, column } => {
                write!(f, "Column '{column}' is missing from the {dataset} dataset")
            }
            Self::RowWidth {
                dataset,
                expected,
                found,
            } => write!(
                f,
                "Row in the {dataset} dataset has {found} cells, expected {expected}"
            ),
        }
    }
}

impl std::error::Error for SourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Csv(err) => Some(err),
            Self::MissingColumn { .. } | Self::RowWidth { .. } => None,
        }
    }
}

/// Errors that can end a report request.
///
/// [`ReportError::LotNotInScores`] and [`ReportError::LotNotInMetadata`] are
/// the expected outcomes of asking for an unknown lot; every other variant is
/// fatal for the request.
#[derive(Debug)]
pub enum ReportError {
    /// No score row carries the requested lot identifier.
    LotNotInScores {
        /// The requested lot.
        lot_id: String,
    },
    /// The lot has scores but no row in the metadata dataset.
    LotNotInMetadata {
        /// The requested lot.
        lot_id: String,
    },
    /// A configured metadata field is absent from the lot's record.
    MissingField {
        /// The lot whose record was being laid out.
        lot_id: String,
        /// The configured column that could not be found.
        column: String,
    },
    /// Every score row of the lot lacks a value for a category.
    IncompleteCategory {
        /// The aggregated lot.
        lot_id: String,
        /// The category without any numeric value.
        category: String,
    },
    /// The document assembler was handed no pages.
    EmptyDocument,
    /// A dataset could not be loaded.
    Source(SourceError),
    /// No usable font family was found.
    FontLoad(genpdf::error::Error),
    /// Laying out or serializing the document failed.
    Render(genpdf::error::Error),
    /// The configuration is unusable.
    Config(ConfigError),
}

impl ReportError {
    /// Returns `true` for the two lot-not-found outcomes.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::LotNotInScores { .. } | Self::LotNotInMetadata { .. }
        )
    }
}

impl From<SourceError> for ReportError {
    fn from(err: SourceError) -> Self {
        Self::Source(err)
    }
}

impl From<ConfigError> for ReportError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LotNotInScores { lot_id } => {
                write!(f, "Lot '{lot_id}' not found in the score dataset")
            }
            Self::LotNotInMetadata { lot_id } => {
                write!(f, "Lot '{lot_id}' not found in the metadata dataset")
            }
            Self::MissingField { lot_id, column } => write!(
                f,
                "Metadata field '{column}' is missing from the record of lot '{lot_id}'"
            ),
            Self::IncompleteCategory { lot_id, category } => write!(
                f,
                "Lot '{lot_id}' has no numeric value for category '{category}'"
            ),
            Self::EmptyDocument => write!(f, "Cannot assemble a document without pages"),
            Self::Source(err) => write!(f, "{err}"),
            Self::FontLoad(err) => write!(f, "Failed to load fonts: {err}"),
            Self::Render(err) => write!(f, "Failed to render report: {err}"),
            Self::Config(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ReportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Source(err) => Some(err),
            Self::FontLoad(err) | Self::Render(err) => Some(err),
            Self::Config(err) => Some(err),
            Self::LotNotInScores { .. }
            | Self::LotNotInMetadata { .. }
            | Self::MissingField { .. }
            | Self::IncompleteCategory { .. }
            | Self::EmptyDocument => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_messages_name_the_dataset() {
        let scores = ReportError::LotNotInScores {
            lot_id: "Lote - 99".into(),
        };
        let metadata = ReportError::LotNotInMetadata {
            lot_id: "Lote - 99".into(),
        };

        assert!(scores.is_not_found());
        assert!(metadata.is_not_found());
        assert!(scores.to_string().contains("score dataset"));
        assert!(metadata.to_string().contains("metadata dataset"));
    }

    #[test]
    fn fatal_errors_are_not_not_found() {
        assert!(!ReportError::EmptyDocument.is_not_found());
        let err = ReportError::from(SourceError::MissingColumn {
            dataset: "scores",
            column: "Lote".into(),
        });
        assert!(!err.is_not_found());
        assert!(std::error::Error::source(&err).is_some());
    }
}
