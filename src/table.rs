//! Grid layout of a lot's metadata record.

use crate::config::FieldSpec;
use crate::error::ReportError;
use crate::model::LotMetadataRecord;

/// A two-row table: field labels on top, the lot's values underneath.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    header: Vec<String>,
    values: Vec<String>,
}

impl Grid {
    /// Returns the header cells.
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Returns the value cells, aligned with [`Grid::header`].
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Returns the number of columns.
    pub fn column_count(&self) -> usize {
        self.header.len()
    }

    /// Iterates over both rows, header first.
    pub fn rows(&self) -> impl Iterator<Item = &[String]> {
        [self.header.as_slice(), self.values.as_slice()].into_iter()
    }
}

/// Lays `record` out in the column order given by `fields`.
///
/// With no configured fields every column of the record is shown in source
/// order, headed by its column name.  A configured field that the record
/// does not carry fails with [`ReportError::MissingField`].
pub fn build(record: &LotMetadataRecord, fields: &[FieldSpec]) -> Result<Grid, ReportError> {
    if fields.is_empty() {
        let (header, values) = record
            .fields()
            .iter()
            .map(|(column, value)| (column.clone(), value.clone()))
            .unzip();
        return Ok(Grid { header, values });
    }

    let mut header = Vec::with_capacity(fields.len());
    let mut values = Vec::with_capacity(fields.len());

    for field in fields {
        let value = record
            .get(&field.column)
            .ok_or_else(|| ReportError::MissingField {
                lot_id: record.lot_id().to_owned(),
                column: field.column.clone(),
            })?;
        header.push(field.label().to_owned());
        values.push(value.to_owned());
    }

    Ok(Grid { header, values })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> LotMetadataRecord {
        LotMetadataRecord::new(
            "Lote - 1",
            [
                ("lote_prova", "Lote - 1"),
                ("variedade", "Catuaí"),
                ("fazenda", "Santa Rita"),
            ],
        )
    }

    #[test]
    fn follows_configured_order() {
        let fields = [
            FieldSpec::new("fazenda", "Farm"),
            FieldSpec::column("variedade"),
        ];
        let grid = build(&record(), &fields).unwrap();

        assert_eq!(grid.header(), ["Farm", "variedade"]);
        assert_eq!(grid.values(), ["Santa Rita", "Catuaí"]);
        assert_eq!(grid.column_count(), 2);
        assert_eq!(grid.rows().count(), 2);
    }

    #[test]
    fn no_fields_shows_whole_record_in_source_order() {
        let grid = build(&record(), &[]).unwrap();

        assert_eq!(grid.header(), ["lote_prova", "variedade", "fazenda"]);
        assert_eq!(grid.values(), ["Lote - 1", "Catuaí", "Santa Rita"]);
    }

    #[test]
    fn missing_field_is_an_error() {
        let fields = [FieldSpec::new("peso", "Weight")];
        let err = build(&record(), &fields).unwrap_err();

        assert!(matches!(err, ReportError::MissingField { ref column, .. } if column == "peso"));
        assert!(!err.is_not_found());
    }
}
