//! Lookup of a lot's descriptive record in the metadata dataset.

use log::debug;

use crate::model::{LotMetadataRecord, Lookup, MetadataTable};

/// Returns the metadata record of `lot_id`.
///
/// The lot is matched exactly against the table's own lot column.  When
/// several rows carry the same lot, the first one in source order is used and
/// the others are ignored.
pub fn resolve(table: &MetadataTable, lot_id: &str) -> Lookup<LotMetadataRecord> {
    let mut matches = table
        .records()
        .iter()
        .filter(|record| table.lot_of(record) == lot_id);

    let Some(record) = matches.next() else {
        debug!("No metadata row for lot '{}'", lot_id);
        return Lookup::NotFound;
    };

    let duplicates = matches.count();
    if duplicates > 0 {
        debug!(
            "Lot '{}' has {} additional metadata rows; using the first",
            lot_id, duplicates
        );
    }

    Lookup::Found(LotMetadataRecord::new(
        lot_id,
        table.headers().iter().zip(record.iter()).map(|(h, v)| (h.clone(), v.clone())),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> MetadataTable {
        MetadataTable::new("lote_prova", ["lote_prova", "fazenda", "variedade"])
            .and_then(|t| t.with_record(["Lote - 1", "Santa Rita", "Catuaí"]))
            .and_then(|t| t.with_record(["Lote - 2", "Boa Vista", "Bourbon"]))
            .and_then(|t| t.with_record(["Lote - 1", "Duplicate", "Geisha"]))
            .unwrap()
    }

    #[test]
    fn resolves_first_matching_row() {
        let record = resolve(&table(), "Lote - 1").found().unwrap();
        assert_eq!(record.lot_id(), "Lote - 1");
        assert_eq!(record.get("fazenda"), Some("Santa Rita"));
        assert_eq!(record.get("variedade"), Some("Catuaí"));
        assert_eq!(record.fields().len(), 3);
    }

    #[test]
    fn unknown_lot_is_not_found() {
        assert_eq!(resolve(&table(), "Lote - 99"), Lookup::NotFound);
        assert_eq!(resolve(&table(), "LOTE - 2"), Lookup::NotFound);
    }
}
