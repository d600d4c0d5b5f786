//! The report pipeline from raw datasets to PDF bytes.
//!
//! The pipeline is a pure function of the two datasets, the lot identifier
//! and the configuration.  Lots are looked up in the score dataset first, so
//! a lot unknown to both datasets is reported as missing from the scores.

use log::{debug, info};

use crate::aggregate;
use crate::builder::DocumentAssembler;
use crate::compose::{self, Page};
use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::metadata;
use crate::model::{LotAggregate, Lookup, MetadataTable, ScoreTable};
use crate::radar::RadarPolygon;
use crate::table;

/// MIME type of the generated documents.
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// A rendered report ready to be handed to the transport layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedReport {
    lot_id: String,
    bytes: Vec<u8>,
}

impl RenderedReport {
    /// Returns the lot the report was rendered for.
    pub fn lot_id(&self) -> &str {
        &self.lot_id
    }

    /// Returns the suggested file name, `<lot>_radar.pdf`.
    pub fn file_name(&self) -> String {
        report_file_name(&self.lot_id)
    }

    /// Returns the PDF bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the report and returns the PDF bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Suggested file name of the report of `lot_id`.
pub fn report_file_name(lot_id: &str) -> String {
    format!("{lot_id}_radar.pdf")
}

/// Aggregates the scores of `lot_id`.
///
/// Fails with [`ReportError::LotNotInScores`] when no score row carries the
/// lot.  Callers can run this before the metadata dataset is even loaded.
pub fn aggregate_lot(scores: &ScoreTable, lot_id: &str) -> Result<LotAggregate, ReportError> {
    match aggregate::aggregate(scores, lot_id)? {
        Lookup::Found(aggregate) => Ok(aggregate),
        Lookup::NotFound => Err(ReportError::LotNotInScores {
            lot_id: lot_id.to_owned(),
        }),
    }
}

/// Resolves the metadata of an aggregated lot and lays out its page.
///
/// Fails with [`ReportError::LotNotInMetadata`] when the metadata dataset
/// has no row for the lot.
pub fn compose_page(
    aggregate: &LotAggregate,
    metadata: &MetadataTable,
    config: &ReportConfig,
) -> Result<Page, ReportError> {
    let lot_id = aggregate.lot_id();
    let record = match metadata::resolve(metadata, lot_id) {
        Lookup::Found(record) => record,
        Lookup::NotFound => {
            return Err(ReportError::LotNotInMetadata {
                lot_id: lot_id.to_owned(),
            })
        }
    };

    let polygon = RadarPolygon::build(aggregate);
    let grid = table::build(&record, &config.metadata_fields)?;
    debug!(
        "Composing report for lot '{}' from {} samples",
        lot_id,
        aggregate.sample_count()
    );
    Ok(compose::compose(polygon, grid, config))
}

/// Runs every step up to page composition.
///
/// Fails with [`ReportError::LotNotInScores`] or
/// [`ReportError::LotNotInMetadata`] when the lot is unknown, without
/// touching any rendering resource.
pub fn compose_report(
    scores: &ScoreTable,
    metadata: &MetadataTable,
    lot_id: &str,
    config: &ReportConfig,
) -> Result<Page, ReportError> {
    let aggregate = aggregate_lot(scores, lot_id)?;
    compose_page(&aggregate, metadata, config)
}

/// Serializes the composed page of `lot_id` into a single-page document.
pub fn render_page(
    lot_id: &str,
    page: Page,
    config: &ReportConfig,
) -> Result<RenderedReport, ReportError> {
    let bytes = DocumentAssembler::from_config(config)
        .with_title(format!("{} – {}", config.chart.title_prefix, lot_id))
        .with_footer(format!("{lot_id} · page {{page}}"))
        .assemble(vec![page])?;

    info!("Rendered report for lot '{}' ({} bytes)", lot_id, bytes.len());
    Ok(RenderedReport {
        lot_id: lot_id.to_owned(),
        bytes,
    })
}

/// Runs the complete pipeline and returns the rendered document.
pub fn generate_report(
    scores: &ScoreTable,
    metadata: &MetadataTable,
    lot_id: &str,
    config: &ReportConfig,
) -> Result<RenderedReport, ReportError> {
    let page = compose_report(scores, metadata, lot_id, config)?;
    render_page(lot_id, page, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::ScoreRow;

    #[test]
    fn unknown_lot_fails_before_metadata_lookup() {
        let scores = ScoreTable::new(["Body"])
            .with_row(ScoreRow::complete("Lote - 1", &[8.0]))
            .unwrap();

        let err = aggregate_lot(&scores, "Lote - 9").unwrap_err();
        assert!(matches!(err, ReportError::LotNotInScores { ref lot_id } if lot_id == "Lote - 9"));
        assert_eq!(aggregate_lot(&scores, "Lote - 1").unwrap().mean("Body"), Some(8.0));
    }

    #[test]
    fn file_name_appends_suffix() {
        assert_eq!(report_file_name("Lote - 1"), "Lote - 1_radar.pdf");
    }
}
