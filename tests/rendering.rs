mod common;

use cupping_radar::builder::DocumentAssembler;
use cupping_radar::config::ReportConfig;
use cupping_radar::fonts;
use cupping_radar::model::{MetadataTable, ScoreRow, ScoreTable};
use cupping_radar::pipeline::{compose_report, generate_report};
use cupping_radar::service::{ReportService, ResponseStatus};
use cupping_radar::ReportError;
use genpdf::error::ErrorKind;
use genpdf::fonts::FontCache;
use genpdf::style::Style;
use sha2::{Digest, Sha256};

use common::{load_fixtures, metadata_source, score_source};

const SKIP_MESSAGE: &str =
    "fonts missing. Set CUPPING_RADAR_FONTS_DIR or install Liberation Sans or DejaVu Sans.";

fn render_lot(lot_id: &str) -> Option<Vec<u8>> {
    if !fonts::fonts_available(None) {
        return None;
    }

    let config = ReportConfig::default();
    let (scores, metadata) = load_fixtures(&config);
    match generate_report(&scores, &metadata, lot_id, &config) {
        Ok(report) => Some(report.into_bytes()),
        Err(ReportError::FontLoad(err)) => {
            eprintln!("Skipping rendering assertions: {}", err);
            None
        }
        Err(other) => panic!("render report for {lot_id}: {other}"),
    }
}

fn scrub_pdf(bytes: &[u8]) -> Vec<u8> {
    fn scrub_segment(data: &mut [u8], tag: &[u8], terminator: u8) {
        let mut index = 0;
        while index + tag.len() < data.len() {
            if data[index..].starts_with(tag) {
                let mut cursor = index + tag.len();
                while cursor < data.len() && data[cursor] != terminator {
                    if terminator == b')'
                        || !matches!(data[cursor], b'<' | b'>' | b' ' | b'\n' | b'\r' | b'\t')
                    {
                        data[cursor] = b'0';
                    }
                    cursor += 1;
                }
                index = cursor;
            } else {
                index += 1;
            }
        }
    }

    fn scrub_xml(data: &mut [u8], start: &[u8], end: &[u8]) {
        let mut offset = 0;
        while let Some(start_pos) = data[offset..]
            .windows(start.len())
            .position(|window| window == start)
        {
            let start_index = offset + start_pos + start.len();
            let Some(end_pos) = data[start_index..]
                .windows(end.len())
                .position(|window| window == end)
            else {
                break;
            };
            for byte in &mut data[start_index..start_index + end_pos] {
                if !matches!(*byte, b'<' | b'>' | b'/' | b' ' | b'\n' | b'\r' | b'\t') {
                    *byte = b'0';
                }
            }
            offset = start_index + end_pos + end.len();
        }
    }

    let mut normalized = bytes.to_vec();
    for tag in [&b"/CreationDate("[..], b"/ModDate(", b"/Producer("] {
        scrub_segment(&mut normalized, tag, b')');
    }
    scrub_segment(&mut normalized, b"/ID[", b']');
    for (start, end) in [
        (&b"<xmp:CreateDate>"[..], &b"</xmp:CreateDate>"[..]),
        (b"<xmp:ModifyDate>", b"</xmp:ModifyDate>"),
        (b"<xmp:MetadataDate>", b"</xmp:MetadataDate>"),
        (b"<xmpMM:DocumentID>", b"</xmpMM:DocumentID>"),
        (b"<xmpMM:InstanceID>", b"</xmpMM:InstanceID>"),
        (b"<xmpMM:VersionID>", b"</xmpMM:VersionID>"),
    ] {
        scrub_xml(&mut normalized, start, end);
    }
    normalized
}

fn normalized_hash(bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(scrub_pdf(bytes)).into()
}

#[test]
fn report_starts_with_pdf_header() {
    let Some(bytes) = render_lot("Lote - 1") else {
        eprintln!("Skipping report_starts_with_pdf_header: {SKIP_MESSAGE}");
        return;
    };
    assert!(bytes.starts_with(b"%PDF-"), "report must start with the PDF signature");
}

#[test]
fn rendering_is_deterministic() {
    let (Some(bytes_a), Some(bytes_b)) = (render_lot("Lote - 2"), render_lot("Lote - 2")) else {
        eprintln!("Skipping rendering_is_deterministic: {SKIP_MESSAGE}");
        return;
    };

    assert_eq!(bytes_a.len(), bytes_b.len(), "PDF sizes should match");
    assert_eq!(
        normalized_hash(&bytes_a),
        normalized_hash(&bytes_b),
        "PDF renders must be deterministic after metadata normalization"
    );
}

#[test]
fn service_payload_decodes_to_the_rendered_pdf() {
    if !fonts::fonts_available(None) {
        eprintln!("Skipping service_payload_decodes_to_the_rendered_pdf: {SKIP_MESSAGE}");
        return;
    }

    let config = ReportConfig::default();
    let service =
        ReportService::new(score_source(&config), metadata_source(&config), config).unwrap();
    let response = service.handle("Lote - 1");
    assert_eq!(response.status, ResponseStatus::Ok);

    let payload = response.payload().expect("successful response carries a payload");
    assert_eq!(payload.file_name, "Lote - 1_radar.pdf");
    assert_eq!(payload.mimetype, "application/pdf");
    assert!(payload.decode_document().unwrap().starts_with(b"%PDF-"));
}

#[test]
fn assembles_several_pages_into_one_document() {
    if !fonts::fonts_available(None) {
        eprintln!("Skipping assembles_several_pages_into_one_document: {SKIP_MESSAGE}");
        return;
    }

    let config = ReportConfig::default();
    let (scores, metadata) = load_fixtures(&config);
    let pages = ["Lote - 1", "Lote - 2"]
        .into_iter()
        .map(|lot| compose_report(&scores, &metadata, lot, &config).unwrap())
        .collect::<Vec<_>>();

    let single = DocumentAssembler::from_config(&config)
        .assemble(vec![compose_report(&scores, &metadata, "Lote - 1", &config).unwrap()])
        .unwrap();
    let double = DocumentAssembler::from_config(&config).assemble(pages).unwrap();

    assert!(double.starts_with(b"%PDF-"));
    assert!(double.len() > single.len());
}

fn text_width(cache: &FontCache, text: &str, font_size: u8, bold: bool) -> f64 {
    let style = Style::new().with_font_size(font_size);
    let style = if bold { style.bold() } else { style };
    let width: printpdf::Mm = style.str_width(cache, text).into();
    width.0
}

fn single_lot_tables(value: &str) -> (ScoreTable, MetadataTable) {
    let scores = ScoreTable::with_default_categories()
        .with_row(ScoreRow::complete("Lote - 1", &[8.0; 10]))
        .unwrap();
    let metadata = MetadataTable::new("lote_prova", ["lote_prova", "observacao"])
        .unwrap()
        .with_record(["Lote - 1", value])
        .unwrap();
    (scores, metadata)
}

#[test]
fn every_metadata_word_fits_its_column() {
    let Ok(family) = fonts::font_family(None) else {
        eprintln!("Skipping every_metadata_word_fits_its_column: {SKIP_MESSAGE}");
        return;
    };
    let cache = FontCache::new(family);

    let config = ReportConfig::default();
    let (scores, metadata) = load_fixtures(&config);
    let content_width = config.page.width_mm - 2.0 * config.page.margin_mm;

    for lot in ["Lote - 1", "Lote - 2"] {
        let page = compose_report(&scores, &metadata, lot, &config).unwrap();
        let table = page.table();
        let grid = table.grid();
        assert_eq!(grid.column_count(), 9, "all metadata columns are shown");

        let layout = table
            .layout(content_width, |text, size, bold| text_width(&cache, text, size, bold))
            .unwrap();
        for (column, (header, value)) in grid.header().iter().zip(grid.values()).enumerate() {
            let cells = [(header, true), (value, false)];
            for (text, bold) in cells {
                for word in text.split_whitespace() {
                    let needed = text_width(&cache, word, layout.font_size, bold) + 2.0;
                    assert!(
                        needed <= layout.widths[column],
                        "'{word}' of {lot} needs {needed:.1} mm, column {column} is {:.1} mm",
                        layout.widths[column]
                    );
                }
            }
        }
    }
}

#[test]
fn overlong_metadata_word_fails_instead_of_dropping_text() {
    if !fonts::fonts_available(None) {
        eprintln!("Skipping overlong_metadata_word_fails_instead_of_dropping_text: {SKIP_MESSAGE}");
        return;
    }

    let config = ReportConfig::default();
    let (scores, metadata) = single_lot_tables(&"fermentacao".repeat(40));
    match generate_report(&scores, &metadata, "Lote - 1", &config) {
        Err(ReportError::Render(err)) => {
            assert!(matches!(err.kind(), ErrorKind::PageSizeExceeded))
        }
        other => panic!("expected a render error, got {other:?}"),
    }
}

#[test]
fn table_without_room_below_chart_is_a_render_error() {
    if !fonts::fonts_available(None) {
        eprintln!("Skipping table_without_room_below_chart_is_a_render_error: {SKIP_MESSAGE}");
        return;
    }

    let mut config = ReportConfig::default();
    config.page.chart_fraction = 0.99;
    let (scores, metadata) = single_lot_tables("Natural");

    assert!(matches!(
        generate_report(&scores, &metadata, "Lote - 1", &config),
        Err(ReportError::Render(_))
    ));
}
