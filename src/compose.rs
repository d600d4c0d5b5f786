//! Page composition: radar chart on top, metadata table underneath.

use genpdf::error::{Error, ErrorKind};
use genpdf::style::Style;
use genpdf::{render, Element, Position, RenderResult};

use crate::config::ReportConfig;
use crate::elements::{mm_from_f64, mm_to_f64, MetadataGrid, RadarChart};
use crate::radar::{RadarPolygon, RadialScale};
use crate::table::Grid;

/// Vertical space between the chart and the table.
pub const SECTION_GAP_MM: f64 = 6.0;

/// A horizontal band of the page content area.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Region {
    /// Offset from the top of the content area in millimetres.
    pub top: f64,
    /// Height in millimetres.
    pub height: f64,
}

/// Split of the content area into the chart and table regions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageLayout {
    /// Upper region holding the radar chart.
    pub chart: Region,
    /// Lower region holding the metadata table.
    pub table: Region,
}

impl PageLayout {
    /// Splits a content area of `height` millimetres.
    ///
    /// The chart receives `chart_fraction` of the height; the table the rest
    /// minus [`SECTION_GAP_MM`].
    pub fn split(height: f64, chart_fraction: f64) -> Self {
        let chart_height = height * chart_fraction;
        let table_top = chart_height + SECTION_GAP_MM;

        Self {
            chart: Region {
                top: 0.0,
                height: chart_height,
            },
            table: Region {
                top: table_top,
                height: (height - table_top).max(0.0),
            },
        }
    }
}

/// One report page, ready to be pushed into a document.
pub struct Page {
    chart: RadarChart,
    table: MetadataGrid,
    chart_fraction: f64,
}

impl Page {
    /// Returns the chart element.
    pub fn chart(&self) -> &RadarChart {
        &self.chart
    }

    /// Returns the table element.
    pub fn table(&self) -> &MetadataGrid {
        &self.table
    }

    /// Returns the share of the content height given to the chart.
    pub fn chart_fraction(&self) -> f64 {
        self.chart_fraction
    }
}

/// Arranges `polygon` and `grid` on a page using the chart and page settings of `config`.
pub fn compose(polygon: RadarPolygon, grid: Grid, config: &ReportConfig) -> Page {
    let title = format!("{} – {}", config.chart.title_prefix, polygon.lot_id());
    let chart = RadarChart::new(polygon, title)
        .with_scale(RadialScale::from(&config.chart), config.chart.rings)
        .with_font_sizes(config.chart.title_font_size, config.chart.label_font_size);
    let table = MetadataGrid::new(grid).with_font_size(config.page.table_font_size);

    Page {
        chart,
        table,
        chart_fraction: config.page.chart_fraction,
    }
}

impl Element for Page {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let size = area.size();
        let layout = PageLayout::split(mm_to_f64(size.height), self.chart_fraction);

        let mut chart_area = area.clone();
        chart_area.set_height(mm_from_f64(layout.chart.height));
        self.chart.render(context, chart_area, style)?;

        let mut table_area = area.clone();
        table_area.add_offset(Position::new(0, mm_from_f64(layout.table.top)));
        table_area.set_height(mm_from_f64(layout.table.height));
        let table_result = self.table.render(context, table_area, style)?;
        if table_result.has_more {
            return Err(Error::new(
                "Metadata table does not fit into the space below the chart",
                ErrorKind::PageSizeExceeded,
            ));
        }

        let mut result = RenderResult::default();
        result.size = size;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::config::FieldSpec;
    use crate::model::{LotMetadataRecord, ScoreRow, ScoreTable};

    #[test]
    fn chart_takes_two_thirds_of_a4_content() {
        // A4 height minus two 15 mm margins.
        let layout = PageLayout::split(267.0, 2.0 / 3.0);

        assert!((layout.chart.height - 178.0).abs() < 1e-9);
        assert!((layout.table.top - 184.0).abs() < 1e-9);
        assert!((layout.table.height - 83.0).abs() < 1e-9);
    }

    #[test]
    fn table_region_never_negative() {
        let layout = PageLayout::split(10.0, 0.9);
        assert_eq!(layout.table.height, 0.0);
    }

    #[test]
    fn compose_titles_chart_with_lot() {
        let table = ScoreTable::new(["Body", "Balance", "Overall"])
            .with_row(ScoreRow::complete("Lote - 7", &[8.0, 7.5, 8.0]))
            .unwrap();
        let aggregate = aggregate(&table, "Lote - 7").unwrap().found().unwrap();
        let record = LotMetadataRecord::new("Lote - 7", [("fazenda", "Santa Rita")]);
        let grid = crate::table::build(&record, &[FieldSpec::new("fazenda", "Farm")]).unwrap();

        let page = compose(RadarPolygon::build(&aggregate), grid, &ReportConfig::default());

        assert_eq!(page.chart().title(), "Radar Sensory – Lote - 7");
        assert_eq!(page.chart().polygon().vertices().len(), 4);
        assert_eq!(page.table().grid().header(), ["Farm"]);
        assert_eq!(page.chart_fraction(), 2.0 / 3.0);
    }
}
