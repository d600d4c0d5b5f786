//! Custom `genpdf` elements drawing the radar chart and the metadata table.
//!
//! `genpdf` ships text and table primitives but no vector charts, so the
//! radar chart is drawn from line segments and positioned strings on the
//! [`render::Area`] it is given.  Lines use the fixed default stroke width of
//! `genpdf`; only their colour is configurable.

use genpdf::elements::{FrameCellDecorator, Paragraph, TableLayout};
use genpdf::error::{Error, ErrorKind};
use genpdf::style::{Color, Style};
use genpdf::{render, Alignment, Element, Margins, Mm, Position, RenderResult};
use log::debug;

use crate::radar::{fill_outlines, ring_outline, Point, RadarPolygon, RadialScale};
use crate::table::Grid;

const TITLE_GAP_MM: f64 = 6.0;
const LABEL_GAP_MM: f64 = 3.0;
const GRID_GREY: u8 = 190;
const SERIES_COLOR: Color = Color::Rgb(31, 119, 180);
// Series colour at a quarter opacity over white.
const FILL_COLOR: Color = Color::Rgb(206, 221, 236);
const FILL_STEP_MM: f64 = 0.3;

const CELL_PADDING_MM: f64 = 1.0;
// Room for the cell frame and wrapping rounding.
const CELL_SLACK_MM: f64 = 1.0;
/// Smallest font size the metadata table is shrunk to.
pub const MIN_TABLE_FONT_SIZE: u8 = 5;

pub(crate) fn mm_from_f64(value: f64) -> Mm {
    Mm::from(printpdf::Mm(value))
}

pub(crate) fn mm_to_f64(value: Mm) -> f64 {
    let mm: printpdf::Mm = value.into();
    mm.0
}

fn position(point: Point) -> Position {
    Position::new(mm_from_f64(point.x), mm_from_f64(point.y))
}

fn positions(points: Vec<Point>) -> Vec<Position> {
    points.into_iter().map(position).collect()
}

fn line_style(color: Color) -> Style {
    Style::new().with_color(color)
}

/// Placement of the chart circle inside the area left below the title.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RadarFrame {
    /// Center of the chart relative to the chart area.
    pub center: Point,
    /// Radius of the outer ring in millimetres.
    pub radius: f64,
}

impl RadarFrame {
    /// Fits the largest circle into a `width` × `height` area.
    ///
    /// `top` is reserved for the title, `label_width` and `label_height` for
    /// the axis labels placed outside the outer ring.
    pub fn fit(width: f64, height: f64, top: f64, label_width: f64, label_height: f64) -> Self {
        let usable_width = (width - 2.0 * (label_width + LABEL_GAP_MM)).max(0.0);
        let usable_height = (height - top - 2.0 * (label_height + LABEL_GAP_MM)).max(0.0);
        let radius = usable_width.min(usable_height) / 2.0;

        Self {
            center: Point::new(width / 2.0, top + (height - top) / 2.0),
            radius,
        }
    }
}

/// Returns the top-left corner of an axis label anchored at `anchor`.
///
/// Labels on the right half start at the anchor, labels on the left half end
/// at it, and labels close to the vertical axis are centered on it.
pub fn label_origin(anchor: Point, angle: f64, width: f64, height: f64) -> Point {
    const AXIS_TOLERANCE: f64 = 0.1;
    let (sin, cos) = angle.sin_cos();

    let x = if cos > AXIS_TOLERANCE {
        anchor.x
    } else if cos < -AXIS_TOLERANCE {
        anchor.x - width
    } else {
        anchor.x - width / 2.0
    };
    let y = if sin > AXIS_TOLERANCE {
        anchor.y - height
    } else if sin < -AXIS_TOLERANCE {
        anchor.y
    } else {
        anchor.y - height / 2.0
    };

    Point::new(x, y)
}

/// Radar chart of one lot with title, grid rings, spokes and axis labels.
pub struct RadarChart {
    polygon: RadarPolygon,
    scale: RadialScale,
    rings: usize,
    title: String,
    title_font_size: u8,
    label_font_size: u8,
}

impl RadarChart {
    /// Creates a chart for `polygon` titled `title`.
    pub fn new(polygon: RadarPolygon, title: impl Into<String>) -> Self {
        Self {
            polygon,
            scale: RadialScale::new(0.0, 10.0),
            rings: 5,
            title: title.into(),
            title_font_size: 16,
            label_font_size: 9,
        }
    }

    /// Sets the radial scale and the number of grid rings.
    pub fn with_scale(mut self, scale: RadialScale, rings: usize) -> Self {
        self.scale = scale;
        self.rings = rings.max(1);
        self
    }

    /// Sets the title and label font sizes.
    pub fn with_font_sizes(mut self, title: u8, labels: u8) -> Self {
        self.title_font_size = title;
        self.label_font_size = labels;
        self
    }

    /// Returns the drawn polygon.
    pub fn polygon(&self) -> &RadarPolygon {
        &self.polygon
    }

    /// Returns the title.
    pub fn title(&self) -> &str {
        &self.title
    }

    fn print(
        area: &render::Area<'_>,
        context: &genpdf::Context,
        origin: Point,
        style: Style,
        text: &str,
    ) -> Result<(), Error> {
        if !area.print_str(&context.font_cache, position(origin), style, text)? {
            debug!("Chart text '{}' was clipped by the chart area", text);
        }
        Ok(())
    }
}

impl Element for RadarChart {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let size = area.size();
        let width = mm_to_f64(size.width);
        let height = mm_to_f64(size.height);
        let font_cache = &context.font_cache;

        let title_style = style.with_font_size(self.title_font_size).bold();
        let title_width = mm_to_f64(title_style.str_width(font_cache, &self.title));
        let title_height = mm_to_f64(title_style.line_height(font_cache));
        Self::print(
            &area,
            context,
            Point::new(((width - title_width) / 2.0).max(0.0), 0.0),
            title_style,
            &self.title,
        )?;

        let label_style = style.with_font_size(self.label_font_size);
        let label_height = mm_to_f64(label_style.line_height(font_cache));
        let label_width = self
            .polygon
            .labels()
            .iter()
            .map(|label| mm_to_f64(label_style.str_width(font_cache, label)))
            .fold(0.0_f64, f64::max);

        let frame = RadarFrame::fit(
            width,
            height,
            title_height + TITLE_GAP_MM,
            label_width,
            label_height,
        );
        let axes = self.polygon.axis_count();
        let grid_line = line_style(Color::Greyscale(GRID_GREY));
        let outline = self.polygon.project(frame.center, frame.radius, self.scale);

        let fill = line_style(FILL_COLOR);
        for pass in fill_outlines(frame.center, &outline, FILL_STEP_MM) {
            area.draw_line(positions(pass), fill);
        }

        let tick_style = style.with_font_size(self.label_font_size.saturating_sub(2).max(5));
        for value in self.scale.ring_values(self.rings) {
            let radius = frame.radius * self.scale.normalize(value);
            area.draw_line(positions(ring_outline(frame.center, radius, axes)), grid_line);
            let tick = format!("{value:.1}");
            Self::print(
                &area,
                context,
                Point::new(frame.center.x + 1.0, frame.center.y - radius),
                tick_style,
                &tick,
            )?;
        }

        for vertex in &self.polygon.vertices()[..axes] {
            let end = frame.center.polar_offset(vertex.angle, frame.radius);
            area.draw_line(vec![position(frame.center), position(end)], grid_line);
        }

        area.draw_line(positions(outline), line_style(SERIES_COLOR));

        for (vertex, label) in self.polygon.vertices().iter().zip(self.polygon.labels()) {
            let anchor = frame
                .center
                .polar_offset(vertex.angle, frame.radius + LABEL_GAP_MM);
            let label_width = mm_to_f64(label_style.str_width(font_cache, label));
            let origin = label_origin(anchor, vertex.angle, label_width, label_height);
            Self::print(&area, context, origin, label_style, label)?;
        }

        let mut result = RenderResult::default();
        result.size = size;
        Ok(result)
    }
}

/// Column weights and font size chosen for a [`Grid`].
#[derive(Clone, Debug, PartialEq)]
pub struct GridLayout {
    /// Font size of every cell in points.
    pub font_size: u8,
    /// Relative column weights handed to the table layout.
    pub weights: Vec<usize>,
    /// Resulting column widths in millimetres.
    pub widths: Vec<f64>,
}

/// Distributes `available` millimetres over columns needing `required` each.
///
/// Weights are expressed in tenths of a millimetre; the spare width is split
/// evenly so no column drops below its requirement after rounding.  Returns
/// `None` when the columns cannot fit side by side.
pub fn fit_columns(required: &[f64], available: f64) -> Option<Vec<usize>> {
    if required.is_empty() {
        return None;
    }
    let count = required.len() as f64;
    let total: f64 = required.iter().sum();
    if total + 0.1 * count > available {
        return None;
    }

    let spare = (available - total) / count;
    Some(
        required
            .iter()
            .map(|width| (((width + spare) * 10.0).floor() as usize).max(1))
            .collect(),
    )
}

fn widest_word<F>(text: &str, font_size: u8, bold: bool, measure: &F) -> f64
where
    F: Fn(&str, u8, bool) -> f64,
{
    text.split_whitespace()
        .map(|word| measure(word, font_size, bold))
        .fold(0.0_f64, f64::max)
}

/// Bordered two-row table rendering a [`Grid`].
///
/// `genpdf` silently drops a word that is wider than its cell, so columns are
/// sized after their widest word and the font is reduced until every word
/// fits.  A grid that does not fit even at [`MIN_TABLE_FONT_SIZE`] is a
/// `PageSizeExceeded` error.
pub struct MetadataGrid {
    grid: Grid,
    font_size: u8,
}

impl MetadataGrid {
    /// Creates the table element for `grid`.
    pub fn new(grid: Grid) -> Self {
        Self { grid, font_size: 8 }
    }

    /// Sets the preferred font size of all cells.
    pub fn with_font_size(mut self, font_size: u8) -> Self {
        self.font_size = font_size;
        self
    }

    /// Returns the laid out grid.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Chooses a font size and column widths for `available_width` millimetres.
    ///
    /// `measure(text, font_size, bold)` returns the width of `text` in
    /// millimetres; header cells are measured bold.
    pub fn layout<F>(&self, available_width: f64, measure: F) -> Result<GridLayout, Error>
    where
        F: Fn(&str, u8, bool) -> f64,
    {
        let largest = self.font_size.max(MIN_TABLE_FONT_SIZE);
        for font_size in (MIN_TABLE_FONT_SIZE..=largest).rev() {
            let required: Vec<f64> = self
                .grid
                .header()
                .iter()
                .zip(self.grid.values())
                .map(|(header, value)| {
                    let word = widest_word(header, font_size, true, &measure)
                        .max(widest_word(value, font_size, false, &measure));
                    word + 2.0 * CELL_PADDING_MM + CELL_SLACK_MM
                })
                .collect();

            if let Some(weights) = fit_columns(&required, available_width) {
                if font_size < self.font_size {
                    debug!(
                        "Metadata table font reduced from {} pt to {} pt",
                        self.font_size, font_size
                    );
                }
                let total: usize = weights.iter().sum();
                let widths = weights
                    .iter()
                    .map(|&weight| available_width * weight as f64 / total as f64)
                    .collect();
                return Ok(GridLayout {
                    font_size,
                    weights,
                    widths,
                });
            }
        }

        Err(Error::new(
            format!(
                "Metadata table needs more than {:.1} mm even at {} pt",
                available_width, MIN_TABLE_FONT_SIZE
            ),
            ErrorKind::PageSizeExceeded,
        ))
    }

    fn table(&self, layout: &GridLayout) -> Result<TableLayout, Error> {
        let mut table = TableLayout::new(layout.weights.clone());
        table.set_cell_decorator(FrameCellDecorator::new(true, true, false));

        let cell_style = Style::new().with_font_size(layout.font_size);
        let padding = mm_from_f64(CELL_PADDING_MM);
        for (index, cells) in self.grid.rows().enumerate() {
            let style = if index == 0 {
                cell_style.bold()
            } else {
                cell_style
            };
            let mut row = table.row();
            for cell in cells {
                row.push_element(
                    Paragraph::new(cell.as_str())
                        .aligned(Alignment::Center)
                        .styled(style)
                        .padded(Margins::trbl(padding, padding, padding, padding)),
                );
            }
            row.push()?;
        }

        Ok(table)
    }
}

impl Element for MetadataGrid {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let available = mm_to_f64(area.size().width);
        let layout = self.layout(available, |text, font_size, bold| {
            let cell_style = style.with_font_size(font_size);
            let cell_style = if bold { cell_style.bold() } else { cell_style };
            mm_to_f64(cell_style.str_width(&context.font_cache, text))
        })?;
        self.table(&layout)?.render(context, area, style)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn frame_is_centered_below_title() {
        let frame = RadarFrame::fit(180.0, 170.0, 20.0, 15.0, 4.0);
        assert_eq!(frame.center.x, 90.0);
        assert_eq!(frame.center.y, 95.0);
        // Height is the binding constraint: 150 - 2 * 7.
        assert_eq!(frame.radius, 68.0);
    }

    #[test]
    fn frame_never_has_negative_radius() {
        let frame = RadarFrame::fit(10.0, 10.0, 20.0, 30.0, 4.0);
        assert_eq!(frame.radius, 0.0);
    }

    #[test]
    fn labels_grow_away_from_the_chart() {
        let anchor = Point::new(100.0, 100.0);

        let right = label_origin(anchor, 0.0, 20.0, 4.0);
        assert_eq!(right, Point::new(100.0, 98.0));

        let left = label_origin(anchor, PI, 20.0, 4.0);
        assert_eq!(left, Point::new(80.0, 98.0));

        let top = label_origin(anchor, FRAC_PI_2, 20.0, 4.0);
        assert_eq!(top, Point::new(90.0, 96.0));

        let bottom = label_origin(anchor, 3.0 * FRAC_PI_2, 20.0, 4.0);
        assert_eq!(bottom, Point::new(90.0, 100.0));
    }

    fn grid(header: &[&str], values: &[&str]) -> MetadataGrid {
        let record = crate::model::LotMetadataRecord::new(
            "L",
            header.iter().copied().zip(values.iter().copied()),
        );
        MetadataGrid::new(crate::table::build(&record, &[]).unwrap())
    }

    // One millimetre per character, bold text a quarter wider.
    fn measure(text: &str, font_size: u8, bold: bool) -> f64 {
        let width = text.chars().count() as f64 * f64::from(font_size) / 8.0;
        if bold {
            width * 1.25
        } else {
            width
        }
    }

    #[test]
    fn columns_follow_their_widest_word() {
        let grid = grid(&["lot", "processo_fermentacao"], &["Lote - 1", "Natural anaeróbico"]);
        let layout = grid.layout(100.0, measure).unwrap();

        assert_eq!(layout.font_size, 8);
        assert!(layout.widths[1] > layout.widths[0]);
        assert!(layout.widths[0] >= 4.0 + 3.0);
        // "processo_fermentacao" in bold is the widest word of the second column.
        assert!(layout.widths[1] >= 20.0 * 1.25 + 3.0);
        assert!((layout.widths.iter().sum::<f64>() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn font_shrinks_until_words_fit() {
        let grid = grid(&["a", "b"], &["abcdefghijklmnopqrst", "abcdefghijklmnopqrst"]);
        // 20 characters need 23 mm per column at 8 pt but only 18 mm at 6 pt.
        let layout = grid.layout(40.0, measure).unwrap();

        assert_eq!(layout.font_size, 6);
        assert!(layout.widths.iter().all(|&width| width >= 18.0));
    }

    #[test]
    fn overlong_word_is_a_page_size_error() {
        let long = "x".repeat(400);
        let grid = grid(&["nota"], &[long.as_str()]);
        let err = grid.layout(180.0, measure).unwrap_err();

        assert!(matches!(err.kind(), ErrorKind::PageSizeExceeded));
    }

    #[test]
    fn fit_columns_rejects_overfull_rows() {
        assert_eq!(fit_columns(&[], 10.0), None);
        assert_eq!(fit_columns(&[6.0, 5.0], 10.0), None);
        assert_eq!(fit_columns(&[4.0, 5.0], 10.0), Some(vec![45, 55]));
    }
}
