//! Serialization of composed pages into a single PDF byte buffer.

use std::path::PathBuf;

use genpdf::elements::{PageBreak, Paragraph};
use genpdf::error::{Error, ErrorKind};
use genpdf::style::{self, Style};
use genpdf::{Alignment, Element, Margins, Mm, PageDecorator, Position, Size};
use log::debug;

use crate::compose::Page;
use crate::config::ReportConfig;
use crate::elements::mm_from_f64;
use crate::error::ReportError;
use crate::fonts;

const FOOTER_HEIGHT_MM: f64 = 6.0;
const FOOTER_FONT_SIZE: u8 = 7;

/// Builds and serializes report documents.
///
/// The `genpdf` document, its font cache and the per-page drawing contexts
/// are created inside [`DocumentAssembler::assemble`] and consumed by the
/// rendering call, so they are dropped on every return path.
#[derive(Clone, Debug, Default)]
pub struct DocumentAssembler {
    title: Option<String>,
    paper_size: Option<(f64, f64)>,
    margin_mm: Option<f64>,
    footer: Option<String>,
    fonts_dir: Option<PathBuf>,
}

impl DocumentAssembler {
    /// Creates an assembler using the `genpdf` defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an assembler using the page and font settings of `config`.
    pub fn from_config(config: &ReportConfig) -> Self {
        Self::new()
            .with_paper_size_mm(config.page.width_mm, config.page.height_mm)
            .with_margin_mm(config.page.margin_mm)
            .with_fonts_dir(config.fonts_dir.clone())
    }

    /// Sets the document title stored in the PDF metadata.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the paper size in millimetres.
    pub fn with_paper_size_mm(mut self, width: f64, height: f64) -> Self {
        self.paper_size = Some((width, height));
        self
    }

    /// Sets the margin applied on all sides of every page.
    pub fn with_margin_mm(mut self, margin: f64) -> Self {
        self.margin_mm = Some(margin);
        self
    }

    /// Adds a footer line; `{page}` is replaced with the page number.
    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    /// Sets the directory searched first for fonts.
    pub fn with_fonts_dir(mut self, fonts_dir: impl Into<Option<PathBuf>>) -> Self {
        self.fonts_dir = fonts_dir.into();
        self
    }

    /// Renders `pages` in order, one PDF page each, into an in-memory buffer.
    pub fn assemble(self, pages: Vec<Page>) -> Result<Vec<u8>, ReportError> {
        if pages.is_empty() {
            return Err(ReportError::EmptyDocument);
        }

        let font_family =
            fonts::font_family(self.fonts_dir.as_deref()).map_err(ReportError::FontLoad)?;
        let mut document = genpdf::Document::new(font_family);

        if let Some(title) = &self.title {
            document.set_title(title.as_str());
        }
        if let Some((width, height)) = self.paper_size {
            document.set_paper_size(Size::new(mm_from_f64(width), mm_from_f64(height)));
        }

        let margins = self
            .margin_mm
            .map(|margin| Margins::all(mm_from_f64(margin)));
        document.set_page_decorator(ReportPageDecorator::new(margins, self.footer));

        let page_count = pages.len();
        for (index, page) in pages.into_iter().enumerate() {
            if index > 0 {
                document.push(PageBreak::new());
            }
            document.push(page);
        }

        let mut bytes = Vec::new();
        document.render(&mut bytes).map_err(ReportError::Render)?;
        debug!("Assembled {} page(s) into {} bytes", page_count, bytes.len());
        Ok(bytes)
    }
}

struct ReportPageDecorator {
    page: usize,
    margins: Option<Margins>,
    footer: Option<String>,
}

impl ReportPageDecorator {
    fn new(margins: Option<Margins>, footer: Option<String>) -> Self {
        Self {
            page: 0,
            margins,
            footer,
        }
    }
}

impl PageDecorator for ReportPageDecorator {
    fn decorate_page<'a>(
        &mut self,
        context: &genpdf::Context,
        mut area: genpdf::render::Area<'a>,
        style: style::Style,
    ) -> Result<genpdf::render::Area<'a>, Error> {
        self.page += 1;

        if let Some(margins) = self.margins {
            area.add_margins(margins);
        }

        if let Some(footer) = &self.footer {
            let height: Mm = mm_from_f64(FOOTER_HEIGHT_MM);
            let available = area.size().height;
            if height > available {
                return Err(Error::new(
                    "Footer height exceeds available space",
                    ErrorKind::InvalidData,
                ));
            }

            let mut footer_area = area.clone();
            footer_area.add_offset(Position::new(0, available - height));
            let text = footer.replace("{page}", &self.page.to_string());
            let mut element = Paragraph::new(text)
                .aligned(Alignment::Right)
                .styled(Style::new().with_font_size(FOOTER_FONT_SIZE));
            let result = element.render(context, footer_area, style)?;
            if result.has_more {
                return Err(Error::new(
                    "Footer does not fit into the reserved space",
                    ErrorKind::PageSizeExceeded,
                ));
            }

            area.set_height(available - height);
        }

        Ok(area)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_page_list_is_rejected_before_loading_fonts() {
        let err = DocumentAssembler::new()
            .with_fonts_dir(PathBuf::from("/__cupping_radar_missing__"))
            .assemble(Vec::new())
            .unwrap_err();
        assert!(matches!(err, ReportError::EmptyDocument));
    }

    #[test]
    fn takes_page_settings_from_config() {
        let mut config = ReportConfig::default();
        config.page.width_mm = 216.0;
        config.page.height_mm = 279.0;
        config.page.margin_mm = 12.0;

        let assembler = DocumentAssembler::from_config(&config);
        assert_eq!(assembler.paper_size, Some((216.0, 279.0)));
        assert_eq!(assembler.margin_mm, Some(12.0));
        assert_eq!(assembler.fonts_dir, None);
    }
}
