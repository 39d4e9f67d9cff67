// Phase 6: page rendering collaborator interface

#[cfg(feature = "pdfium")]
pub mod pdfium;

use image::RgbaImage;

/// Page size in PDF points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    /// Raster dimensions at `scale` (1.0 = one pixel per point).
    pub fn pixels(&self, scale: f64) -> (u32, u32) {
        (
            (self.width * scale).round().max(1.0) as u32,
            (self.height * scale).round().max(1.0) as u32,
        )
    }
}

/// A run of text from a page's embedded text layer.
///
/// `transform` is the run's placement matrix `[a b c d e f]`; `e, f` is the
/// baseline origin in page space (bottom-left origin, points).
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub transform: [f64; 6],
    pub width: f64,
    pub height: f64,
}

impl TextRun {
    /// Run with an identity matrix translated to `(x, y)`.
    pub fn at(text: impl Into<String>, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            text: text.into(),
            transform: [1.0, 0.0, 0.0, 1.0, x, y],
            width,
            height,
        }
    }

    pub fn origin_x(&self) -> f64 {
        self.transform[4]
    }

    pub fn origin_y(&self) -> f64 {
        self.transform[5]
    }
}

/// Rasterises pages and exposes their text layer. Pages are 1-based.
pub trait PageRenderer {
    fn page_count(&self) -> u32;

    fn page_size(&self, page: u32) -> crate::error::Result<PageSize>;

    /// Render `page` at `scale` pixels per point.
    fn render(&self, page: u32, scale: f64) -> crate::error::Result<RgbaImage>;

    /// Text runs of `page`; empty when the page has no text layer.
    fn text_runs(&self, page: u32) -> crate::error::Result<Vec<TextRun>>;
}

/// Check `page` against `renderer`'s page count.
#[cfg(feature = "pdfium")]
pub(crate) fn check_page(renderer: &dyn PageRenderer, page: u32) -> crate::error::Result<()> {
    let count = renderer.page_count();
    if page == 0 || page > count {
        return Err(crate::error::RedactError::validation(format!(
            "Page {page} out of range (document has {count} pages)"
        )));
    }
    Ok(())
}
