// Phase 6: pdfium-render adapter: page rasters and text runs (in-memory only)

use std::path::{Path, PathBuf};

use image::RgbaImage;
use pdfium_render::prelude::*;
use tracing::debug;

use super::{PageRenderer, PageSize, TextRun};
use crate::error::RedactError;

/// Resolves the path to the pdfium shared library.
///
/// Search order:
/// 1. `PDFIUM_DYNAMIC_LIB_PATH` environment variable
/// 2. `vendor/pdfium/lib/` relative to the project root (for development)
fn resolve_pdfium_lib_path() -> crate::error::Result<Option<PathBuf>> {
    if let Ok(path) = std::env::var("PDFIUM_DYNAMIC_LIB_PATH") {
        let p = PathBuf::from(&path);
        if p.exists() {
            return Ok(Some(p));
        }
        return Err(RedactError::render(format!(
            "PDFIUM_DYNAMIC_LIB_PATH is set to '{path}' but the path does not exist"
        )));
    }

    if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
        let vendor_path = PathBuf::from(&manifest_dir).join("vendor/pdfium/lib");
        if vendor_path.exists() {
            return Ok(Some(vendor_path));
        }
    }

    Ok(None)
}

/// Creates a Pdfium instance, falling back to the system library.
fn create_pdfium() -> crate::error::Result<Pdfium> {
    let bindings = match resolve_pdfium_lib_path()? {
        Some(lib_path) => {
            let lib_path_str = lib_path.to_str().ok_or_else(|| {
                RedactError::render("pdfium library path contains non-UTF-8 characters")
            })?;
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(lib_path_str))
        }
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| RedactError::render(format!("pdfium library not available: {e}")))?;
    Ok(Pdfium::new(bindings))
}

/// Document held in memory and re-opened through pdfium per call.
///
/// Page sizes are read once at open time.
pub struct PdfiumRenderer {
    bytes: Vec<u8>,
    sizes: Vec<PageSize>,
}

impl PdfiumRenderer {
    pub fn open(path: impl AsRef<Path>) -> crate::error::Result<Self> {
        Self::from_bytes(std::fs::read(path)?)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> crate::error::Result<Self> {
        let pdfium = create_pdfium()?;
        let sizes = {
            let document = pdfium.load_pdf_from_byte_slice(&bytes, None)?;
            document
                .pages()
                .iter()
                .map(|page| PageSize {
                    width: page.width().value as f64,
                    height: page.height().value as f64,
                })
                .collect()
        };
        Ok(Self { bytes, sizes })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn with_page<T>(
        &self,
        page: u32,
        f: impl FnOnce(&PdfPage) -> crate::error::Result<T>,
    ) -> crate::error::Result<T> {
        super::check_page(self, page)?;
        let pdfium = create_pdfium()?;
        let document = pdfium.load_pdf_from_byte_slice(&self.bytes, None)?;
        let index = u16::try_from(page - 1)
            .map_err(|_| RedactError::render("page index exceeds u16 range"))?;
        let pdf_page = document.pages().get(index)?;
        f(&pdf_page)
    }
}

impl PageRenderer for PdfiumRenderer {
    fn page_count(&self) -> u32 {
        self.sizes.len() as u32
    }

    fn page_size(&self, page: u32) -> crate::error::Result<PageSize> {
        super::check_page(self, page)?;
        Ok(self.sizes[(page - 1) as usize])
    }

    fn render(&self, page: u32, scale: f64) -> crate::error::Result<RgbaImage> {
        let size = self.page_size(page)?;
        let (width_px, height_px) = size.pixels(scale);
        self.with_page(page, |pdf_page| {
            let config = PdfRenderConfig::new()
                .set_target_width(width_px as i32)
                .set_target_height(height_px as i32);
            let bitmap = pdf_page.render_with_config(&config)?;
            debug!(page, width_px, height_px, "page rendered");
            Ok(bitmap.as_image().to_rgba8())
        })
    }

    fn text_runs(&self, page: u32) -> crate::error::Result<Vec<TextRun>> {
        self.with_page(page, |pdf_page| {
            let text = pdf_page.text()?;
            let runs: Vec<TextRun> = text
                .segments()
                .iter()
                .filter_map(|segment| {
                    let content = segment.text();
                    if content.trim().is_empty() {
                        return None;
                    }
                    let bounds = segment.bounds();
                    let left = bounds.left().value as f64;
                    let bottom = bounds.bottom().value as f64;
                    let width = bounds.right().value as f64 - left;
                    let height = bounds.top().value as f64 - bottom;
                    Some(TextRun::at(content, left, bottom, width, height))
                })
                .collect();
            debug!(page, runs = runs.len(), "text layer extracted");
            Ok(runs)
        })
    }
}
