// Phase 8: per-page detector: text layer first, OCR fallback

use image::DynamicImage;
use tracing::{debug, info};

use super::{DetectionOptions, DetectionSource, PatternSet, ocr_match, text_layer};
use crate::mask::Rect;
use crate::ocr::{OcrSlot, preprocess};
use crate::render::PageRenderer;

/// Rectangles found on one page, in interactive raster pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct PageDetection {
    pub page: u32,
    pub source: DetectionSource,
    pub rects: Vec<Rect>,
}

/// Turns pattern matches into rectangles. Never touches the mask store.
pub struct Detector {
    options: DetectionOptions,
    ocr: OcrSlot,
}

impl Detector {
    pub fn new(options: DetectionOptions, ocr: OcrSlot) -> Self {
        Self { options, ocr }
    }

    pub fn options(&self) -> &DetectionOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: DetectionOptions) {
        self.options = options;
    }

    pub fn ocr_running(&self) -> bool {
        self.ocr.is_running()
    }

    /// Stop the OCR worker, if one was started.
    pub fn shutdown(&mut self) {
        self.ocr.shutdown();
    }

    /// Detect matches on `page`.
    ///
    /// Uses the text layer unless it is empty or OCR is forced. Any error
    /// from the renderer or OCR worker is returned unchanged.
    pub fn detect_page(
        &mut self,
        renderer: &dyn PageRenderer,
        page: u32,
        patterns: &PatternSet,
    ) -> crate::error::Result<PageDetection> {
        let size = renderer.page_size(page)?;
        let scale = self.options.interactive_scale;

        if !self.options.force_ocr {
            let runs = renderer.text_runs(page)?;
            if runs.iter().any(|r| !r.text.trim().is_empty()) {
                let group = self
                    .options
                    .group_lines
                    .then_some(self.options.line_tolerance);
                let rects = text_layer::match_runs(&runs, patterns, size.height, scale, group);
                debug!(page, runs = runs.len(), matches = rects.len(), "text layer scanned");
                return Ok(PageDetection {
                    page,
                    source: DetectionSource::TextLayer,
                    rects,
                });
            }
        }

        let raster = renderer.render(page, self.options.ocr_scale)?;
        if raster.width() == 0 || raster.height() == 0 {
            return Ok(PageDetection {
                page,
                source: DetectionSource::Empty,
                rects: Vec::new(),
            });
        }
        let prepared = preprocess::prepare(DynamicImage::ImageRgba8(raster), self.options.preprocess);

        info!(page, "running OCR");
        let recognized = self.ocr.engine()?.recognize(&prepared)?;
        if recognized.is_empty() {
            return Ok(PageDetection {
                page,
                source: DetectionSource::Empty,
                rects: Vec::new(),
            });
        }

        let factor = scale / self.options.ocr_scale;
        let rects: Vec<Rect> = ocr_match::match_page(&recognized, patterns)
            .into_iter()
            .map(|b| Rect::from_corners(b.x0, b.y0, b.x1, b.y1).scaled(factor))
            .collect();
        debug!(page, matches = rects.len(), "OCR text scanned");

        Ok(PageDetection {
            page,
            source: DetectionSource::Ocr,
            rects,
        })
    }
}
