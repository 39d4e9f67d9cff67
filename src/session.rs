// Phase 4: document session: owns store, history, detector and view state

use tracing::{debug, info, warn};

use crate::config::merged::MergedConfig;
use crate::detect::engine::Detector;
use crate::detect::{
    DetectionOptions, DetectionProgress, DetectionReport, DetectionTarget, PageOutcome,
    PatternSet,
};
use crate::error::RedactError;
use crate::export::save::FileSaver;
use crate::export::{self, ExportOptions, PageSelection};
use crate::history::{Action, History, DEFAULT_HISTORY_LIMIT};
use crate::mask::store::MaskStore;
use crate::mask::{Mask, MaskKind, MaskStyle, NewMask, Rect};
use crate::ocr::{OcrEngineFactory, OcrSlot};
use crate::render::PageRenderer;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    pub history_limit: usize,
    pub style: MaskStyle,
    pub detection: DetectionOptions,
    pub export: ExportOptions,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            style: MaskStyle::default(),
            detection: DetectionOptions::default(),
            export: ExportOptions::default(),
        }
    }
}

impl From<&MergedConfig> for SessionConfig {
    fn from(merged: &MergedConfig) -> Self {
        Self {
            history_limit: merged.history_limit,
            style: merged.style,
            detection: merged.detection,
            export: ExportOptions {
                interactive_scale: merged.interactive_scale,
                export_scale: merged.export_scale,
                blur_method: merged.blur_method,
            },
        }
    }
}

/// All engine state for one open document.
///
/// Every mutation goes through here so that it is recorded in the history.
/// Operations take `&mut self`; two runs on one session cannot overlap.
pub struct Session {
    store: MaskStore,
    history: History,
    page_count: u32,
    current_page: u32,
    style: MaskStyle,
    patterns: PatternSet,
    detector: Detector,
    export: ExportOptions,
    needs_redraw: bool,
}

impl Session {
    pub fn new(page_count: u32, config: SessionConfig, ocr: Box<dyn OcrEngineFactory>) -> Self {
        Self {
            store: MaskStore::new(),
            history: History::new(config.history_limit),
            page_count,
            current_page: 1,
            style: config.style,
            patterns: PatternSet::defaults(),
            detector: Detector::new(config.detection, OcrSlot::new(ocr)),
            export: config.export,
            needs_redraw: true,
        }
    }

    /// Switch to a new document: masks and history start empty.
    pub fn load_document(&mut self, page_count: u32) {
        self.store.reset();
        self.history.clear();
        self.page_count = page_count;
        self.current_page = 1;
        self.needs_redraw = true;
        info!(page_count, "document loaded");
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn set_current_page(&mut self, page: u32) -> crate::error::Result<()> {
        self.check_page(page)?;
        self.current_page = page;
        self.needs_redraw = true;
        Ok(())
    }

    pub fn style(&self) -> MaskStyle {
        self.style
    }

    /// Style applied to masks created from now on.
    pub fn set_style(&mut self, style: MaskStyle) {
        self.style = style;
    }

    pub fn patterns(&self) -> &PatternSet {
        &self.patterns
    }

    pub fn set_patterns(&mut self, patterns: PatternSet) {
        self.patterns = patterns;
    }

    pub fn detection_options(&self) -> &DetectionOptions {
        self.detector.options()
    }

    pub fn set_detection_options(&mut self, options: DetectionOptions) {
        self.detector.set_options(options);
    }

    pub fn export_options(&self) -> &ExportOptions {
        &self.export
    }

    pub fn store(&self) -> &MaskStore {
        &self.store
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn page_masks(&self, page: u32) -> &[Mask] {
        self.store.page_masks(page)
    }

    // ---- mask edits (recorded into the open task) ----

    /// Add a mask with the current style. Returns its id.
    pub fn add_mask(&mut self, page: u32, rect: Rect, kind: MaskKind) -> crate::error::Result<String> {
        self.check_page(page)?;
        if !rect.is_valid() {
            return Err(RedactError::validation(format!(
                "mask must have positive width and height, got {}x{}",
                rect.width, rect.height
            )));
        }
        let mask = self.store.add_mask(
            page,
            NewMask {
                rect,
                kind,
                style: self.style,
            },
        );
        let id = mask.id.clone();
        self.history.record(Action::Add { mask });
        self.touch(Some(page));
        Ok(id)
    }

    /// Delete masks fully inside `rect`. Returns how many were removed.
    pub fn delete_masks_in_rect(&mut self, page: u32, rect: Rect) -> crate::error::Result<usize> {
        self.check_page(page)?;
        let removed = self.store.delete_masks_in_rect(page, &rect);
        let count = removed.len();
        if count > 0 {
            self.history.record(Action::Delete { page, removed });
            self.touch(Some(page));
        }
        Ok(count)
    }

    pub fn clear_page(&mut self, page: u32) -> crate::error::Result<usize> {
        self.check_page(page)?;
        let removed = self.store.clear_page(page);
        let count = removed.len();
        if count > 0 {
            self.history.record(Action::ClearPage { page, removed });
            self.touch(Some(page));
        }
        Ok(count)
    }

    /// Remove the detection-generated masks of `page`.
    pub fn clear_ocr(&mut self, page: u32) -> crate::error::Result<usize> {
        self.check_page(page)?;
        Ok(self.clear_ocr_unchecked(page))
    }

    pub fn clear_all(&mut self) -> usize {
        let count = self.store.mask_count();
        if count > 0 {
            let snapshot = self.store.clear_all();
            self.history.record(Action::ClearAll { snapshot });
            self.touch(None);
        }
        count
    }

    /// Close the open task. Returns `false` when nothing was recorded.
    pub fn end_task(&mut self) -> bool {
        self.history.end_task()
    }

    pub fn undo(&mut self) -> bool {
        let undone = self.history.undo(&mut self.store).is_some();
        if undone {
            debug!("task undone");
            self.needs_redraw = true;
        }
        undone
    }

    pub fn redo(&mut self) -> bool {
        let redone = self.history.redo(&mut self.store).is_some();
        if redone {
            debug!("task redone");
            self.needs_redraw = true;
        }
        redone
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// The page the host must redraw from the store, once per change.
    pub fn take_redraw(&mut self) -> Option<u32> {
        std::mem::take(&mut self.needs_redraw).then_some(self.current_page)
    }

    // ---- detection ----

    /// Detect pattern matches on one page or the whole document.
    ///
    /// For each page the previous detection masks are replaced by the new
    /// ones. A page whose detection fails is reported and left untouched.
    /// Everything the run changed becomes a single task.
    pub fn run_detection(
        &mut self,
        renderer: &dyn PageRenderer,
        target: DetectionTarget,
        progress: &mut dyn FnMut(DetectionProgress),
    ) -> crate::error::Result<DetectionReport> {
        if self.patterns.is_empty() {
            return Err(RedactError::validation("no detection patterns configured"));
        }
        let pages: Vec<u32> = match target {
            DetectionTarget::Page(page) => {
                self.check_page(page)?;
                vec![page]
            }
            DetectionTarget::All => (1..=self.page_count).collect(),
        };

        // Finish whatever the user was doing so it stays a separate task.
        self.history.end_task();

        let total = pages.len();
        let mut report = DetectionReport::default();
        for (i, &page) in pages.iter().enumerate() {
            progress(DetectionProgress {
                page,
                position: i + 1,
                total,
            });

            match self.detector.detect_page(renderer, page, &self.patterns) {
                Ok(found) => {
                    self.clear_ocr_unchecked(page);
                    let mut added = 0;
                    for rect in found.rects.into_iter().filter(Rect::is_valid) {
                        self.add_mask(page, rect, MaskKind::Ocr)?;
                        added += 1;
                    }
                    report.pages.push(PageOutcome {
                        page,
                        source: Some(found.source),
                        masks_added: added,
                        error: None,
                    });
                }
                Err(e) => {
                    warn!(page, error = %e, "detection skipped page");
                    report.pages.push(PageOutcome {
                        page,
                        source: None,
                        masks_added: 0,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        self.history.end_task();
        info!(
            pages = total,
            masks = report.masks_added(),
            failed = report.failed_pages().count(),
            "detection finished"
        );
        Ok(report)
    }

    // ---- export ----

    /// Build the redacted output document for `selection`.
    pub fn export_pages(
        &self,
        renderer: &dyn PageRenderer,
        selection: &PageSelection,
    ) -> crate::error::Result<Vec<u8>> {
        let pages = selection.resolve(self.current_page, self.page_count)?;
        export::export_document(renderer, &self.store, &pages, &self.export)
    }

    /// Hand exported bytes to `saver`.
    pub fn save_export(
        &self,
        saver: &mut dyn FileSaver,
        bytes: &[u8],
        suggested_name: &str,
    ) -> crate::error::Result<()> {
        if saver.save(bytes, suggested_name) {
            Ok(())
        } else {
            Err(RedactError::save(format!(
                "could not save '{suggested_name}'"
            )))
        }
    }

    /// Tear down the OCR worker. The session stays usable; OCR restarts on demand.
    pub fn close(&mut self) {
        self.detector.shutdown();
    }

    pub fn ocr_running(&self) -> bool {
        self.detector.ocr_running()
    }

    fn clear_ocr_unchecked(&mut self, page: u32) -> usize {
        let removed = self.store.clear_by_kind(page, MaskKind::Ocr);
        let count = removed.len();
        if count > 0 {
            self.history.record(Action::ClearOcr { page, removed });
            self.touch(Some(page));
        }
        count
    }

    fn check_page(&self, page: u32) -> crate::error::Result<()> {
        if page == 0 || page > self.page_count {
            return Err(RedactError::validation(format!(
                "Page {page} out of range (document has {} pages)",
                self.page_count
            )));
        }
        Ok(())
    }

    fn touch(&mut self, page: Option<u32>) {
        if page.is_none_or(|p| p == self.current_page) {
            self.needs_redraw = true;
        }
    }
}
