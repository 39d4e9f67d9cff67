// Phase 12: ジョブ単位: 入力読込 -> 結合 -> 手動矩形 -> 検出 -> 出力

use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::info;

use crate::config::job::BoxSpec;
use crate::config::merged::MergedConfig;
use crate::detect::{DetectionReport, DetectionTarget, PatternSet};
use crate::export::PageSelection;
use crate::mask::{MaskKind, Rect};
use crate::ocr::OcrEngineFactory;
use crate::ocr::tesseract::TesseractEngine;
use crate::render::PageRenderer;
use crate::session::{Session, SessionConfig};

/// Configuration for a single job.
pub struct JobConfig {
    pub input_paths: Vec<PathBuf>,
    pub output_path: PathBuf,
    pub pages: PageSelection,
    /// Detection patterns; the built-in set when `None`.
    pub patterns: Option<BTreeMap<String, String>>,
    pub boxes: Vec<BoxSpec>,
    pub merged: MergedConfig,
}

/// Result of processing a single job.
#[derive(Debug)]
pub struct JobResult {
    pub input_paths: Vec<PathBuf>,
    pub output_path: PathBuf,
    pub pages_exported: usize,
    pub masks: usize,
    pub detection: Option<DetectionReport>,
}

/// Redacted output of a job, before it is written anywhere.
#[derive(Debug)]
pub struct RedactedDocument {
    pub bytes: Vec<u8>,
    pub pages_exported: usize,
    pub masks: usize,
    pub detection: Option<DetectionReport>,
}

/// OCR factory for the configured Tesseract binary.
pub fn tesseract_factory(merged: &MergedConfig) -> Box<dyn OcrEngineFactory> {
    let settings = merged.ocr.clone();
    Box::new(move || {
        TesseractEngine::new(settings.clone())
            .map(|e| Box::new(e) as Box<dyn crate::ocr::OcrEngine>)
    })
}

/// Apply manual boxes and detection to `renderer`'s document and export it.
pub fn redact_document(
    renderer: &dyn PageRenderer,
    config: &JobConfig,
    ocr: Box<dyn OcrEngineFactory>,
) -> crate::error::Result<RedactedDocument> {
    let mut session = Session::new(
        renderer.page_count(),
        SessionConfig::from(&config.merged),
        ocr,
    );
    if let Some(patterns) = &config.patterns {
        session.set_patterns(PatternSet::compile(patterns)?);
    }

    // 手動矩形はポイント単位で指定される
    let scale = config.merged.interactive_scale;
    for b in &config.boxes {
        let rect = Rect::new(b.x, b.y, b.width, b.height).scaled(scale);
        session.add_mask(b.page, rect, MaskKind::Box)?;
    }
    session.end_task();

    let detection = if config.merged.detect {
        let report = session.run_detection(renderer, DetectionTarget::All, &mut |p| {
            info!(page = p.page, position = p.position, total = p.total, "detecting");
        })?;
        Some(report)
    } else {
        None
    };

    let pages = config
        .pages
        .resolve(session.current_page(), session.page_count())?;
    let bytes = session.export_pages(renderer, &PageSelection::from_pages(&pages))?;
    let masks = session.store().mask_count();
    session.close();

    Ok(RedactedDocument {
        bytes,
        pages_exported: pages.len(),
        masks,
        detection,
    })
}

/// Run a single redaction job end to end, writing the output file.
#[cfg(feature = "pdfium")]
pub fn run_job(config: &JobConfig) -> crate::error::Result<JobResult> {
    use crate::pdf::merge::{merge_documents, rasterize_document};
    use crate::render::pdfium::PdfiumRenderer;

    let sources = config
        .input_paths
        .iter()
        .map(std::fs::read)
        .collect::<Result<Vec<_>, _>>()?;

    let export_scale = config.merged.export_scale;
    let merged = merge_documents(&sources, |_, bytes| {
        rasterize_document(&PdfiumRenderer::from_bytes(bytes.to_vec())?, export_scale)
    })?;

    let renderer = PdfiumRenderer::from_bytes(merged.bytes)?;
    let output = redact_document(&renderer, config, tesseract_factory(&config.merged))?;
    std::fs::write(&config.output_path, &output.bytes)?;

    Ok(JobResult {
        input_paths: config.input_paths.clone(),
        output_path: config.output_path.clone(),
        pages_exported: output.pages_exported,
        masks: output.masks,
        detection: output.detection,
    })
}
