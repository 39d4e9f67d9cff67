// Phase 7: Tesseract CLI wrapper (TSV output -> recognition tree)

use std::path::PathBuf;
use std::process::Command;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use image::DynamicImage;
use tracing::{debug, info};

use super::{OcrBlock, OcrEngine, OcrLine, OcrPage, OcrParagraph, OcrWord, PixelBox};
use crate::config::settings::OcrSettings;
use crate::error::RedactError;

/// Word rows in Tesseract's TSV output.
const TSV_LEVEL_WORD: i32 = 5;

static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// OCR worker backed by the `tesseract` executable.
pub struct TesseractEngine {
    settings: OcrSettings,
    version: String,
}

impl TesseractEngine {
    /// Verify the binary runs and build an engine.
    pub fn new(settings: OcrSettings) -> crate::error::Result<Self> {
        let version = tesseract_version(&settings.binary)?;
        info!(%version, lang = %settings.lang, "tesseract available");
        Ok(Self { settings, version })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    fn temp_image_path() -> PathBuf {
        let seq = TEMP_SEQ.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!(
            "pdf_redaction_ocr_{}_{seq}.png",
            std::process::id()
        ))
    }
}

impl OcrEngine for TesseractEngine {
    fn recognize(&mut self, image: &DynamicImage) -> crate::error::Result<OcrPage> {
        let start = Instant::now();
        let input = Self::temp_image_path();
        image.save(&input)?;

        let mut cmd = Command::new(&self.settings.binary);
        cmd.arg(&input)
            .arg("stdout")
            .arg("-l")
            .arg(&self.settings.lang)
            .arg("--psm")
            .arg(self.settings.psm.to_string())
            .arg("--oem")
            .arg(self.settings.oem.to_string())
            .arg("tsv");
        if let Some(tessdata) = &self.settings.tessdata_dir {
            cmd.env("TESSDATA_PREFIX", tessdata);
        }

        let output = cmd.output();
        let _ = std::fs::remove_file(&input);
        let output = output
            .map_err(|e| RedactError::ocr(format!("failed to run tesseract: {e}")))?;

        if !output.status.success() {
            return Err(RedactError::ocr(format!(
                "tesseract exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let page = parse_tsv(&String::from_utf8_lossy(&output.stdout));
        debug!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            lines = page.lines().count(),
            "tesseract finished"
        );
        Ok(page)
    }
}

/// Parse Tesseract TSV into the block/paragraph/line/word tree.
///
/// Columns: `level page block par line word left top width height conf text`.
/// Only word rows with non-empty text contribute; structure follows the
/// block/par/line numbers in the order they appear.
pub fn parse_tsv(tsv: &str) -> OcrPage {
    let mut page = OcrPage::default();
    let mut last_key: Option<(u32, u32, u32)> = None;
    let mut last_block: Option<u32> = None;
    let mut last_par: Option<(u32, u32)> = None;

    for row in tsv.lines().skip(1) {
        let cols: Vec<&str> = row.split('\t').collect();
        if cols.len() < 12 {
            continue;
        }
        let level: i32 = cols[0].trim().parse().unwrap_or(-1);
        let text = cols[11].trim();
        if level != TSV_LEVEL_WORD || text.is_empty() {
            continue;
        }

        let num = |i: usize| cols[i].trim().parse::<u32>().unwrap_or(0);
        let px = |i: usize| cols[i].trim().parse::<f64>().unwrap_or(0.0);
        let (block, par, line) = (num(2), num(3), num(4));
        let (left, top, width, height) = (px(6), px(7), px(8), px(9));

        if last_block != Some(block) {
            page.blocks.push(OcrBlock::default());
            last_block = Some(block);
            last_par = None;
        }
        let Some(current_block) = page.blocks.last_mut() else {
            continue;
        };
        if last_par != Some((block, par)) {
            current_block.paragraphs.push(OcrParagraph::default());
            last_par = Some((block, par));
            last_key = None;
        }
        let Some(current_par) = current_block.paragraphs.last_mut() else {
            continue;
        };
        if last_key != Some((block, par, line)) {
            current_par.lines.push(OcrLine::default());
            last_key = Some((block, par, line));
        }
        let Some(current_line) = current_par.lines.last_mut() else {
            continue;
        };

        current_line.words.push(OcrWord {
            text: text.to_string(),
            bbox: PixelBox {
                x0: left,
                y0: top,
                x1: left + width,
                y1: top + height,
            },
        });
    }

    page
}

/// First line of `tesseract --version`.
pub fn tesseract_version(binary: &str) -> crate::error::Result<String> {
    let output = Command::new(binary)
        .arg("--version")
        .output()
        .map_err(|e| RedactError::ocr(format!("cannot execute '{binary}': {e}")))?;

    // Older releases print the version banner to stderr.
    let text = if output.stdout.is_empty() {
        String::from_utf8_lossy(&output.stderr).into_owned()
    } else {
        String::from_utf8_lossy(&output.stdout).into_owned()
    };
    text.lines()
        .next()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .ok_or_else(|| RedactError::ocr(format!("'{binary}' reported no version")))
}
