// Phase 7: OCR plumbing tests (TSV parsing, preprocessing, worker slot)

mod common;

use image::{DynamicImage, GrayImage, Luma};
use pdf_redaction::ocr::preprocess::{binarize, prepare};
use pdf_redaction::ocr::tesseract::parse_tsv;
use pdf_redaction::ocr::{OcrPage, OcrSlot, PixelBox};

const HEADER: &str =
    "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext";

fn tsv(rows: &[&str]) -> String {
    let mut out = String::from(HEADER);
    for row in rows {
        out.push('\n');
        out.push_str(row);
    }
    out
}

// ============================================================
// 1. TSV parsing
// ============================================================

#[test]
fn test_parse_tsv_builds_tree() {
    let page = parse_tsv(&tsv(&[
        "1\t1\t0\t0\t0\t0\t0\t0\t800\t600\t-1\t",
        "2\t1\t1\t0\t0\t0\t10\t10\t300\t60\t-1\t",
        "5\t1\t1\t1\t1\t1\t10\t10\t50\t20\t95.1\tCall",
        "5\t1\t1\t1\t1\t2\t70\t10\t120\t20\t91.0\t010-1234-5678",
        "5\t1\t1\t1\t2\t1\t10\t40\t40\t20\t90.0\tnow",
        "5\t1\t1\t2\t1\t1\t10\t80\t40\t20\t90.0\tnext",
        "5\t1\t2\t1\t1\t1\t400\t10\t40\t20\t88.0\tside",
    ]));

    assert_eq!(page.blocks.len(), 2);
    assert_eq!(page.blocks[0].paragraphs.len(), 2);
    assert_eq!(page.blocks[0].paragraphs[0].lines.len(), 2);

    let first_line = &page.blocks[0].paragraphs[0].lines[0];
    let words: Vec<&str> = first_line.words.iter().map(|w| w.text.as_str()).collect();
    assert_eq!(words, vec!["Call", "010-1234-5678"]);
    assert_eq!(
        first_line.words[1].bbox,
        PixelBox {
            x0: 70.0,
            y0: 10.0,
            x1: 190.0,
            y1: 30.0
        }
    );
    assert_eq!(page.lines().count(), 4);
}

#[test]
fn test_parse_tsv_skips_blank_and_short_rows() {
    let page = parse_tsv(&tsv(&[
        "5\t1\t1\t1\t1\t1\t10\t10\t50\t20\t-1\t ",
        "5\t1\t1\t1\t1",
        "",
    ]));
    assert!(page.is_empty());
    assert!(page.blocks.is_empty());
}

#[test]
fn test_parse_tsv_empty_output() {
    assert!(parse_tsv("").is_empty());
}

// ============================================================
// 2. preprocessing
// ============================================================

#[test]
fn test_binarize_outputs_only_black_and_white() {
    let image = GrayImage::from_fn(40, 40, |x, y| Luma([((x * 5 + y * 2) % 256) as u8]));
    let bin = binarize(&DynamicImage::ImageLuma8(image));
    assert_eq!(bin.dimensions(), (40, 40));
    assert!(bin.pixels().all(|p| p[0] == 0 || p[0] == 255));
}

#[test]
fn test_binarize_tolerates_faint_shading_but_keeps_ink() {
    let mut image = GrayImage::from_pixel(21, 21, Luma([200]));
    image.put_pixel(5, 10, Luma([199]));
    image.put_pixel(15, 10, Luma([60]));

    let bin = binarize(&DynamicImage::ImageLuma8(image));
    assert_eq!(bin.get_pixel(0, 0)[0], 255, "flat background is white");
    assert_eq!(bin.get_pixel(5, 10)[0], 255, "one level darker stays white");
    assert_eq!(bin.get_pixel(15, 10)[0], 0, "ink is black");
}

#[test]
fn test_prepare_disabled_passes_through() {
    let image = DynamicImage::new_rgba8(8, 4);
    let out = prepare(image.clone(), false);
    assert_eq!(out, image);

    let out = prepare(image, true);
    assert!(matches!(out, DynamicImage::ImageLuma8(_)));
}

// ============================================================
// 3. worker slot
// ============================================================

#[test]
fn test_slot_starts_lazily_and_shuts_down_once() {
    let (factory, stats) = common::scripted_ocr(OcrPage::default());
    let mut slot = OcrSlot::new(factory);
    assert!(!slot.is_running());
    assert_eq!(stats.created(), 0);

    slot.engine().unwrap();
    slot.engine().unwrap();
    assert_eq!(stats.created(), 1);
    assert!(slot.is_running());

    slot.shutdown();
    slot.shutdown();
    assert_eq!(stats.shutdowns(), 1);
}

#[test]
fn test_slot_drop_shuts_down_engine() {
    let (factory, stats) = common::scripted_ocr(OcrPage::default());
    {
        let mut slot = OcrSlot::new(factory);
        slot.engine().unwrap();
    }
    assert_eq!(stats.shutdowns(), 1);
}

#[test]
fn test_slot_reports_unavailable_engine() {
    let mut slot = OcrSlot::new(common::unavailable_ocr());
    assert!(slot.engine().is_err());
    assert!(!slot.is_running());
}
