// Phase 12: job pipeline tests (manual boxes, detection, page selection)

mod common;

use std::path::PathBuf;

use common::{FakePage, FakeRenderer, scripted_ocr, unavailable_ocr};
use pdf_redaction::config::job::JobFile;
use pdf_redaction::config::merged::MergedConfig;
use pdf_redaction::config::settings::Settings;
use pdf_redaction::detect::DetectionSource;
use pdf_redaction::error::ErrorKind;
use pdf_redaction::ocr::OcrPage;
use pdf_redaction::pdf::reader::PdfReader;
use pdf_redaction::pipeline::job_runner::{JobConfig, redact_document};
use pdf_redaction::render::{PageSize, TextRun};

const PAGE: PageSize = PageSize {
    width: 200.0,
    height: 100.0,
};

fn job_config(job_yaml: &str) -> JobConfig {
    let file: JobFile = serde_yml::from_str(job_yaml).expect("job yaml should parse");
    let job = file.jobs.into_iter().next().expect("one job");
    let merged = MergedConfig::new(&Settings::default(), &job).expect("merge");
    JobConfig {
        input_paths: vec![PathBuf::from("in.pdf")],
        output_path: PathBuf::from("out.pdf"),
        pages: job.pages.clone(),
        patterns: job.patterns.clone(),
        boxes: job.boxes.clone(),
        merged,
    }
}

fn text_page(text: &str) -> FakePage {
    FakePage::with_runs(PAGE, vec![TextRun::at(text, 10.0, 50.0, 110.0, 10.0)])
}

// ============================================================
// 1. manual boxes
// ============================================================

#[test]
fn test_manual_boxes_without_detection() {
    let config = job_config(
        r#"
jobs:
  - input: in.pdf
    output: out.pdf
    detect: false
    boxes:
      - { page: 1, x: 10, y: 10, width: 50, height: 20 }
      - { page: 2, x: 0, y: 0, width: 30, height: 30 }
"#,
    );
    let renderer = FakeRenderer::new(vec![FakePage::blank(PAGE), FakePage::blank(PAGE)]);

    let out = redact_document(&renderer, &config, unavailable_ocr()).unwrap();

    assert_eq!(out.masks, 2);
    assert_eq!(out.pages_exported, 2);
    assert!(out.detection.is_none());
    assert_eq!(PdfReader::from_bytes(&out.bytes).unwrap().page_count(), 2);
}

#[test]
fn test_box_on_missing_page_fails_job() {
    let config = job_config(
        "jobs:\n  - input: a.pdf\n    output: b.pdf\n    detect: false\n    boxes:\n      - { page: 3, x: 0, y: 0, width: 10, height: 10 }\n",
    );
    let renderer = FakeRenderer::new(vec![FakePage::blank(PAGE)]);

    let err = redact_document(&renderer, &config, unavailable_ocr()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

// ============================================================
// 2. detection
// ============================================================

#[test]
fn test_job_detects_with_default_patterns() {
    let config = job_config("jobs:\n  - input: a.pdf\n    output: b.pdf\n");
    let renderer = FakeRenderer::new(vec![text_page("tel 010-1234-5678"), text_page("nothing")]);

    let out = redact_document(&renderer, &config, unavailable_ocr()).unwrap();

    let report = out.detection.expect("detection ran");
    assert_eq!(report.masks_added(), 1);
    assert_eq!(report.pages[0].source, Some(DetectionSource::TextLayer));
    assert_eq!(out.masks, 1);
}

#[test]
fn test_job_custom_patterns_replace_defaults() {
    let config = job_config(
        "jobs:\n  - input: a.pdf\n    output: b.pdf\n    patterns:\n      code: 'ZX-\\d{4}'\n",
    );
    let renderer = FakeRenderer::new(vec![text_page("010-1234-5678 ZX-9981")]);

    let out = redact_document(&renderer, &config, unavailable_ocr()).unwrap();
    assert_eq!(out.detection.unwrap().masks_added(), 1, "only the custom pattern applies");
}

#[test]
fn test_job_rejects_bad_pattern() {
    let config = job_config("jobs:\n  - input: a.pdf\n    output: b.pdf\n    patterns:\n      bad: '('\n");
    let renderer = FakeRenderer::new(vec![FakePage::blank(PAGE)]);

    let err = redact_document(&renderer, &config, unavailable_ocr()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn test_job_ocr_failure_is_reported_not_fatal() {
    let config = job_config("jobs:\n  - input: a.pdf\n    output: b.pdf\n");
    let renderer = FakeRenderer::new(vec![FakePage::blank(PAGE), text_page("01012345678")]);

    let out = redact_document(&renderer, &config, unavailable_ocr()).unwrap();

    let report = out.detection.unwrap();
    assert_eq!(report.failed_pages().count(), 1);
    assert_eq!(out.masks, 1);
    assert_eq!(out.pages_exported, 2);
}

#[test]
fn test_job_shuts_down_ocr_worker() {
    let config = job_config("jobs:\n  - input: a.pdf\n    output: b.pdf\n    force_ocr: true\n");
    let renderer = FakeRenderer::new(vec![FakePage::blank(PAGE)]);
    let (ocr, stats) = scripted_ocr(OcrPage::default());

    redact_document(&renderer, &config, ocr).unwrap();

    assert_eq!(stats.created(), 1);
    assert_eq!(stats.shutdowns(), 1);
}

// ============================================================
// 3. page selection
// ============================================================

#[test]
fn test_job_exports_selected_pages_only() {
    let config = job_config(
        "jobs:\n  - input: a.pdf\n    output: b.pdf\n    detect: false\n    pages: '3,1'\n",
    );
    let renderer = FakeRenderer::new(vec![
        FakePage::blank(PAGE),
        FakePage::blank(PAGE),
        FakePage::blank(PAGE),
    ]);

    let out = redact_document(&renderer, &config, unavailable_ocr()).unwrap();
    assert_eq!(out.pages_exported, 2);
    let rendered: Vec<u32> = renderer.renders.lock().unwrap().iter().map(|r| r.0).collect();
    assert_eq!(rendered, vec![1, 3]);
}

#[test]
fn test_job_rejects_out_of_range_selection() {
    let config = job_config(
        "jobs:\n  - input: a.pdf\n    output: b.pdf\n    detect: false\n    pages: '2-4'\n",
    );
    let renderer = FakeRenderer::new(vec![FakePage::blank(PAGE), FakePage::blank(PAGE)]);

    let err = redact_document(&renderer, &config, unavailable_ocr()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}
