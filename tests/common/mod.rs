// Shared test doubles: in-memory renderer, scripted OCR engine, lopdf fixtures
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use image::{DynamicImage, Rgba, RgbaImage};
use lopdf::{Document, Object, Stream, dictionary};

use pdf_redaction::error::RedactError;
use pdf_redaction::ocr::{OcrEngine, OcrEngineFactory, OcrPage};
use pdf_redaction::render::{PageRenderer, PageSize, TextRun};

pub const LETTER: PageSize = PageSize {
    width: 612.0,
    height: 792.0,
};

/// Fills a freshly rendered page.
pub type Painter = fn(&mut RgbaImage);

#[derive(Clone)]
pub struct FakePage {
    pub size: PageSize,
    pub runs: Vec<TextRun>,
    pub painter: Option<Painter>,
    pub fail: bool,
}

impl FakePage {
    pub fn blank(size: PageSize) -> Self {
        Self {
            size,
            runs: Vec::new(),
            painter: None,
            fail: false,
        }
    }

    pub fn with_runs(size: PageSize, runs: Vec<TextRun>) -> Self {
        Self {
            runs,
            ..Self::blank(size)
        }
    }
}

/// Renderer over scripted pages. Blank pages render white.
pub struct FakeRenderer {
    pub pages: Vec<FakePage>,
    pub renders: Mutex<Vec<(u32, f64)>>,
}

impl FakeRenderer {
    pub fn new(pages: Vec<FakePage>) -> Self {
        Self {
            pages,
            renders: Mutex::new(Vec::new()),
        }
    }

    fn page(&self, page: u32) -> pdf_redaction::error::Result<&FakePage> {
        page.checked_sub(1)
            .and_then(|i| self.pages.get(i as usize))
            .ok_or_else(|| RedactError::validation(format!("no page {page}")))
    }
}

impl PageRenderer for FakeRenderer {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page_size(&self, page: u32) -> pdf_redaction::error::Result<PageSize> {
        Ok(self.page(page)?.size)
    }

    fn render(&self, page: u32, scale: f64) -> pdf_redaction::error::Result<RgbaImage> {
        let p = self.page(page)?;
        if p.fail {
            return Err(RedactError::render(format!("page {page} cannot be rendered")));
        }
        self.renders.lock().unwrap().push((page, scale));
        let (w, h) = p.size.pixels(scale);
        let mut image = RgbaImage::from_pixel(w, h, Rgba([255, 255, 255, 255]));
        if let Some(painter) = p.painter {
            painter(&mut image);
        }
        Ok(image)
    }

    fn text_runs(&self, page: u32) -> pdf_redaction::error::Result<Vec<TextRun>> {
        Ok(self.page(page)?.runs.clone())
    }
}

/// Counters shared between a scripted OCR factory and the test.
#[derive(Default)]
pub struct OcrStats {
    pub created: AtomicUsize,
    pub calls: AtomicUsize,
    pub shutdowns: AtomicUsize,
}

impl OcrStats {
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn shutdowns(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }
}

struct ScriptedOcr {
    result: OcrPage,
    stats: Arc<OcrStats>,
}

impl OcrEngine for ScriptedOcr {
    fn recognize(&mut self, _image: &DynamicImage) -> pdf_redaction::error::Result<OcrPage> {
        self.stats.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.result.clone())
    }

    fn shutdown(&mut self) {
        self.stats.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}

/// Factory whose engines always return `result`.
pub fn scripted_ocr(result: OcrPage) -> (Box<dyn OcrEngineFactory>, Arc<OcrStats>) {
    let stats = Arc::new(OcrStats::default());
    let shared = Arc::clone(&stats);
    let factory = move || -> pdf_redaction::error::Result<Box<dyn OcrEngine>> {
        shared.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedOcr {
            result: result.clone(),
            stats: Arc::clone(&shared),
        }))
    };
    (Box::new(factory), stats)
}

/// Factory that can never start an engine.
pub fn unavailable_ocr() -> Box<dyn OcrEngineFactory> {
    Box::new(|| -> pdf_redaction::error::Result<Box<dyn OcrEngine>> {
        Err(RedactError::ocr("no OCR engine installed"))
    })
}

/// Minimal `page_count`-page PDF with the given MediaBox on every page.
pub fn create_test_document(page_count: usize, width: i64, height: i64) -> Document {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let mut kids = Vec::new();
    for _ in 0..page_count {
        let contents_id = doc.add_object(Stream::new(dictionary! {}, vec![]));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(width),
                Object::Integer(height),
            ],
            "Contents" => contents_id,
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count as i64,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc
}

pub fn document_bytes(mut doc: Document) -> Vec<u8> {
    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("save test document");
    buf
}
