// Phase 7: OCR collaborator interface and recognition tree

pub mod preprocess;
pub mod tesseract;

use image::DynamicImage;

/// Pixel bounding box, `x0,y0` top-left and `x1,y1` bottom-right.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl PixelBox {
    pub fn union(&self, other: &PixelBox) -> PixelBox {
        PixelBox {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OcrWord {
    pub text: String,
    pub bbox: PixelBox,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OcrLine {
    pub words: Vec<OcrWord>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OcrParagraph {
    pub lines: Vec<OcrLine>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OcrBlock {
    pub paragraphs: Vec<OcrParagraph>,
}

/// Recognition result for one raster: block -> paragraph -> line -> word.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OcrPage {
    pub blocks: Vec<OcrBlock>,
}

impl OcrPage {
    pub fn lines(&self) -> impl Iterator<Item = &OcrLine> {
        self.blocks
            .iter()
            .flat_map(|b| b.paragraphs.iter())
            .flat_map(|p| p.lines.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.lines().all(|l| l.words.is_empty())
    }
}

/// A live OCR worker.
pub trait OcrEngine: Send {
    fn recognize(&mut self, image: &DynamicImage) -> crate::error::Result<OcrPage>;

    /// Release the worker. Called once when the owning session closes.
    fn shutdown(&mut self) {}
}

/// Creates OCR workers on first use.
pub trait OcrEngineFactory: Send {
    fn create(&self) -> crate::error::Result<Box<dyn OcrEngine>>;
}

impl<F> OcrEngineFactory for F
where
    F: Fn() -> crate::error::Result<Box<dyn OcrEngine>> + Send,
{
    fn create(&self) -> crate::error::Result<Box<dyn OcrEngine>> {
        self()
    }
}

/// Lazily created, reused OCR worker handle.
pub struct OcrSlot {
    factory: Box<dyn OcrEngineFactory>,
    engine: Option<Box<dyn OcrEngine>>,
}

impl OcrSlot {
    pub fn new(factory: Box<dyn OcrEngineFactory>) -> Self {
        Self {
            factory,
            engine: None,
        }
    }

    /// The worker, creating it on the first call.
    pub fn engine(&mut self) -> crate::error::Result<&mut (dyn OcrEngine + 'static)> {
        if self.engine.is_none() {
            tracing::info!("starting OCR worker");
            self.engine = Some(self.factory.create()?);
        }
        self.engine
            .as_deref_mut()
            .ok_or_else(|| crate::error::RedactError::ocr("OCR worker not initialized"))
    }

    pub fn is_running(&self) -> bool {
        self.engine.is_some()
    }

    pub fn shutdown(&mut self) {
        if let Some(mut engine) = self.engine.take() {
            tracing::info!("terminating OCR worker");
            engine.shutdown();
        }
    }
}

impl Drop for OcrSlot {
    fn drop(&mut self) {
        self.shutdown();
    }
}
