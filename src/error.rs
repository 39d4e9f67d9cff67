use thiserror::Error;

#[derive(Debug, Error)]
pub enum RedactError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("PDF read error: {0}")]
    PdfReadError(String),

    #[error("PDF write error: {0}")]
    PdfWriteError(String),

    #[error("Render error: {0}")]
    RenderError(String),

    #[error("OCR error: {0}")]
    OcrError(String),

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("Preference store error: {0}")]
    StoreError(String),

    #[error("Save error: {0}")]
    SaveError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Coarse classification used by hosts to decide how to surface a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad user input. Raised before any mutation.
    Validation,
    /// A rendering or OCR collaborator failed or is missing. The page is skipped.
    CollaboratorUnavailable,
    /// Filesystem, save dialog or persistent store failure.
    Io,
    /// Malformed input or output document.
    Document,
}

impl RedactError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ValidationError(_) | Self::ConfigError(_) => ErrorKind::Validation,
            Self::RenderError(_) | Self::OcrError(_) => ErrorKind::CollaboratorUnavailable,
            Self::SaveError(_) | Self::StoreError(_) | Self::IoError(_) => ErrorKind::Io,
            Self::PdfReadError(_) | Self::PdfWriteError(_) | Self::ImageError(_) => {
                ErrorKind::Document
            }
        }
    }
}

/// Generates factory methods for [`RedactError`] variants that wrap a `String`.
macro_rules! error_constructors {
    ($(
        $(#[doc = $doc:expr])*
        $method:ident => $variant:ident
    ),* $(,)?) => {
        impl RedactError {
            $(
                $(#[doc = $doc])*
                pub fn $method(msg: impl Into<String>) -> Self {
                    Self::$variant(msg.into())
                }
            )*
        }
    };
}

error_constructors! {
    /// Create a validation error.
    validation => ValidationError,
    /// Create a configuration error.
    config => ConfigError,
    /// Create a PDF read error.
    pdf_read => PdfReadError,
    /// Create a PDF write error.
    pdf_write => PdfWriteError,
    /// Create a render error.
    render => RenderError,
    /// Create an OCR error.
    ocr => OcrError,
    /// Create an image error.
    image => ImageError,
    /// Create a preference store error.
    store => StoreError,
    /// Create a save error.
    save => SaveError,
}

impl From<lopdf::Error> for RedactError {
    fn from(e: lopdf::Error) -> Self {
        Self::PdfReadError(e.to_string())
    }
}

impl From<serde_json::Error> for RedactError {
    fn from(e: serde_json::Error) -> Self {
        Self::StoreError(e.to_string())
    }
}

impl From<serde_yml::Error> for RedactError {
    fn from(e: serde_yml::Error) -> Self {
        Self::ConfigError(e.to_string())
    }
}

impl From<regex::Error> for RedactError {
    fn from(e: regex::Error) -> Self {
        Self::ValidationError(e.to_string())
    }
}

#[cfg(feature = "pdfium")]
impl From<pdfium_render::prelude::PdfiumError> for RedactError {
    fn from(e: pdfium_render::prelude::PdfiumError) -> Self {
        Self::RenderError(e.to_string())
    }
}

impl From<image::ImageError> for RedactError {
    fn from(e: image::ImageError) -> Self {
        Self::ImageError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RedactError>;
