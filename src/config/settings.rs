use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::history::DEFAULT_HISTORY_LIMIT;

/// How blurred masks are softened at export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlurMethod {
    /// Gaussian blur with sigma proportional to the mask height.
    #[default]
    Gaussian,
    /// Shrink then enlarge the region; cheaper, coarser.
    Downsample,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    pub binary: String,
    pub lang: String,
    pub psm: u8,
    pub oem: u8,
    pub tessdata_dir: Option<PathBuf>,
}

impl Default for OcrSettings {
    fn default() -> Self {
        OcrSettings {
            binary: "tesseract".to_string(),
            lang: "eng+kor".to_string(),
            psm: 3,
            oem: 1,
            tessdata_dir: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Render scale of the interactive canvas; mask coordinates live here.
    pub interactive_scale: f64,
    /// Render scale of exported rasters.
    pub export_scale: f64,
    /// Render scale used for OCR rasters.
    pub ocr_scale: f64,
    pub history_limit: usize,
    /// Fill colour for new masks, `#rgb` or `#rrggbb`.
    pub color: String,
    pub blur: bool,
    pub blur_method: BlurMethod,
    pub force_ocr: bool,
    pub preprocess: bool,
    pub group_lines: bool,
    pub line_tolerance: f64,
    pub ocr: OcrSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            interactive_scale: 2.0,
            export_scale: 3.0,
            ocr_scale: 3.0,
            history_limit: DEFAULT_HISTORY_LIMIT,
            color: "#000000".to_string(),
            blur: false,
            blur_method: BlurMethod::Gaussian,
            force_ocr: false,
            preprocess: true,
            group_lines: true,
            line_tolerance: 2.0,
            ocr: OcrSettings::default(),
        }
    }
}

impl Settings {
    pub fn from_yaml(yaml: &str) -> crate::error::Result<Self> {
        let settings: Settings = serde_yml::from_str(yaml).map_err(|e| {
            crate::error::RedactError::config(format!("Failed to parse settings YAML: {e}"))
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Reject values that would make the engine misbehave.
    pub fn validate(&self) -> crate::error::Result<()> {
        for (name, value) in [
            ("interactive_scale", self.interactive_scale),
            ("export_scale", self.export_scale),
            ("ocr_scale", self.ocr_scale),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(crate::error::RedactError::config(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        if self.history_limit == 0 {
            return Err(crate::error::RedactError::config(
                "history_limit must be at least 1",
            ));
        }
        if !(self.line_tolerance.is_finite() && self.line_tolerance >= 0.0) {
            return Err(crate::error::RedactError::config(
                "line_tolerance must be non-negative",
            ));
        }
        crate::mask::Rgb::from_hex(&self.color)
            .map_err(|e| crate::error::RedactError::config(e.to_string()))?;
        Ok(())
    }
}
