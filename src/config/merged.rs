use super::job::Job;
use super::settings::{BlurMethod, OcrSettings, Settings};
use crate::detect::DetectionOptions;
use crate::mask::{MaskStyle, Rgb};

#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub interactive_scale: f64,
    pub export_scale: f64,
    pub ocr_scale: f64,
    pub history_limit: usize,
    pub style: MaskStyle,
    pub blur_method: BlurMethod,
    pub detect: bool,
    pub detection: DetectionOptions,
    pub ocr: OcrSettings,
}

impl MergedConfig {
    /// ジョブ側で指定された値は settings より優先する。
    pub fn new(settings: &Settings, job: &Job) -> crate::error::Result<Self> {
        let color = Rgb::from_hex(job.color.as_deref().unwrap_or(&settings.color))?;
        let export_scale = job.export_scale.unwrap_or(settings.export_scale);
        if !(export_scale.is_finite() && export_scale > 0.0) {
            return Err(crate::error::RedactError::config(format!(
                "export_scale must be a positive number, got {export_scale}"
            )));
        }

        Ok(MergedConfig {
            interactive_scale: settings.interactive_scale,
            export_scale,
            ocr_scale: settings.ocr_scale,
            history_limit: settings.history_limit,
            style: MaskStyle {
                color,
                blur: job.blur.unwrap_or(settings.blur),
            },
            blur_method: settings.blur_method,
            detect: job.detect.unwrap_or(true),
            detection: DetectionOptions {
                interactive_scale: settings.interactive_scale,
                ocr_scale: settings.ocr_scale,
                force_ocr: job.force_ocr.unwrap_or(settings.force_ocr),
                preprocess: settings.preprocess,
                group_lines: settings.group_lines,
                line_tolerance: settings.line_tolerance,
            },
            ocr: settings.ocr.clone(),
        })
    }
}
