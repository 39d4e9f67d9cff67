pub mod config;
pub mod detect;
pub mod editor;
pub mod error;
pub mod export;
pub mod history;
pub mod mask;
pub mod ocr;
pub mod overlay;
pub mod pdf;
pub mod pipeline;
pub mod prefs;
pub mod render;
pub mod session;
