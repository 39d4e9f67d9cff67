// Phase 1: 設定読込（ジョブファイル隣の settings.yaml）

pub mod job;
pub mod merged;
pub mod settings;

use std::path::{Path, PathBuf};

use tracing::debug;

use settings::Settings;

/// ジョブファイルの隣で探す設定ファイル名（この順）。
pub const SETTINGS_FILE_NAMES: &[&str] = &["settings.yaml", "settings.yml"];

/// `dir` 内で最初に見つかった設定ファイル。
pub fn find_settings_file(dir: &Path) -> Option<PathBuf> {
    SETTINGS_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// ジョブファイルに対応する設定。隣に設定ファイルがなければデフォルト値。
pub fn load_settings_for_job(job_file_path: &Path) -> crate::error::Result<Settings> {
    let dir = job_file_path
        .parent()
        .ok_or_else(|| crate::error::RedactError::config("Cannot determine job file directory"))?;

    match find_settings_file(dir) {
        Some(path) => {
            debug!(path = %path.display(), "loading settings");
            Settings::from_file(&path)
        }
        None => Ok(Settings::default()),
    }
}
