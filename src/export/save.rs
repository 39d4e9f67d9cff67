// Phase 10: file-save collaborator

use std::path::{Path, PathBuf};

use tracing::{info, warn};

/// Persists exported bytes somewhere the user chose.
pub trait FileSaver {
    /// Returns whether the bytes were saved.
    fn save(&mut self, bytes: &[u8], suggested_name: &str) -> bool;
}

/// Saves into a fixed directory under the suggested name.
#[derive(Debug, Clone)]
pub struct DirectorySaver {
    dir: PathBuf,
    last_saved: Option<PathBuf>,
}

impl DirectorySaver {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            last_saved: None,
        }
    }

    pub fn last_saved(&self) -> Option<&Path> {
        self.last_saved.as_deref()
    }
}

impl FileSaver for DirectorySaver {
    fn save(&mut self, bytes: &[u8], suggested_name: &str) -> bool {
        // Only the final path component is honoured.
        let Some(name) = Path::new(suggested_name).file_name() else {
            warn!(suggested_name, "refusing to save without a file name");
            return false;
        };
        let path = self.dir.join(name);
        match std::fs::write(&path, bytes) {
            Ok(()) => {
                info!(path = %path.display(), bytes = bytes.len(), "export saved");
                self.last_saved = Some(path);
                true
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "export save failed");
                false
            }
        }
    }
}

/// Default output name: `<stem>_redacted.pdf`.
pub fn suggested_file_name(input: &Path) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    format!("{stem}_redacted.pdf")
}
