// Phase 13: persisted preferences (redaction colour, saved patterns)

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::detect::{DEFAULT_PATTERNS, PatternSet};
use crate::error::RedactError;
use crate::mask::Rgb;

/// Key holding the redaction colour; every other key is a pattern.
pub const COLOR_KEY: &str = "color";

/// Durable string key-value storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> crate::error::Result<()>;
    fn delete(&mut self, key: &str) -> crate::error::Result<()>;
    fn clear(&mut self) -> crate::error::Result<()>;
    fn entries(&self) -> Vec<(String, String)>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> crate::error::Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&mut self, key: &str) -> crate::error::Result<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn clear(&mut self) -> crate::error::Result<()> {
        self.entries.clear();
        Ok(())
    }

    fn entries(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// A JSON object on disk, rewritten after every change.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl JsonFileStore {
    /// Open `path`, starting empty when the file does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> crate::error::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> crate::error::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> crate::error::Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn delete(&mut self, key: &str) -> crate::error::Result<()> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }

    fn clear(&mut self) -> crate::error::Result<()> {
        self.entries.clear();
        self.flush()
    }

    fn entries(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// Typed view over a [`KeyValueStore`].
pub struct Preferences<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> Preferences<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Seed the built-in patterns when the store holds no patterns yet.
    pub fn seed_defaults(&mut self) -> crate::error::Result<()> {
        if self.store.entries().iter().any(|(k, _)| k != COLOR_KEY) {
            return Ok(());
        }
        for (name, pattern) in DEFAULT_PATTERNS {
            self.store.set(name, pattern)?;
        }
        Ok(())
    }

    /// Saved colour; black when absent or unreadable.
    pub fn color(&self) -> Rgb {
        match self.store.get(COLOR_KEY) {
            Some(hex) => Rgb::from_hex(&hex).unwrap_or_else(|e| {
                warn!(error = %e, "stored colour unreadable, using black");
                Rgb::BLACK
            }),
            None => Rgb::BLACK,
        }
    }

    pub fn set_color(&mut self, color: Rgb) -> crate::error::Result<()> {
        self.store.set(COLOR_KEY, &color.to_hex())
    }

    /// Saved `(name, pattern)` pairs, by name.
    pub fn patterns(&self) -> Vec<(String, String)> {
        self.store
            .entries()
            .into_iter()
            .filter(|(k, _)| k != COLOR_KEY)
            .collect()
    }

    /// Compile the saved patterns. Bad entries are skipped with a warning.
    pub fn pattern_set(&self) -> PatternSet {
        let mut set = PatternSet::new();
        for (name, pattern) in self.patterns() {
            if let Err(e) = set.insert(name.as_str(), &pattern) {
                warn!(pattern = %name, error = %e, "skipping stored pattern");
            }
        }
        set
    }

    /// Validate then store a pattern.
    pub fn save_pattern(&mut self, name: &str, pattern: &str) -> crate::error::Result<()> {
        PatternSet::new().insert(name, pattern)?;
        self.store.set(name, pattern)
    }

    pub fn delete_pattern(&mut self, name: &str) -> crate::error::Result<()> {
        if name == COLOR_KEY {
            return Err(RedactError::validation(format!(
                "'{COLOR_KEY}' is not a pattern"
            )));
        }
        self.store.delete(name)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }
}
