// Phase 5: detection: pattern sets, options and run reports

pub mod engine;
pub mod ocr_match;
pub mod text_layer;

use regex::Regex;
use tracing::debug;

use crate::error::RedactError;
use crate::prefs::COLOR_KEY;

/// Built-in patterns seeded into a fresh preference store.
pub const DEFAULT_PATTERNS: &[(&str, &str)] = &[
    (
        "resident_registration_number",
        r"\d{2}(0\d|1[0-2])(0[1-9]|[12]\d|3[01])-?[1-4]\d{6}",
    ),
    ("phone_number", r"0\d{1,2}-?\d{3,4}-?\d{4}"),
];

/// A named, compiled detection pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
    name: String,
    regex: Regex,
}

impl Pattern {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &str {
        self.regex.as_str()
    }
}

/// Compiled patterns, applied in insertion order.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<Pattern>,
}

impl PatternSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile every `(name, pattern)` pair, failing on the first bad one.
    pub fn compile<I, N, P>(entries: I) -> crate::error::Result<Self>
    where
        I: IntoIterator<Item = (N, P)>,
        N: Into<String>,
        P: AsRef<str>,
    {
        let mut set = Self::new();
        for (name, pattern) in entries {
            set.insert(name, pattern.as_ref())?;
        }
        Ok(set)
    }

    pub fn defaults() -> Self {
        let patterns = DEFAULT_PATTERNS
            .iter()
            .filter_map(|(name, source)| {
                Regex::new(source).ok().map(|regex| Pattern {
                    name: (*name).to_string(),
                    regex,
                })
            })
            .collect();
        Self { patterns }
    }

    /// Validate and add a pattern, replacing one with the same name.
    pub fn insert(&mut self, name: impl Into<String>, pattern: &str) -> crate::error::Result<()> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(RedactError::validation("Pattern name cannot be empty"));
        }
        if name == COLOR_KEY {
            return Err(RedactError::validation(format!(
                "'{COLOR_KEY}' is reserved and cannot name a pattern"
            )));
        }
        if pattern.trim().is_empty() {
            return Err(RedactError::validation(format!(
                "Pattern '{name}' is empty"
            )));
        }
        let regex = Regex::new(pattern).map_err(|e| {
            RedactError::validation(format!("Pattern '{name}' does not compile: {e}"))
        })?;

        match self.patterns.iter_mut().find(|p| p.name == name) {
            Some(existing) => existing.regex = regex,
            None => self.patterns.push(Pattern { name, regex }),
        }
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.patterns.len();
        self.patterns.retain(|p| p.name != name);
        self.patterns.len() != before
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pattern> {
        self.patterns.iter()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Character-index spans `[start, end)` of every non-empty match of every
    /// pattern in `text`.
    pub fn find_spans(&self, text: &str) -> Vec<(usize, usize)> {
        let char_starts: Vec<usize> = text.char_indices().map(|(b, _)| b).collect();
        let to_char = |byte: usize| char_starts.partition_point(|&b| b < byte);

        let mut spans = Vec::new();
        for pattern in &self.patterns {
            for m in pattern.regex.find_iter(text) {
                if m.start() == m.end() {
                    continue;
                }
                // Never log the matched text itself.
                debug!(pattern = %pattern.name, len = m.len(), "pattern matched");
                spans.push((to_char(m.start()), to_char(m.end())));
            }
        }
        spans
    }
}

/// Knobs for the detection run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionOptions {
    /// Scale of the canvas that mask coordinates refer to.
    pub interactive_scale: f64,
    /// Scale pages are rasterised at for OCR.
    pub ocr_scale: f64,
    /// Skip the text layer and always OCR.
    pub force_ocr: bool,
    /// Binarise rasters before OCR.
    pub preprocess: bool,
    /// Join text runs sharing a baseline before matching.
    pub group_lines: bool,
    /// Largest baseline difference (points) for runs on one line.
    pub line_tolerance: f64,
}

impl Default for DetectionOptions {
    fn default() -> Self {
        Self {
            interactive_scale: 2.0,
            ocr_scale: 3.0,
            force_ocr: false,
            preprocess: true,
            group_lines: true,
            line_tolerance: 2.0,
        }
    }
}

/// Which pages a run covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionTarget {
    Page(u32),
    All,
}

/// Where a page's matches came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionSource {
    TextLayer,
    Ocr,
    /// Neither a text layer nor recognisable text.
    Empty,
}

/// Reported before each page is processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectionProgress {
    pub page: u32,
    /// 1-based position within the run.
    pub position: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageOutcome {
    pub page: u32,
    pub source: Option<DetectionSource>,
    pub masks_added: usize,
    /// Set when the page was skipped.
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionReport {
    pub pages: Vec<PageOutcome>,
}

impl DetectionReport {
    pub fn masks_added(&self) -> usize {
        self.pages.iter().map(|p| p.masks_added).sum()
    }

    pub fn failed_pages(&self) -> impl Iterator<Item = &PageOutcome> {
        self.pages.iter().filter(|p| p.error.is_some())
    }
}
