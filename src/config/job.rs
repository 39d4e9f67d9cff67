use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::RedactError;
use crate::export::PageSelection;

#[derive(Debug, Clone, Deserialize)]
pub struct JobFile {
    pub jobs: Vec<Job>,
}

/// 単一の入力ファイル、または順に結合する複数ファイル。
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum JobInput {
    One(String),
    Many(Vec<String>),
}

impl JobInput {
    pub fn paths(&self) -> Vec<&str> {
        match self {
            JobInput::One(p) => vec![p.as_str()],
            JobInput::Many(ps) => ps.iter().map(String::as_str).collect(),
        }
    }
}

/// 手動指定の墨消し矩形（PDFポイント、左上原点）。
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct BoxSpec {
    pub page: u32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Job {
    pub input: JobInput,
    pub output: String,
    /// 出力ページ。省略時は全ページ。
    #[serde(default, deserialize_with = "deserialize_selection")]
    pub pages: PageSelection,
    /// 名前付き検出パターン。省略時は組み込みセット。
    pub patterns: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub boxes: Vec<BoxSpec>,
    pub detect: Option<bool>,
    pub color: Option<String>,
    pub blur: Option<bool>,
    pub force_ocr: Option<bool>,
    pub export_scale: Option<f64>,
}

/// 1始まりのページ範囲（両端含む）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PageRange {
    pub start: u32,
    pub end: u32,
}

impl PageRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self {
            start: start.min(end),
            end: start.max(end),
        }
    }

    pub fn single(page: u32) -> Self {
        Self::new(page, page)
    }

    pub fn pages(&self) -> impl Iterator<Item = u32> {
        self.start..=self.end
    }
}

/// ページ範囲文字列をパースして、昇順・重なりなしの範囲リストに変換する。
///
/// 形式:
/// - 単一ページ: `"5"`
/// - 範囲: `"5-10"`（逆順の `"10-5"` は `"5-10"` として扱う）
/// - 混合（カンマ区切り）: `"1, 3, 5-10, 15"`
///
/// 空白は無視する。ページ番号は1始まりなので `0` はエラー。
/// ここでは範囲を展開しない。文書のページ数との照合は
/// `PageSelection::resolve` がページリストを作る前に行う。
pub fn parse_page_range(s: &str) -> crate::error::Result<Vec<PageRange>> {
    let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(RedactError::validation("Page range cannot be empty"));
    }

    let page_number = |text: &str| -> crate::error::Result<u32> {
        let page: u32 = text
            .parse()
            .map_err(|_| RedactError::validation(format!("Invalid page number: '{text}'")))?;
        if page == 0 {
            return Err(RedactError::validation("Page numbers start at 1"));
        }
        Ok(page)
    };

    let mut ranges = Vec::new();

    for part in compact.split(',') {
        if part.is_empty() {
            continue;
        }

        if let Some((start_str, end_str)) = part.split_once('-') {
            ranges.push(PageRange::new(page_number(start_str)?, page_number(end_str)?));
        } else {
            ranges.push(PageRange::single(page_number(part)?));
        }
    }

    if ranges.is_empty() {
        return Err(RedactError::validation("Page range resolved to empty set"));
    }

    // ソート後、重なる・隣接する範囲をまとめる
    ranges.sort_unstable();
    let mut merged: Vec<PageRange> = Vec::with_capacity(ranges.len());
    for r in ranges {
        match merged.last_mut() {
            Some(last) if r.start <= last.end.saturating_add(1) => {
                last.end = last.end.max(r.end);
            }
            _ => merged.push(r),
        }
    }
    Ok(merged)
}

/// `deserialize_with` 用のページ選択デシリアライザ。
fn deserialize_selection<'de, D>(deserializer: D) -> Result<PageSelection, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(serde::de::Error::custom)
}
