// Phase 5: OCR detection: match recognised lines, union the covered word boxes

use super::PatternSet;
use crate::ocr::{OcrLine, OcrPage, PixelBox};

/// Boxes (OCR raster pixels) covering every match in every recognised line.
pub fn match_page(page: &OcrPage, patterns: &PatternSet) -> Vec<PixelBox> {
    page.lines()
        .flat_map(|line| match_line(line, patterns))
        .collect()
}

/// Match one line with spaces removed, mapping each match back to the words
/// it falls in.
pub fn match_line(line: &OcrLine, patterns: &PatternSet) -> Vec<PixelBox> {
    let words: Vec<String> = line
        .words
        .iter()
        .map(|w| w.text.chars().filter(|c| !c.is_whitespace()).collect())
        .collect();
    let lengths: Vec<usize> = words.iter().map(|w| w.chars().count()).collect();
    let text: String = words.concat();
    if text.is_empty() {
        return Vec::new();
    }

    patterns
        .find_spans(&text)
        .into_iter()
        .filter_map(|(start, end)| {
            let (first, last) = covering_words(&lengths, start, end)?;
            line.words[first..=last]
                .iter()
                .map(|w| w.bbox)
                .reduce(|a, b| a.union(&b))
        })
        .collect()
}

/// Indices of the first and last word whose character range intersects
/// `[start, end)`, walking cumulative word lengths.
fn covering_words(lengths: &[usize], start: usize, end: usize) -> Option<(usize, usize)> {
    let mut offset = 0;
    let mut first = None;
    for (i, &len) in lengths.iter().enumerate() {
        let word_end = offset + len;
        if len > 0 {
            if first.is_none() && start < word_end {
                first = Some(i);
            }
            if let Some(f) = first
                && end <= word_end
            {
                return Some((f, i));
            }
        }
        offset = word_end;
    }
    first.map(|f| (f, lengths.len() - 1))
}
