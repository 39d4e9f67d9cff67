// Phase 5: text-layer detection: runs -> lines -> matched raster rectangles

use std::cmp::Ordering;

use super::PatternSet;
use crate::mask::Rect;
use crate::render::TextRun;

/// Group runs into lines by baseline.
///
/// Runs are ordered top-down, and a run joins the current line when its
/// baseline is within `tolerance` of the line's first run. Each line is then
/// ordered left to right.
pub fn group_lines(runs: &[TextRun], tolerance: f64) -> Vec<Vec<&TextRun>> {
    let mut sorted: Vec<&TextRun> = runs.iter().collect();
    sorted.sort_by(|a, b| {
        b.origin_y()
            .partial_cmp(&a.origin_y())
            .unwrap_or(Ordering::Equal)
            .then(a.origin_x().partial_cmp(&b.origin_x()).unwrap_or(Ordering::Equal))
    });

    let mut lines: Vec<Vec<&TextRun>> = Vec::new();
    for run in sorted {
        match lines.last_mut() {
            Some(line) if (line[0].origin_y() - run.origin_y()).abs() < tolerance => {
                line.push(run)
            }
            _ => lines.push(vec![run]),
        }
    }

    for line in &mut lines {
        line.sort_by(|a, b| {
            a.origin_x()
                .partial_cmp(&b.origin_x())
                .unwrap_or(Ordering::Equal)
        });
    }
    lines
}

/// Match `patterns` against text runs and return raster rectangles.
///
/// Spaces are stripped before matching. Glyph advances are approximated as
/// `run.width / run.char_count` (every character equally wide), so the
/// rectangle for a match spans its character range within each run it
/// touches. Page space is bottom-left origin in points; the result is
/// top-left origin at `scale` on a canvas `page_height * scale` tall.
pub fn match_runs(
    runs: &[TextRun],
    patterns: &PatternSet,
    page_height: f64,
    scale: f64,
    group: Option<f64>,
) -> Vec<Rect> {
    let lines: Vec<Vec<&TextRun>> = match group {
        Some(tolerance) => group_lines(runs, tolerance),
        None => runs.iter().map(|r| vec![r]).collect(),
    };

    let canvas_height = page_height * scale;
    let mut rects = Vec::new();

    for line in lines {
        // Stripped text plus, per stripped char, (run index, char index in run).
        let mut stripped = String::new();
        let mut origin: Vec<(usize, usize)> = Vec::new();
        for (run_idx, run) in line.iter().enumerate() {
            for (char_idx, c) in run.text.chars().enumerate() {
                if c.is_whitespace() {
                    continue;
                }
                stripped.push(c);
                origin.push((run_idx, char_idx));
            }
        }
        if stripped.is_empty() {
            continue;
        }

        for (start, end) in patterns.find_spans(&stripped) {
            if let Some(page_rect) = span_rect(&line, &origin[start..end]) {
                rects.push(to_raster(&page_rect, canvas_height, scale));
            }
        }
    }
    rects
}

/// Page-space rectangle (x0, y0, x1, y1) covering the given characters.
fn span_rect(line: &[&TextRun], chars: &[(usize, usize)]) -> Option<(f64, f64, f64, f64)> {
    let mut acc: Option<(f64, f64, f64, f64)> = None;

    let mut i = 0;
    while i < chars.len() {
        let run_idx = chars[i].0;
        let first = chars[i].1;
        let mut last = first;
        while i < chars.len() && chars[i].0 == run_idx {
            last = chars[i].1;
            i += 1;
        }

        let run = line[run_idx];
        let len = run.text.chars().count();
        if len == 0 {
            continue;
        }
        let char_width = run.width / len as f64;
        let x0 = run.origin_x() + char_width * first as f64;
        let x1 = run.origin_x() + char_width * (last + 1) as f64;
        let y0 = run.origin_y();
        let y1 = run.origin_y() + run.height;

        acc = Some(match acc {
            None => (x0, y0, x1, y1),
            Some((ax0, ay0, ax1, ay1)) => (ax0.min(x0), ay0.min(y0), ax1.max(x1), ay1.max(y1)),
        });
    }
    acc
}

fn to_raster(page: &(f64, f64, f64, f64), canvas_height: f64, scale: f64) -> Rect {
    let (x0, y0, x1, y1) = *page;
    Rect::new(
        x0 * scale,
        canvas_height - y1 * scale,
        (x1 - x0) * scale,
        (y1 - y0) * scale,
    )
}
