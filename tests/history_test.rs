// Phase 3: action log tests (undo/redo round trips)

mod common;

use pdf_redaction::history::{Action, History};
use pdf_redaction::mask::store::MaskStore;
use pdf_redaction::mask::{Mask, MaskKind, MaskStyle, NewMask, Rect};
use pdf_redaction::session::{Session, SessionConfig};

fn session(pages: u32) -> Session {
    Session::new(pages, SessionConfig::default(), common::unavailable_ocr())
}

fn snapshot(session: &Session) -> Vec<Vec<Mask>> {
    (1..=session.page_count())
        .map(|p| session.page_masks(p).to_vec())
        .collect()
}

fn rect(x: f64, y: f64) -> Rect {
    Rect::new(x, y, 20.0, 20.0)
}

// ============================================================
// 1. round trips
// ============================================================

#[test]
fn test_undo_restores_exact_prior_state() {
    let mut s = session(2);
    s.add_mask(1, rect(0.0, 0.0), MaskKind::Box).unwrap();
    s.add_mask(1, rect(50.0, 0.0), MaskKind::Ocr).unwrap();
    s.add_mask(1, rect(100.0, 0.0), MaskKind::Box).unwrap();
    s.add_mask(2, rect(0.0, 0.0), MaskKind::Ocr).unwrap();
    s.end_task();
    let before = snapshot(&s);

    // Three tasks of mixed action types.
    s.delete_masks_in_rect(1, Rect::new(40.0, -10.0, 40.0, 40.0)).unwrap();
    s.end_task();
    s.clear_ocr(2).unwrap();
    s.add_mask(2, rect(300.0, 300.0), MaskKind::Box).unwrap();
    s.end_task();
    s.clear_all();
    s.end_task();
    assert!(s.store().is_empty());

    assert!(s.undo());
    assert!(s.undo());
    assert!(s.undo());

    assert_eq!(snapshot(&s), before, "ids and order must be restored");
}

#[test]
fn test_redo_after_undo_restores_pre_undo_state() {
    let mut s = session(1);
    s.add_mask(1, rect(0.0, 0.0), MaskKind::Box).unwrap();
    s.add_mask(1, rect(30.0, 0.0), MaskKind::Box).unwrap();
    s.end_task();
    s.clear_page(1).unwrap();
    s.add_mask(1, rect(60.0, 0.0), MaskKind::Ocr).unwrap();
    s.end_task();
    let after = snapshot(&s);

    s.undo();
    assert_ne!(snapshot(&s), after);
    s.redo();
    assert_eq!(snapshot(&s), after);
}

#[test]
fn test_undo_reverts_task_actions_in_reverse_order() {
    let mut s = session(1);
    s.add_mask(1, rect(0.0, 0.0), MaskKind::Ocr).unwrap();
    s.end_task();
    let before = snapshot(&s);

    // The same mask is removed then re-added in one task; reverse order matters.
    s.clear_ocr(1).unwrap();
    s.add_mask(1, rect(0.0, 0.0), MaskKind::Ocr).unwrap();
    s.clear_page(1).unwrap();
    s.end_task();

    s.undo();
    assert_eq!(snapshot(&s), before);
}

#[test]
fn test_new_task_discards_redo() {
    let mut s = session(1);
    s.add_mask(1, rect(0.0, 0.0), MaskKind::Box).unwrap();
    s.end_task();
    s.undo();
    assert!(s.can_redo());

    s.add_mask(1, rect(40.0, 0.0), MaskKind::Box).unwrap();
    s.end_task();
    let state = snapshot(&s);

    assert!(!s.can_redo());
    assert!(!s.redo(), "redo must be a no-op");
    assert_eq!(snapshot(&s), state);
}

#[test]
fn test_undo_redo_on_empty_stacks_are_noops() {
    let mut s = session(1);
    assert!(!s.undo());
    assert!(!s.redo());
    assert!(s.store().is_empty());
}

#[test]
fn test_end_task_without_actions_pushes_nothing() {
    let mut s = session(1);
    assert!(!s.end_task());
    assert_eq!(s.history().undo_len(), 0);
}

#[test]
fn test_undo_closes_open_task_first() {
    let mut s = session(1);
    s.add_mask(1, rect(0.0, 0.0), MaskKind::Box).unwrap();
    // No end_task: the open task is committed then undone.
    assert!(s.undo());
    assert!(s.store().is_empty());
    assert!(s.redo());
    assert_eq!(s.store().mask_count(), 1);
}

#[test]
fn test_undo_marks_page_for_redraw() {
    let mut s = session(1);
    s.take_redraw();
    s.add_mask(1, rect(0.0, 0.0), MaskKind::Box).unwrap();
    s.end_task();
    assert_eq!(s.take_redraw(), Some(1));
    assert_eq!(s.take_redraw(), None, "redraw is requested once");

    s.undo();
    assert_eq!(s.take_redraw(), Some(1));
}

// ============================================================
// 2. bounded history
// ============================================================

#[test]
fn test_history_evicts_oldest_task_past_limit() {
    let mut store = MaskStore::new();
    let mut history = History::new(3);

    for i in 0..5 {
        let mask = store.add_mask(
            1,
            NewMask {
                rect: rect(i as f64 * 30.0, 0.0),
                kind: MaskKind::Box,
                style: MaskStyle::default(),
            },
        );
        history.record(Action::Add { mask });
        history.end_task();
    }
    assert_eq!(history.undo_len(), 3);

    while history.undo(&mut store).is_some() {}
    // The two oldest adds fell off the stack and stay applied.
    assert_eq!(store.mask_count(), 2);
}

#[test]
fn test_discard_pending_reverts_buffer() {
    let mut store = MaskStore::new();
    let mut history = History::default();
    let mask = store.add_mask(
        1,
        NewMask {
            rect: rect(0.0, 0.0),
            kind: MaskKind::Ocr,
            style: MaskStyle::default(),
        },
    );
    history.record(Action::Add { mask });
    assert!(history.has_pending());

    history.discard_pending(&mut store);
    assert!(store.is_empty());
    assert!(!history.end_task());
}
