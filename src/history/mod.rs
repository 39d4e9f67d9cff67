// Phase 3: 操作ログ: タスク、上限付き undo/redo スタック

pub mod action;

use std::collections::VecDeque;

use tracing::debug;

pub use action::Action;

use crate::mask::store::MaskStore;

/// undo スタックに保持するタスク数のデフォルト。
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// `end_task` 境界間のアクション列。undo/redo の単位。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Task {
    pub actions: Vec<Action>,
}

impl Task {
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// undo/redo 履歴。
///
/// アクションは [`History::end_task`] で1つの [`Task`] にまとめられるまで
/// 保留バッファに溜まる。タスクを積むと redo スタックは空になる。
/// undo スタックが上限を超えたら最も古いタスクを捨てる。
#[derive(Debug)]
pub struct History {
    undo: VecDeque<Task>,
    redo: Vec<Task>,
    pending: Vec<Action>,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            pending: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// 適用済みのアクションを開いているタスクに追加する。
    pub fn record(&mut self, action: Action) {
        self.pending.push(action);
    }

    /// 開いているタスクを閉じる。何も記録されていなければ `false`。
    pub fn end_task(&mut self) -> bool {
        if self.pending.is_empty() {
            return false;
        }
        let task = Task {
            actions: std::mem::take(&mut self.pending),
        };
        debug!(actions = task.len(), "task committed");
        self.undo.push_back(task);
        if self.undo.len() > self.limit {
            self.undo.pop_front();
            debug!(limit = self.limit, "oldest task evicted from history");
        }
        self.redo.clear();
        true
    }

    /// 保留中のアクションを `store` に対して取り消し、破棄する。
    pub fn discard_pending(&mut self, store: &mut MaskStore) {
        for action in self.pending.drain(..).rev() {
            action.revert(store);
        }
    }

    /// 直近のタスクを取り消す。開いているタスクは先に閉じる。
    ///
    /// 取り消したタスクを返す。取り消すものがなければ `None`。
    pub fn undo(&mut self, store: &mut MaskStore) -> Option<&Task> {
        self.end_task();
        let task = self.undo.pop_back()?;
        for action in task.actions.iter().rev() {
            action.revert(store);
        }
        self.redo.push(task);
        self.redo.last()
    }

    /// 直近に取り消したタスクを再適用する。
    pub fn redo(&mut self, store: &mut MaskStore) -> Option<&Task> {
        let task = self.redo.pop()?;
        for action in &task.actions {
            action.apply(store);
        }
        self.undo.push_back(task);
        self.undo.back()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty() || !self.pending.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// 履歴をすべて破棄する（新規文書）。
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
        self.pending.clear();
    }
}
