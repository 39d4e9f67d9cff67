// Phase 3: 取り消し可能なマスクストア操作

use crate::mask::store::{MaskStore, PageSnapshot};
use crate::mask::{Mask, Removed};

/// マスクストアに対する取り消し可能な編集1件。
///
/// 各バリアントは自身を逆適用するのに必要な情報だけを持つ。
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Add { mask: Mask },
    Delete { page: u32, removed: Vec<Removed> },
    ClearPage { page: u32, removed: Vec<Removed> },
    ClearOcr { page: u32, removed: Vec<Removed> },
    ClearAll { snapshot: PageSnapshot },
}

impl Action {
    /// 元の操作をそのまま再適用する。
    pub fn apply(&self, store: &mut MaskStore) {
        match self {
            Action::Add { mask } => store.push(mask.clone()),
            Action::Delete { page, removed }
            | Action::ClearPage { page, removed }
            | Action::ClearOcr { page, removed } => store.remove_all(*page, removed),
            Action::ClearAll { .. } => {
                store.clear_all();
            }
        }
    }

    /// 操作を逆適用する。
    pub fn revert(&self, store: &mut MaskStore) {
        match self {
            Action::Add { mask } => {
                store.remove_by_id(mask.page, &mask.id);
            }
            Action::Delete { page, removed }
            | Action::ClearPage { page, removed }
            | Action::ClearOcr { page, removed } => store.restore(*page, removed),
            Action::ClearAll { snapshot } => store.replace_all(snapshot.clone()),
        }
    }

    /// 操作対象のページ。文書全体への操作なら `None`。
    pub fn page(&self) -> Option<u32> {
        match self {
            Action::Add { mask } => Some(mask.page),
            Action::Delete { page, .. }
            | Action::ClearPage { page, .. }
            | Action::ClearOcr { page, .. } => Some(*page),
            Action::ClearAll { .. } => None,
        }
    }
}
