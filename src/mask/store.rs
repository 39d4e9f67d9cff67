// Phase 2: マスクストア: ページごとの順序付きマスク集合

use std::collections::BTreeMap;

use super::{Mask, MaskKind, NewMask, Rect, Removed};

/// 全消去時に取る、全ページのマスクのスナップショット。
pub type PageSnapshot = BTreeMap<u32, Vec<Mask>>;

/// ページ番号 -> 挿入順（z順）のマスク。
///
/// 削除系メソッドは取り除いたマスクを元のインデックス付きで返す。
/// 操作ログはそれを使って元の位置に戻す。
#[derive(Debug, Default, Clone)]
pub struct MaskStore {
    pages: BTreeMap<u32, Vec<Mask>>,
    counter: u64,
}

impl MaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 全マスクを破棄し、IDカウンタを初期化する（新規文書）。
    pub fn reset(&mut self) {
        self.pages.clear();
        self.counter = 0;
    }

    /// `new` にIDを振って `page` の末尾に追加し、格納したマスクを返す。
    pub fn add_mask(&mut self, page: u32, new: NewMask) -> Mask {
        self.counter += 1;
        let mask = Mask {
            id: format!("mask-{page}-{}-{}", self.counter, new.kind),
            page,
            x: new.rect.x,
            y: new.rect.y,
            width: new.rect.width,
            height: new.rect.height,
            kind: new.kind,
            color: new.style.color,
            blur: new.style.blur,
        };
        self.pages.entry(page).or_default().push(mask.clone());
        mask
    }

    /// ID付きのマスクを末尾に再追加する。
    pub fn push(&mut self, mask: Mask) {
        self.pages.entry(mask.page).or_default().push(mask);
    }

    pub fn remove_by_id(&mut self, page: u32, id: &str) -> Option<Removed> {
        let masks = self.pages.get_mut(&page)?;
        let index = masks.iter().position(|m| m.id == id)?;
        let mask = masks.remove(index);
        if masks.is_empty() {
            self.pages.remove(&page);
        }
        Some(Removed { index, mask })
    }

    /// `page` 上で `rect` に完全に含まれるマスクを削除する。部分的な重なりは残す。
    pub fn delete_masks_in_rect(&mut self, page: u32, rect: &Rect) -> Vec<Removed> {
        self.remove_where(page, |m| rect.encloses(&m.rect()))
    }

    pub fn clear_page(&mut self, page: u32) -> Vec<Removed> {
        self.remove_where(page, |_| true)
    }

    pub fn clear_by_kind(&mut self, page: u32, kind: MaskKind) -> Vec<Removed> {
        self.remove_where(page, |m| m.kind == kind)
    }

    /// 全ページの全マスクを削除し、削除前の内容を返す。
    pub fn clear_all(&mut self) -> PageSnapshot {
        std::mem::take(&mut self.pages)
    }

    /// 削除したマスクを記録された位置に戻す。
    ///
    /// `removed` は削除系メソッドが返すとおりインデックス昇順であること。
    pub fn restore(&mut self, page: u32, removed: &[Removed]) {
        if removed.is_empty() {
            return;
        }
        let masks = self.pages.entry(page).or_default();
        for r in removed {
            let index = r.index.min(masks.len());
            masks.insert(index, r.mask.clone());
        }
    }

    /// `removed` に含まれるマスクをIDで削除する。
    pub fn remove_all(&mut self, page: u32, removed: &[Removed]) {
        for r in removed {
            self.remove_by_id(page, &r.mask.id);
        }
    }

    /// ストア全体を `snapshot` の内容で置き換える。
    pub fn replace_all(&mut self, snapshot: PageSnapshot) {
        self.pages = snapshot
            .into_iter()
            .filter(|(_, masks)| !masks.is_empty())
            .collect();
    }

    /// `page` のマスク（z順）。未知のページは空スライス。
    pub fn page_masks(&self, page: u32) -> &[Mask] {
        self.pages.get(&page).map(Vec::as_slice).unwrap_or(&[])
    }

    /// マスクを1つ以上持つページ（昇順）。
    pub fn pages(&self) -> impl Iterator<Item = u32> + '_ {
        self.pages.keys().copied()
    }

    pub fn mask_count(&self) -> usize {
        self.pages.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    fn remove_where<F>(&mut self, page: u32, mut pred: F) -> Vec<Removed>
    where
        F: FnMut(&Mask) -> bool,
    {
        let Some(masks) = self.pages.get_mut(&page) else {
            return Vec::new();
        };

        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(masks.len());
        for (index, mask) in masks.drain(..).enumerate() {
            if pred(&mask) {
                removed.push(Removed { index, mask });
            } else {
                kept.push(mask);
            }
        }
        *masks = kept;
        if masks.is_empty() {
            self.pages.remove(&page);
        }
        removed
    }
}
