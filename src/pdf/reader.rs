use std::path::Path;

use lopdf::Document;

use crate::render::PageSize;

/// ページ辺の上限（14,400 pt = 200 インチ）。
const PDF_MAX_DIMENSION_PT: f64 = 14_400.0;

pub struct PdfReader {
    doc: Document,
}

impl PdfReader {
    pub fn open(path: impl AsRef<Path>) -> crate::error::Result<Self> {
        let doc = Document::load(path)?;
        Ok(Self { doc })
    }

    pub fn from_bytes(bytes: &[u8]) -> crate::error::Result<Self> {
        let doc = Document::load_mem(bytes)?;
        Ok(Self { doc })
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn into_document(self) -> Document {
        self.doc
    }

    pub fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    pub fn is_encrypted(&self) -> bool {
        self.doc.is_encrypted()
    }

    /// MediaBox からページサイズを取得する（1始まり）。
    /// `Parent` からの継承も辿る。
    pub fn page_size(&self, page_num: u32) -> crate::error::Result<PageSize> {
        let page_id = self.get_page_id(page_num)?;
        let media_box = inherited_attribute(&self.doc, page_id, b"MediaBox")
            .ok_or_else(|| crate::error::RedactError::pdf_read("MediaBox not found"))?;
        let media_box = match media_box {
            lopdf::Object::Reference(id) => self.doc.get_object(id)?.clone(),
            other => other,
        };

        let values = media_box.as_array()?;
        if values.len() < 4 {
            return Err(crate::error::RedactError::pdf_read("Invalid MediaBox"));
        }

        let to_f64 = |obj: &lopdf::Object| -> crate::error::Result<f64> {
            match obj {
                lopdf::Object::Integer(i) => Ok(*i as f64),
                lopdf::Object::Real(f) => Ok(*f as f64),
                _ => Err(crate::error::RedactError::pdf_read("Invalid MediaBox value")),
            }
        };

        let width = (to_f64(&values[2])? - to_f64(&values[0])?).abs();
        let height = (to_f64(&values[3])? - to_f64(&values[1])?).abs();

        if width <= 0.0 || height <= 0.0 {
            return Err(crate::error::RedactError::pdf_read(
                "Invalid MediaBox: non-positive page dimensions",
            ));
        }
        if width > PDF_MAX_DIMENSION_PT || height > PDF_MAX_DIMENSION_PT {
            return Err(crate::error::RedactError::pdf_read(
                "Invalid MediaBox: page dimensions exceed PDF limits",
            ));
        }

        Ok(PageSize { width, height })
    }

    fn get_page_id(&self, page_num: u32) -> crate::error::Result<lopdf::ObjectId> {
        self.doc.get_pages().get(&page_num).copied().ok_or_else(|| {
            crate::error::RedactError::pdf_read(format!("page {page_num} not found"))
        })
    }
}

/// ページ辞書で `key` を探し、なければ祖先ノードを辿る。
pub(crate) fn inherited_attribute(
    doc: &Document,
    page_id: lopdf::ObjectId,
    key: &[u8],
) -> Option<lopdf::Object> {
    let mut current = doc.get_dictionary(page_id).ok()?;
    // 循環した Parent チェーンでも停止するよう回数を制限
    for _ in 0..64 {
        if let Ok(value) = current.get(key) {
            return Some(value.clone());
        }
        let parent_id = current.get(b"Parent").and_then(lopdf::Object::as_reference).ok()?;
        current = doc.get_dictionary(parent_id).ok()?;
    }
    None
}
