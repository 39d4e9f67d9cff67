// Phase 11: 入力PDFの連結、コピーできないページは画像として再埋め込み

use std::collections::BTreeMap;

use image::RgbaImage;
use lopdf::{Document, Object, ObjectId, dictionary};
use tracing::{info, warn};

use super::reader::inherited_attribute;
use super::writer::RasterPageWriter;
use crate::error::RedactError;
use crate::render::{PageRenderer, PageSize};

/// ページツリーの祖先から継承されうるページ属性。
const INHERITABLE: &[&[u8]] = &[b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

/// そのまま結合できなかった入力のレンダリング済みページ。
pub type RasterPages = Vec<(RgbaImage, PageSize)>;

#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub bytes: Vec<u8>,
    pub page_count: u32,
    /// 画像として再埋め込みした入力のインデックス。
    pub rasterized: Vec<usize>,
}

/// Render every page of `renderer` at `scale`.
pub fn rasterize_document(
    renderer: &dyn PageRenderer,
    scale: f64,
) -> crate::error::Result<RasterPages> {
    (1..=renderer.page_count())
        .map(|page| Ok((renderer.render(page, scale)?, renderer.page_size(page)?)))
        .collect()
}

/// Merge `sources` in order into one document.
///
/// A source that fails to parse or is encrypted is handed to `rasterize`
/// (with its index) and replaced by an image-only copy of its pages.
pub fn merge_documents<F>(sources: &[Vec<u8>], mut rasterize: F) -> crate::error::Result<MergeOutcome>
where
    F: FnMut(usize, &[u8]) -> crate::error::Result<RasterPages>,
{
    if sources.is_empty() {
        return Err(RedactError::validation("no documents to merge"));
    }

    let mut documents = Vec::with_capacity(sources.len());
    let mut rasterized = Vec::new();

    for (idx, bytes) in sources.iter().enumerate() {
        match Document::load_mem(bytes) {
            Ok(doc) if !doc.is_encrypted() => documents.push(doc),
            loaded => {
                match loaded {
                    Ok(_) => warn!(source = idx, "encrypted document, re-embedding pages as images"),
                    Err(e) => warn!(source = idx, error = %e, "unreadable document, re-embedding pages as images"),
                }
                let pages = rasterize(idx, bytes)?;
                let mut writer = RasterPageWriter::new();
                for (image, size) in &pages {
                    writer.add_page(image, *size)?;
                }
                documents.push(Document::load_mem(&writer.save_to_bytes()?)?);
                rasterized.push(idx);
            }
        }
    }

    if documents.len() == 1 && rasterized.is_empty() {
        let page_count = documents[0].get_pages().len() as u32;
        return Ok(MergeOutcome {
            bytes: sources[0].clone(),
            page_count,
            rasterized,
        });
    }

    let mut merged = concatenate(documents)?;
    let page_count = merged.get_pages().len() as u32;
    let mut bytes = Vec::new();
    merged
        .save_to(&mut bytes)
        .map_err(|e| RedactError::pdf_write(e.to_string()))?;
    info!(sources = sources.len(), page_count, "documents merged");

    Ok(MergeOutcome {
        bytes,
        page_count,
        rasterized,
    })
}

fn concatenate(documents: Vec<Document>) -> crate::error::Result<Document> {
    let mut max_id = 1;
    let mut pages: Vec<(ObjectId, lopdf::Dictionary)> = Vec::new();
    let mut objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for mut doc in documents {
        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        for (_, page_id) in doc.get_pages() {
            let mut dict = doc.get_dictionary(page_id)?.clone();
            for key in INHERITABLE {
                if !dict.has(key)
                    && let Some(value) = inherited_attribute(&doc, page_id, key)
                {
                    dict.set(*key, value);
                }
            }
            pages.push((page_id, dict));
        }
        objects.extend(doc.objects);
    }

    let mut merged = Document::with_version("1.5");
    for (id, object) in objects {
        let skip = match object.type_name() {
            Ok(name) => matches!(name, b"Catalog" | b"Pages" | b"Page" | b"Outlines" | b"Outline"),
            Err(_) => false,
        };
        if !skip {
            merged.objects.insert(id, object);
        }
    }

    let pages_id: ObjectId = (max_id, 0);
    for (page_id, mut dict) in pages.iter().cloned() {
        dict.set("Parent", pages_id);
        merged.objects.insert(page_id, Object::Dictionary(dict));
    }

    merged.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => pages.iter().map(|(id, _)| Object::Reference(*id)).collect::<Vec<_>>(),
            "Count" => pages.len() as i64,
        }),
    );

    let catalog_id: ObjectId = (max_id + 1, 0);
    merged.objects.insert(
        catalog_id,
        Object::Dictionary(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        }),
    );
    merged.trailer.set("Root", catalog_id);
    merged.max_id = max_id + 1;
    merged.renumber_objects();
    merged.compress();
    Ok(merged)
}
