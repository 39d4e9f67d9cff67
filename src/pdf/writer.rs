// Phase 11: ラスタページ書き出し（1ページ = Flate画像XObject 1つ）

use std::io::Write;

use flate2::Compression;
use flate2::write::ZlibEncoder;
use image::RgbaImage;
use lopdf::{Document, Object, ObjectId, Stream, dictionary};

use crate::error::RedactError;
use crate::render::PageSize;

/// 全ページが全面画像の文書を組み立てる。
pub struct RasterPageWriter {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<ObjectId>,
}

impl Default for RasterPageWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl RasterPageWriter {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            kids: Vec::new(),
        }
    }

    /// `width x height` のページ全体に `/name` を描くコンテンツストリーム:
    /// `q <width> 0 0 <height> 0 0 cm /<name> Do Q`。
    pub fn build_image_content_stream(name: &str, width: f64, height: f64) -> Vec<u8> {
        format!(
            "q {} 0 0 {} 0 0 cm /{name} Do Q",
            format_number(width),
            format_number(height)
        )
        .into_bytes()
    }

    /// FlateDecode圧縮の DeviceRGB 画像XObjectを追加する。アルファは捨てる。
    pub fn add_image_xobject(&mut self, image: &RgbaImage) -> crate::error::Result<ObjectId> {
        let (width, height) = image.dimensions();
        let rgb: Vec<u8> = image
            .pixels()
            .flat_map(|p| [p.0[0], p.0[1], p.0[2]])
            .collect();
        let dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        };
        let stream = Stream::new(dict, flate_encode(&rgb)?);
        Ok(self.doc.add_object(Object::Stream(stream)))
    }

    /// `image` を引き伸ばして敷き詰めた `size` ポイントのページを追加する。
    pub fn add_page(&mut self, image: &RgbaImage, size: PageSize) -> crate::error::Result<ObjectId> {
        let image_id = self.add_image_xobject(image)?;

        let resources_id = self.doc.add_object(dictionary! {
            "XObject" => dictionary! {
                "Im0" => Object::Reference(image_id),
            },
        });

        let content = Self::build_image_content_stream("Im0", size.width, size.height);
        let content_id = self
            .doc
            .add_object(Object::Stream(Stream::new(dictionary! {}, content)));

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(size.width as f32),
                Object::Real(size.height as f32),
            ],
            "Resources" => resources_id,
            "Contents" => content_id,
        });
        self.kids.push(page_id);
        Ok(page_id)
    }

    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// ページツリーとカタログを確定し、文書をシリアライズする。
    pub fn save_to_bytes(mut self) -> crate::error::Result<Vec<u8>> {
        if self.kids.is_empty() {
            return Err(RedactError::pdf_write("document has no pages"));
        }

        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => self.kids.iter().map(|&id| Object::Reference(id)).collect::<Vec<_>>(),
            "Count" => self.kids.len() as i64,
        };
        self.doc
            .objects
            .insert(self.pages_id, Object::Dictionary(pages));

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        self.doc
            .save_to(&mut buf)
            .map_err(|e| RedactError::pdf_write(e.to_string()))?;
        Ok(buf)
    }
}

/// `/FlateDecode` 用にストリームを zlib 圧縮する。
pub(crate) fn flate_encode(data: &[u8]) -> crate::error::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| RedactError::pdf_write(format!("Flate encode error: {e}")))?;
    encoder
        .finish()
        .map_err(|e| RedactError::pdf_write(format!("Flate encode error: {e}")))
}

/// コンテンツストリームのオペランド用の最短10進表記。
fn format_number(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        let s = format!("{v:.4}");
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}
