//! Building image-only PDF documents
//!
//! The decryptor and the normalizer both produce documents whose pages each
//! show a single raster image. This module owns the lopdf plumbing for that:
//! page tree, image XObjects and the placement content stream.

use crate::constants::OUTPUT_PDF_VERSION;
use crate::types::{Rect, Result};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

/// Accumulates pages and produces a standalone document
pub(crate) struct ImagePdfBuilder {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
}

impl ImagePdfBuilder {
    pub fn new() -> Self {
        let mut doc = Document::with_version(OUTPUT_PDF_VERSION);
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            kids: Vec::new(),
        }
    }

    /// Append a page of `page_size` points showing `image` inside `placement`
    pub fn add_image_page(
        &mut self,
        page_size: (f32, f32),
        image: EmbeddedImage,
        placement: Rect,
    ) -> ObjectId {
        let image_id = image.add_to(&mut self.doc);

        let mut xobjects = Dictionary::new();
        xobjects.set("Im0", Object::Reference(image_id));
        let mut resources = Dictionary::new();
        resources.set("XObject", Object::Dictionary(xobjects));

        let content = format!(
            "q {} 0 0 {} {} {} cm /Im0 Do Q\n",
            placement.width, placement.height, placement.x, placement.y
        );
        let content_id = self
            .doc
            .add_object(Stream::new(Dictionary::new(), content.into_bytes()));

        let mut page_dict = Dictionary::new();
        page_dict.set("Type", Object::Name(b"Page".to_vec()));
        page_dict.set("Parent", Object::Reference(self.pages_id));
        page_dict.set(
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(page_size.0),
                Object::Real(page_size.1),
            ]),
        );
        page_dict.set("Resources", Object::Dictionary(resources));
        page_dict.set("Contents", Object::Reference(content_id));

        let page_id = self.doc.add_object(page_dict);
        self.kids.push(Object::Reference(page_id));
        page_id
    }

    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    pub fn finish(mut self) -> Document {
        finish_page_tree(&mut self.doc, self.pages_id, self.kids);
        self.doc
    }
}

/// Install the Pages node and Catalog for `kids` under `pages_id`
pub(crate) fn finish_page_tree(doc: &mut Document, pages_id: ObjectId, kids: Vec<Object>) {
    let count = kids.len() as i64;
    let pages_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(kids)),
        ("Count", Object::Integer(count)),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", catalog_id);
}

// =============================================================================
// Image XObjects
// =============================================================================

/// An image ready to be written as an XObject
pub(crate) struct EmbeddedImage {
    pub width: u32,
    pub height: u32,
    stream: Stream,
    soft_mask: Option<Stream>,
}

impl EmbeddedImage {
    /// Wrap already-encoded JPEG data without re-encoding it
    pub fn jpeg(data: Vec<u8>, width: u32, height: u32, gray: bool) -> Self {
        let color_space = if gray { "DeviceGray" } else { "DeviceRGB" };
        let dict = image_dict(width, height, color_space, Some("DCTDecode"));
        Self {
            width,
            height,
            stream: Stream::new(dict, data).with_compression(false),
            soft_mask: None,
        }
    }

    /// JPEG-encode an RGB bitmap
    pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Self> {
        let mut data = Vec::new();
        JpegEncoder::new_with_quality(&mut data, quality).encode_image(image)?;
        Ok(Self::jpeg(data, image.width(), image.height(), false))
    }

    /// Store pixels losslessly (Flate), keeping any alpha channel as a soft mask
    pub fn lossless(image: &DynamicImage) -> Result<Self> {
        let (width, height) = (image.width(), image.height());

        let soft_mask = if image.color().has_alpha() {
            let alpha: Vec<u8> = image.to_luma_alpha8().pixels().map(|p| p.0[1]).collect();
            let mut mask = Stream::new(image_dict(width, height, "DeviceGray", None), alpha);
            mask.compress()?;
            Some(mask)
        } else {
            None
        };

        let (color_space, pixels) = if image.color().has_color() {
            ("DeviceRGB", image.to_rgb8().into_raw())
        } else {
            ("DeviceGray", image.to_luma8().into_raw())
        };
        let mut stream = Stream::new(image_dict(width, height, color_space, None), pixels);
        stream.compress()?;

        Ok(Self {
            width,
            height,
            stream,
            soft_mask,
        })
    }

    fn add_to(mut self, doc: &mut Document) -> ObjectId {
        if let Some(mask) = self.soft_mask.take() {
            let mask_id = doc.add_object(mask);
            self.stream.dict.set("SMask", Object::Reference(mask_id));
        }
        doc.add_object(self.stream)
    }
}

fn image_dict(width: u32, height: u32, color_space: &str, filter: Option<&str>) -> Dictionary {
    let mut dict = Dictionary::new();
    dict.set("Type", Object::Name(b"XObject".to_vec()));
    dict.set("Subtype", Object::Name(b"Image".to_vec()));
    dict.set("Width", Object::Integer(width as i64));
    dict.set("Height", Object::Integer(height as i64));
    dict.set("ColorSpace", Object::Name(color_space.as_bytes().to_vec()));
    dict.set("BitsPerComponent", Object::Integer(8));
    if let Some(filter) = filter {
        dict.set("Filter", Object::Name(filter.as_bytes().to_vec()));
    }
    dict
}
