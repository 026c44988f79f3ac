#![allow(dead_code)]

use image::{Rgb, RgbImage, Rgba, RgbaImage};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use pdf_assemble::*;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub fn create_test_pdf(num_pages: usize, width: i64, height: i64) -> Document {
    let mut doc = Document::with_version("1.7");

    // Create page tree root ID
    let pages_id = doc.new_object_id();

    let mut kids = Vec::new();
    for _ in 0..num_pages {
        let content_id = doc.add_object(Stream::new(Dictionary::new(), b"q Q".to_vec()));

        let page_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(width),
                    Object::Integer(height),
                ]),
            ),
            ("Resources", Object::Dictionary(Dictionary::new())),
            ("Contents", Object::Reference(content_id)),
        ]));
        kids.push(Object::Reference(page_id));
    }

    let pages_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(kids)),
        ("Count", Object::Integer(num_pages as i64)),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", catalog_id);

    doc
}

pub fn pdf_bytes(mut doc: Document) -> Vec<u8> {
    let mut writer = Vec::new();
    doc.save_to(&mut writer).unwrap();
    writer
}

pub fn plain_pdf(name: &str, num_pages: usize, width: i64, height: i64) -> InputFile {
    InputFile::pdf(name, pdf_bytes(create_test_pdf(num_pages, width, height)))
}

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([200, 40, 40]));
    let mut data = Vec::new();
    image::codecs::jpeg::JpegEncoder::new(&mut data)
        .encode_image(&img)
        .unwrap();
    data
}

pub fn png_bytes(width: u32, height: u32, alpha: bool) -> Vec<u8> {
    let mut data = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut data);
    if alpha {
        RgbaImage::from_pixel(width, height, Rgba([10, 200, 10, 128]))
            .write_to(&mut cursor, image::ImageFormat::Png)
            .unwrap();
    } else {
        RgbImage::from_pixel(width, height, Rgb([10, 200, 10]))
            .write_to(&mut cursor, image::ImageFormat::Png)
            .unwrap();
    }
    data
}

pub fn jpeg_file(name: &str, width: u32, height: u32) -> InputFile {
    InputFile::new(name, "image/jpeg", jpeg_bytes(width, height))
}

/// Width and height of each page's MediaBox, in page order
pub fn page_sizes(doc: &Document) -> Vec<(f32, f32)> {
    doc.get_pages()
        .values()
        .map(|&id| media_box_size(doc, id))
        .collect()
}

pub fn media_box_size(doc: &Document, page_id: ObjectId) -> (f32, f32) {
    let page = doc.get_dictionary(page_id).unwrap();
    let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
    let coord = |i: usize| media_box[i].as_float().unwrap();
    (coord(2) - coord(0), coord(3) - coord(1))
}

pub fn approx(a: (f32, f32), b: (f32, f32)) -> bool {
    (a.0 - b.0).abs() < 0.05 && (a.1 - b.1).abs() < 0.05
}

struct LockedDocument {
    password: String,
    page_sizes: Vec<(f32, f32)>,
}

/// Engine double. Locked documents are opaque byte markers registered with a
/// password and page sizes; anything else is opened with lopdf.
#[derive(Default)]
pub struct ScriptedEngine {
    locked: HashMap<Vec<u8>, LockedDocument>,
    opens: AtomicUsize,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a locked document and return the file that refers to it.
    /// Every call yields distinct contents, even for a repeated name.
    pub fn lock(&mut self, name: &str, password: &str, page_sizes: &[(f32, f32)]) -> InputFile {
        let data = format!("%LOCKED {} #{}", name, self.locked.len()).into_bytes();
        self.locked.insert(
            data.clone(),
            LockedDocument {
                password: password.to_string(),
                page_sizes: page_sizes.to_vec(),
            },
        );
        InputFile::pdf(name, data)
    }

    /// Number of times any document was opened
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    fn open(&self, data: &[u8], password: Option<&str>) -> pdf_assemble::Result<Vec<(f32, f32)>> {
        self.opens.fetch_add(1, Ordering::SeqCst);

        if let Some(locked) = self.locked.get(data) {
            return match password {
                Some(p) if p == locked.password => Ok(locked.page_sizes.clone()),
                _ => Err(AssemblyError::password_rejected(password)),
            };
        }

        let doc = Document::load_mem(data).map_err(|e| AssemblyError::Unreadable {
            name: String::new(),
            reason: e.to_string(),
        })?;
        Ok(page_sizes(&doc))
    }
}

impl DocumentEngine for ScriptedEngine {
    fn page_count(&self, data: &[u8], password: Option<&str>) -> pdf_assemble::Result<usize> {
        Ok(self.open(data, password)?.len())
    }

    fn rasterize(
        &self,
        data: &[u8],
        password: Option<&str>,
        dpi: f32,
        sink: &mut dyn FnMut(RenderedPage) -> pdf_assemble::Result<()>,
    ) -> pdf_assemble::Result<()> {
        for (index, (width_pt, height_pt)) in self.open(data, password)?.into_iter().enumerate() {
            let scale = dpi / 72.0;
            let image = RgbImage::from_pixel(
                ((width_pt * scale) as u32).max(1),
                ((height_pt * scale) as u32).max(1),
                Rgb([255, 255, 255]),
            );
            sink(RenderedPage {
                index,
                width_pt,
                height_pt,
                image,
            })?;
        }
        Ok(())
    }
}

/// Options that keep rasterized fixtures small
pub fn fast_options() -> AssemblyOptions {
    AssemblyOptions {
        render_dpi: 18.0,
        ..AssemblyOptions::default()
    }
}
