mod common;

use common::*;
use lopdf::{Document, Stream};
use pdf_assemble::*;

fn only_image(doc: &Document) -> &Stream {
    let page_id = *doc.get_pages().values().next().unwrap();
    let page = doc.get_dictionary(page_id).unwrap();
    let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
    let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
    let image_id = xobjects.get(b"Im0").unwrap().as_reference().unwrap();
    doc.get_object(image_id).unwrap().as_stream().unwrap()
}

#[tokio::test]
async fn test_jpeg_is_embedded_unchanged() {
    let data = jpeg_bytes(120, 80);
    let file = InputFile::new("photo.jpg", "image/jpeg", data.clone());

    let doc = normalize_image(&file, &AssemblyOptions::default())
        .await
        .unwrap()
        .unwrap();

    let sizes = page_sizes(&doc);
    assert_eq!(sizes.len(), 1);
    assert!(approx(sizes[0], (595.2756, 841.8898)));

    let image = only_image(&doc);
    assert_eq!(image.dict.get(b"Filter").unwrap().as_name().unwrap(), b"DCTDecode");
    assert_eq!(image.dict.get(b"Width").unwrap().as_i64().unwrap(), 120);
    assert_eq!(image.content, data);
}

#[tokio::test]
async fn test_png_alpha_becomes_soft_mask() {
    let file = InputFile::new("logo.png", "image/png", png_bytes(16, 16, true));

    let doc = normalize_image(&file, &AssemblyOptions::default())
        .await
        .unwrap()
        .unwrap();

    let image = only_image(&doc);
    assert_eq!(image.dict.get(b"Filter").unwrap().as_name().unwrap(), b"FlateDecode");
    assert!(image.dict.get(b"SMask").is_ok());
}

#[tokio::test]
async fn test_opaque_png_has_no_soft_mask() {
    let file = InputFile::new("chart.png", "image/png", png_bytes(16, 16, false));

    let doc = normalize_image(&file, &AssemblyOptions::default())
        .await
        .unwrap()
        .unwrap();

    assert!(only_image(&doc).dict.get(b"SMask").is_err());
}

#[tokio::test]
async fn test_landscape_page() {
    let options = AssemblyOptions {
        image_orientation: Orientation::Landscape,
        image_paper_size: PaperSize::Letter,
        ..AssemblyOptions::default()
    };
    let doc = normalize_image(&jpeg_file("wide.jpg", 300, 100), &options)
        .await
        .unwrap()
        .unwrap();

    assert!(approx(page_sizes(&doc)[0], (792.0, 612.0)));
}

#[tokio::test]
async fn test_unembeddable_image_yields_nothing() {
    let file = InputFile::new("anim.gif", "image/gif", b"GIF89a".to_vec());
    let result = normalize_image(&file, &AssemblyOptions::default()).await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_non_image_is_rejected() {
    let file = plain_pdf("a.pdf", 1, 612, 792);
    let result = normalize_image(&file, &AssemblyOptions::default()).await;
    assert!(matches!(result, Err(AssemblyError::UnsupportedFormat(_))));
}

#[tokio::test]
async fn test_corrupt_image_is_unreadable() {
    let file = InputFile::new("broken.jpg", "image/jpeg", b"\xFF\xD8not really".to_vec());
    match normalize_image(&file, &AssemblyOptions::default()).await {
        Err(AssemblyError::Unreadable { name, .. }) => assert_eq!(name, "broken.jpg"),
        other => panic!("expected unreadable error, got {:?}", other),
    }
}

#[test]
fn test_fit_image_keeps_aspect_ratio() {
    let page = (595.0, 842.0);
    let rect = fit_image(3000.0, 2000.0, page, 28.0);

    assert!((rect.width / rect.height - 1.5).abs() < 1e-3);
    assert!(rect.x >= 28.0 - 1e-3);
    assert!(rect.right() <= 595.0 - 28.0 + 1e-3);
    assert!((rect.x - (595.0 - rect.right())).abs() < 1e-3);
    assert!((rect.y - (842.0 - rect.top())).abs() < 1e-3);
}
