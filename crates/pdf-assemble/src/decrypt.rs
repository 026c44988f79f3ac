//! Removing encryption by rasterizing
//!
//! Each page of the protected document is rendered to a bitmap, JPEG encoded
//! and placed on a fresh page of the same physical size. Vector content and
//! text become pixels; in exchange the output needs no decryption support
//! from any downstream tool.

use crate::engine::{DocumentEngine, RenderedPage};
use crate::options::AssemblyOptions;
use crate::types::*;
use crate::writer::{EmbeddedImage, ImagePdfBuilder};
use lopdf::Document;
use std::sync::Arc;

/// Produce an unencrypted copy of `file` using `password`.
///
/// Fails with [`AssemblyError::WrongPassword`] when the password is rejected.
pub async fn decrypt_pdf<E: DocumentEngine>(
    engine: &Arc<E>,
    file: &InputFile,
    password: &str,
    options: &AssemblyOptions,
) -> Result<Document> {
    let engine = Arc::clone(engine);
    let data = file.shared_data();
    let name = file.name().to_string();
    let password = password.to_string();
    let dpi = options.render_dpi;
    let quality = options.jpeg_quality;

    let (doc, pages) = tokio::task::spawn_blocking(move || {
        let mut builder = ImagePdfBuilder::new();
        engine.rasterize(&data, Some(password.as_str()), dpi, &mut |page| {
            add_rendered_page(&mut builder, page, quality)
        })?;
        let pages = builder.page_count();
        Ok::<_, AssemblyError>((builder.finish(), pages))
    })
    .await?
    .map_err(|e| match e {
        // A password was supplied, so a rejection means it is wrong
        AssemblyError::PasswordRequired => AssemblyError::WrongPassword,
        AssemblyError::Unreadable { reason, .. } => AssemblyError::Unreadable { name, reason },
        other => other,
    })?;

    log::info!(
        "Decrypted {} into {} by rasterizing {} page(s) at {} DPI",
        file.name(),
        decrypted_file_name(file.name()),
        pages,
        dpi
    );
    Ok(doc)
}

/// Assemble rendered pages into a document, one image per page.
///
/// Each output page has the rendered page's physical size and the image
/// covers it exactly, whatever resolution it was rendered at.
pub fn build_raster_document(
    pages: impl IntoIterator<Item = RenderedPage>,
    jpeg_quality: u8,
) -> Result<Document> {
    let mut builder = ImagePdfBuilder::new();
    for page in pages {
        add_rendered_page(&mut builder, page, jpeg_quality)?;
    }
    Ok(builder.finish())
}

fn add_rendered_page(
    builder: &mut ImagePdfBuilder,
    page: RenderedPage,
    jpeg_quality: u8,
) -> Result<()> {
    let image = EmbeddedImage::encode_jpeg(&page.image, jpeg_quality)?;
    builder.add_image_page(
        (page.width_pt, page.height_pt),
        image,
        Rect::new(0.0, 0.0, page.width_pt, page.height_pt),
    );
    Ok(())
}
