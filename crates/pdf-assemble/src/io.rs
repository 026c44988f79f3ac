//! File I/O for assembly inputs and output

use crate::types::*;
use lopdf::Document;
use std::path::Path;

/// Media type implied by a file's extension.
///
/// Unknown extensions map to `application/octet-stream`, which the batch
/// filter drops.
pub fn media_type_for_path(path: impl AsRef<Path>) -> &'static str {
    let extension = path
        .as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("pdf") => PDF_MEDIA_TYPE,
        Some("jpg" | "jpeg" | "jpe") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("tif" | "tiff") => "image/tiff",
        _ => "application/octet-stream",
    }
}

/// Load a single input file, tagging it with the media type of its extension
pub async fn load_input_file(path: impl AsRef<Path>) -> Result<InputFile> {
    let path = path.as_ref();
    let data = tokio::fs::read(path).await?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    Ok(InputFile::new(name, media_type_for_path(path), data))
}

/// Load multiple input files, preserving order
pub async fn load_input_files(paths: &[impl AsRef<Path>]) -> Result<Vec<InputFile>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        files.push(load_input_file(path).await?);
    }
    Ok(files)
}

/// Serialize a document, optionally compressing its streams
pub fn save_to_bytes(mut doc: Document, compress: bool) -> Result<Vec<u8>> {
    if compress {
        doc.compress();
    }
    let mut writer = Vec::new();
    doc.save_to(&mut writer)?;
    Ok(writer)
}

/// Write assembled PDF bytes to `path`
pub async fn save_pdf(data: &[u8], path: impl AsRef<Path>) -> Result<()> {
    tokio::fs::write(path, data).await?;
    Ok(())
}
