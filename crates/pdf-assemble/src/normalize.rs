//! Turning a standalone image into a one-page document

use crate::constants::MAX_IMAGE_SCALE;
use crate::options::AssemblyOptions;
use crate::types::*;
use crate::writer::{EmbeddedImage, ImagePdfBuilder};
use image::{ColorType, DynamicImage};
use lopdf::Document;

/// Place an image of `image_width` x `image_height` (one pixel = one point at
/// scale 1.0) on a page, scaled uniformly to fit inside `margin` and centered.
/// The scale never exceeds 1.0.
pub fn fit_image(image_width: f32, image_height: f32, page_size: (f32, f32), margin: f32) -> Rect {
    let (page_width, page_height) = page_size;
    let available_width = (page_width - 2.0 * margin).max(0.0);
    let available_height = (page_height - 2.0 * margin).max(0.0);

    let scale = (available_width / image_width)
        .min(available_height / image_height)
        .min(MAX_IMAGE_SCALE);

    let width = image_width * scale;
    let height = image_height * scale;
    Rect::new(
        (page_width - width) / 2.0,
        (page_height - height) / 2.0,
        width,
        height,
    )
}

/// Embed an image file on a single page.
///
/// Returns `Ok(None)` for image subtypes other than JPEG and PNG; those are
/// skipped without producing a page.
pub async fn normalize_image(
    file: &InputFile,
    options: &AssemblyOptions,
) -> Result<Option<Document>> {
    let file = file.clone();
    let options = options.clone();
    tokio::task::spawn_blocking(move || normalize_image_sync(&file, &options)).await?
}

pub fn normalize_image_sync(
    file: &InputFile,
    options: &AssemblyOptions,
) -> Result<Option<Document>> {
    let format = match file.kind() {
        InputKind::Image(format) => format,
        InputKind::OtherImage => {
            log::debug!(
                "Skipping {} ({}): image type not supported",
                file.name(),
                file.media_type()
            );
            return Ok(None);
        }
        InputKind::Pdf | InputKind::Unsupported => {
            return Err(AssemblyError::UnsupportedFormat(file.media_type().to_string()));
        }
    };

    let decoded = image::load_from_memory_with_format(file.data(), codec_format(format))
        .map_err(|e| AssemblyError::unreadable(file.name(), e))?;
    let embedded = embed(file, format, &decoded, options.jpeg_quality)?;

    let page_size = options.image_page_size_pt();
    let placement = fit_image(
        embedded.width as f32,
        embedded.height as f32,
        page_size,
        options.image_margin_pt(),
    );

    let mut builder = ImagePdfBuilder::new();
    builder.add_image_page(page_size, embedded, placement);
    Ok(Some(builder.finish()))
}

fn codec_format(format: ImageFormat) -> image::ImageFormat {
    match format {
        ImageFormat::Jpeg => image::ImageFormat::Jpeg,
        ImageFormat::Png => image::ImageFormat::Png,
    }
}

fn embed(
    file: &InputFile,
    format: ImageFormat,
    decoded: &DynamicImage,
    jpeg_quality: u8,
) -> Result<EmbeddedImage> {
    let (width, height) = (decoded.width(), decoded.height());
    match (format, decoded.color(), jpeg_components(file.data())) {
        // Three-component and grayscale JPEGs are embedded as-is; CMYK data
        // decodes to RGB and must be re-encoded to match DeviceRGB
        (ImageFormat::Jpeg, ColorType::Rgb8, Some(3)) => {
            Ok(EmbeddedImage::jpeg(file.data().to_vec(), width, height, false))
        }
        (ImageFormat::Jpeg, ColorType::L8, Some(1)) => {
            Ok(EmbeddedImage::jpeg(file.data().to_vec(), width, height, true))
        }
        (ImageFormat::Jpeg, _, _) => EmbeddedImage::encode_jpeg(&decoded.to_rgb8(), jpeg_quality),
        (ImageFormat::Png, _, _) => EmbeddedImage::lossless(decoded),
    }
}

/// Number of color components declared by the JPEG frame header
fn jpeg_components(data: &[u8]) -> Option<u8> {
    let mut pos = 2; // skip SOI
    while pos + 4 <= data.len() {
        if data[pos] != 0xFF {
            return None;
        }
        let marker = data[pos + 1];
        let length = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
        let is_frame = matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_frame {
            // length(2) precision(1) height(2) width(2) components(1)
            return data.get(pos + 9).copied();
        }
        pos += 2 + length;
    }
    None
}
