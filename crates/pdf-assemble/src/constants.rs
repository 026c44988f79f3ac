//! Shared constants for document assembly

// =============================================================================
// Unit Conversion
// =============================================================================

/// PDF user space unit: 72 points per inch
pub const POINTS_PER_INCH: f32 = 72.0;

/// Points per millimeter (1 inch = 72 points, 1 inch = 25.4mm)
pub const POINTS_PER_MM: f32 = POINTS_PER_INCH / 25.4;

/// Convert millimeters to points
#[inline]
pub fn mm_to_pt(mm: f32) -> f32 {
    mm * POINTS_PER_MM
}

// =============================================================================
// Rasterizing
// =============================================================================

/// Render resolution for decrypted pages. Print quality without huge output.
pub const DEFAULT_RENDER_DPI: f32 = 200.0;

/// Upper bound accepted for the render resolution
pub const MAX_RENDER_DPI: f32 = 1200.0;

/// JPEG quality used when re-embedding rendered pages
pub const DEFAULT_JPEG_QUALITY: u8 = 92;

// =============================================================================
// Image Pages
// =============================================================================

/// Margin around images placed on a normalized page (millimeters)
pub const DEFAULT_IMAGE_MARGIN_MM: f32 = 10.0;

/// Largest scale applied to an image; images are never enlarged
pub const MAX_IMAGE_SCALE: f32 = 1.0;

// =============================================================================
// Output
// =============================================================================

/// PDF version written for assembled documents
pub const OUTPUT_PDF_VERSION: &str = "1.7";
