//! Rendering engine abstraction
//!
//! Opening encrypted documents and rasterizing their pages needs a full PDF
//! renderer. The pipeline talks to it through [`DocumentEngine`] so hosts can
//! choose the backend and tests can script one.

#[cfg(feature = "pdfium")]
mod pdfium;

#[cfg(feature = "pdfium")]
pub use self::pdfium::{PdfiumEngine, init_pdfium};

use crate::types::Result;
use image::RgbImage;

/// One page rendered to a bitmap
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// Zero-based position in the source document
    pub index: usize,
    /// Physical page width in points
    pub width_pt: f32,
    /// Physical page height in points
    pub height_pt: f32,
    pub image: RgbImage,
}

/// A PDF renderer capable of opening password protected documents.
///
/// Methods block; async callers run them on the blocking pool. When a
/// document refuses to open because of its password, implementations return
/// [`AssemblyError::password_rejected`](crate::AssemblyError::password_rejected)
/// for the password they were given. Any other open failure is reported as
/// [`AssemblyError::Unreadable`](crate::AssemblyError::Unreadable).
pub trait DocumentEngine: Send + Sync + 'static {
    /// Open `data` and report its page count.
    fn page_count(&self, data: &[u8], password: Option<&str>) -> Result<usize>;

    /// Open `data` and render every page, in order, at `dpi`.
    ///
    /// Pages are handed to `sink` one at a time so callers never hold more
    /// than one bitmap. An error from `sink` stops rendering.
    fn rasterize(
        &self,
        data: &[u8],
        password: Option<&str>,
        dpi: f32,
        sink: &mut dyn FnMut(RenderedPage) -> Result<()>,
    ) -> Result<()>;
}

/// Treat an empty password the same as no password
pub(crate) fn effective_password(password: Option<&str>) -> Option<&str> {
    password.filter(|p| !p.is_empty())
}
