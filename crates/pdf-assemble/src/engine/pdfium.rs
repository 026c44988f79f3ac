use super::{DocumentEngine, RenderedPage};
use crate::constants::POINTS_PER_INCH;
use crate::types::{AssemblyError, Result};
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};

/// Environment variable naming a directory that holds the pdfium library
pub const PDFIUM_DIR_ENV: &str = "PRINTEG_PDFIUM_DIR";

/// Bind to pdfium, trying an explicit directory, then `$PRINTEG_PDFIUM_DIR`,
/// then the vendored library, then the system library.
pub fn init_pdfium(library_dir: Option<&Path>) -> std::result::Result<Pdfium, PdfiumError> {
    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Some(dir) = library_dir {
        candidates.push(dir.to_path_buf());
    }
    if let Some(dir) = std::env::var_os(PDFIUM_DIR_ENV) {
        candidates.push(PathBuf::from(dir));
    }
    // When running from cargo, the working directory is the workspace root
    if let Ok(mut vendor) = std::env::current_dir() {
        vendor.push("vendor/pdfium/lib");
        candidates.push(vendor);
    }

    for dir in candidates.iter().filter(|dir| dir.exists()) {
        if let Ok(binding) =
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))
        {
            log::debug!("Bound pdfium from {}", dir.display());
            return Ok(Pdfium::new(binding));
        }
    }

    Pdfium::bind_to_system_library().map(Pdfium::new)
}

/// [`DocumentEngine`] backed by the pdfium renderer.
///
/// The library is bound once, when the engine is built, and shared by every
/// call.
pub struct PdfiumEngine {
    pdfium: Pdfium,
}

impl PdfiumEngine {
    /// Bind pdfium from the default locations
    pub fn new() -> Result<Self> {
        Self::bind(None)
    }

    /// Bind pdfium, looking in `library_dir` first
    pub fn bind(library_dir: Option<&Path>) -> Result<Self> {
        let pdfium =
            init_pdfium(library_dir).map_err(|e| AssemblyError::Engine(e.to_string()))?;
        Ok(Self { pdfium })
    }
}

fn open_error(error: PdfiumError, password: Option<&str>) -> AssemblyError {
    match error {
        PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::PasswordError) => {
            AssemblyError::password_rejected(password)
        }
        other => AssemblyError::unreadable("document", other),
    }
}

impl DocumentEngine for PdfiumEngine {
    fn page_count(&self, data: &[u8], password: Option<&str>) -> Result<usize> {
        let document = self
            .pdfium
            .load_pdf_from_byte_slice(data, password)
            .map_err(|e| open_error(e, password))?;
        Ok(document.pages().len() as usize)
    }

    fn rasterize(
        &self,
        data: &[u8],
        password: Option<&str>,
        dpi: f32,
        sink: &mut dyn FnMut(RenderedPage) -> Result<()>,
    ) -> Result<()> {
        let document = self
            .pdfium
            .load_pdf_from_byte_slice(data, password)
            .map_err(|e| open_error(e, password))?;

        let config = PdfRenderConfig::new()
            .scale_page_by_factor(dpi / POINTS_PER_INCH)
            .render_form_data(true);

        for (index, page) in document.pages().iter().enumerate() {
            let width_pt = page.width().value;
            let height_pt = page.height().value;

            let bitmap = page
                .render_with_config(&config)
                .map_err(|e| AssemblyError::unreadable(&format!("page {}", index + 1), e))?;
            let image = bitmap.as_image().into_rgb8();

            log::debug!(
                "Rendered page {} ({}x{} pt) to {}x{} px",
                index + 1,
                width_pt,
                height_pt,
                image.width(),
                image.height()
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

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal valid PDF document (Hello World)
    const SAMPLE_PDF: &[u8] = b"%PDF-1.4
1 0 obj
<<
/Type /Catalog
/Pages 2 0 R
>>
endobj
2 0 obj
<<
/Type /Pages
/Kids [3 0 R]
/Count 1
>>
endobj
3 0 obj
<<
/Type /Page
/Parent 2 0 R
/Resources <<
/Font <<
/F1 <<
/Type /Font
/Subtype /Type1
/BaseFont /Helvetica
>>
>>
>>
/MediaBox [0 0 612 792]
/Contents 4 0 R
>>
endobj
4 0 obj
<<
/Length 44
>>
stream
BT
/F1 24 Tf
100 700 Td
(Hello World) Tj
ET
endstream
endobj
xref
0 5
0000000000 65535 f
0000000009 00000 n
0000000058 00000 n
0000000115 00000 n
0000000317 00000 n
trailer
<<
/Size 5
/Root 1 0 R
>>
startxref
410
%%EOF
";

    #[test]
    fn test_bound_engine_is_shared_across_threads() {
        fn assert_shareable<T: DocumentEngine>() {}
        assert_shareable::<PdfiumEngine>();
    }

    #[test]
    #[ignore = "requires the pdfium shared library"]
    fn test_pdfium_counts_and_renders() {
        let engine = PdfiumEngine::new().unwrap();
        assert_eq!(engine.page_count(SAMPLE_PDF, None).unwrap(), 1);

        let mut pages = Vec::new();
        engine
            .rasterize(SAMPLE_PDF, None, 144.0, &mut |page| {
                pages.push(page);
                Ok(())
            })
            .unwrap();

        assert_eq!(pages.len(), 1);
        let page = &pages[0];
        assert!((page.width_pt - 612.0).abs() < 0.5);
        assert!((page.height_pt - 792.0).abs() < 0.5);
        // 144 DPI is twice the native resolution
        assert!((page.image.width() as i64 - 1224).abs() <= 1);
        assert!((page.image.height() as i64 - 1584).abs() <= 1);
    }

    #[test]
    #[ignore = "requires the pdfium shared library"]
    fn test_pdfium_reports_garbage_as_unreadable() {
        let engine = PdfiumEngine::new().unwrap();
        let result = engine.page_count(b"not a pdf", None);
        assert!(matches!(result, Err(AssemblyError::Unreadable { .. })));
    }
}
