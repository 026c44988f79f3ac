use crate::constants::*;
use crate::types::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Tunables for the assembly pipeline
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AssemblyOptions {
    /// Resolution used when rasterizing encrypted documents
    pub render_dpi: f32,
    /// JPEG quality (1-100) for rasterized pages
    pub jpeg_quality: u8,

    // Image normalization
    pub image_paper_size: PaperSize,
    pub image_orientation: Orientation,
    pub image_margin_mm: f32,

    /// Compress object streams of the merged output
    pub compress_output: bool,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self {
            render_dpi: DEFAULT_RENDER_DPI,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            image_paper_size: PaperSize::A4,
            image_orientation: Orientation::Portrait,
            image_margin_mm: DEFAULT_IMAGE_MARGIN_MM,
            compress_output: true,
        }
    }
}

impl AssemblyOptions {
    /// Load options from JSON file
    #[cfg(feature = "serde")]
    pub async fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let options: Self = serde_json::from_slice(&bytes)
            .map_err(|e| AssemblyError::Config(format!("Failed to parse config: {}", e)))?;
        options.validate()?;
        Ok(options)
    }

    /// Save options to JSON file
    #[cfg(feature = "serde")]
    pub async fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| AssemblyError::Config(format!("Failed to serialize config: {}", e)))?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    /// Page size in points for normalized images
    pub fn image_page_size_pt(&self) -> (f32, f32) {
        self.image_paper_size.dimensions_pt(self.image_orientation)
    }

    pub fn image_margin_pt(&self) -> f32 {
        mm_to_pt(self.image_margin_mm)
    }

    /// Validate the options
    pub fn validate(&self) -> Result<()> {
        if !(self.render_dpi > 0.0 && self.render_dpi <= MAX_RENDER_DPI) {
            return Err(AssemblyError::Config(format!(
                "Render DPI must be between 0 and {}, got {}",
                MAX_RENDER_DPI, self.render_dpi
            )));
        }

        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(AssemblyError::Config(format!(
                "JPEG quality must be between 1 and 100, got {}",
                self.jpeg_quality
            )));
        }

        let (width_mm, height_mm) = self.image_paper_size.dimensions_mm();
        if width_mm <= 0.0 || height_mm <= 0.0 {
            return Err(AssemblyError::Config(
                "Image page dimensions must be positive".to_string(),
            ));
        }

        if self.image_margin_mm < 0.0 || self.image_margin_mm * 2.0 >= width_mm.min(height_mm) {
            return Err(AssemblyError::Config(format!(
                "Image margin of {}mm leaves no room on a {}x{}mm page",
                self.image_margin_mm, width_mm, height_mm
            )));
        }

        Ok(())
    }
}
