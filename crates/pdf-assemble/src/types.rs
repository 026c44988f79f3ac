use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssemblyError {
    /// The document is encrypted and was opened without a password.
    #[error("A password is required to open this document")]
    PasswordRequired,
    /// The document is encrypted and the supplied password was rejected.
    #[error("Incorrect password")]
    WrongPassword,
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("Could not read {name}: {reason}")]
    Unreadable { name: String, reason: String },
    #[error("Merge failed: {0}")]
    MergeFailed(String),
    #[error("No valid pages to assemble")]
    NoPages,
    #[error("No password request is pending")]
    NoPendingRequest,
    #[error("Rendering engine unavailable: {0}")]
    Engine(String),
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl AssemblyError {
    /// The error an engine reports when a document refuses to open for lack of
    /// the right password. Which variant depends on whether one was supplied.
    pub fn password_rejected(password: Option<&str>) -> Self {
        match password {
            Some(_) => AssemblyError::WrongPassword,
            None => AssemblyError::PasswordRequired,
        }
    }

    /// True for the expected, locally handled password conditions.
    pub fn is_password_condition(&self) -> bool {
        matches!(
            self,
            AssemblyError::PasswordRequired | AssemblyError::WrongPassword
        )
    }

    /// True when retrying the same batch may succeed without code changes.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, AssemblyError::Config(_) | AssemblyError::Engine(_))
    }

    pub(crate) fn unreadable(name: &str, reason: impl ToString) -> Self {
        AssemblyError::Unreadable {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AssemblyError>;

pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// Image subtypes the normalizer can embed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

/// How an input file will be treated by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Pdf,
    /// Supported raster image
    Image(ImageFormat),
    /// `image/*` with a subtype we cannot embed; produces no page
    OtherImage,
    /// Anything else; never admitted to a batch
    Unsupported,
}

impl InputKind {
    pub fn from_media_type(media_type: &str) -> Self {
        let media_type = media_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match media_type.as_str() {
            PDF_MEDIA_TYPE => InputKind::Pdf,
            "image/jpeg" | "image/jpg" | "image/pjpeg" => InputKind::Image(ImageFormat::Jpeg),
            "image/png" => InputKind::Image(ImageFormat::Png),
            other if other.starts_with("image/") => InputKind::OtherImage,
            _ => InputKind::Unsupported,
        }
    }

    /// Whether files of this kind pass the input filter
    pub fn is_admitted(self) -> bool {
        !matches!(self, InputKind::Unsupported)
    }
}

/// A user-supplied file. Cloning shares the underlying bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    name: String,
    media_type: String,
    data: Arc<[u8]>,
}

impl InputFile {
    pub fn new(
        name: impl Into<String>,
        media_type: impl Into<String>,
        data: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            data: data.into(),
        }
    }

    pub fn pdf(name: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        Self::new(name, PDF_MEDIA_TYPE, data)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn shared_data(&self) -> Arc<[u8]> {
        Arc::clone(&self.data)
    }

    pub fn kind(&self) -> InputKind {
        InputKind::from_media_type(&self.media_type)
    }

    /// Key used to remember the password that unlocked this file
    pub fn key(&self) -> FileKey {
        FileKey(self.name.clone())
    }
}

/// Name-based identity of an input file within one session
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileKey(pub String);

/// The assembled output handed to the order flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedDocument {
    pub file_name: String,
    pub data: Vec<u8>,
    pub page_count: usize,
}

/// Suggested name for the merged output of `files`
pub fn merged_file_name(files: &[InputFile]) -> String {
    match files {
        [single] => format!("{}.pdf", file_stem(single.name())),
        _ => format!("Merged ({} files).pdf", files.len()),
    }
}

/// Name given to the unencrypted copy of `name`
pub fn decrypted_file_name(name: &str) -> String {
    let base = name
        .len()
        .checked_sub(4)
        .filter(|&cut| name.is_char_boundary(cut) && name[cut..].eq_ignore_ascii_case(".pdf"))
        .map_or(name, |cut| &name[..cut]);
    format!("{base}.pdf")
}

fn file_stem(name: &str) -> &str {
    Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name)
}

/// Paper orientation
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Standard paper sizes
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PaperSize {
    A3,
    A4,
    A5,
    Letter,
    Legal,
    Custom { width_mm: f32, height_mm: f32 },
}

impl PaperSize {
    /// Base dimensions in millimeters, portrait
    pub fn dimensions_mm(self) -> (f32, f32) {
        match self {
            PaperSize::A3 => (297.0, 420.0),
            PaperSize::A4 => (210.0, 297.0),
            PaperSize::A5 => (148.0, 210.0),
            PaperSize::Letter => (215.9, 279.4),
            PaperSize::Legal => (215.9, 355.6),
            PaperSize::Custom {
                width_mm,
                height_mm,
            } => (width_mm, height_mm),
        }
    }

    /// Dimensions in points with orientation applied
    pub fn dimensions_pt(self, orientation: Orientation) -> (f32, f32) {
        let (w, h) = self.dimensions_mm();
        let (w, h) = (crate::constants::mm_to_pt(w), crate::constants::mm_to_pt(h));
        match orientation {
            Orientation::Portrait => (w, h),
            Orientation::Landscape => (h, w),
        }
    }
}

/// Axis-aligned rectangle in PDF user space (origin bottom-left)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn top(&self) -> f32 {
        self.y + self.height
    }
}
