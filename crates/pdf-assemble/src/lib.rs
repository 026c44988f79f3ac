pub mod constants;
mod decrypt;
pub mod engine;
mod io;
mod merge;
mod normalize;
mod options;
pub mod orchestrator;
mod page_count;
mod probe;
mod types;
mod writer;

pub use decrypt::{build_raster_document, decrypt_pdf};
pub use engine::{DocumentEngine, RenderedPage};
pub use io::{load_input_file, load_input_files, media_type_for_path, save_pdf, save_to_bytes};
pub use merge::{merge, merge_documents};
pub use normalize::{fit_image, normalize_image, normalize_image_sync};
pub use options::*;
pub use orchestrator::{AssemblyState, Orchestrator, PasswordRequest, Progress};
pub use page_count::{count_pdf_pages, page_count};
pub use probe::is_encrypted;
pub use types::*;
