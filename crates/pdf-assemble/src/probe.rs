use crate::engine::DocumentEngine;
use crate::page_count::page_count;
use crate::types::*;
use std::sync::Arc;

/// Whether `file` needs a password before it can be opened.
///
/// Only a "password required" failure counts as encrypted. Files that fail to
/// open for any other reason are reported as not encrypted so the user is not
/// prompted for them; they fail later when the batch is resolved.
pub async fn is_encrypted<E: DocumentEngine>(engine: &Arc<E>, file: &InputFile) -> bool {
    match page_count(engine, file, None).await {
        Ok(_) => false,
        Err(AssemblyError::PasswordRequired) => true,
        Err(e) => {
            log::debug!("Probe could not open {}: {}", file.name(), e);
            false
        }
    }
}
