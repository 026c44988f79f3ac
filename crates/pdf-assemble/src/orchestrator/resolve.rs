//! Turning every batch entry into a ready-to-merge document

use crate::decrypt::decrypt_pdf;
use crate::engine::DocumentEngine;
use crate::normalize::normalize_image;
use crate::options::AssemblyOptions;
use crate::types::*;
use lopdf::Document;
use std::collections::HashMap;
use std::sync::Arc;

/// Decrypt the entries listed in `unlocked`, normalize images and load every
/// other PDF unchanged, keeping batch order. Images that cannot be embedded
/// are skipped.
pub(crate) async fn resolve_batch<E: DocumentEngine>(
    engine: &Arc<E>,
    files: &[InputFile],
    unlocked: &HashMap<usize, String>,
    options: &AssemblyOptions,
) -> Result<Vec<Document>> {
    let mut documents = Vec::with_capacity(files.len());

    for (index, file) in files.iter().enumerate() {
        match file.kind() {
            InputKind::Pdf => {
                let doc = match unlocked.get(&index) {
                    Some(password) => decrypt_pdf(engine, file, password, options).await?,
                    None => load_plain_pdf(file).await?,
                };
                documents.push(doc);
            }
            InputKind::Image(_) | InputKind::OtherImage => {
                if let Some(doc) = normalize_image(file, options).await? {
                    documents.push(doc);
                }
            }
            InputKind::Unsupported => {
                log::debug!("Skipping unsupported file {}", file.name());
            }
        }
    }

    Ok(documents)
}

async fn load_plain_pdf(file: &InputFile) -> Result<Document> {
    let data = file.shared_data();
    tokio::task::spawn_blocking(move || Document::load_mem(&data))
        .await?
        .map_err(|e| AssemblyError::unreadable(file.name(), e))
}
