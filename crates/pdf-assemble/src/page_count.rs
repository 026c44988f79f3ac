use crate::engine::{DocumentEngine, effective_password};
use crate::types::*;
use lopdf::Document;
use std::sync::Arc;

/// Count the pages of `file`, opening it with `password` if given.
///
/// An encrypted document fails with [`AssemblyError::PasswordRequired`] when
/// no password (or an empty one) is supplied and with
/// [`AssemblyError::WrongPassword`] when the password is rejected.
pub async fn page_count<E: DocumentEngine>(
    engine: &Arc<E>,
    file: &InputFile,
    password: Option<&str>,
) -> Result<usize> {
    if file.kind() != InputKind::Pdf {
        return Err(AssemblyError::UnsupportedFormat(file.media_type().to_string()));
    }

    let engine = Arc::clone(engine);
    let data = file.shared_data();
    let password = effective_password(password).map(str::to_string);

    tokio::task::spawn_blocking(move || engine.page_count(&data, password.as_deref()))
        .await?
        .map_err(|e| match e {
            AssemblyError::Unreadable { reason, .. } => {
                AssemblyError::unreadable(file.name(), reason)
            }
            other => other,
        })
}

/// Count the pages of an unencrypted PDF without a rendering engine
pub fn count_pdf_pages(data: &[u8]) -> Result<usize> {
    let doc = Document::load_mem(data)?;
    Ok(doc.get_pages().len())
}
