//! Batch orchestration
//!
//! The orchestrator owns one session: the ordered batch of admitted files,
//! the passwords that unlocked encrypted PDFs, and at most one outstanding
//! password request. Assembly proceeds in stages:
//!
//! ```text
//! Idle -> Scanning -> (AwaitingPassword -> Scanning)* -> Resolving -> Merging -> Ready
//! ```
//!
//! Scanning probes every PDF in order. An encrypted one is opened with the
//! passwords already stored under its name; if none of them works, scanning
//! halts with a password request. Only files found encrypted are decrypted,
//! every other PDF passes through unchanged. Any change to the batch
//! composition invalidates the output and restarts the scan from the first
//! file.

mod resolve;
mod session;

pub use session::PasswordStore;

use crate::engine::DocumentEngine;
use crate::io::save_to_bytes;
use crate::merge::merge;
use crate::options::AssemblyOptions;
use crate::page_count::{count_pdf_pages, page_count};
use crate::probe::is_encrypted;
use crate::types::*;
use session::{PendingRequest, Session};
use std::sync::Arc;

/// Stage of the assembly state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssemblyState {
    #[default]
    Idle,
    Scanning,
    AwaitingPassword,
    Resolving,
    Merging,
    Ready,
}

impl std::fmt::Display for AssemblyState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            AssemblyState::Idle => "idle",
            AssemblyState::Scanning => "scanning",
            AssemblyState::AwaitingPassword => "awaiting password",
            AssemblyState::Resolving => "resolving",
            AssemblyState::Merging => "merging",
            AssemblyState::Ready => "ready",
        };
        f.write_str(label)
    }
}

/// What the host must show for the outstanding password request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordRequest {
    pub file_index: usize,
    pub file_name: String,
    /// Set after a submitted password was rejected
    pub attempt_failed: bool,
}

/// Where an assembly call left the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    /// Halted on an encrypted file; answer with `submit_password` or
    /// `cancel_password`
    PasswordRequired(PasswordRequest),
    /// The merged document is available through `output`
    Ready { page_count: usize },
}

type StateListener = Box<dyn Fn(AssemblyState) + Send + Sync>;

/// Drives a batch of files to a single merged PDF
pub struct Orchestrator<E: DocumentEngine> {
    engine: Arc<E>,
    options: AssemblyOptions,
    session: Session,
    listener: Option<StateListener>,
}

impl<E: DocumentEngine> Orchestrator<E> {
    pub fn new(engine: Arc<E>, options: AssemblyOptions) -> Self {
        Self {
            engine,
            options,
            session: Session::default(),
            listener: None,
        }
    }

    /// Call `listener` on every state transition
    pub fn on_state_change(
        mut self,
        listener: impl Fn(AssemblyState) + Send + Sync + 'static,
    ) -> Self {
        self.listener = Some(Box::new(listener));
        self
    }

    pub fn state(&self) -> AssemblyState {
        self.session.state
    }

    pub fn options(&self) -> &AssemblyOptions {
        &self.options
    }

    pub fn files(&self) -> &[InputFile] {
        &self.session.batch
    }

    pub fn passwords(&self) -> &PasswordStore {
        &self.session.passwords
    }

    /// The outstanding password request, if any
    pub fn pending_request(&self) -> Option<PasswordRequest> {
        self.session.pending.as_ref().map(|pending| self.request_for(pending))
    }

    /// The merged document, present only in the `Ready` state
    pub fn output(&self) -> Option<&MergedDocument> {
        self.session.output.as_ref()
    }

    /// Append files to the batch. Files that are neither PDFs nor images are
    /// dropped. Returns the number of files admitted.
    pub fn add_files(&mut self, files: impl IntoIterator<Item = InputFile>) -> usize {
        let before = self.session.batch.len();
        for file in files {
            if file.kind().is_admitted() {
                self.session.batch.push(file);
            } else {
                log::debug!("Dropping {} ({}): not a PDF or image", file.name(), file.media_type());
            }
        }

        let admitted = self.session.batch.len() - before;
        if admitted > 0 {
            log::info!("Added {} file(s), batch now has {}", admitted, self.session.batch.len());
            self.invalidate();
        }
        admitted
    }

    /// Remove the file at `index` from the batch
    pub fn remove_file(&mut self, index: usize) -> Option<InputFile> {
        if index >= self.session.batch.len() {
            return None;
        }
        let removed = self.session.batch.remove(index);
        log::info!("Removed {}, batch now has {}", removed.name(), self.session.batch.len());
        self.invalidate();
        Some(removed)
    }

    /// Advance the batch as far as possible.
    ///
    /// Stops at the first encrypted PDF without a stored password, or once the
    /// merged document is ready. While a password request is outstanding this
    /// only repeats it. On failure the session returns to `Idle` with the batch
    /// and stored passwords intact, so the call can be retried.
    pub async fn assemble(&mut self) -> Result<Progress> {
        match self.session.state {
            AssemblyState::AwaitingPassword => {
                if let Some(request) = self.pending_request() {
                    return Ok(Progress::PasswordRequired(request));
                }
            }
            AssemblyState::Ready => {
                if let Some(output) = &self.session.output {
                    return Ok(Progress::Ready {
                        page_count: output.page_count,
                    });
                }
            }
            _ => {}
        }

        self.advance().await
    }

    /// Answer the outstanding password request.
    ///
    /// A rejected password keeps the request open with `attempt_failed` set.
    /// An accepted one is stored and assembly continues with the next file.
    pub async fn submit_password(&mut self, password: &str) -> Result<Progress> {
        let Some(mut pending) = self.session.pending.clone() else {
            return Err(AssemblyError::NoPendingRequest);
        };
        let file = self
            .session
            .batch
            .get(pending.file_index)
            .cloned()
            .ok_or(AssemblyError::NoPendingRequest)?;

        match page_count(&self.engine, &file, Some(password)).await {
            Ok(pages) => {
                log::info!("Unlocked {} ({} pages)", file.name(), pages);
                self.session.passwords.insert(file.key(), password);
                self.session.unlocked.insert(pending.file_index, password.to_string());
                self.session.pending = None;
                self.session.scan_cursor = pending.file_index + 1;
                self.advance().await
            }
            Err(e) if e.is_password_condition() => {
                log::info!("Password rejected for {}", file.name());
                pending.attempt_failed = true;
                let request = self.request_for(&pending);
                self.session.pending = Some(pending);
                Ok(Progress::PasswordRequired(request))
            }
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    /// Dismiss the outstanding password request. The batch is kept.
    pub fn cancel_password(&mut self) {
        if let Some(request) = self.pending_request() {
            log::info!("Password request for {} cancelled", request.file_name);
        }
        self.invalidate();
    }

    /// Take the merged document and end the session.
    ///
    /// Returns `None` unless the session is `Ready`.
    pub fn hand_off(&mut self) -> Option<MergedDocument> {
        if self.session.state != AssemblyState::Ready {
            return None;
        }
        let output = self.session.output.take()?;
        log::info!("Handing off {} ({} pages)", output.file_name, output.page_count);
        self.reset();
        Some(output)
    }

    /// Discard the batch, stored passwords and any output
    pub fn reset(&mut self) {
        let previous = std::mem::take(&mut self.session);
        if previous.state != AssemblyState::Idle {
            self.notify(AssemblyState::Idle);
        }
    }

    async fn advance(&mut self) -> Result<Progress> {
        match self.run().await {
            Ok(progress) => Ok(progress),
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    async fn run(&mut self) -> Result<Progress> {
        self.session.output = None;

        self.set_state(AssemblyState::Scanning);
        if let Some(request) = self.scan().await? {
            self.set_state(AssemblyState::AwaitingPassword);
            return Ok(Progress::PasswordRequired(request));
        }

        self.set_state(AssemblyState::Resolving);
        let documents = resolve::resolve_batch(
            &self.engine,
            &self.session.batch,
            &self.session.unlocked,
            &self.options,
        )
        .await?;

        self.set_state(AssemblyState::Merging);
        let merged = merge(documents).await?;
        let compress = self.options.compress_output;
        let (data, page_count) = tokio::task::spawn_blocking(move || -> Result<(Vec<u8>, usize)> {
            let data = save_to_bytes(merged, compress)?;
            let pages = count_pdf_pages(&data)?;
            Ok((data, pages))
        })
        .await?
        .map_err(|e| match e {
            AssemblyError::MergeFailed(_) => e,
            other => AssemblyError::MergeFailed(other.to_string()),
        })?;

        if page_count == 0 {
            return Err(AssemblyError::NoPages);
        }

        let output = MergedDocument {
            file_name: merged_file_name(&self.session.batch),
            data,
            page_count,
        };
        log::info!("Assembled {} ({} pages)", output.file_name, page_count);
        self.session.output = Some(output);
        self.set_state(AssemblyState::Ready);
        Ok(Progress::Ready { page_count })
    }

    /// Probe files from the cursor onward. Returns the request for the first
    /// encrypted PDF that none of the stored passwords opens.
    async fn scan(&mut self) -> Result<Option<PasswordRequest>> {
        while self.session.scan_cursor < self.session.batch.len() {
            let index = self.session.scan_cursor;
            let file = self.session.batch[index].clone();

            if file.kind() == InputKind::Pdf && is_encrypted(&self.engine, &file).await {
                match self.try_stored_passwords(&file).await? {
                    Some(password) => {
                        log::debug!("{} opened with a stored password", file.name());
                        self.session.unlocked.insert(index, password);
                    }
                    None => {
                        // Set when a stored password for this name was rejected
                        let attempt_failed = self.session.passwords.contains(&file.key());
                        log::info!("{} is encrypted, requesting password", file.name());
                        let pending = PendingRequest {
                            file_index: index,
                            attempt_failed,
                        };
                        let request = self.request_for(&pending);
                        self.session.pending = Some(pending);
                        return Ok(Some(request));
                    }
                }
            }

            self.session.scan_cursor += 1;
        }
        Ok(None)
    }

    /// The first stored password that opens `file`
    async fn try_stored_passwords(&self, file: &InputFile) -> Result<Option<String>> {
        for candidate in self.session.passwords.candidates(&file.key()) {
            match page_count(&self.engine, file, Some(candidate)).await {
                Ok(_) => return Ok(Some(candidate.clone())),
                Err(e) if e.is_password_condition() => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }

    fn request_for(&self, pending: &PendingRequest) -> PasswordRequest {
        PasswordRequest {
            file_index: pending.file_index,
            file_name: self
                .session
                .batch
                .get(pending.file_index)
                .map(|file| file.name().to_string())
                .unwrap_or_default(),
            attempt_failed: pending.attempt_failed,
        }
    }

    fn invalidate(&mut self) {
        self.session.invalidate();
        self.set_state(AssemblyState::Idle);
    }

    fn fail(&mut self, error: &AssemblyError) {
        log::warn!("Assembly failed: {}", error);
        self.invalidate();
    }

    fn set_state(&mut self, state: AssemblyState) {
        if self.session.state == state {
            return;
        }
        log::debug!("Assembly state: {} -> {}", self.session.state, state);
        self.session.state = state;
        self.notify(state);
    }

    fn notify(&self, state: AssemblyState) {
        if let Some(listener) = &self.listener {
            listener(state);
        }
    }
}
