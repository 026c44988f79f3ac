use super::AssemblyState;
use crate::types::{FileKey, InputFile, MergedDocument};
use std::collections::HashMap;

/// Passwords that unlocked files in the current session.
///
/// Several files may share a name, so each key holds every password that
/// opened a file of that name. Entries are only ever added; a new session
/// starts with an empty store.
#[derive(Debug, Default)]
pub struct PasswordStore {
    passwords: HashMap<FileKey, Vec<String>>,
}

impl PasswordStore {
    pub fn insert(&mut self, key: FileKey, password: impl Into<String>) {
        let password = password.into();
        let known = self.passwords.entry(key).or_default();
        if !known.contains(&password) {
            known.push(password);
        }
    }

    /// Passwords worth trying for a file with this key, oldest first
    pub fn candidates(&self, key: &FileKey) -> &[String] {
        self.passwords.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn contains(&self, key: &FileKey) -> bool {
        self.passwords.contains_key(key)
    }

    /// Total number of stored passwords
    pub fn len(&self) -> usize {
        self.passwords.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.passwords.is_empty()
    }
}

/// The single outstanding password request
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PendingRequest {
    pub file_index: usize,
    pub attempt_failed: bool,
}

/// Everything the orchestrator mutates while assembling one batch
#[derive(Debug, Default)]
pub(crate) struct Session {
    pub batch: Vec<InputFile>,
    pub passwords: PasswordStore,
    pub pending: Option<PendingRequest>,
    /// Index of the next file to probe
    pub scan_cursor: usize,
    /// Password that opened each encrypted entry scanned so far, by batch index
    pub unlocked: HashMap<usize, String>,
    pub output: Option<MergedDocument>,
    pub state: AssemblyState,
}

impl Session {
    /// Drop everything derived from the current batch composition.
    /// Scanning starts over from the first file; stored passwords survive.
    pub fn invalidate(&mut self) {
        self.pending = None;
        self.scan_cursor = 0;
        self.unlocked.clear();
        self.output = None;
    }
}
