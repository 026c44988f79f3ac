use std::path::PathBuf;
use tokio::sync::mpsc;

// Re-export types from library crates
pub use pdf_assemble::{AssemblyState, InputFile, MergedDocument};

/// Commands sent from the host to the assembly worker
#[derive(Debug)]
pub enum AssemblyCommand {
    /// Append files to the batch; unsupported ones are dropped
    AddFiles {
        files: Vec<InputFile>,
    },
    /// Load files from disk and append them to the batch
    AddPaths {
        paths: Vec<PathBuf>,
    },
    RemoveFile {
        index: usize,
    },
    /// Run assembly again, e.g. after a failure
    Assemble,
    SubmitPassword {
        password: String,
    },
    CancelPassword,
    /// Discard the batch and every stored password
    Reset,
    /// Take the merged document, ending the session
    HandOff,
}

/// Updates sent from the worker back to the host
#[derive(Debug, Clone)]
pub enum AssemblyUpdate {
    StateChanged {
        state: AssemblyState,
    },
    FilesChanged {
        names: Vec<String>,
    },
    PasswordRequested {
        file_index: usize,
        file_name: String,
        attempt_failed: bool,
    },
    /// A merged document is ready for hand-off
    Assembled {
        file_name: String,
        page_count: usize,
    },
    HandedOff {
        document: MergedDocument,
    },
    Error {
        message: String,
    },
}

pub type CommandSender = mpsc::UnboundedSender<AssemblyCommand>;
pub type CommandReceiver = mpsc::UnboundedReceiver<AssemblyCommand>;
pub type UpdateSender = mpsc::UnboundedSender<AssemblyUpdate>;
pub type UpdateReceiver = mpsc::UnboundedReceiver<AssemblyUpdate>;
