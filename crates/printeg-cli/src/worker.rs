use pdf_assemble::{AssemblyOptions, DocumentEngine, Orchestrator, Progress, load_input_files};
use pdf_async_runtime::{AssemblyCommand, AssemblyUpdate, CommandReceiver, UpdateSender};
use std::sync::Arc;

/// Async worker task that owns the orchestrator, processes commands and sends
/// updates
pub async fn worker_task<E: DocumentEngine>(
    mut orchestrator: Orchestrator<E>,
    mut command_rx: CommandReceiver,
    update_tx: UpdateSender,
) {
    while let Some(cmd) = command_rx.recv().await {
        process_command(cmd, &mut orchestrator, &update_tx).await;
    }
}

/// Build an orchestrator whose state transitions are reported on `update_tx`
pub fn reporting_orchestrator<E: DocumentEngine>(
    engine: Arc<E>,
    options: AssemblyOptions,
    update_tx: &UpdateSender,
) -> Orchestrator<E> {
    let state_tx = update_tx.clone();
    Orchestrator::new(engine, options).on_state_change(move |state| {
        let _ = state_tx.send(AssemblyUpdate::StateChanged { state });
    })
}

async fn process_command<E: DocumentEngine>(
    cmd: AssemblyCommand,
    orchestrator: &mut Orchestrator<E>,
    update_tx: &UpdateSender,
) {
    match cmd {
        AssemblyCommand::AddFiles { files } => {
            orchestrator.add_files(files);
            files_changed(orchestrator, update_tx);
            run_assembly(orchestrator, update_tx).await;
        }
        AssemblyCommand::AddPaths { paths } => match load_input_files(&paths).await {
            Ok(files) => {
                orchestrator.add_files(files);
                files_changed(orchestrator, update_tx);
                run_assembly(orchestrator, update_tx).await;
            }
            Err(e) => send_error(update_tx, format!("Failed to load files: {}", e)),
        },
        AssemblyCommand::RemoveFile { index } => {
            if orchestrator.remove_file(index).is_none() {
                send_error(update_tx, format!("No file at position {}", index + 1));
                return;
            }
            files_changed(orchestrator, update_tx);
            if !orchestrator.files().is_empty() {
                run_assembly(orchestrator, update_tx).await;
            }
        }
        AssemblyCommand::Assemble => {
            run_assembly(orchestrator, update_tx).await;
        }
        AssemblyCommand::SubmitPassword { password } => {
            let result = orchestrator.submit_password(&password).await;
            report(result, orchestrator, update_tx);
        }
        AssemblyCommand::CancelPassword => {
            orchestrator.cancel_password();
        }
        AssemblyCommand::Reset => {
            orchestrator.reset();
            files_changed(orchestrator, update_tx);
        }
        AssemblyCommand::HandOff => match orchestrator.hand_off() {
            Some(document) => {
                let _ = update_tx.send(AssemblyUpdate::HandedOff { document });
                files_changed(orchestrator, update_tx);
            }
            None => send_error(update_tx, "No assembled document to hand off".to_string()),
        },
    }
}

async fn run_assembly<E: DocumentEngine>(
    orchestrator: &mut Orchestrator<E>,
    update_tx: &UpdateSender,
) {
    let result = orchestrator.assemble().await;
    report(result, orchestrator, update_tx);
}

fn report<E: DocumentEngine>(
    result: pdf_assemble::Result<Progress>,
    orchestrator: &Orchestrator<E>,
    update_tx: &UpdateSender,
) {
    let update = match result {
        Ok(Progress::PasswordRequired(request)) => AssemblyUpdate::PasswordRequested {
            file_index: request.file_index,
            file_name: request.file_name,
            attempt_failed: request.attempt_failed,
        },
        Ok(Progress::Ready { page_count }) => AssemblyUpdate::Assembled {
            file_name: orchestrator
                .output()
                .map(|output| output.file_name.clone())
                .unwrap_or_default(),
            page_count,
        },
        Err(e) => {
            if !e.is_recoverable() {
                log::error!("{}", e);
            }
            AssemblyUpdate::Error {
                message: e.to_string(),
            }
        }
    };
    let _ = update_tx.send(update);
}

fn files_changed<E: DocumentEngine>(orchestrator: &Orchestrator<E>, update_tx: &UpdateSender) {
    let names = orchestrator
        .files()
        .iter()
        .map(|file| file.name().to_string())
        .collect();
    let _ = update_tx.send(AssemblyUpdate::FilesChanged { names });
}

fn send_error(update_tx: &UpdateSender, message: String) {
    log::error!("{}", message);
    let _ = update_tx.send(AssemblyUpdate::Error { message });
}
