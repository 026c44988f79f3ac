use anyhow::{Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use pdf_assemble::engine::PdfiumEngine;
use pdf_assemble::{AssemblyOptions, Orientation, PaperSize};
use pdf_async_runtime::{AssemblyCommand, AssemblyUpdate};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

mod logger;
mod prompt;
mod worker;

use logger::AppLogger;
use prompt::{PasswordPrompt, parse_preset};

/// Log entries retained for `--log-file`
const MAX_LOG_ENTRIES: usize = 10_000;

#[derive(Parser)]
#[command(
    name = "printeg",
    about = "Assemble PDFs and images into one printable PDF",
    version
)]
struct Cli {
    /// Log debug details
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Write the session log to this file on exit
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Directory containing the pdfium shared library
    #[arg(long, global = true)]
    pdfium_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge files into a single PDF, asking for passwords as needed
    Assemble {
        /// Input files (PDF or image), in output order
        #[arg(short, long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,

        /// Output PDF file
        #[arg(short, long)]
        output: PathBuf,

        /// Password for a file, as NAME=PASSWORD; may be repeated
        #[arg(long = "password", value_parser = parse_preset)]
        passwords: Vec<(String, String)>,

        /// Options file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Render resolution for password-protected PDFs
        #[arg(long)]
        dpi: Option<f32>,

        /// Page size for image files
        #[arg(long, value_enum)]
        paper: Option<PaperArg>,

        /// Page orientation for image files
        #[arg(long, value_enum)]
        orientation: Option<OrientationArg>,

        /// Margin around images in mm
        #[arg(long)]
        margin: Option<f32>,

        /// Write uncompressed output
        #[arg(long)]
        no_compress: bool,
    },

    /// Report which PDFs are password protected
    Probe {
        #[arg(short, long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,
    },

    /// Print the page count of a PDF
    Count {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(long)]
        password: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PaperArg {
    A3,
    A4,
    A5,
    Letter,
    Legal,
}

#[derive(Clone, Copy, ValueEnum)]
enum OrientationArg {
    Portrait,
    Landscape,
}

impl From<PaperArg> for PaperSize {
    fn from(arg: PaperArg) -> Self {
        match arg {
            PaperArg::A3 => Self::A3,
            PaperArg::A4 => Self::A4,
            PaperArg::A5 => Self::A5,
            PaperArg::Letter => Self::Letter,
            PaperArg::Legal => Self::Legal,
        }
    }
}

impl From<OrientationArg> for Orientation {
    fn from(arg: OrientationArg) -> Self {
        match arg {
            OrientationArg::Portrait => Self::Portrait,
            OrientationArg::Landscape => Self::Landscape,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let logger = AppLogger::new(MAX_LOG_ENTRIES, level);
    logger.clone().init()?;

    let result = run(cli.command, cli.pdfium_dir.as_deref()).await;

    if let Some(path) = &cli.log_file {
        logger.dump_to(path)?;
    }
    result
}

async fn run(command: Commands, pdfium_dir: Option<&Path>) -> Result<()> {
    let engine = Arc::new(PdfiumEngine::bind(pdfium_dir)?);

    match command {
        Commands::Assemble {
            input,
            output,
            passwords,
            config,
            dpi,
            paper,
            orientation,
            margin,
            no_compress,
        } => {
            let mut options = match config {
                Some(path) => AssemblyOptions::load(&path).await?,
                None => AssemblyOptions::default(),
            };
            if let Some(dpi) = dpi {
                options.render_dpi = dpi;
            }
            if let Some(paper) = paper {
                options.image_paper_size = paper.into();
            }
            if let Some(orientation) = orientation {
                options.image_orientation = orientation.into();
            }
            if let Some(margin) = margin {
                options.image_margin_mm = margin;
            }
            if no_compress {
                options.compress_output = false;
            }
            options.validate()?;

            assemble(engine, options, input, output, passwords).await?;
        }

        Commands::Probe { input } => {
            let files = pdf_assemble::load_input_files(&input).await?;
            for file in &files {
                let status = match file.kind() {
                    pdf_assemble::InputKind::Pdf => {
                        if pdf_assemble::is_encrypted(&engine, file).await {
                            "password protected"
                        } else {
                            "not protected"
                        }
                    }
                    _ => "not a PDF",
                };
                println!("{}: {}", file.name(), status);
            }
        }

        Commands::Count { input, password } => {
            let file = pdf_assemble::load_input_file(&input).await?;
            let pages = pdf_assemble::page_count(&engine, &file, password.as_deref()).await?;
            println!("{}: {} pages", file.name(), pages);
        }
    }

    Ok(())
}

/// Drive the worker until the merged document is saved or the user cancels
async fn assemble(
    engine: Arc<PdfiumEngine>,
    options: AssemblyOptions,
    input: Vec<PathBuf>,
    output: PathBuf,
    passwords: Vec<(String, String)>,
) -> Result<()> {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (update_tx, mut update_rx) = mpsc::unbounded_channel();

    let orchestrator = worker::reporting_orchestrator(engine, options, &update_tx);
    let worker = tokio::spawn(worker::worker_task(orchestrator, command_rx, update_tx));

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut prompt = PasswordPrompt::new(passwords, stdin);

    command_tx.send(AssemblyCommand::AddPaths { paths: input })?;

    while let Some(update) = update_rx.recv().await {
        match update {
            AssemblyUpdate::StateChanged { state } => {
                log::debug!("State: {}", state);
            }
            AssemblyUpdate::FilesChanged { names } => {
                if names.is_empty() {
                    continue;
                }
                log::info!("Batch: {}", names.join(", "));
            }
            AssemblyUpdate::PasswordRequested {
                file_name,
                attempt_failed,
                ..
            } => match prompt.ask(&file_name, attempt_failed).await? {
                Some(password) => command_tx.send(AssemblyCommand::SubmitPassword { password })?,
                None => {
                    command_tx.send(AssemblyCommand::CancelPassword)?;
                    bail!("Cancelled: no password for {}", file_name);
                }
            },
            AssemblyUpdate::Assembled {
                file_name,
                page_count,
            } => {
                log::info!("Assembled {} ({} pages)", file_name, page_count);
                command_tx.send(AssemblyCommand::HandOff)?;
            }
            AssemblyUpdate::HandedOff { document } => {
                pdf_assemble::save_pdf(&document.data, &output).await?;
                println!(
                    "Assembled {} pages → {}",
                    document.page_count,
                    output.display()
                );
                break;
            }
            AssemblyUpdate::Error { message } => {
                bail!(message);
            }
        }
    }

    drop(command_tx);
    worker.await?;
    Ok(())
}
