//! # BMP Batch Converter - Main Entry Point
//!
//! Questo è il punto di ingresso principale dell'applicazione.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing`
//! - Validazione degli input dell'utente (errori di configurazione → exit 1)
//! - Creazione della configurazione e avvio del converter
//! - Modalità worker nascosta, usata dal coordinator per i processi figli
//!
//! ## Flusso di esecuzione:
//! 1. Parsa gli argomenti CLI (input path, worker count, opzioni)
//! 2. Configura il logging (INFO o DEBUG a seconda del flag verbose)
//! 3. Valida il worker count e crea un oggetto Config
//! 4. Istanzia BatchConverter e avvia la conversione
//!
//! ## Esempio di utilizzo:
//! ```bash
//! bmp-converter /path/to/bitmaps 8 --verbose
//! ```

use anyhow::{anyhow, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::debug;

use bmp_batch_converter::{
    config::DEFAULT_OUTPUT_DIR,
    converter::worker,
    BatchConverter, Config, Isolation,
};

#[derive(Parser)]
#[command(name = "bmp-converter")]
#[command(version)]
#[command(about = "Convert a tree of BMP images to PNG using parallel workers")]
#[command(allow_negative_numbers = true)]
struct Args {
    /// BMP file or directory containing BMP files
    #[arg(required_unless_present = "worker_index")]
    input_path: Option<PathBuf>,

    /// Number of parallel workers (positive integer)
    #[arg(required_unless_present = "worker_index")]
    worker_count: Option<String>,

    /// Convert the chunk described on stdin (set by the coordinator)
    #[arg(long, hide = true, conflicts_with_all = ["input_path", "worker_count"])]
    worker_index: Option<usize>,

    /// Output directory for converted files
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
    output: PathBuf,

    /// Worker isolation: "process" or "thread"
    #[arg(long, default_value = "process")]
    isolation: Isolation,

    /// Extension of the source files (case-sensitive)
    #[arg(long, default_value = "bmp")]
    from: String,

    /// Extension of the converted files
    #[arg(long, default_value = "png")]
    to: String,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn log_level(verbose: bool) -> tracing::Level {
    if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if e.use_stderr() => {
            e.print()?;
            std::process::exit(1);
        }
        Err(e) => e.exit(),
    };

    match args.worker_index {
        Some(index) => run_worker(index, args.verbose).await,
        None => run_converter(args).await,
    }
}

async fn run_converter(args: Args) -> Result<()> {
    // Initialize logging
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level(args.verbose))
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    // Validate arguments
    let input_path = args
        .input_path
        .ok_or_else(|| anyhow!("missing <INPUT_PATH> argument"))?;
    let raw_workers = args
        .worker_count
        .ok_or_else(|| anyhow!("missing <WORKER_COUNT> argument"))?;
    let workers = Config::parse_worker_count(&raw_workers)?;

    let config = Config {
        input_path,
        workers,
        output_dir: args.output,
        isolation: args.isolation,
        source_extension: args.from,
        target_extension: args.to,
    };

    let mut converter = BatchConverter::new(config)?;
    converter.run().await?;

    Ok(())
}

async fn run_worker(index: usize, verbose: bool) -> Result<()> {
    // stdout carries the outcome stream, so diagnostics go to stderr
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level(verbose))
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    debug!("Worker {} started", index);

    tokio::task::spawn_blocking(|| worker::serve(std::io::stdin().lock(), std::io::stdout().lock()))
        .await??;

    Ok(())
}
