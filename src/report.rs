//! # Conversion Statistics and Report Module
//!
//! Questo modulo raccoglie gli esiti per-file dei worker e produce il report
//! finale della conversione.
//!
//! ## Componenti principali:
//! - `FileOutcome`: esito di un singolo file (convertito o fallito)
//! - `WorkerReport`: esiti di un chunk, nell'ordine di conversione
//! - `ConversionStats`: statistiche cumulative sul batch
//! - `RunReport`: report completo restituito dal coordinator
//!
//! ## Statistiche tracciate:
//! - **files_converted**: File scritti nella directory di output
//! - **decode_failures** / **encode_failures**: File saltati per errore
//! - **files_unaccounted**: File assegnati a un worker morto prima dell'esito
//! - **bytes_written**: Byte totali scritti
//! - **workers_failed**: Worker terminati in modo anomalo

use crate::file_manager::FileManager;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Stage of the per-file pipeline that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureStage {
    Decode,
    Encode,
}

/// Result of converting one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum FileStatus {
    Converted { bytes_written: u64 },
    Failed { stage: FailureStage, reason: String },
}

/// Outcome for one source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileOutcome {
    #[serde(with = "crate::converter::protocol::wire_path")]
    pub source: PathBuf,
    #[serde(with = "crate::converter::protocol::wire_path")]
    pub output: PathBuf,
    #[serde(flatten)]
    pub status: FileStatus,
}

impl FileOutcome {
    pub fn is_converted(&self) -> bool {
        matches!(self.status, FileStatus::Converted { .. })
    }
}

/// What one worker did with its chunk
#[derive(Debug, Clone)]
pub struct WorkerReport {
    pub index: usize,
    /// Number of jobs in the chunk
    pub assigned: usize,
    pub outcomes: Vec<FileOutcome>,
    pub elapsed: Duration,
    /// False when the worker died or reported garbage
    pub exit_ok: bool,
}

impl WorkerReport {
    /// Report for a worker that terminated abnormally
    pub fn abnormal(index: usize, assigned: usize, outcomes: Vec<FileOutcome>, elapsed: Duration) -> Self {
        Self {
            index,
            assigned,
            outcomes,
            elapsed,
            exit_ok: false,
        }
    }
}

/// Statistics tracker for conversion results
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConversionStats {
    pub files_converted: usize,
    pub decode_failures: usize,
    pub encode_failures: usize,
    /// Assigned files for which no outcome ever came back
    pub files_unaccounted: usize,
    pub bytes_written: u64,
    pub workers_failed: usize,
}

impl ConversionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_outcome(&mut self, outcome: &FileOutcome) {
        match &outcome.status {
            FileStatus::Converted { bytes_written } => {
                self.files_converted += 1;
                self.bytes_written += bytes_written;
            }
            FileStatus::Failed { stage: FailureStage::Decode, .. } => self.decode_failures += 1,
            FileStatus::Failed { stage: FailureStage::Encode, .. } => self.encode_failures += 1,
        }
    }

    pub fn add_worker(&mut self, report: &WorkerReport) {
        for outcome in &report.outcomes {
            self.add_outcome(outcome);
        }
        self.files_unaccounted += report.assigned.saturating_sub(report.outcomes.len());
        if !report.exit_ok {
            self.workers_failed += 1;
        }
    }

    pub fn failures(&self) -> usize {
        self.decode_failures + self.encode_failures
    }

    pub fn format_summary(&self) -> String {
        format!(
            "Converted: {} files | Failed: {} (decode {}, encode {}) | Unaccounted: {} | Written: {} | Failed workers: {}",
            self.files_converted,
            self.failures(),
            self.decode_failures,
            self.encode_failures,
            self.files_unaccounted,
            FileManager::format_size(self.bytes_written),
            self.workers_failed
        )
    }
}

/// Final report of a batch run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub output_dir: PathBuf,
    pub discovered: usize,
    /// One entry per spawned worker, ordered by worker index
    pub workers: Vec<WorkerReport>,
    pub stats: ConversionStats,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn new(output_dir: PathBuf, discovered: usize, mut workers: Vec<WorkerReport>, elapsed: Duration) -> Self {
        workers.sort_by_key(|w| w.index);
        let mut stats = ConversionStats::new();
        for worker in &workers {
            stats.add_worker(worker);
        }

        Self {
            output_dir,
            discovered,
            workers,
            stats,
            elapsed,
        }
    }

    /// All outcomes in worker order, which is discovery order
    pub fn outcomes(&self) -> impl Iterator<Item = &FileOutcome> {
        self.workers.iter().flat_map(|w| w.outcomes.iter())
    }
}
