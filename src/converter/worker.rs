//! # Chunk Worker Module
//!
//! Worker per la conversione di un singolo chunk.
//! Converte i file nell'ordine ricevuto; un file illeggibile o non scrivibile
//! viene segnalato e saltato, mai propagato al batch.

use crate::{
    codec::{Codec, ImageCodec},
    converter::{
        path_resolver::ConversionJob,
        protocol::{ChunkManifest, WorkerMessage},
    },
    error::{ConvertError, Result},
    report::{FailureStage, FileOutcome, FileStatus, WorkerReport},
};
use image::ImageFormat;
use std::io::{Read, Write};
use std::time::Instant;
use tracing::{debug, warn};

/// Converts the jobs of one chunk, sequentially
pub struct ChunkWorker<'a> {
    index: usize,
    codec: &'a dyn Codec,
}

impl<'a> ChunkWorker<'a> {
    pub fn new(index: usize, codec: &'a dyn Codec) -> Self {
        Self { index, codec }
    }

    /// Convert every job and collect the outcomes
    pub fn run(&self, jobs: Vec<ConversionJob>) -> WorkerReport {
        self.run_with(jobs, |_| {})
    }

    /// Like `run`, calling `on_outcome` right after each file is done
    pub fn run_with<F>(&self, jobs: Vec<ConversionJob>, mut on_outcome: F) -> WorkerReport
    where
        F: FnMut(&FileOutcome),
    {
        let start = Instant::now();
        let assigned = jobs.len();
        debug!("Worker {} starting on {} files", self.index, assigned);

        let mut outcomes = Vec::with_capacity(assigned);
        for job in jobs {
            let outcome = self.convert(job);
            on_outcome(&outcome);
            outcomes.push(outcome);
        }

        let elapsed = start.elapsed();
        debug!("Worker {} finished {} files in {:?}", self.index, assigned, elapsed);

        WorkerReport {
            index: self.index,
            assigned,
            outcomes,
            elapsed,
            exit_ok: true,
        }
    }

    fn convert(&self, job: ConversionJob) -> FileOutcome {
        let status = match self.decode_then_encode(&job) {
            Ok(bytes_written) => {
                debug!("Converted {} -> {}", job.source.display(), job.output.display());
                FileStatus::Converted { bytes_written }
            }
            Err((stage, err)) => {
                warn!("Skipping {}: {}", job.source.display(), err);
                FileStatus::Failed {
                    stage,
                    reason: err.to_string(),
                }
            }
        };

        FileOutcome {
            source: job.source,
            output: job.output,
            status,
        }
    }

    fn decode_then_encode(&self, job: &ConversionJob) -> std::result::Result<u64, (FailureStage, ConvertError)> {
        let image = self
            .codec
            .decode(&job.source)
            .map_err(|e| (FailureStage::Decode, e))?;

        self.codec
            .encode(&image, &job.output)
            .map_err(|e| (FailureStage::Encode, e))?;

        match std::fs::metadata(&job.output) {
            Ok(metadata) => Ok(metadata.len()),
            Err(e) => {
                debug!("Cannot stat {}: {}", job.output.display(), e);
                Ok(0)
            }
        }
    }
}

/// Entry point of a worker process.
///
/// Reads a `ChunkManifest` from `input` and streams one JSON line per file to
/// `output`, followed by a `finished` line.
pub fn serve<R: Read, W: Write>(input: R, mut output: W) -> Result<()> {
    let manifest = ChunkManifest::read_from(input)?;
    let target = ImageFormat::from_extension(&manifest.target_extension).ok_or_else(|| {
        ConvertError::Protocol(format!(
            "unsupported target extension '{}'",
            manifest.target_extension
        ))
    })?;

    let codec = ImageCodec::new(target);
    debug!(
        "Worker {} converting {} files to {:?}",
        manifest.index,
        manifest.jobs.len(),
        codec.target()
    );
    let mut emit_error = None;
    let report = ChunkWorker::new(manifest.index, &codec).run_with(manifest.jobs, |outcome| {
        if emit_error.is_some() {
            return;
        }
        let message = WorkerMessage::FileDone {
            outcome: outcome.clone(),
        };
        if let Err(e) = message.emit(&mut output) {
            emit_error = Some(e);
        }
    });

    if let Some(e) = emit_error {
        return Err(e);
    }

    WorkerMessage::Finished {
        files: report.outcomes.len(),
        duration_seconds: report.elapsed.as_secs_f64(),
    }
    .emit(&mut output)
}
