//! # Batch Converter Main Orchestrator
//!
//! Orchestratore principale che delega responsabilità ai moduli specializzati.
//!
//! ## Fasi:
//! `Init → Discovering → Partitioning → Spawning → Running → Joining →
//! Reporting → Done`, con `Failed` raggiungibile da config non valida,
//! discovery fallita o spawn fallito. Nessuna fase viene rientrata.
//!
//! ## Concorrenza:
//! Ogni chunk appartiene a un solo worker (processo figlio o thread dedicato).
//! I worker non condividono stato; il coordinator li avvia tutti e poi
//! attende ciascuno (barriera completa) prima di produrre il report.

use crate::{
    codec::{Codec, ImageCodec},
    config::{Config, Isolation},
    converter::{
        partition::partition,
        path_resolver::{ConversionJob, PathResolver},
        protocol::{ChunkManifest, WorkerTranscript},
        worker::ChunkWorker,
    },
    error::{ConvertError, Result},
    file_manager::FileManager,
    report::{RunReport, WorkerReport},
};
use futures::future::join_all;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, warn};

/// Hidden flag the coordinator passes to start a worker process
pub const WORKER_INDEX_FLAG: &str = "--worker-index";

/// Lifecycle of a batch run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    Discovering,
    Partitioning,
    Spawning,
    Running,
    Joining,
    Reporting,
    Done,
    Failed,
}

/// A spawned worker, alive until joined
enum WorkerHandle {
    Thread {
        index: usize,
        assigned: usize,
        handle: std::thread::JoinHandle<WorkerReport>,
    },
    Process {
        index: usize,
        assigned: usize,
        task: tokio::task::JoinHandle<WorkerReport>,
    },
    /// Worker that was never started; its report is already final
    Settled(WorkerReport),
}

impl WorkerHandle {
    /// Wait for the worker to terminate
    async fn join(self) -> WorkerReport {
        match self {
            WorkerHandle::Thread {
                index,
                assigned,
                handle,
            } => match tokio::task::spawn_blocking(move || handle.join()).await {
                Ok(Ok(report)) => report,
                Ok(Err(_)) => {
                    error!("Worker {} panicked", index);
                    WorkerReport::abnormal(index, assigned, Vec::new(), Duration::ZERO)
                }
                Err(e) => {
                    error!("Failed to join worker {}: {}", index, e);
                    WorkerReport::abnormal(index, assigned, Vec::new(), Duration::ZERO)
                }
            },
            WorkerHandle::Process {
                index,
                assigned,
                task,
            } => match task.await {
                Ok(report) => report,
                Err(e) => {
                    error!("Supervisor of worker {} failed: {}", index, e);
                    WorkerReport::abnormal(index, assigned, Vec::new(), Duration::ZERO)
                }
            },
            WorkerHandle::Settled(report) => report,
        }
    }

    /// Stop supervising; a child process is killed when its task is dropped
    fn abort(self) {
        match self {
            WorkerHandle::Thread { index, .. } => {
                warn!("Worker {} keeps running detached", index);
            }
            WorkerHandle::Process { task, .. } => task.abort(),
            WorkerHandle::Settled(_) => {}
        }
    }
}

/// Orchestratore principale
pub struct BatchConverter {
    config: Config,
    codec: Arc<dyn Codec>,
    worker_program: Option<PathBuf>,
    phase: Phase,
}

impl BatchConverter {
    /// Crea nuova istanza del converter
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let codec: Arc<dyn Codec> = Arc::new(ImageCodec::new(config.target_format()?));

        Ok(Self {
            config,
            codec,
            worker_program: None,
            phase: Phase::Init,
        })
    }

    /// Codec used by thread workers
    pub fn with_codec(mut self, codec: Arc<dyn Codec>) -> Self {
        self.codec = codec;
        self
    }

    /// Executable started for process workers (default: the current binary)
    pub fn with_worker_program(mut self, program: PathBuf) -> Self {
        self.worker_program = Some(program);
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Esegue la conversione batch
    pub async fn run(&mut self) -> Result<RunReport> {
        match self.run_phases().await {
            Ok(report) => Ok(report),
            Err(e) => {
                error!("Conversion failed during {:?}: {}", self.phase, e);
                self.enter(Phase::Failed);
                Err(e)
            }
        }
    }

    async fn run_phases(&mut self) -> Result<RunReport> {
        self.enter(Phase::Discovering);
        let sources = self.discover().await?;
        info!(
            "Found {} .{} files in {}",
            sources.len(),
            self.config.source_extension,
            self.config.input_path.display()
        );

        let output_dir = self.prepare_output_dir().await?;

        self.enter(Phase::Partitioning);
        let jobs = PathResolver::plan_jobs(sources, &output_dir, &self.config.target_extension)?;
        let discovered = jobs.len();
        let chunks = partition(jobs, self.config.workers)?;
        for (index, chunk) in chunks.iter().enumerate() {
            debug!("Chunk {}: {} files", index, chunk.len());
        }

        let start_time = Instant::now();

        self.enter(Phase::Spawning);
        let handles = self.spawn_all(chunks)?;

        self.enter(Phase::Running);
        info!(
            "{} {} workers running",
            handles.len(),
            self.config.isolation
        );

        self.enter(Phase::Joining);
        let reports = join_all(handles.into_iter().map(WorkerHandle::join)).await;
        let elapsed = start_time.elapsed();

        self.enter(Phase::Reporting);
        let report = RunReport::new(output_dir, discovered, reports, elapsed);
        self.print_final_stats(&report);

        self.enter(Phase::Done);
        Ok(report)
    }

    /// Walk the input tree on the blocking pool
    async fn discover(&self) -> Result<Vec<PathBuf>> {
        let root = self.config.input_path.clone();
        let extension = self.config.source_extension.clone();

        tokio::task::spawn_blocking(move || FileManager::find_source_files(&root, &extension))
            .await
            .map_err(|e| ConvertError::Discovery {
                path: self.config.input_path.clone(),
                source: std::io::Error::new(std::io::ErrorKind::Other, e),
            })?
    }

    async fn prepare_output_dir(&self) -> Result<PathBuf> {
        let dir = self.config.output_dir.clone();

        tokio::task::spawn_blocking(move || FileManager::ensure_output_dir(&dir))
            .await
            .map_err(|e| ConvertError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?
    }

    fn enter(&mut self, phase: Phase) {
        debug!("Phase {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }

    /// Avvia un worker per chunk; al primo errore interrompe tutto
    fn spawn_all(&self, chunks: Vec<Vec<ConversionJob>>) -> Result<Vec<WorkerHandle>> {
        let program = match self.config.isolation {
            Isolation::Process => Some(self.resolve_worker_program()?),
            Isolation::Thread => None,
        };

        let mut handles = Vec::with_capacity(chunks.len());
        for (index, jobs) in chunks.into_iter().enumerate() {
            let spawned = match &program {
                Some(program) => self.spawn_process(program.clone(), index, jobs),
                None => self.spawn_thread(index, jobs),
            };

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    error!("Aborting: {} of {} workers were started", handles.len(), self.config.workers);
                    for handle in handles {
                        handle.abort();
                    }
                    return Err(e);
                }
            }
        }

        Ok(handles)
    }

    fn resolve_worker_program(&self) -> Result<PathBuf> {
        match &self.worker_program {
            Some(program) => Ok(program.clone()),
            None => std::env::current_exe().map_err(|source| ConvertError::Spawn { index: 0, source }),
        }
    }

    fn spawn_thread(&self, index: usize, jobs: Vec<ConversionJob>) -> Result<WorkerHandle> {
        let codec = Arc::clone(&self.codec);
        let assigned = jobs.len();

        let handle = std::thread::Builder::new()
            .name(format!("worker-{}", index))
            .spawn(move || ChunkWorker::new(index, &*codec).run(jobs))
            .map_err(|source| ConvertError::Spawn { index, source })?;

        Ok(WorkerHandle::Thread {
            index,
            assigned,
            handle,
        })
    }

    fn spawn_process(&self, program: PathBuf, index: usize, jobs: Vec<ConversionJob>) -> Result<WorkerHandle> {
        let assigned = jobs.len();
        let manifest = ChunkManifest {
            index,
            target_extension: self.config.target_extension.clone(),
            jobs,
        };
        let payload = match manifest.to_bytes() {
            Ok(payload) => payload,
            Err(e) => {
                // The chunk is lost, the batch is not
                error!("Cannot encode chunk {}: {}", index, e);
                return Ok(WorkerHandle::Settled(WorkerReport::abnormal(
                    index,
                    assigned,
                    Vec::new(),
                    Duration::ZERO,
                )));
            }
        };

        let mut command = tokio::process::Command::new(&program);
        command
            .arg(WORKER_INDEX_FLAG)
            .arg(index.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        if tracing::enabled!(tracing::Level::DEBUG) {
            command.arg("--verbose");
        }

        let mut child = command
            .spawn()
            .map_err(|source| ConvertError::Spawn { index, source })?;
        let mut stdin = child.stdin.take().ok_or_else(|| ConvertError::Spawn {
            index,
            source: std::io::Error::new(std::io::ErrorKind::BrokenPipe, "worker stdin not captured"),
        })?;
        debug!("Spawned worker {} (pid {:?}) with {} files", index, child.id(), assigned);

        let task = tokio::spawn(async move {
            let started = Instant::now();

            if let Err(e) = stdin.write_all(&payload).await {
                warn!("Could not send chunk to worker {}: {}", index, e);
            }
            drop(stdin);

            let output = match child.wait_with_output().await {
                Ok(output) => output,
                Err(e) => {
                    error!("Lost worker {}: {}", index, e);
                    return WorkerReport::abnormal(index, assigned, Vec::new(), started.elapsed());
                }
            };

            let transcript = WorkerTranscript::parse(output.stdout.as_slice());
            for e in &transcript.errors {
                warn!("Worker {}: {}", index, e);
            }
            if !output.status.success() {
                error!("Worker {} exited with {}", index, output.status);
            }

            WorkerReport {
                index,
                assigned,
                exit_ok: output.status.success() && transcript.is_clean(),
                outcomes: transcript.outcomes,
                elapsed: started.elapsed(),
            }
        });

        Ok(WorkerHandle::Process {
            index,
            assigned,
            task,
        })
    }

    /// Stampa statistiche finali
    fn print_final_stats(&self, report: &RunReport) {
        for worker in &report.workers {
            debug!(
                "Worker {}: {}/{} files in {:.3}s{}",
                worker.index,
                worker.outcomes.iter().filter(|o| o.is_converted()).count(),
                worker.assigned,
                worker.elapsed.as_secs_f64(),
                if worker.exit_ok { "" } else { " (abnormal exit)" }
            );
        }

        info!("{}", report.stats.format_summary());
        info!(
            "Conversion finished in {:.3}s, files saved to {}",
            report.elapsed.as_secs_f64(),
            report.output_dir.display()
        );
    }
}
