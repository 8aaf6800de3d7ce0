//! # Converter Module
//!
//! Modulo che separa le responsabilità del pipeline in sottomoduli:
//! - `coordinator`: Orchestratore principale (discovery, spawn, join, report)
//! - `partition`: Divisione deterministica dei file in chunk
//! - `path_resolver`: Logica di calcolo path di output centralizzata
//! - `worker`: Worker per singoli chunk
//! - `protocol`: Messaggi JSON fra coordinator e processi worker

pub mod coordinator;
pub mod partition;
pub mod path_resolver;
pub mod protocol;
pub mod worker;

pub use coordinator::{BatchConverter, Phase, WORKER_INDEX_FLAG};
pub use partition::{chunk_bounds, partition};
pub use path_resolver::{ConversionJob, PathResolver};
pub use worker::ChunkWorker;
