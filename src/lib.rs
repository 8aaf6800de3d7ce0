//! # BMP Batch Converter Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare dell'applicazione
//! - Espone i tipi e le funzioni principali tramite re-exports
//! - Fornisce un'interfaccia pulita per il main.rs e per i test
//!
//! ## Architettura dei moduli:
//! - `config`: Gestione configurazione e validazione parametri
//! - `error`: Tipi di errore custom
//! - `file_manager`: Discovery dei file sorgente e directory di output
//! - `codec`: Adapter verso la libreria `image`
//! - `converter`: Partizionamento, worker e orchestratore
//! - `report`: Esiti per-file e statistiche finali
//!
//! ## Utilizzo:
//! ```ignore
//! use bmp_batch_converter::{BatchConverter, Config};
//!
//! let config = Config { input_path: path, workers: 4, ..Default::default() };
//! let report = BatchConverter::new(config)?.run().await?;
//! ```

pub mod codec;
pub mod config;
pub mod converter;
pub mod error;
pub mod file_manager;
pub mod report;

pub use codec::{Codec, ImageCodec};
pub use config::{Config, Isolation};
pub use converter::BatchConverter;
pub use error::ConvertError;
pub use report::RunReport;
