//! # Error Types Module
//!
//! Questo modulo definisce tutti i tipi di errore custom della conversione.
//!
//! ## Responsabilità:
//! - Definisce `ConvertError` enum per categorizzare tutti gli errori possibili
//! - Integra con `thiserror` per automatic error conversion
//!
//! ## Categorie di errori:
//! - `Config`: Parametri non validi (worker count, estensioni)
//! - `Discovery`: Input path mancante o non leggibile
//! - `Spawn`: Impossibile creare un worker (thread o processo)
//! - `Decode` / `Encode`: Errori per singolo file, mai fatali per il batch
//! - `Protocol`: Messaggi malformati dal processo worker
//! - `Io` / `Json`: Conversioni automatiche da errori standard
//!
//! ## Esempio:
//! ```ignore
//! if workers == 0 {
//!     return Err(ConvertError::Config("worker count must be greater than 0".into()));
//! }
//! ```

use std::path::PathBuf;

/// Custom error types for batch conversion
#[derive(thiserror::Error, Debug)]
pub enum ConvertError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cannot read input path {}: {source}", .path.display())]
    Discovery {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to spawn worker {index}: {source}")]
    Spawn {
        index: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot decode {}: {reason}", .path.display())]
    Decode { path: PathBuf, reason: String },

    #[error("Cannot encode {}: {reason}", .path.display())]
    Encode { path: PathBuf, reason: String },

    #[error("Worker protocol error: {0}")]
    Protocol(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ConvertError>;
