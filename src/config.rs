//! # Configuration Management Module
//!
//! Questo modulo gestisce tutta la configurazione di una conversione batch.
//!
//! ## Responsabilità:
//! - Definisce la struct `Config` con tutti i parametri della conversione
//! - Fornisce validazione dei parametri prima di qualsiasi accesso al filesystem
//! - Fornisce valori di default sensati per tutti i parametri
//!
//! ## Parametri di configurazione:
//! - `input_path`: File o directory da convertire
//! - `workers`: Numero di worker paralleli (deve essere > 0)
//! - `output_dir`: Directory di output (default: `converted_multi`)
//! - `isolation`: Processi separati o thread dedicati (default: processi)
//! - `source_extension`: Estensione dei file sorgente (default: `bmp`)
//! - `target_extension`: Estensione del formato di destinazione (default: `png`)
//!
//! ## Esempio:
//! ```ignore
//! let config = Config {
//!     input_path: "photos".into(),
//!     workers: 8,
//!     ..Default::default()
//! };
//! config.validate()?;
//! ```

use crate::error::{ConvertError, Result};
use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Name of the output directory created under the current working directory
pub const DEFAULT_OUTPUT_DIR: &str = "converted_multi";

/// How each chunk is isolated from the others
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Isolation {
    /// One child OS process per chunk
    #[default]
    Process,
    /// One dedicated OS thread per chunk
    Thread,
}

impl fmt::Display for Isolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Isolation::Process => write!(f, "process"),
            Isolation::Thread => write!(f, "thread"),
        }
    }
}

impl FromStr for Isolation {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "process" => Ok(Isolation::Process),
            "thread" => Ok(Isolation::Thread),
            other => Err(ConvertError::Config(format!(
                "unknown isolation mode '{}' (expected 'process' or 'thread')",
                other
            ))),
        }
    }
}

/// Configuration for a batch conversion run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// File or directory to convert
    pub input_path: PathBuf,
    /// Number of parallel workers
    pub workers: usize,
    /// Directory receiving the converted files
    pub output_dir: PathBuf,
    /// Worker isolation strategy
    pub isolation: Isolation,
    /// Extension of the source files (case-sensitive, without dot)
    pub source_extension: String,
    /// Extension of the converted files (without dot)
    pub target_extension: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_path: PathBuf::new(),
            workers: 1,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            isolation: Isolation::default(),
            source_extension: "bmp".to_string(),
            target_extension: "png".to_string(),
        }
    }
}

impl Config {
    /// Parse the raw worker count argument.
    ///
    /// Accepts any integer text, then rejects values that are not positive.
    pub fn parse_worker_count(raw: &str) -> Result<usize> {
        let value: i64 = raw.trim().parse().map_err(|_| {
            ConvertError::Config(format!("worker count must be an integer, got '{}'", raw))
        })?;

        if value <= 0 {
            return Err(ConvertError::Config(format!(
                "worker count must be greater than 0, got {}",
                value
            )));
        }

        usize::try_from(value)
            .map_err(|_| ConvertError::Config(format!("worker count {} is too large", value)))
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.input_path.as_os_str().is_empty() {
            return Err(ConvertError::Config("input path is required".to_string()));
        }

        if self.workers == 0 {
            return Err(ConvertError::Config(
                "number of workers must be greater than 0".to_string(),
            ));
        }

        if self.source_extension.is_empty() || self.source_extension.contains('.') {
            return Err(ConvertError::Config(format!(
                "invalid source extension '{}'",
                self.source_extension
            )));
        }

        self.target_format()?;

        if self.source_extension == self.target_extension {
            return Err(ConvertError::Config(format!(
                "source and target extension are both '{}'",
                self.source_extension
            )));
        }

        Ok(())
    }

    /// Image format matching the target extension
    pub fn target_format(&self) -> Result<ImageFormat> {
        ImageFormat::from_extension(&self.target_extension).ok_or_else(|| {
            ConvertError::Config(format!(
                "unsupported target extension '{}'",
                self.target_extension
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_for(input: &str, workers: usize) -> Config {
        Config {
            input_path: PathBuf::from(input),
            workers,
            ..Default::default()
        }
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.output_dir, PathBuf::from("converted_multi"));
        assert_eq!(config.isolation, Isolation::Process);
        assert_eq!(config.source_extension, "bmp");
        assert_eq!(config.target_extension, "png");
        assert_eq!(config.target_format().unwrap(), ImageFormat::Png);
    }

    #[test]
    fn test_config_validation() {
        let mut config = config_for("images", 4);
        assert!(config.validate().is_ok());

        config.workers = 0;
        assert!(config.validate().is_err());

        config.workers = 2;
        config.target_extension = "nope".to_string();
        assert!(config.validate().is_err());

        config.target_extension = "bmp".to_string();
        assert!(config.validate().is_err());

        config.target_extension = "png".to_string();
        config.input_path = PathBuf::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_worker_count() {
        assert_eq!(Config::parse_worker_count("3").unwrap(), 3);
        assert_eq!(Config::parse_worker_count(" 12 ").unwrap(), 12);

        for bad in ["0", "-2", "two", "1.5", ""] {
            let err = Config::parse_worker_count(bad).unwrap_err();
            assert!(matches!(err, ConvertError::Config(_)), "{}", bad);
        }
    }

    #[test]
    fn test_isolation_from_str() {
        assert_eq!("thread".parse::<Isolation>().unwrap(), Isolation::Thread);
        assert_eq!("process".parse::<Isolation>().unwrap(), Isolation::Process);
        assert!("fork".parse::<Isolation>().is_err());
        assert_eq!(Isolation::Thread.to_string(), "thread");
    }
}
