//! # Worker Protocol Module
//!
//! Questo modulo definisce la comunicazione fra coordinator e processi worker.
//!
//! ## Flusso:
//! - Il coordinator scrive un `ChunkManifest` JSON sullo stdin del worker
//! - Il worker emette una riga JSON `WorkerMessage` per ogni file su stdout
//! - L'ultima riga è sempre `finished`
//!
//! ## Tipi di messaggi:
//! - `file_done`: Esito di un singolo file
//! - `finished`: Fine del chunk con numero di file e durata
//!
//! ## Path:
//! I path viaggiano come stringhe quando sono UTF-8 validi, altrimenti come
//! array dei byte grezzi (`wire_path`), così ogni nome legale sul filesystem
//! arriva intatto al worker.

use crate::{
    converter::path_resolver::ConversionJob,
    error::{ConvertError, Result},
    report::FileOutcome,
};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};

/// Serde adapter for paths that may not be valid UTF-8
pub mod wire_path {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::path::{Path, PathBuf};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Text(String),
        Bytes(Vec<u8>),
    }

    pub fn serialize<S: Serializer>(path: &Path, serializer: S) -> Result<S::Ok, S::Error> {
        match path.to_str() {
            Some(text) => serializer.serialize_str(text),
            None => serializer.serialize_bytes(&raw_bytes(path)),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<PathBuf, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Text(text) => Ok(PathBuf::from(text)),
            Repr::Bytes(bytes) => from_raw_bytes(bytes).map_err(serde::de::Error::custom),
        }
    }

    #[cfg(unix)]
    fn raw_bytes(path: &Path) -> Vec<u8> {
        use std::os::unix::ffi::OsStrExt;
        path.as_os_str().as_bytes().to_vec()
    }

    #[cfg(not(unix))]
    fn raw_bytes(path: &Path) -> Vec<u8> {
        path.to_string_lossy().into_owned().into_bytes()
    }

    #[cfg(unix)]
    fn from_raw_bytes(bytes: Vec<u8>) -> Result<PathBuf, std::string::FromUtf8Error> {
        use std::os::unix::ffi::OsStringExt;
        Ok(PathBuf::from(std::ffi::OsString::from_vec(bytes)))
    }

    #[cfg(not(unix))]
    fn from_raw_bytes(bytes: Vec<u8>) -> Result<PathBuf, std::string::FromUtf8Error> {
        String::from_utf8(bytes).map(PathBuf::from)
    }
}

/// Work assigned to one worker process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkManifest {
    pub index: usize,
    pub target_extension: String,
    pub jobs: Vec<ConversionJob>,
}

impl ChunkManifest {
    pub fn read_from<R: std::io::Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// Tipo di messaggio JSON emesso dal worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkerMessage {
    /// Fine elaborazione di un file specifico
    FileDone { outcome: FileOutcome },

    /// Chunk completato
    Finished { files: usize, duration_seconds: f64 },
}

impl WorkerMessage {
    /// Write the message as one JSON line and flush
    pub fn emit<W: Write>(&self, writer: &mut W) -> Result<()> {
        serde_json::to_writer(&mut *writer, self)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }

    pub fn parse_line(line: &str) -> Result<Self> {
        serde_json::from_str(line)
            .map_err(|e| ConvertError::Protocol(format!("malformed worker message '{}': {}", line, e)))
    }
}

/// What the coordinator learned from a worker's stdout
#[derive(Debug, Default)]
pub struct WorkerTranscript {
    pub outcomes: Vec<FileOutcome>,
    pub finished: bool,
    pub errors: Vec<ConvertError>,
}

impl WorkerTranscript {
    /// Parse every line of a worker's stdout, keeping what is readable
    pub fn parse<R: BufRead>(reader: R) -> Self {
        let mut transcript = Self::default();

        for line in reader.lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    transcript.errors.push(e.into());
                    break;
                }
            };

            if line.trim().is_empty() {
                continue;
            }

            match WorkerMessage::parse_line(&line) {
                Ok(WorkerMessage::FileDone { outcome }) => transcript.outcomes.push(outcome),
                Ok(WorkerMessage::Finished { files, .. }) => {
                    if files != transcript.outcomes.len() {
                        transcript.errors.push(ConvertError::Protocol(format!(
                            "worker reported {} files but sent {} outcomes",
                            files,
                            transcript.outcomes.len()
                        )));
                    }
                    transcript.finished = true;
                }
                Err(e) => transcript.errors.push(e),
            }
        }

        transcript
    }

    pub fn is_clean(&self) -> bool {
        self.finished && self.errors.is_empty()
    }
}
