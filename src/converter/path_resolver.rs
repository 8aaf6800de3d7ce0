//! # Path Resolution Module
//!
//! Centralizza tutta la logica di calcolo dei path di output.
//!
//! Il path di output usa solo il nome del file sorgente (la directory viene
//! scartata) con l'estensione di destinazione, dentro l'unica directory di
//! output. Due sorgenti con lo stesso nome in sottocartelle diverse
//! collidono: la prima in ordine di discovery tiene il nome, le successive
//! ricevono un suffisso `-N` e la collisione viene segnalata.

use crate::error::{ConvertError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A source file paired with the file it will be converted into
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionJob {
    #[serde(with = "crate::converter::protocol::wire_path")]
    pub source: PathBuf,
    #[serde(with = "crate::converter::protocol::wire_path")]
    pub output: PathBuf,
}

/// Utility per calcolare i path di output in modo centralizzato
pub struct PathResolver;

impl PathResolver {
    /// Output path for a single source file, ignoring collisions
    pub fn get_output_path(source: &Path, output_dir: &Path, target_extension: &str) -> Result<PathBuf> {
        let file_stem = source.file_stem().ok_or_else(|| {
            ConvertError::Config(format!("invalid file name: {}", source.display()))
        })?;

        let mut file_name = file_stem.to_os_string();
        file_name.push(".");
        file_name.push(target_extension);
        Ok(output_dir.join(file_name))
    }

    /// Build the job list for the discovered sources.
    ///
    /// Order follows `sources`. Colliding names get a numeric suffix.
    pub fn plan_jobs(
        sources: Vec<PathBuf>,
        output_dir: &Path,
        target_extension: &str,
    ) -> Result<Vec<ConversionJob>> {
        // output path -> source that claimed it
        let mut taken: HashMap<PathBuf, PathBuf> = HashMap::with_capacity(sources.len());
        let mut jobs = Vec::with_capacity(sources.len());

        for source in sources {
            let natural = Self::get_output_path(&source, output_dir, target_extension)?;

            let output = match taken.get(&natural) {
                Some(owner) => {
                    let renamed = Self::next_free_name(&source, output_dir, target_extension, &taken)?;
                    warn!(
                        "Output name collision: {} and {} both map to {}; writing {} instead",
                        owner.display(),
                        source.display(),
                        natural.display(),
                        renamed.display()
                    );
                    renamed
                }
                None => natural,
            };

            debug!("Planned {} -> {}", source.display(), output.display());
            taken.insert(output.clone(), source.clone());
            jobs.push(ConversionJob { source, output });
        }

        Ok(jobs)
    }

    fn next_free_name(
        source: &Path,
        output_dir: &Path,
        target_extension: &str,
        taken: &HashMap<PathBuf, PathBuf>,
    ) -> Result<PathBuf> {
        let file_stem = source.file_stem().ok_or_else(|| {
            ConvertError::Config(format!("invalid file name: {}", source.display()))
        })?;

        (1usize..)
            .map(|n| {
                let mut file_name = file_stem.to_os_string();
                file_name.push(format!("-{}.{}", n, target_extension));
                output_dir.join(file_name)
            })
            .find(|candidate| !taken.contains_key(candidate))
            .ok_or_else(|| ConvertError::Config(format!("no free output name for {}", source.display())))
    }
}
