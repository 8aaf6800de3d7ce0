//! # File Management Module
//!
//! Questo modulo gestisce la discovery dei file sorgente e le operazioni sulla
//! directory di output.
//!
//! ## Responsabilità:
//! - Discovery ricorsiva dei file sorgente in una directory
//! - Match esatto (case-sensitive) dell'estensione
//! - Creazione idempotente della directory di output
//! - Formattazione human-readable delle dimensioni
//!
//! ## Ordine di discovery:
//! La visita è depth-first con le entry di ogni directory ordinate per nome.
//! Lo stesso albero produce sempre la stessa sequenza, che è la base del
//! partizionamento fra worker.
//!
//! Un symlink a un file regolare conta come il file stesso; i symlink a
//! directory non vengono attraversati.
//!
//! ## Esempio:
//! ```ignore
//! let files = FileManager::find_source_files(Path::new("/path/to/images"), "bmp")?;
//! ```

use crate::error::{ConvertError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Manages file discovery and output directory setup
pub struct FileManager;

impl FileManager {
    /// Find all files under `root` whose extension is exactly `extension`.
    ///
    /// A single matching file yields itself; a non-matching file yields nothing.
    pub fn find_source_files(root: &Path, extension: &str) -> Result<Vec<PathBuf>> {
        let metadata = std::fs::metadata(root).map_err(|source| ConvertError::Discovery {
            path: root.to_path_buf(),
            source,
        })?;

        if metadata.is_file() {
            return Ok(if Self::has_extension(root, extension) {
                vec![root.to_path_buf()]
            } else {
                Vec::new()
            });
        }

        if !metadata.is_dir() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(|e| ConvertError::Discovery {
                path: e.path().unwrap_or(root).to_path_buf(),
                source: e.into(),
            })?;

            // `Path::is_file` follows the link, `DirEntry::file_type` does not
            if Self::has_extension(entry.path(), extension) && entry.path().is_file() {
                files.push(entry.into_path());
            }
        }

        debug!("Discovered {} .{} files under {}", files.len(), extension, root.display());
        Ok(files)
    }

    /// Check whether a path carries exactly the given extension
    pub fn has_extension(path: &Path, extension: &str) -> bool {
        path.extension().map_or(false, |ext| ext == extension)
    }

    /// Create the output directory if it does not exist yet
    pub fn ensure_output_dir(dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        Ok(dir.canonicalize()?)
    }

    /// Get human-readable file size
    pub fn format_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn test_discovery_filters_by_exact_extension() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(&root.join("a.bmp"));
        touch(&root.join("b.txt"));
        touch(&root.join("c.BMP"));
        touch(&root.join("d.bmp.bak"));

        let files = FileManager::find_source_files(root, "bmp").unwrap();
        assert_eq!(files, vec![root.join("a.bmp")]);
    }

    #[test]
    fn test_discovery_is_recursive_and_sorted() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(&root.join("z.bmp"));
        touch(&root.join("b/2.bmp"));
        touch(&root.join("b/1.bmp"));
        touch(&root.join("a/deep/x.bmp"));
        fs::create_dir_all(root.join("empty")).unwrap();

        let files = FileManager::find_source_files(root, "bmp").unwrap();
        assert_eq!(
            files,
            vec![
                root.join("a/deep/x.bmp"),
                root.join("b/1.bmp"),
                root.join("b/2.bmp"),
                root.join("z.bmp"),
            ]
        );

        // Same tree, same order
        assert_eq!(files, FileManager::find_source_files(root, "bmp").unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn test_discovery_follows_file_symlinks() {
        use std::os::unix::fs::symlink;

        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("in");
        let real = temp_dir.path().join("real");
        touch(&real.join("a.bmp"));
        touch(&root.join("plain.bmp"));
        fs::create_dir_all(real.join("dir")).unwrap();
        touch(&real.join("dir/inner.bmp"));

        symlink(real.join("a.bmp"), root.join("link.bmp")).unwrap();
        symlink(real.join("gone.bmp"), root.join("dangling.bmp")).unwrap();
        symlink(real.join("dir"), root.join("linked_dir")).unwrap();

        let files = FileManager::find_source_files(&root, "bmp").unwrap();
        assert_eq!(files, vec![root.join("link.bmp"), root.join("plain.bmp")]);
    }

    #[test]
    fn test_discovery_single_file() {
        let temp_dir = TempDir::new().unwrap();
        let bmp = temp_dir.path().join("one.bmp");
        let txt = temp_dir.path().join("one.txt");
        touch(&bmp);
        touch(&txt);

        assert_eq!(FileManager::find_source_files(&bmp, "bmp").unwrap(), vec![bmp]);
        assert!(FileManager::find_source_files(&txt, "bmp").unwrap().is_empty());
    }

    #[test]
    fn test_discovery_missing_path_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nothing-here");

        let err = FileManager::find_source_files(&missing, "bmp").unwrap_err();
        assert!(matches!(err, ConvertError::Discovery { .. }));
    }

    #[test]
    fn test_ensure_output_dir_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let out = temp_dir.path().join("converted_multi");

        let first = FileManager::ensure_output_dir(&out).unwrap();
        let second = FileManager::ensure_output_dir(&out).unwrap();
        assert!(out.is_dir());
        assert_eq!(first, second);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(FileManager::format_size(512), "512 B");
        assert_eq!(FileManager::format_size(2048), "2.00 KB");
    }
}
