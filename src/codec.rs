//! # Codec Adapter Module
//!
//! Confine verso la libreria di codifica immagini.
//!
//! ## Responsabilità:
//! - `decode()`: legge un file sorgente in un buffer di pixel
//! - `encode()`: scrive un buffer di pixel nel formato di destinazione
//!
//! Il pipeline di conversione conosce solo il trait `Codec`; formato, profondità
//! colore e parametri di compressione restano dentro l'implementazione.

use crate::error::{ConvertError, Result};
use image::{DynamicImage, ImageFormat};
use std::path::Path;

/// Decode/encode capability used by the workers
pub trait Codec: Send + Sync {
    /// Decode the image stored at `path`
    fn decode(&self, path: &Path) -> Result<DynamicImage>;

    /// Encode `image` and write it to `path`
    fn encode(&self, image: &DynamicImage, path: &Path) -> Result<()>;
}

/// `Codec` backed by the `image` crate
#[derive(Debug, Clone, Copy)]
pub struct ImageCodec {
    target: ImageFormat,
}

impl ImageCodec {
    pub fn new(target: ImageFormat) -> Self {
        Self { target }
    }

    pub fn target(&self) -> ImageFormat {
        self.target
    }
}

impl Default for ImageCodec {
    fn default() -> Self {
        Self::new(ImageFormat::Png)
    }
}

impl Codec for ImageCodec {
    fn decode(&self, path: &Path) -> Result<DynamicImage> {
        image::open(path).map_err(|e| ConvertError::Decode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    fn encode(&self, image: &DynamicImage, path: &Path) -> Result<()> {
        image
            .save_with_format(path, self.target)
            .map_err(|e| ConvertError::Encode {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }
}
