//! # Partition Module
//!
//! Divide la sequenza di file scoperti in chunk contigui, uno per worker.
//! La dimensione è `ceil(N / W)`; l'ultimo chunk prende il resto e può essere
//! più piccolo o vuoto. Vengono sempre prodotti esattamente W chunk.

use crate::error::{ConvertError, Result};
use std::ops::Range;

/// Index ranges of the `workers` chunks covering `len` items
pub fn chunk_bounds(len: usize, workers: usize) -> Result<Vec<Range<usize>>> {
    if workers == 0 {
        return Err(ConvertError::Config(
            "cannot partition work across 0 workers".to_string(),
        ));
    }

    let chunk_size = len.div_ceil(workers);
    let bounds = (0..workers)
        .map(|i| {
            let start = (i * chunk_size).min(len);
            let end = if i == workers - 1 {
                len
            } else {
                ((i + 1) * chunk_size).min(len)
            };
            start..end
        })
        .collect();

    Ok(bounds)
}

/// Split `items` into exactly `workers` contiguous chunks, preserving order
pub fn partition<T>(items: Vec<T>, workers: usize) -> Result<Vec<Vec<T>>> {
    let bounds = chunk_bounds(items.len(), workers)?;
    let mut remaining = items.into_iter();

    Ok(bounds
        .into_iter()
        .map(|range| remaining.by_ref().take(range.len()).collect())
        .collect())
}
