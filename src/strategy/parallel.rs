// Parallel parse using Rayon
//
// Strategy:
// 1. Split the buffer into 64-byte aligned chunks
// 2. Parallel: count quote parity per chunk
// 3. Sequential: prefix the parities into each chunk's entry quote state
// 4. Parallel: scan every chunk from its entry state
// 5. Stitch the chunk indexes in order, then resolve rows in parallel
//
// A chunk that starts inside a quoted field only knows so after step 3,
// which is why the parity pass runs first. Row output order is preserved
// because rayon's indexed collect keeps positions.

use rayon::prelude::*;

use super::{resolve_entry, Resolved};
use crate::core::{quote_parity, scan_range, RowSpan, ScanStrategy, StructuralIndex, BLOCK};

/// Chunk boundaries over `len` bytes, each chunk a multiple of 64 bytes
/// except possibly the last.
fn chunk_bounds(len: usize, chunk_size: usize) -> Vec<(usize, usize)> {
    let chunk = (chunk_size / BLOCK).max(1) * BLOCK;
    (0..len)
        .step_by(chunk)
        .map(|start| (start, (start + chunk).min(len)))
        .collect()
}

/// Build the same index as `scan_structural`, one chunk per rayon task.
pub fn scan_chunked<S: ScanStrategy + ?Sized>(
    input: &[u8],
    chunk_size: usize,
    strategy: &S,
) -> StructuralIndex {
    let bounds = chunk_bounds(input.len(), chunk_size);
    tracing::trace!(chunks = bounds.len(), chunk_size, "chunk plan");

    let parities: Vec<bool> = bounds
        .par_iter()
        .map(|&(start, end)| quote_parity(input, start, end, strategy))
        .collect();

    // Exclusive prefix: entry state of chunk k is the xor of chunks 0..k
    let mut state = false;
    let entry_states: Vec<bool> = parities
        .iter()
        .map(|&odd| {
            let entry = state;
            state ^= odd;
            entry
        })
        .collect();

    let input_len = input.len() as u32;
    let parts: Vec<StructuralIndex> = bounds
        .par_iter()
        .zip(entry_states.par_iter())
        .map(|(&(start, end), &in_quotes)| {
            let mut field_seps = Vec::with_capacity((end - start) / 10 + 4);
            let mut row_ends = Vec::with_capacity((end - start) / 50 + 2);
            let ends_in_quote = scan_range(
                input,
                start,
                end,
                in_quotes,
                strategy,
                &mut field_seps,
                &mut row_ends,
            );
            StructuralIndex {
                field_seps,
                row_ends,
                input_len,
                ends_in_quote,
            }
        })
        .collect();

    let mut index = StructuralIndex {
        input_len,
        ..StructuralIndex::default()
    };
    for part in parts {
        index.extend(part);
    }
    index
}

/// Chunked scan followed by row resolution on the rayon pool.
pub fn resolve_parallel<S: ScanStrategy + ?Sized>(
    input: &[u8],
    keys: usize,
    chunk_size: usize,
    strategy: &S,
) -> Vec<Resolved> {
    let index = scan_chunked(input, chunk_size, strategy);
    tracing::debug!(
        rows = index.row_count(),
        separators = index.field_seps.len(),
        ends_in_quote = index.ends_in_quote,
        "scanned input in parallel"
    );

    // Row spans come from a sequential cursor over the separators; the
    // resolve step is where the per-row work is.
    let spans: Vec<RowSpan> = index.rows().collect();
    spans
        .par_iter()
        .enumerate()
        .filter_map(|(i, row)| resolve_entry(input, &index, i, row, keys))
        .collect()
}
