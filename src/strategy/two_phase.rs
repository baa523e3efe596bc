// Sequential two-phase parse
//
// Phase 1: one pass of the structural scanner over the whole buffer
// Phase 2: walk the index row by row and resolve fields

use super::{resolve_entry, Resolved};
use crate::core::{scan_structural, ScanStrategy, StructuralIndex};

/// Scan and resolve on the calling thread.
pub fn resolve_sequential<S: ScanStrategy + ?Sized>(
    input: &[u8],
    keys: usize,
    strategy: &S,
) -> Vec<Resolved> {
    let index = scan_structural(input, strategy);
    tracing::debug!(
        rows = index.row_count(),
        separators = index.field_seps.len(),
        ends_in_quote = index.ends_in_quote,
        "scanned input"
    );
    resolve_index(input, &index, keys)
}

/// Phase 2 over an existing index, in row order.
pub(crate) fn resolve_index(input: &[u8], index: &StructuralIndex, keys: usize) -> Vec<Resolved> {
    index
        .rows()
        .enumerate()
        .filter_map(|(i, row)| resolve_entry(input, index, i, &row, keys))
        .collect()
}
