// Record table builders
//
// Both paths scan into a StructuralIndex and resolve every non-blank row;
// they differ only in whether the work runs on the rayon pool.

pub mod parallel;
pub mod two_phase;

pub use parallel::{resolve_parallel, scan_chunked};
pub use two_phase::resolve_sequential;

use crate::core::{resolve_row, RowSpan, ScanStrategy, Scalar, StructuralIndex, Swar};
use crate::error::{MalformedKind, MalformedRow};
use crate::options::{ParseOptions, ScanMode};
use crate::records::{RecordTable, Row};

/// One resolved row: byte offset of its start plus fields or the reason it
/// was rejected.
pub type Resolved = (u32, Result<Vec<String>, MalformedKind>);

/// Scan and resolve `input` according to `opts`.
pub fn build_table(input: &[u8], opts: &ParseOptions) -> RecordTable {
    match opts.scan_mode.effective() {
        ScanMode::Scalar => build_with(input, opts, &Scalar),
        #[cfg(feature = "nightly-simd")]
        ScanMode::Simd => build_with(input, opts, &crate::core::PortableSimd),
        _ => build_with(input, opts, &Swar),
    }
}

fn build_with<S: ScanStrategy>(input: &[u8], opts: &ParseOptions, strategy: &S) -> RecordTable {
    let parallel = opts.use_parallel(input.len());
    tracing::trace!(
        strategy = strategy.name(),
        parallel,
        bytes = input.len(),
        "building record table"
    );

    let resolved = if parallel {
        resolve_parallel(input, opts.keys, opts.chunk_size, strategy)
    } else {
        resolve_sequential(input, opts.keys, strategy)
    };
    into_table(resolved, opts.keys)
}

/// Resolve row `i` unless it is blank.
#[inline]
pub(crate) fn resolve_entry(
    input: &[u8],
    index: &StructuralIndex,
    i: usize,
    row: &RowSpan,
    keys: usize,
) -> Option<Resolved> {
    if row.is_blank() {
        return None;
    }
    // Only the final row can be left open by the scanner
    let unterminated = index.ends_in_quote && i + 1 == index.row_count();
    Some((row.start, resolve_row(input, index, row, keys, unterminated)))
}

fn into_table(resolved: Vec<Resolved>, keys: usize) -> RecordTable {
    let entries = resolved
        .into_iter()
        .enumerate()
        .map(|(index, (offset, result))| match result {
            Ok(fields) => Ok(Row::new(fields)),
            Err(kind) => {
                let report = MalformedRow {
                    index,
                    offset: offset as u64,
                    kind,
                };
                tracing::warn!(index, offset, reason = %report.kind, "malformed row");
                Err(report)
            }
        })
        .collect();
    RecordTable { keys, entries }
}
