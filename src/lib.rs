// simdcsv - Fast whole-file CSV parsing into fixed-width rows
//
// Pipeline:
// 1. Load: read or memory-map the whole file (buffer)
// 2. Scan: classify 64-byte blocks into bitmasks, prefix-XOR quote regions,
//    collect unquoted separators and row ends (core::scanner)
// 3. Resolve: split rows into fields, strip quotes, check field counts
//    (core::field), sequentially or on the rayon pool (strategy)
// 4. Iterate: pull rows one at a time from the handle (records)

#![cfg_attr(feature = "nightly-simd", feature(portable_simd))]

use std::path::Path;

pub mod buffer;
pub mod core;
pub mod error;
pub mod options;
pub mod records;
pub mod resource;
pub mod strategy;

pub use crate::core::encode::encode_rows;
pub use buffer::InputBuffer;
pub use error::{Error, ErrorKind, MalformedKind, MalformedRow, Result};
pub use options::{LoadMode, ParseOptions, ScanMode};
pub use records::{CursorState, RecordTable, Records, Row, Rows};
pub use resource::{RecordsRef, RecordsResource};

/// Parse the file at `path` into rows of exactly `keys` fields.
///
/// Malformed rows do not fail the parse; they come back from [`next`] as
/// [`Error::Malformed`] in the position they occupied.
pub fn parse(path: impl AsRef<Path>, keys: usize) -> Result<Records> {
    Records::parse(path, keys)
}

/// Next row of the handle. `None` is end of stream and repeats on every
/// later call.
#[inline]
pub fn next(records: &mut Records) -> Option<Result<&Row>> {
    records.next_row()
}

/// Release the handle and everything it owns.
pub fn release(records: Records) {
    records.release()
}

// ============================================================================
// Allocator Configuration
// ============================================================================

// When memory_tracking is enabled, wrap the allocator to track usage
#[cfg(feature = "memory_tracking")]
mod tracking {
    use std::alloc::{GlobalAlloc, Layout};
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub static ALLOCATED: AtomicUsize = AtomicUsize::new(0);
    pub static PEAK_ALLOCATED: AtomicUsize = AtomicUsize::new(0);

    pub struct TrackingAllocator;

    #[cfg(feature = "mimalloc")]
    static UNDERLYING: mimalloc::MiMalloc = mimalloc::MiMalloc;

    #[cfg(not(feature = "mimalloc"))]
    static UNDERLYING: std::alloc::System = std::alloc::System;

    unsafe impl GlobalAlloc for TrackingAllocator {
        unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
            let ptr = UNDERLYING.alloc(layout);
            if !ptr.is_null() {
                let current = ALLOCATED.fetch_add(layout.size(), Ordering::Relaxed) + layout.size();
                PEAK_ALLOCATED.fetch_max(current, Ordering::Relaxed);
            }
            ptr
        }

        unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
            ALLOCATED.fetch_sub(layout.size(), Ordering::Relaxed);
            UNDERLYING.dealloc(ptr, layout)
        }
    }
}

#[cfg(feature = "memory_tracking")]
#[global_allocator]
static GLOBAL: tracking::TrackingAllocator = tracking::TrackingAllocator;

// When memory_tracking is disabled, use mimalloc directly (no overhead)
#[cfg(all(feature = "mimalloc", not(feature = "memory_tracking")))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Process-wide heap statistics. All zeros unless built with the
/// `memory_tracking` feature.
pub mod memory {
    #[cfg(feature = "memory_tracking")]
    use std::sync::atomic::Ordering;

    /// Bytes currently allocated.
    #[cfg(feature = "memory_tracking")]
    pub fn allocated() -> usize {
        super::tracking::ALLOCATED.load(Ordering::SeqCst)
    }

    /// Highest `allocated()` since start or the last `reset_peak`.
    #[cfg(feature = "memory_tracking")]
    pub fn peak() -> usize {
        super::tracking::PEAK_ALLOCATED.load(Ordering::SeqCst)
    }

    /// Reset the peak to the current allocation. Returns (current, old peak).
    #[cfg(feature = "memory_tracking")]
    pub fn reset_peak() -> (usize, usize) {
        let current = super::tracking::ALLOCATED.load(Ordering::SeqCst);
        let peak = super::tracking::PEAK_ALLOCATED.swap(current, Ordering::SeqCst);
        (current, peak)
    }

    #[cfg(not(feature = "memory_tracking"))]
    pub fn allocated() -> usize {
        0
    }

    #[cfg(not(feature = "memory_tracking"))]
    pub fn peak() -> usize {
        0
    }

    #[cfg(not(feature = "memory_tracking"))]
    pub fn reset_peak() -> (usize, usize) {
        (0, 0)
    }
}
