// Core primitives: byte classification, structural scan, field resolution

pub mod classify;
pub mod encode;
pub mod field;
pub mod index;
pub mod scanner;

#[cfg(feature = "nightly-simd")]
pub use classify::PortableSimd;
pub use classify::{BlockMasks, ByteClass, ScanStrategy, Scalar, Swar, BLOCK};
pub use field::{field_bytes, resolve_row, FieldSpan};
pub use index::{RowEnd, RowSpan, StructuralIndex};
pub use scanner::{quote_parity, scan_range, scan_structural};
