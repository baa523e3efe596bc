// Block classification: one bitmask per structural byte class
//
// Every scan strategy turns a 64-byte block into four u64 masks (bit i set
// when byte i has that class). The quote-region logic in `scanner` only ever
// sees masks, so strategies can be swapped without touching the resolver or
// the record store.
//
// Strategies:
//   Scalar:       byte-at-a-time match, portable reference
//   Swar:         8 x u64 word-at-a-time comparison (stable Rust, default)
//   PortableSimd: std::simd 64-lane comparison (nightly-simd feature)

/// Bytes per classified block. Matches the width of the masks.
pub const BLOCK: usize = 64;

pub const DELIMITER: u8 = b',';
pub const QUOTE: u8 = b'"';
pub const LF: u8 = b'\n';
pub const CR: u8 = b'\r';

/// Structural class of one input byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteClass {
    Ordinary,
    Delimiter,
    Quote,
    /// LF or CR. Whether a CR actually ends a record is decided when it is
    /// paired with the following LF.
    Terminator,
}

/// Per-class bitmasks for one block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockMasks {
    pub delim: u64,
    pub quote: u64,
    pub lf: u64,
    pub cr: u64,
}

impl BlockMasks {
    /// Class of the byte at `i` (0..64).
    #[inline]
    pub fn class_at(&self, i: usize) -> ByteClass {
        let bit = 1u64 << i;
        if self.delim & bit != 0 {
            ByteClass::Delimiter
        } else if self.quote & bit != 0 {
            ByteClass::Quote
        } else if (self.lf | self.cr) & bit != 0 {
            ByteClass::Terminator
        } else {
            ByteClass::Ordinary
        }
    }
}

/// A way of classifying a block of bytes.
///
/// Implementations must agree bit-for-bit; `tests/conformance.rs` and the
/// property tests hold them to that.
pub trait ScanStrategy: Sync {
    fn name(&self) -> &'static str;

    fn classify(&self, block: &[u8; BLOCK]) -> BlockMasks;
}

// ---------------------------------------------------------------------------
// Scalar
// ---------------------------------------------------------------------------

/// Portable byte-at-a-time fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct Scalar;

impl ScanStrategy for Scalar {
    fn name(&self) -> &'static str {
        "scalar"
    }

    #[inline]
    fn classify(&self, block: &[u8; BLOCK]) -> BlockMasks {
        let mut masks = BlockMasks::default();
        for (i, &byte) in block.iter().enumerate() {
            let bit = 1u64 << i;
            match byte {
                DELIMITER => masks.delim |= bit,
                QUOTE => masks.quote |= bit,
                LF => masks.lf |= bit,
                CR => masks.cr |= bit,
                _ => {}
            }
        }
        masks
    }
}

// ---------------------------------------------------------------------------
// SWAR
// ---------------------------------------------------------------------------

const ONE: u64 = u64::MAX / 255; // 0x0101_0101_0101_0101
const LOW7: u64 = ONE * 0x7F; // 0x7F7F_7F7F_7F7F_7F7F

/// Gathers the high bit of each byte into the low 8 bits.
const MOVEMASK_MAGIC: u64 = 0x0102_0408_1020_4080;

/// High bit of each byte of the result is set iff that byte of `word`
/// equals `byte`. Exact per byte: no borrow crosses lanes.
#[inline(always)]
fn eq_high_bits(word: u64, byte: u8) -> u64 {
    let x = word ^ (ONE * byte as u64);
    let t = (x & LOW7).wrapping_add(LOW7);
    !(t | x | LOW7)
}

/// Compress per-byte high bits into an 8-bit mask, byte 0 -> bit 0.
#[inline(always)]
fn movemask(high_bits: u64) -> u64 {
    ((high_bits >> 7).wrapping_mul(MOVEMASK_MAGIC)) >> 56
}

/// SIMD-within-a-register: eight 8-byte words per block.
#[derive(Debug, Clone, Copy, Default)]
pub struct Swar;

impl ScanStrategy for Swar {
    fn name(&self) -> &'static str {
        "swar"
    }

    #[inline]
    fn classify(&self, block: &[u8; BLOCK]) -> BlockMasks {
        let mut masks = BlockMasks::default();
        for (w, chunk) in block.chunks_exact(8).enumerate() {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(chunk);
            let word = u64::from_le_bytes(bytes);
            let shift = w * 8;
            masks.delim |= movemask(eq_high_bits(word, DELIMITER)) << shift;
            masks.quote |= movemask(eq_high_bits(word, QUOTE)) << shift;
            masks.lf |= movemask(eq_high_bits(word, LF)) << shift;
            masks.cr |= movemask(eq_high_bits(word, CR)) << shift;
        }
        masks
    }
}

// ---------------------------------------------------------------------------
// std::simd
// ---------------------------------------------------------------------------

#[cfg(feature = "nightly-simd")]
mod portable {
    use super::*;
    use std::simd::prelude::*;

    /// 64-lane `std::simd` comparison; one `to_bitmask` per class.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct PortableSimd;

    impl ScanStrategy for PortableSimd {
        fn name(&self) -> &'static str {
            "simd"
        }

        #[inline]
        fn classify(&self, block: &[u8; BLOCK]) -> BlockMasks {
            let chunk = Simd::<u8, BLOCK>::from_array(*block);
            BlockMasks {
                delim: chunk.simd_eq(Simd::splat(DELIMITER)).to_bitmask(),
                quote: chunk.simd_eq(Simd::splat(QUOTE)).to_bitmask(),
                lf: chunk.simd_eq(Simd::splat(LF)).to_bitmask(),
                cr: chunk.simd_eq(Simd::splat(CR)).to_bitmask(),
            }
        }
    }
}

#[cfg(feature = "nightly-simd")]
pub use portable::PortableSimd;
