// Structural scanner, simdjson-style prefix-XOR quote detection
//
// Scans the input once, 64 bytes per block, producing a StructuralIndex of
// all unquoted separators and row endings. Byte classification is delegated
// to a `ScanStrategy`; everything here works on the resulting bitmasks.
//
// Per block:
//   quoted   = prefix_xor(quote_bits) ^ carry
//   seps     = delim_bits & !quoted
//   ends     = lf_bits & !quoted
//   crlf     = ends & ((cr_bits << 1) | prev_cr)
//
// `carry` is all-ones when the previous block ended inside quotes. A doubled
// quote toggles twice, so it never changes the region; the resolver turns
// the pair back into one literal quote.
//
// The final partial block is zero-padded. Zero bytes are ordinary, and the
// padding lanes are masked off before any position is emitted.

use super::classify::{ScanStrategy, BLOCK};
use super::index::{RowEnd, StructuralIndex};

// ---------------------------------------------------------------------------
// Prefix-XOR: compute cumulative XOR to determine quoted regions
// ---------------------------------------------------------------------------
//
// Given a bitmask where bit i is set if position i has a quote character,
// prefix_xor(mask) produces a bitmask where bit i is set if position i is
// inside a quoted region (odd number of quotes at or before it).

/// Prefix-XOR via shift-and-xor cascade over all 64 bits.
#[inline]
pub fn prefix_xor(mut x: u64) -> u64 {
    x ^= x << 1;
    x ^= x << 2;
    x ^= x << 4;
    x ^= x << 8;
    x ^= x << 16;
    x ^= x << 32;
    x
}

/// Extract set bit positions from a u64 bitmask, adding `base_pos` offset.
#[inline]
fn extract_positions(mut mask: u64, base_pos: u32, out: &mut Vec<u32>) {
    while mask != 0 {
        let bit = mask.trailing_zeros();
        out.push(base_pos + bit);
        mask &= mask - 1; // clear lowest set bit
    }
}

/// Emit RowEnd entries for every unquoted LF bit.
///
/// LFs whose bit is also set in `crlf` were preceded by a CR and become
/// RowEnd { pos: cr_pos, len: 2 }. A CR without a following LF is data.
#[inline]
fn emit_row_ends(mut lf_bits: u64, crlf_bits: u64, base_pos: u32, out: &mut Vec<RowEnd>) {
    while lf_bits != 0 {
        let bit = lf_bits.trailing_zeros();
        let abs_pos = base_pos + bit;
        if crlf_bits & (1u64 << bit) != 0 {
            out.push(RowEnd {
                pos: abs_pos - 1,
                len: 2,
            });
        } else {
            out.push(RowEnd {
                pos: abs_pos,
                len: 1,
            });
        }
        lf_bits &= lf_bits - 1;
    }
}

/// Iterate `input[start..end]` as 64-byte blocks; the last one zero-padded.
/// Calls `f(block_start, block, valid_len)`.
#[inline]
fn for_each_block(
    input: &[u8],
    start: usize,
    end: usize,
    mut f: impl FnMut(usize, &[u8; BLOCK], usize),
) {
    let mut pos = start;
    while pos < end {
        match input[pos..end].first_chunk::<BLOCK>() {
            Some(block) => {
                f(pos, block, BLOCK);
                pos += BLOCK;
            }
            None => {
                let n = end - pos;
                let mut tail = [0u8; BLOCK];
                tail[..n].copy_from_slice(&input[pos..end]);
                f(pos, &tail, n);
                pos = end;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Core scanner
// ---------------------------------------------------------------------------

/// Scan the whole input and produce a `StructuralIndex`.
///
/// The caller guarantees `input.len() <= u32::MAX`.
pub fn scan_structural<S: ScanStrategy + ?Sized>(input: &[u8], strategy: &S) -> StructuralIndex {
    debug_assert!(input.len() <= u32::MAX as usize);
    let est_seps = input.len() / 10 + 16;
    let est_rows = input.len() / 50 + 4;
    let mut field_seps: Vec<u32> = Vec::with_capacity(est_seps);
    let mut row_ends: Vec<RowEnd> = Vec::with_capacity(est_rows);

    let ends_in_quote = scan_range(
        input,
        0,
        input.len(),
        false,
        strategy,
        &mut field_seps,
        &mut row_ends,
    );

    StructuralIndex {
        field_seps,
        row_ends,
        input_len: input.len() as u32,
        ends_in_quote,
    }
}

/// Scan `input[start..end]` starting in the given quote state.
///
/// Positions are absolute. The CR carry for the first block is taken from
/// `input[start - 1]`, so a CRLF split across a range boundary still becomes
/// one terminator. Returns the quote state after `end - 1`.
pub fn scan_range<S: ScanStrategy + ?Sized>(
    input: &[u8],
    start: usize,
    end: usize,
    in_quotes: bool,
    strategy: &S,
    field_seps: &mut Vec<u32>,
    row_ends: &mut Vec<RowEnd>,
) -> bool {
    let mut carry: u64 = if in_quotes { !0 } else { 0 };
    let mut prev_cr: u64 = (start > 0 && input[start - 1] == b'\r') as u64;

    for_each_block(input, start, end, |block_start, block, valid_len| {
        let valid: u64 = if valid_len == BLOCK {
            !0
        } else {
            (1u64 << valid_len) - 1
        };
        let masks = strategy.classify(block);
        let base = block_start as u32;

        let quoted = prefix_xor(masks.quote) ^ carry;
        let outside = !quoted & valid;

        extract_positions(masks.delim & outside, base, field_seps);

        let lf_bits = masks.lf & outside;
        let crlf_bits = lf_bits & ((masks.cr << 1) | prev_cr);
        emit_row_ends(lf_bits, crlf_bits, base, row_ends);

        // State after the last valid byte of this block
        carry = if (quoted >> (valid_len - 1)) & 1 != 0 { !0 } else { 0 };
        prev_cr = (masks.cr >> 63) & 1;
    });

    carry != 0
}

/// Parity of the number of quote bytes in `input[start..end]`.
///
/// `true` means odd: a range with odd parity flips the quote state of
/// everything after it. Used to seed chunk scans in the parallel path.
pub fn quote_parity<S: ScanStrategy + ?Sized>(
    input: &[u8],
    start: usize,
    end: usize,
    strategy: &S,
) -> bool {
    let mut parity = 0u32;
    for_each_block(input, start, end, |_, block, _| {
        parity ^= strategy.classify(block).quote.count_ones() & 1;
    });
    parity != 0
}

/// Byte-at-a-time reference scan, kept for cross-checking the block scanner.
///
/// Walks `BlockMasks::class_at` per byte instead of combining masks.
#[cfg(test)]
pub(crate) fn scan_reference(input: &[u8]) -> StructuralIndex {
    use super::classify::{ByteClass, Scalar, LF};

    let mut field_seps = Vec::new();
    let mut row_ends = Vec::new();
    let mut in_quotes = false;

    for_each_block(input, 0, input.len(), |block_start, block, valid_len| {
        let masks = Scalar.classify(block);
        for i in 0..valid_len {
            let pos = block_start + i;
            match masks.class_at(i) {
                ByteClass::Quote => in_quotes = !in_quotes,
                _ if in_quotes => {}
                ByteClass::Delimiter => field_seps.push(pos as u32),
                ByteClass::Terminator if input[pos] == LF => {
                    if pos > 0 && input[pos - 1] == b'\r' {
                        row_ends.push(RowEnd {
                            pos: (pos - 1) as u32,
                            len: 2,
                        });
                    } else {
                        row_ends.push(RowEnd {
                            pos: pos as u32,
                            len: 1,
                        });
                    }
                }
                ByteClass::Terminator | ByteClass::Ordinary => {}
            }
        }
    });

    StructuralIndex {
        field_seps,
        row_ends,
        input_len: input.len() as u32,
        ends_in_quote: in_quotes,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::classify::{Scalar, Swar};

    // Strategy-vs-strategy scenarios live in tests/conformance.rs.
    // Block boundaries, carry propagation and padding are tested here.

    fn scan(input: &[u8]) -> StructuralIndex {
        scan_structural(input, &Swar)
    }

    #[test]
    fn test_prefix_xor_known_values() {
        fn prefix_xor_reference(mask: u64) -> u64 {
            let mut result = 0u64;
            let mut parity = 0u64;
            for i in 0..64 {
                parity ^= (mask >> i) & 1;
                result |= parity << i;
            }
            result
        }

        let test_masks: &[u64] = &[
            0,
            1,
            0b11,
            0b101,
            0b1001,
            0xFF,
            0xAAAA_AAAA_AAAA_AAAA,
            0x8000_0000_0000_0001,
            1 << 63,
            u64::MAX,
        ];
        for &mask in test_masks {
            assert_eq!(
                prefix_xor(mask),
                prefix_xor_reference(mask),
                "prefix_xor wrong for mask {mask:#066b}"
            );
        }

        // Single quote at pos 0: everything after is "in quotes"
        assert_eq!(prefix_xor(1), u64::MAX);
        // Two quotes at pos 0,1 (open then close): only pos 0 is "in quotes"
        assert_eq!(prefix_xor(0b11), 1);
        // Quote at pos 0 and pos 5: positions 0-4 in quotes
        assert_eq!(prefix_xor(0b100001), 0b011111);
    }

    #[test]
    fn test_quote_suppresses_separator() {
        // a,"b,c",d\n: comma at position 4 is inside quotes
        let idx = scan(b"a,\"b,c\",d\n");
        assert_eq!(idx.field_seps, vec![1, 7], "comma at pos 4 must be suppressed");
        assert_eq!(idx.row_ends, vec![RowEnd { pos: 9, len: 1 }]);
        assert!(!idx.ends_in_quote);
    }

    #[test]
    fn test_quote_suppresses_newline_and_crlf() {
        let idx = scan(b"a,\"b\r\nc\",d\n");
        // positions: a=0 ,=1 "=2 b=3 \r=4 \n=5 c=6 "=7 ,=8 d=9 \n=10
        assert_eq!(idx.field_seps, vec![1, 8]);
        assert_eq!(idx.row_ends, vec![RowEnd { pos: 10, len: 1 }]);
    }

    #[test]
    fn test_doubled_quotes_keep_subsequent_separator_live() {
        // "say ""hi""",done\n
        let idx = scan(b"\"say \"\"hi\"\"\",done\n");
        assert_eq!(idx.field_seps, vec![12]);
        assert_eq!(idx.row_ends, vec![RowEnd { pos: 17, len: 1 }]);
    }

    #[test]
    fn test_crlf_produces_row_end_len_2() {
        let idx = scan(b"a,b\r\nc,d\n");
        assert_eq!(idx.field_seps, vec![1, 6]);
        assert_eq!(
            idx.row_ends,
            vec![RowEnd { pos: 3, len: 2 }, RowEnd { pos: 8, len: 1 }]
        );
    }

    #[test]
    fn test_bare_cr_is_data() {
        let idx = scan(b"a\rb\n");
        assert!(idx.field_seps.is_empty());
        assert_eq!(idx.row_ends, vec![RowEnd { pos: 3, len: 1 }]);
    }

    #[test]
    fn test_cr_at_block_boundary_then_lf() {
        // \r is the last byte of block 0, \n the first byte of block 1
        let mut input = vec![b'x'; 63];
        input.push(b'\r');
        input.push(b'\n');
        input.extend_from_slice(b"y\n");

        let idx = scan(&input);
        assert_eq!(
            idx.row_ends,
            vec![RowEnd { pos: 63, len: 2 }, RowEnd { pos: 66, len: 1 }],
            "CRLF split across blocks must still produce len=2"
        );
    }

    #[test]
    fn test_carry_across_block_boundary() {
        // Quote opens in block 0 and closes in block 1; the commas between
        // are content.
        let mut input = b"x,\"".to_vec();
        input.extend(std::iter::repeat(b',').take(70));
        input.extend_from_slice(b"\",y\n");
        // closing quote at 73, real separator at 74, \n at 76

        let idx = scan(&input);
        assert_eq!(idx.field_seps, vec![1, 74]);
        assert_eq!(idx.row_ends, vec![RowEnd { pos: 76, len: 1 }]);
    }

    #[test]
    fn test_even_quote_count_clears_carry() {
        // Block 0 holds an open/close pair ending exactly at byte 63
        let mut input = vec![b'"'];
        input.extend(std::iter::repeat(b'q').take(62));
        input.push(b'"');
        input.extend_from_slice(b",x,y\n");

        let idx = scan(&input);
        assert_eq!(idx.field_seps, vec![64, 66]);
        assert_eq!(idx.row_ends, vec![RowEnd { pos: 68, len: 1 }]);
    }

    #[test]
    fn test_unterminated_quote_is_reported() {
        let idx = scan(b"a,\"bc\nd,e\n");
        assert_eq!(idx.field_seps, vec![1]);
        assert!(idx.row_ends.is_empty(), "everything after the quote is content");
        assert!(idx.ends_in_quote);
    }

    #[test]
    fn test_input_shorter_than_block_and_empty() {
        let idx = scan(b"a,b\n");
        assert_eq!(idx.field_seps, vec![1]);
        assert_eq!(idx.row_ends, vec![RowEnd { pos: 3, len: 1 }]);

        let idx = scan(b"");
        assert_eq!(idx, StructuralIndex::default());
    }

    #[test]
    fn test_padding_never_emits_positions() {
        // Exactly one full block followed by a single byte
        let mut input = vec![b'a'; 64];
        input.push(b',');
        let idx = scan(&input);
        assert_eq!(idx.field_seps, vec![64]);
        assert_eq!(idx.input_len, 65);
    }

    #[test]
    fn test_large_input_all_separators_correct() {
        let line = b"aaa,bbb,ccc\n"; // 12 bytes, seps at offsets 3 and 7
        let input: Vec<u8> = line.iter().copied().cycle().take(12 * 100).collect();
        let idx = scan(&input);

        let expected_seps: Vec<u32> = (0..100u32)
            .flat_map(|r| [r * 12 + 3, r * 12 + 7])
            .collect();
        assert_eq!(idx.field_seps, expected_seps);
        assert_eq!(idx.row_ends.len(), 100);
        for (i, re) in idx.row_ends.iter().enumerate() {
            assert_eq!(re.pos, (i as u32) * 12 + 11, "row {i} end position");
        }
    }

    #[test]
    fn test_block_scan_matches_reference() {
        let input: &[u8] = b"h1,h2,\"h,3\"\r\n1,\"x\"\"y\",z\n\n\"multi\nline\",,\r\n\
            tail without newline, \"and \"\"quotes\"\"\",\ra,b\r\n";
        let mut big = Vec::new();
        for _ in 0..9 {
            big.extend_from_slice(input);
        }
        let expected = scan_reference(&big);
        assert_eq!(scan_structural(&big, &Swar), expected);
        assert_eq!(scan_structural(&big, &Scalar), expected);
    }

    #[test]
    fn test_scan_range_resumes_mid_quote() {
        // Resuming inside a quoted field: comma at 6 is content, 12 is real
        let input = b"inside,more\",real\n";
        let mut seps = Vec::new();
        let mut ends = Vec::new();
        let carry = scan_range(input, 0, input.len(), true, &Swar, &mut seps, &mut ends);

        assert!(!carry);
        assert_eq!(seps, vec![12]);
        assert_eq!(ends, vec![RowEnd { pos: 17, len: 1 }]);
    }

    #[test]
    fn test_scan_range_picks_up_cr_before_start() {
        let input = b"a\r\nb\n";
        let mut seps = Vec::new();
        let mut ends = Vec::new();
        scan_range(input, 2, input.len(), false, &Swar, &mut seps, &mut ends);
        assert_eq!(
            ends,
            vec![RowEnd { pos: 1, len: 2 }, RowEnd { pos: 4, len: 1 }]
        );
    }

    #[test]
    fn test_quote_parity() {
        let input = b"\"a\",\"b";
        assert!(quote_parity(input, 0, input.len(), &Swar));
        assert!(!quote_parity(input, 0, 4, &Scalar));
        assert!(!quote_parity(input, 0, 0, &Swar));
    }
}
