//! Property-based tests for the parser
//!
//! - Encoding generated rows and parsing them back reproduces every value
//! - All scan strategies build the same structural index
//! - Parallel and sequential parses build the same table

use proptest::prelude::*;
use simdcsv::core::{scan_structural, Scalar, Swar};
use simdcsv::strategy::scan_chunked;
use simdcsv::{encode_rows, ParseOptions, Records, ScanMode};

/// Field values, including ones that force quoting
fn field_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        // Plain values
        "[a-zA-Z0-9 ._-]{0,10}",
        // Dialect bytes mixed in
        "[a-z,\"\r\n ]{0,12}",
        // Any printable text, multi-byte included
        "\\PC{0,8}",
    ]
}

/// Tables with a fixed field count per row
fn table_strategy() -> impl Strategy<Value = (usize, Vec<Vec<String>>)> {
    (1usize..6).prop_flat_map(|keys| {
        (
            Just(keys),
            prop::collection::vec(prop::collection::vec(field_strategy(), keys), 0..40),
        )
    })
}

/// Raw input over the bytes the scanner cares about
fn csv_bytes_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(
        prop_oneof![
            Just(b','),
            Just(b'"'),
            Just(b'\n'),
            Just(b'\r'),
            Just(b'a'),
            Just(b'z'),
        ],
        0..400,
    )
}

fn drain(records: &mut Records) -> Vec<Result<Vec<String>, String>> {
    records
        .rows()
        .map(|entry| entry.map(|row| row.fields().to_vec()).map_err(|e| e.to_string()))
        .collect()
}

#[cfg(test)]
mod proptest_tests {
    use super::*;

    proptest! {
        #[test]
        fn test_encode_then_parse_round_trips((keys, rows) in table_strategy()) {
            let input = encode_rows(&rows);
            let opts = ParseOptions::new(keys).with_parallel(false);
            let mut records = Records::from_bytes(input, &opts).unwrap();

            prop_assert_eq!(records.malformed_count(), 0);
            let parsed: Vec<Vec<String>> = drain(&mut records)
                .into_iter()
                .map(|entry| entry.unwrap())
                .collect();
            prop_assert_eq!(parsed, rows);
        }

        #[test]
        fn test_scan_strategies_agree(input in csv_bytes_strategy()) {
            let reference = scan_structural(&input, &Scalar);
            prop_assert_eq!(&scan_structural(&input, &Swar), &reference);
            prop_assert_eq!(&scan_chunked(&input, 64, &Swar), &reference);
            prop_assert_eq!(&scan_chunked(&input, 128, &Scalar), &reference);
        }

        #[test]
        fn test_parallel_matches_sequential(input in csv_bytes_strategy(), keys in 1usize..4) {
            let sequential = ParseOptions::new(keys)
                .with_scan_mode(ScanMode::Scalar)
                .with_parallel(false);
            let parallel = ParseOptions::new(keys)
                .with_parallel_threshold(0)
                .with_chunk_size(64);

            let mut a = Records::from_bytes(input.clone(), &sequential).unwrap();
            let mut b = Records::from_bytes(input, &parallel).unwrap();
            prop_assert_eq!(a.len(), b.len());
            prop_assert_eq!(drain(&mut a), drain(&mut b));
        }
    }
}
