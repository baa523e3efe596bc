// CSV encoding for the fixed dialect, inverse of field resolution
//
// A field is quoted only when it contains a delimiter, quote, CR or LF;
// quotes inside a quoted field are doubled. Rows end with LF.

use super::classify::{CR, DELIMITER, LF, QUOTE};

/// Does this field need to be wrapped in quotes to survive a round trip?
#[inline]
pub fn field_needs_quoting(field: &[u8]) -> bool {
    field
        .iter()
        .any(|&b| b == DELIMITER || b == QUOTE || b == LF || b == CR)
}

/// Write a field that needs quoting: quote + field_with_doubled_quotes + quote
#[inline]
pub fn write_quoted_field(out: &mut Vec<u8>, field: &[u8]) {
    out.push(QUOTE);
    for &b in field {
        out.push(b);
        if b == QUOTE {
            out.push(QUOTE); // double the quote character
        }
    }
    out.push(QUOTE);
}

/// Write one field, quoting only if required.
#[inline]
pub fn write_field(out: &mut Vec<u8>, field: &[u8]) {
    if field_needs_quoting(field) {
        write_quoted_field(out, field);
    } else {
        out.extend_from_slice(field);
    }
}

/// Write one row followed by LF.
///
/// A row of one empty field is written as `""`, since a bare LF would read
/// back as a blank line and be skipped.
pub fn write_row<I, F>(out: &mut Vec<u8>, fields: I)
where
    I: IntoIterator<Item = F>,
    F: AsRef<[u8]>,
{
    let mut count = 0;
    let mut last_empty = false;
    for (i, field) in fields.into_iter().enumerate() {
        let field = field.as_ref();
        if i > 0 {
            out.push(DELIMITER);
        }
        write_field(out, field);
        count = i + 1;
        last_empty = field.is_empty();
    }
    if count == 1 && last_empty {
        out.extend_from_slice(&[QUOTE, QUOTE]);
    }
    out.push(LF);
}

/// Encode a whole table.
pub fn encode_rows<R, I, F>(rows: R) -> Vec<u8>
where
    R: IntoIterator<Item = I>,
    I: IntoIterator<Item = F>,
    F: AsRef<[u8]>,
{
    let mut out = Vec::new();
    for row in rows {
        write_row(&mut out, row);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_needs_quoting() {
        assert!(!field_needs_quoting(b"plain value"));
        assert!(!field_needs_quoting(b""));
        assert!(field_needs_quoting(b"a,b"));
        assert!(field_needs_quoting(b"say \"hi\""));
        assert!(field_needs_quoting(b"two\nlines"));
        assert!(field_needs_quoting(b"cr\r"));
    }

    #[test]
    fn test_write_quoted_field_doubles_quotes() {
        let mut out = Vec::new();
        write_quoted_field(&mut out, b"say \"hi\"");
        assert_eq!(out, b"\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_encode_rows() {
        let rows = vec![vec!["id", "name"], vec!["2", "Bob, Jr."], vec!["3", ""]];
        assert_eq!(encode_rows(rows), b"id,name\n2,\"Bob, Jr.\"\n3,\n");
    }

    #[test]
    fn test_single_empty_field_is_quoted() {
        let rows = vec![vec!["a"], vec![""], vec!["b"]];
        assert_eq!(encode_rows(rows), b"a\n\"\"\nb\n");
        // Only the one-field case needs it
        assert_eq!(encode_rows(vec![vec!["", ""]]), b",\n");
    }
}
