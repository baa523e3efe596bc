// Field resolution: spans, quote stripping and un-escaping
//
// The scanner has already decided where fields and rows end. What is left
// per field is rule 4 of the dialect: a field whose first byte is a quote
// yields the bytes between the quotes with doubled quotes collapsed; any
// other field is taken verbatim.

use std::borrow::Cow;

use super::classify::QUOTE;
use super::index::{RowSpan, StructuralIndex};
use crate::error::MalformedKind;

/// Location of one field in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpan {
    pub start: u32,
    pub end: u32,
    /// First byte is a quote.
    pub quoted: bool,
}

impl FieldSpan {
    #[inline]
    pub fn new(input: &[u8], start: u32, end: u32) -> Self {
        FieldSpan {
            start,
            end,
            quoted: start < end && input[start as usize] == QUOTE,
        }
    }
}

/// Field content for a span. Borrows unless doubled quotes had to be
/// collapsed.
#[inline]
pub fn field_bytes(input: &[u8], span: FieldSpan) -> Result<Cow<'_, [u8]>, MalformedKind> {
    let field = &input[span.start as usize..span.end as usize];
    if !span.quoted {
        return Ok(Cow::Borrowed(field));
    }

    // Fast path: "...", no quotes inside
    if field.len() >= 2 && field[field.len() - 1] == QUOTE {
        let inner = &field[1..field.len() - 1];
        if !inner.contains(&QUOTE) {
            return Ok(Cow::Borrowed(inner));
        }
    }

    unescape_quoted(field).map(Cow::Owned)
}

/// Walk a field that opens with a quote.
///
/// A quote toggles quoted state unless it is the first half of a doubled
/// quote inside quoted state, which emits one literal quote. Bytes after the
/// closing quote are kept as they are.
fn unescape_quoted(field: &[u8]) -> Result<Vec<u8>, MalformedKind> {
    let mut out = Vec::with_capacity(field.len());
    let mut in_quotes = true;
    let mut i = 1;

    while i < field.len() {
        let byte = field[i];
        if byte == QUOTE {
            if in_quotes && i + 1 < field.len() && field[i + 1] == QUOTE {
                out.push(QUOTE);
                i += 2;
                continue;
            }
            in_quotes = !in_quotes;
        } else {
            out.push(byte);
        }
        i += 1;
    }

    if in_quotes {
        return Err(MalformedKind::UnterminatedQuote);
    }
    Ok(out)
}

#[inline]
fn into_string(bytes: Cow<'_, [u8]>) -> Result<String, std::str::Utf8Error> {
    match bytes {
        Cow::Borrowed(b) => std::str::from_utf8(b).map(str::to_owned),
        Cow::Owned(v) => String::from_utf8(v).map_err(|e| e.utf8_error()),
    }
}

/// Resolve one row of the index into exactly `keys` owned strings.
///
/// `unterminated` marks the row the input ended inside of; the scanner
/// reports that once for the whole buffer.
pub fn resolve_row(
    input: &[u8],
    index: &StructuralIndex,
    row: &RowSpan,
    keys: usize,
    unterminated: bool,
) -> Result<Vec<String>, MalformedKind> {
    if unterminated {
        return Err(MalformedKind::UnterminatedQuote);
    }

    let fields = index.fields(row);
    let found = fields.len();
    if found != keys {
        return Err(MalformedKind::FieldCount {
            expected: keys,
            found,
        });
    }

    let mut out = Vec::with_capacity(keys);
    for (i, (start, end)) in fields.enumerate() {
        let bytes = field_bytes(input, FieldSpan::new(input, start, end))?;
        let value = into_string(bytes).map_err(|_| MalformedKind::InvalidUtf8 { field: i })?;
        out.push(value);
    }
    Ok(out)
}
