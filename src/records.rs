// Record store and row cursor
//
// A `Records` owns the input buffer, the resolved table and the cursor.
// Rows are lent out by reference; `release` consumes the handle, so a
// released handle cannot be touched again.

use std::ops::Deref;
use std::path::Path;
use std::time::Instant;

use crate::buffer::{check_len, InputBuffer};
use crate::error::{Error, MalformedRow, Result};
use crate::options::ParseOptions;
use crate::strategy::build_table;

/// One parsed row: exactly `keys` values in column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    fields: Vec<String>,
}

impl Row {
    pub fn new(fields: Vec<String>) -> Self {
        Row { fields }
    }

    #[inline]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn into_fields(self) -> Vec<String> {
        self.fields
    }
}

impl Deref for Row {
    type Target = [String];

    #[inline]
    fn deref(&self) -> &[String] {
        &self.fields
    }
}

/// Every non-blank row of the input, in file order.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RecordTable {
    pub keys: usize,
    pub entries: Vec<std::result::Result<Row, MalformedRow>>,
}

/// Where the cursor stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    Active,
    Exhausted,
}

/// A parse handle: input, table and cursor.
#[derive(Debug)]
pub struct Records {
    buffer: InputBuffer,
    table: RecordTable,
    cursor: usize,
}

impl Records {
    /// Parse `path` with default options.
    pub fn parse(path: impl AsRef<Path>, keys: usize) -> Result<Self> {
        Self::parse_with(path, &ParseOptions::new(keys))
    }

    pub fn parse_with(path: impl AsRef<Path>, opts: &ParseOptions) -> Result<Self> {
        let path = path.as_ref();
        if opts.keys == 0 {
            return Err(Error::InvalidKeys);
        }

        let start = Instant::now();
        let buffer = InputBuffer::load(path, opts.load_mode)?;
        tracing::debug!(
            path = %path.display(),
            bytes = buffer.len(),
            mapped = buffer.is_mapped(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "loaded input"
        );
        Ok(Self::build(buffer, opts))
    }

    /// Parse an in-memory buffer.
    pub fn from_bytes(bytes: Vec<u8>, opts: &ParseOptions) -> Result<Self> {
        if opts.keys == 0 {
            return Err(Error::InvalidKeys);
        }
        check_len(Path::new("<memory>"), bytes.len() as u64)?;
        Ok(Self::build(InputBuffer::Owned(bytes), opts))
    }

    fn build(buffer: InputBuffer, opts: &ParseOptions) -> Self {
        let start = Instant::now();
        let table = build_table(&buffer, opts);
        let records = Records {
            buffer,
            table,
            cursor: 0,
        };
        tracing::debug!(
            rows = records.len(),
            malformed = records.malformed_count(),
            keys = records.keys(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "parsed records"
        );
        records
    }

    #[inline]
    pub fn keys(&self) -> usize {
        self.table.keys
    }

    /// Number of entries, malformed ones included.
    #[inline]
    pub fn len(&self) -> usize {
        self.table.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.table.entries.is_empty()
    }

    pub fn malformed_count(&self) -> usize {
        self.malformed().count()
    }

    /// Reports for every rejected row, independent of the cursor.
    pub fn malformed(&self) -> impl Iterator<Item = &MalformedRow> + '_ {
        self.table.entries.iter().filter_map(|e| e.as_ref().err())
    }

    /// The raw input bytes.
    pub fn input(&self) -> &[u8] {
        &self.buffer
    }

    pub fn state(&self) -> CursorState {
        if self.cursor < self.len() {
            CursorState::Active
        } else {
            CursorState::Exhausted
        }
    }

    /// Entries consumed so far.
    #[inline]
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// The entry under the cursor, then advance. `None` once exhausted, on
    /// every call.
    pub fn next_row(&mut self) -> Option<Result<&Row>> {
        next_entry(&self.table.entries, &mut self.cursor)
    }

    /// Iterator over the remaining entries, sharing this handle's cursor.
    pub fn rows(&mut self) -> Rows<'_> {
        Rows {
            entries: &self.table.entries,
            cursor: &mut self.cursor,
        }
    }

    /// Drop the buffer, the table and every row.
    pub fn release(self) {
        tracing::debug!(
            rows = self.len(),
            position = self.cursor,
            "released records"
        );
    }
}

#[inline]
fn next_entry<'a>(
    entries: &'a [std::result::Result<Row, MalformedRow>],
    cursor: &mut usize,
) -> Option<Result<&'a Row>> {
    let entry = entries.get(*cursor)?;
    *cursor += 1;
    Some(entry.as_ref().map_err(|bad| Error::Malformed(bad.clone())))
}

/// Borrowing iterator returned by [`Records::rows`].
pub struct Rows<'a> {
    entries: &'a [std::result::Result<Row, MalformedRow>],
    cursor: &'a mut usize,
}

impl<'a> Iterator for Rows<'a> {
    type Item = Result<&'a Row>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        next_entry(self.entries, self.cursor)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.entries.len().saturating_sub(*self.cursor);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Rows<'_> {}
