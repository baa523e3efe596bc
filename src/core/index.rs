// Structural index for a scanned buffer
//
// Produced by the scanner, consumed by the resolver.
// Positions use u32 (4 GB cap, halves memory vs usize on 64-bit).

/// A record terminator position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowEnd {
    /// Byte position of terminator start (\n or \r in \r\n).
    pub pos: u32,
    /// 1 for \n, 2 for \r\n.
    pub len: u8,
}

/// Positions of all unquoted separators and row endings.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct StructuralIndex {
    /// Unquoted field separators, ascending.
    pub field_seps: Vec<u32>,
    /// Unquoted row terminators, ascending.
    pub row_ends: Vec<RowEnd>,
    /// Total input length.
    pub input_len: u32,
    /// The input ended inside a quoted region.
    pub ends_in_quote: bool,
}

/// Bounds of one row plus the slice of `field_seps` that falls inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowSpan {
    pub start: u32,
    /// Excludes the terminator.
    pub content_end: u32,
    pub sep_lo: usize,
    pub sep_hi: usize,
}

impl RowSpan {
    /// A blank record: two terminators back to back, or a bare trailing one.
    #[inline]
    pub fn is_blank(&self) -> bool {
        self.start == self.content_end
    }
}

impl StructuralIndex {
    /// Number of rows, blank ones included.
    #[inline]
    pub fn row_count(&self) -> usize {
        let n = self.row_ends.len();
        // If there's content after the last row_end (no trailing newline), there's one more row.
        let tail_start = match self.row_ends.last() {
            Some(last) => last.pos as usize + last.len as usize,
            None => 0,
        };
        if tail_start < self.input_len as usize {
            n + 1
        } else {
            n
        }
    }

    /// Iterate over rows with their field separators, using a linear cursor.
    ///
    /// O(total_seps) across all rows, no binary search.
    #[inline]
    pub fn rows(&self) -> RowSpanIter<'_> {
        RowSpanIter {
            index: self,
            row_idx: 0,
            pos: 0,
            sep_cursor: 0,
        }
    }

    /// Field (start, end) pairs of a row.
    #[inline]
    pub fn fields(&self, row: &RowSpan) -> FieldIter<'_> {
        FieldIter {
            seps: &self.field_seps[row.sep_lo..row.sep_hi],
            row_start: row.start,
            row_content_end: row.content_end,
            idx: 0,
            done: false,
        }
    }

    /// Append `other`, whose positions are already absolute.
    ///
    /// Used to stitch chunk indexes back together in input order.
    pub(crate) fn extend(&mut self, other: StructuralIndex) {
        debug_assert!(self
            .field_seps
            .last()
            .zip(other.field_seps.first())
            .map_or(true, |(a, b)| a < b));
        self.field_seps.extend(other.field_seps);
        self.row_ends.extend(other.row_ends);
        self.ends_in_quote = other.ends_in_quote;
    }
}

/// Iterator over the rows of a `StructuralIndex`.
pub struct RowSpanIter<'a> {
    index: &'a StructuralIndex,
    row_idx: usize,
    pos: u32,
    sep_cursor: usize,
}

impl<'a> Iterator for RowSpanIter<'a> {
    type Item = RowSpan;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let (start, content_end) = if self.row_idx < self.index.row_ends.len() {
            let re = &self.index.row_ends[self.row_idx];
            let start = self.pos;
            self.pos = re.pos + re.len as u32;
            self.row_idx += 1;
            (start, re.pos)
        } else if self.pos < self.index.input_len {
            // Trailing row without terminator
            let start = self.pos;
            let end = self.index.input_len;
            self.pos = end;
            self.row_idx += 1;
            (start, end)
        } else {
            return None;
        };

        // Advance cursor past separators in this row
        let sep_lo = self.sep_cursor;
        let seps = &self.index.field_seps;
        while self.sep_cursor < seps.len() && seps[self.sep_cursor] < content_end {
            self.sep_cursor += 1;
        }

        Some(RowSpan {
            start,
            content_end,
            sep_lo,
            sep_hi: self.sep_cursor,
        })
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.index.row_count().saturating_sub(self.row_idx);
        (remaining, Some(remaining))
    }
}

/// Iterator over fields in a single row.
pub struct FieldIter<'a> {
    seps: &'a [u32],
    row_start: u32,
    row_content_end: u32,
    idx: usize,
    done: bool,
}

impl<'a> Iterator for FieldIter<'a> {
    /// (field_start, field_end): byte positions in the input.
    type Item = (u32, u32);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let field_start = if self.idx == 0 {
            self.row_start
        } else {
            self.seps[self.idx - 1] + 1
        };

        if self.idx < self.seps.len() {
            let field_end = self.seps[self.idx];
            self.idx += 1;
            Some((field_start, field_end))
        } else {
            // Last field: ends at row_content_end
            self.done = true;
            Some((field_start, self.row_content_end))
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.done {
            0
        } else {
            self.seps.len() + 1 - self.idx
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for FieldIter<'_> {}
