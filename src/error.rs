// Error types for parsing and handle lifecycle

use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of an [`Error`], for callers that branch on the
/// failure without looking at its message.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// The input could not be opened, read or mapped.
    File,
    /// A single row could not be resolved; other rows are unaffected.
    Malformed,
    /// A runtime-guarded handle was used after it was released.
    UseAfterRelease,
    /// Invalid arguments (e.g. zero keys).
    Usage,
}

/// The crate error type.
#[derive(Debug, Error)]
pub enum Error {
    /// The input path cannot be opened or read.
    #[error("cannot read {}: {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Offsets are u32, so inputs are capped at 4 GiB.
    #[error("{} is {len} bytes; inputs are limited to {} bytes", .path.display(), u32::MAX)]
    InputTooLarge { path: PathBuf, len: u64 },

    /// A row could not be turned into exactly `keys` fields.
    #[error(transparent)]
    Malformed(#[from] MalformedRow),

    #[error("parse handle used after release")]
    UseAfterRelease,

    #[error("key count must be at least 1")]
    InvalidKeys,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::File { .. } | Error::InputTooLarge { .. } => ErrorKind::File,
            Error::Malformed(_) => ErrorKind::Malformed,
            Error::UseAfterRelease => ErrorKind::UseAfterRelease,
            Error::InvalidKeys => ErrorKind::Usage,
        }
    }

    pub(crate) fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::File {
            path: path.into(),
            source,
        }
    }
}

/// Why a row was rejected.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum MalformedKind {
    #[error("input ended inside a quoted field")]
    UnterminatedQuote,

    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },

    #[error("field {field} is not valid UTF-8")]
    InvalidUtf8 { field: usize },
}

/// A rejected row, kept in the record table at the position it occupied.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("malformed row {index} at byte {offset}: {kind}")]
pub struct MalformedRow {
    /// Position of the entry in the record table (0-based).
    pub index: usize,
    /// Byte offset of the row start in the input.
    pub offset: u64,
    pub kind: MalformedKind,
}

pub type Result<T> = std::result::Result<T, Error>;
