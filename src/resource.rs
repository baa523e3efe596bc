// Shared, runtime-guarded parse handle
//
// `Records` enforces release through ownership. Callers that have to share
// a handle (across threads, or through a binding layer that only holds
// references) use this wrapper instead: the Mutex serialises access to the
// cursor, and release leaves `None` behind so later calls fail cleanly.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{Error, Result};
use crate::options::ParseOptions;
use crate::records::{Records, Row};

/// A `Records` that can be released while references to it are still
/// alive.
#[derive(Debug)]
pub struct RecordsResource {
    inner: Mutex<Option<Records>>,
}

/// Type alias for the shared handle
pub type RecordsRef = Arc<RecordsResource>;

impl RecordsResource {
    pub fn new(records: Records) -> Self {
        RecordsResource {
            inner: Mutex::new(Some(records)),
        }
    }

    /// Parse `path` and wrap the result.
    pub fn open(path: impl AsRef<Path>, opts: &ParseOptions) -> Result<RecordsRef> {
        let records = Records::parse_with(path, opts)?;
        Ok(Arc::new(Self::new(records)))
    }

    fn lock(&self) -> MutexGuard<'_, Option<Records>> {
        // A panic mid-call leaves the cursor consistent; keep serving
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the next row. `Ok(None)` at end of stream.
    pub fn next_row(&self) -> Result<Option<Row>> {
        let mut guard = self.lock();
        let records = guard.as_mut().ok_or(Error::UseAfterRelease)?;
        records.next_row().map(|entry| entry.cloned()).transpose()
    }

    /// Drop the parsed data. A second release is an error.
    pub fn release(&self) -> Result<()> {
        let records = self.lock().take().ok_or(Error::UseAfterRelease)?;
        records.release();
        Ok(())
    }

    pub fn is_released(&self) -> bool {
        self.lock().is_none()
    }
}
