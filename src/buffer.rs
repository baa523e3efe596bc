// Input buffer: the whole file, read or mapped, alive as long as its Records

use std::fs::File;
use std::io::Read;
use std::ops::Deref;
use std::path::Path;

use memmap2::Mmap;

use crate::error::{Error, Result};
use crate::options::LoadMode;

/// Raw bytes of one input file.
#[derive(Debug)]
pub enum InputBuffer {
    Owned(Vec<u8>),
    Mapped(Mmap),
}

impl InputBuffer {
    /// Load `path` in full. The file handle is closed before this returns,
    /// on success and on error.
    pub fn load(path: &Path, mode: LoadMode) -> Result<Self> {
        let mut file = File::open(path).map_err(|err| Error::file(path, err))?;
        let len = file
            .metadata()
            .map(|meta| meta.len())
            .map_err(|err| Error::file(path, err))?;

        check_len(path, len)?;

        // Zero-length maps are rejected on some platforms
        if len == 0 {
            return Ok(InputBuffer::Owned(Vec::new()));
        }

        match mode {
            LoadMode::Read => {
                let mut bytes = Vec::with_capacity(len as usize);
                file.read_to_end(&mut bytes)
                    .map_err(|err| Error::file(path, err))?;
                // The file may have grown since `metadata`
                check_len(path, bytes.len() as u64)?;
                Ok(InputBuffer::Owned(bytes))
            }
            LoadMode::Mmap => {
                // SAFETY: read-only map; the file must not be truncated while
                // the Records that owns this buffer is alive.
                let mmap = unsafe { Mmap::map(&file).map_err(|err| Error::file(path, err))? };
                // The map covers the length at map time, not the one checked above
                check_len(path, mmap.len() as u64)?;
                Ok(InputBuffer::Mapped(mmap))
            }
        }
    }

    pub fn is_mapped(&self) -> bool {
        matches!(self, InputBuffer::Mapped(_))
    }
}

/// Positions are `u32`, so no input may exceed `u32::MAX` bytes.
pub(crate) fn check_len(path: &Path, len: u64) -> Result<()> {
    if len > u32::MAX as u64 {
        return Err(Error::InputTooLarge {
            path: path.to_path_buf(),
            len,
        });
    }
    Ok(())
}

impl Deref for InputBuffer {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &[u8] {
        match self {
            InputBuffer::Owned(bytes) => bytes,
            InputBuffer::Mapped(mmap) => mmap,
        }
    }
}
