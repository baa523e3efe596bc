// Parse configuration

/// Inputs at least this large are parsed on the rayon pool when
/// `ParseOptions::parallel` is set.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 8 * 1024 * 1024;

/// Bytes per parallel scan chunk. Rounded down to a multiple of 64.
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Which byte classifier the scanner uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScanMode {
    /// `Simd` when built with `nightly-simd`, otherwise `Swar`.
    #[default]
    Auto,
    Scalar,
    Swar,
    /// Falls back to `Swar` without the `nightly-simd` feature.
    Simd,
}

impl ScanMode {
    /// The mode that will actually run on this build.
    pub fn effective(self) -> ScanMode {
        match self {
            ScanMode::Auto | ScanMode::Simd if cfg!(feature = "nightly-simd") => ScanMode::Simd,
            ScanMode::Auto | ScanMode::Simd => ScanMode::Swar,
            other => other,
        }
    }
}

/// How the file gets into memory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadMode {
    /// One `read_to_end` into an owned buffer.
    #[default]
    Read,
    /// Read-only memory map.
    Mmap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Fields every row must have.
    pub keys: usize,
    pub scan_mode: ScanMode,
    pub load_mode: LoadMode,
    pub parallel: bool,
    pub parallel_threshold: usize,
    pub chunk_size: usize,
}

impl ParseOptions {
    pub fn new(keys: usize) -> Self {
        ParseOptions {
            keys,
            scan_mode: ScanMode::Auto,
            load_mode: LoadMode::Read,
            parallel: true,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_scan_mode(mut self, mode: ScanMode) -> Self {
        self.scan_mode = mode;
        self
    }

    pub fn with_load_mode(mut self, mode: LoadMode) -> Self {
        self.load_mode = mode;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_parallel_threshold(mut self, bytes: usize) -> Self {
        self.parallel_threshold = bytes;
        self
    }

    pub fn with_chunk_size(mut self, bytes: usize) -> Self {
        self.chunk_size = bytes;
        self
    }

    /// Whether an input of `len` bytes takes the parallel path.
    pub(crate) fn use_parallel(&self, len: usize) -> bool {
        self.parallel && len >= self.parallel_threshold
    }
}
