//! Store configuration: cache file policy and header-supplied setup parameters

use connmat_core::CacheMode;
use std::path::{Path, PathBuf};

/// Where an on-disk store keeps its writable copy
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CachePolicy {
    /// Unnamed temporary file, deleted when the store releases it
    #[default]
    Anonymous,
    /// Caller-named file, left in place after use
    Named(PathBuf),
}

impl CachePolicy {
    /// Use a named cache file at `path`
    pub fn named<P: AsRef<Path>>(path: P) -> Self {
        CachePolicy::Named(path.as_ref().to_path_buf())
    }

    /// Path of the cache file, if it has one
    pub fn path(&self) -> Option<&Path> {
        match self {
            CachePolicy::Anonymous => None,
            CachePolicy::Named(path) => Some(path),
        }
    }
}

/// Parameters a header reader supplies to
/// [`MatrixStore::setup_from`](crate::MatrixStore::setup_from)
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MatrixSetup {
    /// Dimension list, expected to be `[rows, cols]`
    pub dimensions: Vec<usize>,
    /// Byte position of the first matrix element
    pub offset: u64,
    /// Caching strategy
    pub cache_mode: CacheMode,
    /// Whether the file byte order differs from the host
    pub needs_swap: bool,
}

impl MatrixSetup {
    /// Create setup parameters for a `rows` x `cols` matrix
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            dimensions: vec![rows, cols],
            offset: 0,
            cache_mode: CacheMode::default(),
            needs_swap: false,
        }
    }

    /// Set the data offset
    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    /// Set the caching strategy
    pub fn with_cache_mode(mut self, cache_mode: CacheMode) -> Self {
        self.cache_mode = cache_mode;
        self
    }

    /// Mark the file as foreign byte order
    pub fn with_needs_swap(mut self, needs_swap: bool) -> Self {
        self.needs_swap = needs_swap;
        self
    }
}
