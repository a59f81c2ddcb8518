//! Caching strategy selection

/// Where the authoritative copy of the matrix lives after setup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CacheMode {
    /// Whole matrix held in one owned buffer, file read once at setup
    #[default]
    InMemory,
    /// Reads served from the file, writes land in a cache file
    OnDisk,
}
