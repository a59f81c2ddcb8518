//! I/O sizing constants

/// Largest byte count handed to a single read or write call
///
/// Several platform I/O layers misbehave on single transfers approaching
/// 2 GiB, so bulk transfers are split into pieces of at most this size.
pub const MAX_IO_CHUNK_BYTES: usize = 1 << 30;

/// Number of dimensions a matrix header must supply
pub const MATRIX_DIMENSIONS: usize = 2;
