//! Matrix element type constraints
//!
//! Connectivity matrices hold IEEE floating-point values. Any element type
//! must be plain old data so rows can be moved to and from files as raw
//! bytes, and byte-swappable so foreign-endian files can be served.

use crate::byteswap::ByteSwap;

/// Trait for types that can be stored as matrix elements
pub trait MatrixElement: ByteSwap + PartialEq + Default + Send + Sync + 'static {
    /// Get the size in bytes of this element type
    fn size_bytes() -> usize {
        core::mem::size_of::<Self>()
    }
}

impl MatrixElement for f32 {}

impl MatrixElement for f64 {}
