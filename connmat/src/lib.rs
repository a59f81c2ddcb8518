//! Connmat - dense connectivity-matrix storage
//!
//! Reads, caches and rewrites large row-major floating-point matrices held
//! in binary files of either byte order.
//!
//! ## Architecture
//!
//! - **connmat-core**: element types, byte swapping, layout arithmetic and
//!   errors (no I/O)
//! - **connmat**: the file-backed [`MatrixStore`] and its chunked I/O helpers
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use connmat::{CacheMode, CachePolicy, MatrixStore};
//!
//! fn example() -> connmat::Result<()> {
//!     let mut store = MatrixStore::<f32>::new();
//!     store.set_matrix_file("subject.dconn.nii", CachePolicy::Anonymous);
//!     // Shape, offset and byte order come from the file header
//!     store.setup(&[91282, 91282], 1024, CacheMode::OnDisk, false)?;
//!
//!     let row = store.get_row(100)?;
//!     println!("row 100 starts with {}", row[0]);
//!
//!     let mut scaled: Vec<f32> = row.iter().map(|v| v * 2.0).collect();
//!     store.set_row(100, &mut scaled)?;
//!     store.write_to_new_file("scaled.dconn.nii", 1024, false)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Caching
//!
//! - **In memory**: the file is read once, one row per call, and every
//!   access afterwards is a buffer copy
//! - **On disk**: reads come straight from the file until the first write,
//!   which copies the matrix into a cache file exactly once

// Re-export core abstractions
pub use connmat_core::{
    swap_in_place, ByteSwap, CacheMode, ErrorCategory, MatrixElement, MatrixError,
    MatrixLayout, SwapGuard, MAX_IO_CHUNK_BYTES,
};

pub mod chunked_io;
pub mod config;
pub mod error;
pub mod store;

pub use config::{CachePolicy, MatrixSetup};
pub use error::{Error, Result};
pub use store::{MatrixStore, ReadTarget};
