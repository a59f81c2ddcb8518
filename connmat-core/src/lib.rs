#![no_std]

//! Connectivity matrix core definitions
//!
//! Pure definitions shared by every matrix store backend: element types,
//! byte-order reversal, layout arithmetic and errors. No I/O lives here.

pub mod byteswap;
pub mod cache_mode;
pub mod constants;
pub mod element;
pub mod error;
pub mod layout;

pub use byteswap::{swap_in_place, ByteSwap, SwapGuard};
pub use cache_mode::CacheMode;
pub use constants::*;
pub use element::MatrixElement;
pub use error::*;
pub use layout::MatrixLayout;
