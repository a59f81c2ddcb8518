//! In-place byte order reversal for fixed-width numeric arrays
//!
//! Swapping works on bit patterns only: values are never converted, so
//! NaN payloads and signed zeros survive a swap/unswap pair untouched.

use bytemuck::Pod;
use core::mem::size_of;
use core::ops::Deref;

/// Fixed-width numeric types whose byte order can be reversed
pub trait ByteSwap: Pod {
    /// Reverse the byte sequence of a single value
    fn swap_bytes_in_place(&mut self) {
        bytemuck::bytes_of_mut(self).reverse();
    }
}

macro_rules! impl_byte_swap {
    ($($type:ty),*) => {
        $(impl ByteSwap for $type {})*
    };
}

impl_byte_swap!(u16, i16, u32, i32, u64, i64, f32, f64);

/// Reverse the byte order of every element in `data`
///
/// An empty slice is a no-op.
pub fn swap_in_place<T: ByteSwap>(data: &mut [T]) {
    let width = size_of::<T>();
    if width <= 1 {
        return;
    }
    let bytes: &mut [u8] = bytemuck::cast_slice_mut(data);
    for element in bytes.chunks_exact_mut(width) {
        element.reverse();
    }
}

/// Scoped byte swap over a borrowed buffer
///
/// Swaps on construction when `active`, and swaps back when dropped, so the
/// buffer is restored on every exit path, including early `?` returns.
pub struct SwapGuard<'a, T: ByteSwap> {
    data: &'a mut [T],
    active: bool,
}

impl<'a, T: ByteSwap> SwapGuard<'a, T> {
    /// Swap `data` in place if `active` is set
    pub fn new(data: &'a mut [T], active: bool) -> Self {
        if active {
            swap_in_place(data);
        }
        Self { data, active }
    }

    /// Whether the wrapped buffer is currently swapped
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// View the (possibly swapped) buffer as raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&*self.data)
    }
}

impl<T: ByteSwap> Deref for SwapGuard<'_, T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &*self.data
    }
}

impl<T: ByteSwap> Drop for SwapGuard<'_, T> {
    fn drop(&mut self) {
        if self.active {
            swap_in_place(self.data);
        }
    }
}
