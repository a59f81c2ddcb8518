//! Dimension validation and byte-offset arithmetic for row-major matrices
//!
//! Pure functions with no I/O. Every position handed to a seek is computed
//! here with overflow checks, so the I/O layer never does raw arithmetic.

use crate::constants::MATRIX_DIMENSIONS;
use crate::error::{MatrixError, Result};

/// Shape and placement of a dense row-major matrix within a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MatrixLayout {
    rows: usize,
    cols: usize,
    offset: u64,
    element_size: usize,
}

impl MatrixLayout {
    /// Build a layout from a header-supplied dimension list
    ///
    /// The list must hold exactly `[rows, cols]`. Zero-sized matrices are
    /// accepted; every index check on them fails.
    pub fn from_dimensions(dimensions: &[usize], offset: u64, element_size: usize) -> Result<Self> {
        if dimensions.len() != MATRIX_DIMENSIONS {
            return Err(MatrixError::InvalidDimensionCount {
                found: dimensions.len(),
            });
        }
        Self::new(dimensions[0], dimensions[1], offset, element_size)
    }

    /// Build a layout from explicit row and column counts
    pub fn new(rows: usize, cols: usize, offset: u64, element_size: usize) -> Result<Self> {
        let layout = Self {
            rows,
            cols,
            offset,
            element_size,
        };
        let total = layout.checked_total_bytes()?;
        offset.checked_add(total).ok_or(MatrixError::SizeOverflow)?;
        Ok(layout)
    }

    fn checked_total_bytes(&self) -> Result<u64> {
        let count = self
            .rows
            .checked_mul(self.cols)
            .ok_or(MatrixError::SizeOverflow)?;
        let bytes = count
            .checked_mul(self.element_size)
            .ok_or(MatrixError::SizeOverflow)?;
        u64::try_from(bytes).map_err(|_| MatrixError::SizeOverflow)
    }

    pub const fn rows(&self) -> usize {
        self.rows
    }

    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Byte position of row 0, column 0
    pub const fn offset(&self) -> u64 {
        self.offset
    }

    pub const fn element_size(&self) -> usize {
        self.element_size
    }

    /// Dimensions as (rows, cols)
    pub const fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Total number of elements
    pub const fn element_count(&self) -> usize {
        // Checked at construction
        self.rows * self.cols
    }

    /// Size of one row in bytes
    pub const fn row_bytes(&self) -> usize {
        self.cols * self.element_size
    }

    /// Size of the whole matrix region in bytes
    pub const fn total_bytes(&self) -> u64 {
        (self.element_count() * self.element_size) as u64
    }

    /// Validate a row index
    pub const fn check_row(&self, row: usize) -> Result<()> {
        if row >= self.rows {
            return Err(MatrixError::IndexOutOfBounds {
                index: row,
                len: self.rows,
            });
        }
        Ok(())
    }

    /// Validate a column index
    pub const fn check_col(&self, col: usize) -> Result<()> {
        if col >= self.cols {
            return Err(MatrixError::IndexOutOfBounds {
                index: col,
                len: self.cols,
            });
        }
        Ok(())
    }

    /// Validate a buffer length against another expected length
    pub const fn check_len(expected: usize, found: usize) -> Result<()> {
        if expected != found {
            return Err(MatrixError::LengthMismatch { expected, found });
        }
        Ok(())
    }

    /// File position of the first element of `row`
    pub const fn row_position(&self, row: usize) -> u64 {
        self.offset + (row * self.row_bytes()) as u64
    }

    /// File position of the element at (`row`, `col`)
    pub const fn element_position(&self, row: usize, col: usize) -> u64 {
        self.row_position(row) + (col * self.element_size) as u64
    }

    /// Index of (`row`, `col`) within a flat row-major buffer
    pub const fn flat_index(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    /// Same shape and element size, placed at a different offset
    pub fn with_offset(&self, offset: u64) -> Result<Self> {
        Self::new(self.rows, self.cols, offset, self.element_size)
    }
}
