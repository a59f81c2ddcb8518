//! Error types for connectivity-matrix operations

/// Broad classes of failure, used by callers that only need to decide
/// whether to report a bad file, a bad call, or a bad configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The call itself was invalid (uninitialized store, bad index, bad length)
    Usage,
    /// The header-supplied shape could not describe a matrix
    Format,
    /// The requested combination of settings is unsupported
    Configuration,
    /// Reading or writing the backing storage failed
    Io,
}

/// Errors that can occur during matrix store operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixError {
    /// Operation attempted before `setup`
    Uninitialized,
    /// Dimension list did not have exactly two entries
    InvalidDimensionCount { found: usize },
    /// Row or column index past the end of the matrix
    IndexOutOfBounds { index: usize, len: usize },
    /// Caller buffer length does not match the addressed region
    LengthMismatch { expected: usize, found: usize },
    /// In-place flush requested with a different byte order than the cache
    ByteOrderMismatch,
    /// In-place flush requested at a different data offset than the cache
    OffsetMismatch,
    /// Matrix size in bytes does not fit the address space
    SizeOverflow,
}

impl MatrixError {
    /// Get the category of this error
    pub const fn category(&self) -> ErrorCategory {
        match self {
            MatrixError::Uninitialized
            | MatrixError::IndexOutOfBounds { .. }
            | MatrixError::LengthMismatch { .. } => ErrorCategory::Usage,
            MatrixError::InvalidDimensionCount { .. } | MatrixError::SizeOverflow => {
                ErrorCategory::Format
            }
            MatrixError::ByteOrderMismatch | MatrixError::OffsetMismatch => {
                ErrorCategory::Configuration
            }
        }
    }
}

impl core::fmt::Display for MatrixError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MatrixError::Uninitialized => write!(f, "Matrix store used before setup"),
            MatrixError::InvalidDimensionCount { found } => {
                write!(f, "Matrix must have exactly 2 dimensions, found {found}")
            }
            MatrixError::IndexOutOfBounds { index, len } => {
                write!(f, "Index {index} out of bounds for length {len}")
            }
            MatrixError::LengthMismatch { expected, found } => {
                write!(f, "Buffer length {found} does not match expected {expected}")
            }
            MatrixError::ByteOrderMismatch => write!(
                f,
                "Cannot change byte order while writing the cache file in place"
            ),
            MatrixError::OffsetMismatch => write!(
                f,
                "Cannot move matrix data while writing the cache file in place"
            ),
            MatrixError::SizeOverflow => write!(f, "Matrix size calculation would overflow"),
        }
    }
}

/// Result type for matrix core operations
pub type Result<T> = core::result::Result<T, MatrixError>;
