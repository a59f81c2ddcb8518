//! Error type for matrix store operations that touch files

use connmat_core::{ErrorCategory, MatrixError};

/// Errors raised by [`MatrixStore`](crate::MatrixStore)
#[derive(Debug)]
pub enum Error {
    /// Usage, format or configuration failure detected before any I/O
    Matrix(MatrixError),
    /// The platform reported a failure opening, seeking, reading or writing
    Io {
        context: &'static str,
        source: std::io::Error,
    },
    /// A read or write transferred fewer bytes than requested
    ShortTransfer {
        context: &'static str,
        expected: usize,
        transferred: usize,
    },
}

impl Error {
    pub(crate) fn io(context: &'static str) -> impl FnOnce(std::io::Error) -> Self {
        move |source| Error::Io { context, source }
    }

    /// Get the category of this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Matrix(err) => err.category(),
            Error::Io { .. } | Error::ShortTransfer { .. } => ErrorCategory::Io,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Matrix(err) => write!(f, "{err}"),
            Error::Io { context, source } => write!(f, "{context}: {source}"),
            Error::ShortTransfer {
                context,
                expected,
                transferred,
            } => write!(
                f,
                "{context}: transferred {transferred} of {expected} bytes (file may be truncated)"
            ),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<MatrixError> for Error {
    fn from(err: MatrixError) -> Self {
        Error::Matrix(err)
    }
}

/// Result type for matrix store operations
pub type Result<T> = std::result::Result<T, Error>;
