//! Error handling for the Paradox decoder
//!
//! Only hard failures are errors. Conditions the format is known to contain in
//! legacy data (a blob whose stored size disagrees with its reference, an
//! unrecognized field type) decode to absent values instead.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Coarse classification of a [`ParadoxError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Underlying I/O failure
    Io,
    /// Truncated or malformed file contents
    Format,
    /// A requested file or companion file does not exist
    NotFound,
    /// Misuse of the row-cursor interface
    Usage,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ErrorKind::Io => "I/O error",
            ErrorKind::Format => "format error",
            ErrorKind::NotFound => "not found",
            ErrorKind::Usage => "usage error",
        })
    }
}

/// Main error type for the Paradox engine
#[derive(Error, Debug)]
pub enum ParadoxError {
    #[error("I/O error: {0}")]
    Io(io::Error),

    #[error("Invalid file format: {0}")]
    Format(String),

    #[error("Table not found: {}", .0.display())]
    TableNotFound(PathBuf),

    #[error("Table has no primary index")]
    NoPrimaryIndex,

    #[error("Column {column}: expected {expected}, found {found}")]
    TypeMismatch {
        column: usize,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Column index {0} out of range")]
    ColumnOutOfRange(usize),

    #[error("No current row")]
    NoCurrentRow,
}

impl ParadoxError {
    /// Build a format error from anything printable
    pub fn format(msg: impl Into<String>) -> Self {
        ParadoxError::Format(msg.into())
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ParadoxError::Io(_) => ErrorKind::Io,
            ParadoxError::Format(_) => ErrorKind::Format,
            ParadoxError::TableNotFound(_) | ParadoxError::NoPrimaryIndex => ErrorKind::NotFound,
            ParadoxError::TypeMismatch { .. }
            | ParadoxError::ColumnOutOfRange(_)
            | ParadoxError::NoCurrentRow => ErrorKind::Usage,
        }
    }
}

impl From<io::Error> for ParadoxError {
    /// A short read always means the file is truncated, so it is reported as
    /// a format error rather than a plain I/O failure.
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            ParadoxError::Format(format!("unexpected end of file: {}", err))
        } else {
            ParadoxError::Io(err)
        }
    }
}

/// Result type for Paradox operations
pub type ParadoxResult<T> = Result<T, ParadoxError>;
