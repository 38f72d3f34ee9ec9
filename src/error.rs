// Error Module - Typed failures for the parameter and mode stores
use std::path::PathBuf;
use thiserror::Error;

/// Errors from reading or writing the on-disk state files.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{} does not exist", path.display())]
    Missing { path: PathBuf },

    #[error("{} has {found} lines, expected at least 6", path.display())]
    ShortFile { path: PathBuf, found: usize },

    #[error("{} line {line} ({field}): '{value}' is not a number", path.display())]
    BadValue {
        path: PathBuf,
        line: usize,
        field: &'static str,
        value: String,
    },

    #[error("unknown mode '{0}'")]
    UnknownMode(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    /// Wrap an I/O error, turning `NotFound` into `Missing`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            StoreError::Missing { path }
        } else {
            StoreError::Io { path, source }
        }
    }
}

/// Rejections for a submitted parameter set.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("{field} = {value} is out of range (0..={max})")]
    OutOfRange {
        field: &'static str,
        value: u16,
        max: u16,
    },

    #[error("{min_field} ({min}) is greater than {max_field} ({max})")]
    Inverted {
        min_field: &'static str,
        min: u16,
        max_field: &'static str,
        max: u16,
    },
}
