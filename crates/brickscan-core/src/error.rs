//! Error types for the brickscan-core library.
//!
//! This module provides error handling using the `thiserror` crate. Only
//! [`Error::NoCandidateFound`] is meant to reach callers of the extraction
//! functions; the other read failures are absorbed by the scanner.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for brickscan operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for all brickscan operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Failed to read input file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        /// Path to the file that failed to read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A read would run past the end of the byte stream
    #[error("read of {len} bytes at offset {offset} exceeds stream of {available} bytes")]
    OutOfBounds {
        /// Byte offset where the read started
        offset: usize,
        /// Number of bytes requested
        len: usize,
        /// Length of the byte stream
        available: usize,
    },

    /// No scan pass produced a complete candidate array
    #[error("no record array candidate found in input")]
    NoCandidateFound,
}

impl Error {
    /// Creates a new file read error
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Creates a new out-of-bounds read error
    pub fn out_of_bounds(offset: usize, len: usize, available: usize) -> Self {
        Self::OutOfBounds {
            offset,
            len,
            available,
        }
    }
}
