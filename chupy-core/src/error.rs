//! Error types for chupy operations.
//!
//! This module provides a single error type covering every failure mode in
//! the pipeline: I/O errors, container validation errors, codec errors, and
//! argument validation errors surfaced by the CLI.

use std::io;
use thiserror::Error;

/// The main error type for chupy operations.
#[derive(Debug, Error)]
pub enum ChupyError {
    /// I/O error from underlying reader/writer.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid parameter combination.
    #[error("Invalid arguments: {message}")]
    InvalidArgs {
        /// Description of the invalid combination.
        message: String,
    },

    /// Invalid magic number in a container header.
    #[error("Invalid magic number: expected {expected:02x?}, found {found:02x?}")]
    InvalidMagic {
        /// Expected magic bytes.
        expected: Vec<u8>,
        /// Actual magic bytes found.
        found: Vec<u8>,
    },

    /// Container format version is not supported.
    #[error("Unsupported format version: {found}")]
    BadVersion {
        /// The version number found in the header.
        found: u32,
    },

    /// Unexpected end of input.
    #[error("Unexpected end of input: expected {expected} more bytes")]
    UnexpectedEof {
        /// Number of bytes that were expected but not available.
        expected: usize,
    },

    /// Corrupted data in a compressed stream or container.
    #[error("Corrupted data at offset {offset}: {message}")]
    CorruptedData {
        /// Byte offset where corruption was detected.
        offset: u64,
        /// Description of the corruption.
        message: String,
    },

    /// Invalid distance in a dictionary back-reference.
    #[error("Invalid back-reference distance: {distance} exceeds output size {history_size}")]
    InvalidDistance {
        /// The invalid distance value.
        distance: usize,
        /// Bytes produced so far.
        history_size: usize,
    },

    /// Encoder received a symbol outside the declared alphabet.
    #[error("Symbol {symbol} out of range for alphabet of size {alphabet_size}")]
    SymbolOutOfRange {
        /// The offending symbol value.
        symbol: u16,
        /// Declared alphabet size.
        alphabet_size: u16,
    },

    /// Algorithm selector not in the accepted set.
    #[error("Unsupported algorithm: {name}")]
    UnsupportedAlgorithm {
        /// The requested algorithm name.
        name: String,
    },

    /// The OS entropy source failed.
    #[error("Random source unavailable: {message}")]
    RandomSource {
        /// Description of the failure.
        message: String,
    },
}

/// Result type alias for chupy operations.
pub type Result<T> = std::result::Result<T, ChupyError>;

impl ChupyError {
    /// Create an invalid arguments error.
    pub fn invalid_args(message: impl Into<String>) -> Self {
        Self::InvalidArgs {
            message: message.into(),
        }
    }

    /// Create an invalid magic error.
    pub fn invalid_magic(expected: impl Into<Vec<u8>>, found: impl Into<Vec<u8>>) -> Self {
        Self::InvalidMagic {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create a bad version error.
    pub fn bad_version(found: u32) -> Self {
        Self::BadVersion { found }
    }

    /// Create an unexpected EOF error.
    pub fn unexpected_eof(expected: usize) -> Self {
        Self::UnexpectedEof { expected }
    }

    /// Create a corrupted data error.
    pub fn corrupted(offset: u64, message: impl Into<String>) -> Self {
        Self::CorruptedData {
            offset,
            message: message.into(),
        }
    }

    /// Create an invalid distance error.
    pub fn invalid_distance(distance: usize, history_size: usize) -> Self {
        Self::InvalidDistance {
            distance,
            history_size,
        }
    }

    /// Create a symbol out of range error.
    pub fn symbol_out_of_range(symbol: u16, alphabet_size: u16) -> Self {
        Self::SymbolOutOfRange {
            symbol,
            alphabet_size,
        }
    }

    /// Create an unsupported algorithm error.
    pub fn unsupported_algorithm(name: impl Into<String>) -> Self {
        Self::UnsupportedAlgorithm { name: name.into() }
    }

    /// Create a random source error.
    pub fn random_source(message: impl Into<String>) -> Self {
        Self::RandomSource {
            message: message.into(),
        }
    }
}
