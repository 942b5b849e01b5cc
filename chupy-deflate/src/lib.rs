//! # Chupy Deflate
//!
//! The compression pipeline of the chupy archiver: an LZ77 dictionary
//! stage chained with a length-limited canonical Huffman entropy stage.
//!
//! The dictionary stage turns raw bytes into a stream of literal and
//! back-reference tokens over a 32 KiB sliding window; the entropy stage
//! treats the serialized token bytes as symbols over a 256-entry alphabet
//! and packs them into a self-describing prefix-coded block.
//!
//! ## Example
//!
//! ```rust
//! use chupy_deflate::{compress, decompress};
//!
//! let original = b"Hello, World! Hello, World!";
//! let compressed = compress(original).unwrap();
//! let decompressed = decompress(&compressed).unwrap();
//! assert_eq!(&decompressed, original);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod huffman;
pub mod lz77;

// Re-exports
pub use huffman::{CanonicalCode, MAX_CODE_LENGTH, build_code_lengths};
pub use lz77::{Lz77Encoder, Lz77Token, MAX_MATCH, MIN_MATCH, WINDOW_SIZE};

use chupy_core::error::Result;

/// Compress raw bytes: dictionary stage, then entropy stage.
pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
    let dict_stream = lz77::encode(data);
    huffman::encode_block(&dict_stream, huffman::BYTE_ALPHABET, MAX_CODE_LENGTH)
}

/// Reverse [`compress`]: entropy stage, then dictionary stage.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let dict_stream = huffman::decode_block(data)?;
    lz77::decode(&dict_stream)
}
