//! Single-file `.chupy` container.
//!
//! Layout:
//!
//! ```text
//! 5 bytes   magic "CHUPY"
//! 3 bytes   zero padding (8-byte alignment of the magic field)
//! u16 LE    format version (currently 1)
//! u8        extension length k, 0..=15
//! 16 bytes  original extension, first k bytes used, including the dot
//! ...       prefix-coded block over the dictionary-coded payload
//! ```
//!
//! The stored extension lets decompression restore the original file
//! type when the caller does not name one.

use chupy_core::error::{ChupyError, Result};

/// Magic bytes identifying a `.chupy` file.
pub const CHUPY_MAGIC: [u8; 5] = *b"CHUPY";

/// Current format version.
pub const CHUPY_VERSION: u16 = 1;

/// Total header size in bytes.
pub const CHUPY_HEADER_SIZE: usize = 27;

/// Maximum stored extension length in bytes.
pub const MAX_EXTENSION_LEN: usize = 15;

/// `.chupy` file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChupyHeader {
    /// Format version.
    pub version: u16,
    /// Original file extension including the leading dot (may be empty).
    pub extension: String,
}

impl ChupyHeader {
    /// Create a header for the given original extension.
    ///
    /// The extension is truncated to 15 bytes on a character boundary.
    pub fn new(extension: &str) -> Self {
        let mut ext = extension;
        while ext.len() > MAX_EXTENSION_LEN {
            let mut cut = ext.len() - 1;
            while !ext.is_char_boundary(cut) {
                cut -= 1;
            }
            ext = &ext[..cut];
        }
        Self {
            version: CHUPY_VERSION,
            extension: ext.to_string(),
        }
    }

    /// Serialize the header to its fixed 27-byte form.
    pub fn to_bytes(&self) -> [u8; CHUPY_HEADER_SIZE] {
        let mut out = [0u8; CHUPY_HEADER_SIZE];
        out[..5].copy_from_slice(&CHUPY_MAGIC);
        // bytes 5..8 stay zero (alignment padding)
        out[8..10].copy_from_slice(&self.version.to_le_bytes());
        out[10] = self.extension.len() as u8;
        out[11..11 + self.extension.len()].copy_from_slice(self.extension.as_bytes());
        out
    }

    /// Parse and validate a header from the start of `data`.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < CHUPY_HEADER_SIZE {
            return Err(ChupyError::unexpected_eof(CHUPY_HEADER_SIZE - data.len()));
        }

        if data[..5] != CHUPY_MAGIC {
            return Err(ChupyError::invalid_magic(
                CHUPY_MAGIC.to_vec(),
                data[..5].to_vec(),
            ));
        }

        let version = u16::from_le_bytes([data[8], data[9]]);
        if version != CHUPY_VERSION {
            return Err(ChupyError::bad_version(version as u32));
        }

        let ext_len = data[10] as usize;
        if ext_len > MAX_EXTENSION_LEN {
            return Err(ChupyError::corrupted(
                10,
                format!("extension length {ext_len} exceeds {MAX_EXTENSION_LEN}"),
            ));
        }

        let extension = std::str::from_utf8(&data[11..11 + ext_len])
            .map_err(|_| ChupyError::corrupted(11, "extension is not valid UTF-8"))?
            .to_string();

        Ok(Self { version, extension })
    }
}

/// Compress `data` into a complete `.chupy` file.
pub fn compress(data: &[u8], extension: &str) -> Result<Vec<u8>> {
    let header = ChupyHeader::new(extension);
    let payload = chupy_deflate::compress(data)?;

    let mut out = Vec::with_capacity(CHUPY_HEADER_SIZE + payload.len());
    out.extend_from_slice(&header.to_bytes());
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Decompress a complete `.chupy` file, returning the header and the
/// original bytes.
pub fn decompress(file: &[u8]) -> Result<(ChupyHeader, Vec<u8>)> {
    let header = ChupyHeader::from_bytes(file)?;
    let data = chupy_deflate::decompress(&file[CHUPY_HEADER_SIZE..])?;
    Ok((header, data))
}
