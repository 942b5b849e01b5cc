//! Multi-file `.chupydir` archive.
//!
//! Layout:
//!
//! ```text
//! 8 bytes   magic "CHUPYDIR"
//! u32 LE    format version (currently 1)
//! u32 LE    file count
//! u64 LE    total uncompressed size
//! u64 LE    metadata block size
//! ...       metadata block (one record per file)
//! ...       prefix-coded block over the dictionary-coded concatenation
//! ```
//!
//! Each metadata record: u16 LE path length, UTF-8 path bytes (relative,
//! forward slashes), u64 LE offset into the concatenated plaintext,
//! u64 LE file size. Extraction slices the decompressed buffer at each
//! entry's (offset, size).

use chupy_core::error::{ChupyError, Result};

/// Magic bytes identifying a `.chupydir` archive.
pub const CHUPYDIR_MAGIC: [u8; 8] = *b"CHUPYDIR";

/// Current format version.
pub const CHUPYDIR_VERSION: u32 = 1;

/// Total header size in bytes.
pub const CHUPYDIR_HEADER_SIZE: usize = 32;

/// `.chupydir` archive header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChupyDirHeader {
    /// Format version.
    pub version: u32,
    /// Number of files in the archive.
    pub file_count: u32,
    /// Total size of the concatenated plaintext.
    pub total_uncompressed: u64,
    /// Size of the serialized metadata block.
    pub metadata_size: u64,
}

impl ChupyDirHeader {
    /// Serialize the header to its fixed 32-byte form.
    pub fn to_bytes(&self) -> [u8; CHUPYDIR_HEADER_SIZE] {
        let mut out = [0u8; CHUPYDIR_HEADER_SIZE];
        out[..8].copy_from_slice(&CHUPYDIR_MAGIC);
        out[8..12].copy_from_slice(&self.version.to_le_bytes());
        out[12..16].copy_from_slice(&self.file_count.to_le_bytes());
        out[16..24].copy_from_slice(&self.total_uncompressed.to_le_bytes());
        out[24..32].copy_from_slice(&self.metadata_size.to_le_bytes());
        out
    }

    /// Parse and validate a header from the start of `data`.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < CHUPYDIR_HEADER_SIZE {
            return Err(ChupyError::unexpected_eof(CHUPYDIR_HEADER_SIZE - data.len()));
        }

        if data[..8] != CHUPYDIR_MAGIC {
            return Err(ChupyError::invalid_magic(
                CHUPYDIR_MAGIC.to_vec(),
                data[..8].to_vec(),
            ));
        }

        let version = u32::from_le_bytes([data[8], data[9], data[10], data[11]]);
        if version != CHUPYDIR_VERSION {
            return Err(ChupyError::bad_version(version));
        }

        Ok(Self {
            version,
            file_count: u32::from_le_bytes([data[12], data[13], data[14], data[15]]),
            total_uncompressed: u64::from_le_bytes(data[16..24].try_into().unwrap()),
            metadata_size: u64::from_le_bytes(data[24..32].try_into().unwrap()),
        })
    }
}

/// Metadata for one archived file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Relative path, forward slashes, UTF-8.
    pub path: String,
    /// Byte offset into the concatenated plaintext.
    pub offset: u64,
    /// File size in bytes.
    pub size: u64,
}

/// Serialize the metadata block.
fn serialize_metadata(entries: &[FileEntry]) -> Vec<u8> {
    let mut out = Vec::new();
    for entry in entries {
        let path_bytes = entry.path.as_bytes();
        out.extend_from_slice(&(path_bytes.len() as u16).to_le_bytes());
        out.extend_from_slice(path_bytes);
        out.extend_from_slice(&entry.offset.to_le_bytes());
        out.extend_from_slice(&entry.size.to_le_bytes());
    }
    out
}

/// Parse the metadata block; it must hold exactly `count` records.
fn deserialize_metadata(data: &[u8], count: usize) -> Result<Vec<FileEntry>> {
    let mut entries = Vec::with_capacity(count.min(1 << 16));
    let mut pos = 0usize;

    while pos < data.len() {
        let len_bytes = data
            .get(pos..pos + 2)
            .ok_or_else(|| ChupyError::corrupted(pos as u64, "truncated path length"))?;
        let path_len = u16::from_le_bytes([len_bytes[0], len_bytes[1]]) as usize;
        pos += 2;

        let path_bytes = data
            .get(pos..pos + path_len)
            .ok_or_else(|| ChupyError::corrupted(pos as u64, "truncated path"))?;
        let path = std::str::from_utf8(path_bytes)
            .map_err(|_| ChupyError::corrupted(pos as u64, "path is not valid UTF-8"))?
            .to_string();
        pos += path_len;

        let rest = data
            .get(pos..pos + 16)
            .ok_or_else(|| ChupyError::corrupted(pos as u64, "truncated entry record"))?;
        let offset = u64::from_le_bytes(rest[..8].try_into().unwrap());
        let size = u64::from_le_bytes(rest[8..].try_into().unwrap());
        pos += 16;

        entries.push(FileEntry { path, offset, size });
    }

    if entries.len() != count {
        return Err(ChupyError::corrupted(
            0,
            format!("metadata holds {} entries, header says {count}", entries.len()),
        ));
    }

    Ok(entries)
}

/// Build a `.chupydir` archive from (path, contents) pairs.
///
/// Contents are concatenated into one plaintext buffer so the dictionary
/// coder can match across file boundaries; the metadata table records
/// where each file lives in that buffer.
pub fn pack_files(files: &[(String, Vec<u8>)]) -> Result<Vec<u8>> {
    let mut entries = Vec::with_capacity(files.len());
    let mut plaintext = Vec::new();

    for (path, contents) in files {
        entries.push(FileEntry {
            path: path.clone(),
            offset: plaintext.len() as u64,
            size: contents.len() as u64,
        });
        plaintext.extend_from_slice(contents);
    }

    let metadata = serialize_metadata(&entries);
    let payload = chupy_deflate::compress(&plaintext)?;

    let header = ChupyDirHeader {
        version: CHUPYDIR_VERSION,
        file_count: entries.len() as u32,
        total_uncompressed: plaintext.len() as u64,
        metadata_size: metadata.len() as u64,
    };

    let mut out = Vec::with_capacity(CHUPYDIR_HEADER_SIZE + metadata.len() + payload.len());
    out.extend_from_slice(&header.to_bytes());
    out.extend_from_slice(&metadata);
    out.extend_from_slice(&payload);
    Ok(out)
}

/// A parsed and decompressed `.chupydir` archive.
#[derive(Debug)]
pub struct ChupyDirArchive {
    entries: Vec<FileEntry>,
    plaintext: Vec<u8>,
}

impl ChupyDirArchive {
    /// Parse, validate, and decompress a `.chupydir` archive.
    pub fn read(file: &[u8]) -> Result<Self> {
        let header = ChupyDirHeader::from_bytes(file)?;

        let metadata_end = CHUPYDIR_HEADER_SIZE
            .checked_add(header.metadata_size as usize)
            .filter(|&end| end <= file.len())
            .ok_or_else(|| {
                ChupyError::corrupted(CHUPYDIR_HEADER_SIZE as u64, "metadata extends past file")
            })?;

        let entries = deserialize_metadata(
            &file[CHUPYDIR_HEADER_SIZE..metadata_end],
            header.file_count as usize,
        )?;

        let plaintext = chupy_deflate::decompress(&file[metadata_end..])?;
        if plaintext.len() as u64 != header.total_uncompressed {
            return Err(ChupyError::corrupted(
                metadata_end as u64,
                format!(
                    "decompressed size {} does not match header {}",
                    plaintext.len(),
                    header.total_uncompressed
                ),
            ));
        }

        for entry in &entries {
            let end = entry.offset.checked_add(entry.size);
            if end.is_none() || end.unwrap() > plaintext.len() as u64 {
                return Err(ChupyError::corrupted(
                    0,
                    format!("entry '{}' extends past the plaintext buffer", entry.path),
                ));
            }
        }

        Ok(Self { entries, plaintext })
    }

    /// The archive's file entries, in archive order.
    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    /// The contents of one entry.
    pub fn file_data(&self, entry: &FileEntry) -> &[u8] {
        &self.plaintext[entry.offset as usize..(entry.offset + entry.size) as usize]
    }

    /// Iterate over (path, contents) pairs.
    pub fn files(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.entries
            .iter()
            .map(|e| (e.path.as_str(), self.file_data(e)))
    }
}
