//! LZ77 dictionary coding.
//!
//! The dictionary stage scans the input through a 32 KiB sliding window
//! and replaces repeated sequences with back-references (length, distance
//! pairs). Matching is greedy: at each position the longest match wins,
//! and ties break toward the smallest distance, so output is fully
//! deterministic.
//!
//! # Token wire format
//!
//! Tokens serialize to a compact byte stream:
//!
//! - `0x00..=0x7F`: literal, the byte represents itself
//! - `0xFF b`: escaped literal `b` (for bytes >= 0x80)
//! - `0x80 len dist`: match; `len` is one byte when < 255, otherwise
//!   `0xFF` followed by a 16-bit little-endian length; `dist` is a
//!   16-bit little-endian distance
//!
//! A match may reach past the point where it starts producing output
//! (length > distance); the decoder copies one byte at a time so these
//! self-overlapping runs expand correctly.

use chupy_core::error::{ChupyError, Result};
use rayon::prelude::*;

/// Sliding window capacity (32 KiB, the DEFLATE standard).
pub const WINDOW_SIZE: usize = 32768;

/// Minimum useful match length.
pub const MIN_MATCH: usize = 3;

/// Maximum match length.
pub const MAX_MATCH: usize = 258;

/// Candidate-list size above which the match search goes parallel.
const PARALLEL_THRESHOLD: usize = 512;

/// Token marker for a back-reference.
const MARKER_MATCH: u8 = 0x80;

/// Token marker for an escaped literal.
const MARKER_ESCAPE: u8 = 0xFF;

/// A token produced by the dictionary coder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lz77Token {
    /// A literal byte.
    Literal(u8),
    /// A back-reference to previously emitted data.
    Match {
        /// Number of bytes to copy (3-258).
        length: u16,
        /// Distance back from the current output end (1-32768).
        distance: u16,
    },
}

/// LZ77 encoder.
///
/// Keeps per-byte occurrence lists so the window scan only visits
/// positions whose first byte already matches; the scan itself is exact
/// over those candidates, so the occurrence index never changes which
/// match is chosen.
#[derive(Debug)]
pub struct Lz77Encoder {
    /// Positions of each byte value seen so far, ascending.
    occurrences: Vec<Vec<u32>>,
}

impl Lz77Encoder {
    /// Create a new encoder.
    pub fn new() -> Self {
        Self {
            occurrences: vec![Vec::new(); 256],
        }
    }

    /// Record that `pos` holds byte `byte`.
    #[inline]
    fn record(&mut self, byte: u8, pos: usize) {
        self.occurrences[byte as usize].push(pos as u32);
    }

    /// Length of the common prefix of `input[a..]` and `input[cursor..]`,
    /// capped at `max_len`. `a < cursor`, and the comparison may run past
    /// `cursor`, which is what makes self-overlapping matches work.
    #[inline]
    fn match_length(input: &[u8], a: usize, cursor: usize, max_len: usize) -> usize {
        let mut len = 0;
        while len < max_len && input[a + len] == input[cursor + len] {
            len += 1;
        }
        len
    }

    /// Pick the better of two (length, distance) candidates: greatest
    /// length, ties to the smallest distance.
    #[inline]
    fn better(a: (usize, usize), b: (usize, usize)) -> (usize, usize) {
        if b.0 > a.0 || (b.0 == a.0 && b.0 > 0 && b.1 < a.1) {
            b
        } else {
            a
        }
    }

    /// Find the longest match for the lookahead at `cursor`.
    ///
    /// Returns (length, distance), (0, 0) when the window holds no match.
    /// The candidate scan is a reduction with a deterministic merge rule,
    /// so the parallel and serial paths produce identical results.
    fn find_longest_match(&self, input: &[u8], cursor: usize) -> (usize, usize) {
        let max_len = MAX_MATCH.min(input.len() - cursor);
        if max_len < MIN_MATCH {
            return (0, 0);
        }

        let window_start = cursor.saturating_sub(WINDOW_SIZE);
        let positions = &self.occurrences[input[cursor] as usize];
        let first_live = positions.partition_point(|&p| (p as usize) < window_start);
        let candidates = &positions[first_live..];
        if candidates.is_empty() {
            return (0, 0);
        }

        // The most recent candidate has the smallest distance; if it
        // already reaches max_len nothing can beat it.
        let nearest = *candidates.last().unwrap() as usize;
        let nearest_len = Self::match_length(input, nearest, cursor, max_len);
        if nearest_len == max_len {
            return (nearest_len, cursor - nearest);
        }

        let best = if candidates.len() >= PARALLEL_THRESHOLD {
            candidates
                .par_iter()
                .map(|&p| {
                    let p = p as usize;
                    (Self::match_length(input, p, cursor, max_len), cursor - p)
                })
                .reduce(|| (0, 0), Self::better)
        } else {
            candidates.iter().fold((0, 0), |acc, &p| {
                let p = p as usize;
                Self::better(acc, (Self::match_length(input, p, cursor, max_len), cursor - p))
            })
        };

        Self::better(best, (nearest_len, cursor - nearest))
    }

    /// Run the greedy coder over the whole input.
    ///
    /// Window state is per call: any positions recorded by a previous
    /// run are discarded first.
    pub fn tokenize(&mut self, input: &[u8]) -> Vec<Lz77Token> {
        for positions in &mut self.occurrences {
            positions.clear();
        }

        let mut tokens = Vec::new();
        let mut cursor = 0;

        while cursor < input.len() {
            let (length, distance) = self.find_longest_match(input, cursor);

            if length >= MIN_MATCH {
                tokens.push(Lz77Token::Match {
                    length: length as u16,
                    distance: distance as u16,
                });
                for i in 0..length {
                    self.record(input[cursor + i], cursor + i);
                }
                cursor += length;
            } else {
                tokens.push(Lz77Token::Literal(input[cursor]));
                self.record(input[cursor], cursor);
                cursor += 1;
            }
        }

        tokens
    }
}

impl Default for Lz77Encoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Serialize tokens to the byte wire format.
pub fn serialize_tokens(tokens: &[Lz77Token]) -> Vec<u8> {
    let mut out = Vec::with_capacity(tokens.len() * 2);

    for token in tokens {
        match *token {
            Lz77Token::Literal(byte) => {
                if byte < MARKER_MATCH {
                    out.push(byte);
                } else {
                    out.push(MARKER_ESCAPE);
                    out.push(byte);
                }
            }
            Lz77Token::Match { length, distance } => {
                out.push(MARKER_MATCH);
                if length < 255 {
                    out.push(length as u8);
                } else {
                    out.push(0xFF);
                    out.extend_from_slice(&length.to_le_bytes());
                }
                out.extend_from_slice(&distance.to_le_bytes());
            }
        }
    }

    out
}

/// Compress `input` to the dictionary-coded byte stream.
pub fn encode(input: &[u8]) -> Vec<u8> {
    let mut encoder = Lz77Encoder::new();
    let tokens = encoder.tokenize(input);
    serialize_tokens(&tokens)
}

/// Expand a dictionary-coded byte stream back to the original bytes.
pub fn decode(input: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(input.len() * 2);
    let mut pos = 0;

    while pos < input.len() {
        let marker = input[pos];
        pos += 1;

        match marker {
            0x00..=0x7F => out.push(marker),
            MARKER_ESCAPE => {
                let byte = *input
                    .get(pos)
                    .ok_or_else(|| ChupyError::unexpected_eof(1))?;
                pos += 1;
                out.push(byte);
            }
            MARKER_MATCH => {
                let len_byte = *input
                    .get(pos)
                    .ok_or_else(|| ChupyError::unexpected_eof(1))?;
                pos += 1;

                let length = if len_byte < 255 {
                    len_byte as usize
                } else {
                    let bytes = input
                        .get(pos..pos + 2)
                        .ok_or_else(|| ChupyError::unexpected_eof(2))?;
                    pos += 2;
                    u16::from_le_bytes([bytes[0], bytes[1]]) as usize
                };

                let bytes = input
                    .get(pos..pos + 2)
                    .ok_or_else(|| ChupyError::unexpected_eof(2))?;
                pos += 2;
                let distance = u16::from_le_bytes([bytes[0], bytes[1]]) as usize;

                if length == 0 {
                    return Err(ChupyError::corrupted(
                        (pos - 1) as u64,
                        "zero-length back-reference",
                    ));
                }
                if distance == 0 || distance > out.len() {
                    return Err(ChupyError::invalid_distance(distance, out.len()));
                }

                // Byte-at-a-time so self-overlapping copies expand correctly.
                let start = out.len() - distance;
                for i in 0..length {
                    let byte = out[start + i];
                    out.push(byte);
                }
            }
            _ => {
                return Err(ChupyError::corrupted(
                    (pos - 1) as u64,
                    format!("unknown token marker {marker:#04x}"),
                ));
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(input: &[u8]) -> Vec<u8> {
        decode(&encode(input)).unwrap()
    }

    #[test]
    fn test_empty_input() {
        assert!(encode(b"").is_empty());
        assert!(decode(b"").unwrap().is_empty());
    }

    #[test]
    fn test_single_byte() {
        let mut encoder = Lz77Encoder::new();
        let tokens = encoder.tokenize(b"x");
        assert_eq!(tokens, vec![Lz77Token::Literal(b'x')]);
        assert_eq!(roundtrip(b"x"), b"x");
    }

    #[test]
    fn test_literals_only() {
        let input = b"abcdefgh";
        let mut encoder = Lz77Encoder::new();
        let tokens = encoder.tokenize(input);
        assert!(tokens.iter().all(|t| matches!(t, Lz77Token::Literal(_))));
        assert_eq!(tokens.len(), 8);
    }

    #[test]
    fn test_abracadabra() {
        let input = b"ABRACADABRA";
        let mut encoder = Lz77Encoder::new();
        let tokens = encoder.tokenize(input);

        // The trailing "ABRA" repeats the head, so a match of length >= 3
        // must appear.
        let has_match = tokens
            .iter()
            .any(|t| matches!(t, Lz77Token::Match { length, .. } if *length >= 3));
        assert!(has_match, "expected a match for the repeated ABRA");

        assert_eq!(roundtrip(input), input);
    }

    #[test]
    fn test_nearest_distance_wins_ties() {
        // "abcXabcYabc": the final "abc" matches at distance 4 and 8;
        // the tie must resolve to distance 4.
        let input = b"abcXabcYabc";
        let mut encoder = Lz77Encoder::new();
        let tokens = encoder.tokenize(input);

        let last = tokens.last().unwrap();
        assert_eq!(
            *last,
            Lz77Token::Match {
                length: 3,
                distance: 4
            }
        );
    }

    #[test]
    fn test_self_overlapping_run() {
        // 4096 identical bytes: one literal, then matches covering the
        // remaining 4095 bytes by copying from one byte back.
        let input = vec![0x41u8; 4096];
        let mut encoder = Lz77Encoder::new();
        let tokens = encoder.tokenize(&input);

        assert_eq!(tokens[0], Lz77Token::Literal(0x41));
        let match_total: usize = tokens[1..]
            .iter()
            .map(|t| match t {
                Lz77Token::Literal(_) => panic!("run should compress to matches"),
                Lz77Token::Match { length, .. } => *length as usize,
            })
            .sum();
        assert_eq!(match_total, 4095);

        assert_eq!(roundtrip(&input), input);
    }

    #[test]
    fn test_encoder_reuse() {
        let mut encoder = Lz77Encoder::new();
        let first = encoder.tokenize(b"ABRACADABRA");
        let second = encoder.tokenize(b"ABRACADABRA");
        assert_eq!(first, second);
    }

    #[test]
    fn test_long_run_roundtrip() {
        let input = vec![0xEEu8; 1024];
        assert_eq!(roundtrip(&input), input);
    }

    #[test]
    fn test_escaped_literals() {
        let input: Vec<u8> = (0..=255u8).collect();
        assert_eq!(roundtrip(&input), input);
    }

    #[test]
    fn test_window_eviction() {
        // Input longer than the window; the repeated head sits outside
        // the window by the time the tail is coded, so the coder must not
        // reference it.
        let mut input = Vec::new();
        let mut seed = 0x2545F491u32;
        for _ in 0..(WINDOW_SIZE + 8192) {
            seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
            input.push((seed >> 16) as u8);
        }
        assert_eq!(roundtrip(&input), input);
    }

    #[test]
    fn test_max_match_length_cap() {
        // A run much longer than MAX_MATCH forces length-capped matches.
        let input = vec![b'z'; MAX_MATCH * 3 + 7];
        let mut encoder = Lz77Encoder::new();
        let tokens = encoder.tokenize(&input);
        for t in &tokens {
            if let Lz77Token::Match { length, .. } = t {
                assert!(*length as usize <= MAX_MATCH);
            }
        }
        assert_eq!(roundtrip(&input), input);
    }

    #[test]
    fn test_decode_rejects_zero_distance() {
        // 0x80, length 3, distance 0
        let data = [0x80, 0x03, 0x00, 0x00];
        let err = decode(&data).unwrap_err();
        assert!(matches!(err, ChupyError::InvalidDistance { .. }));
    }

    #[test]
    fn test_decode_rejects_distance_past_output() {
        // One literal, then a match reaching back 2 bytes.
        let data = [b'a', 0x80, 0x03, 0x02, 0x00];
        let err = decode(&data).unwrap_err();
        assert!(matches!(err, ChupyError::InvalidDistance { .. }));
    }

    #[test]
    fn test_decode_rejects_zero_length() {
        let data = [b'a', 0x80, 0x00, 0x01, 0x00];
        let err = decode(&data).unwrap_err();
        assert!(matches!(err, ChupyError::CorruptedData { .. }));
    }

    #[test]
    fn test_decode_rejects_unknown_marker() {
        let data = [0x90];
        let err = decode(&data).unwrap_err();
        assert!(matches!(err, ChupyError::CorruptedData { .. }));
    }

    #[test]
    fn test_decode_truncated_match() {
        let data = [b'a', 0x80, 0x03, 0x01];
        let err = decode(&data).unwrap_err();
        assert!(matches!(err, ChupyError::UnexpectedEof { .. }));
    }

    #[test]
    fn test_long_match_wire_format() {
        // Lengths >= 255 use the escaped 16-bit form.
        let tokens = vec![
            Lz77Token::Literal(b'q'),
            Lz77Token::Match {
                length: 258,
                distance: 1,
            },
        ];
        let bytes = serialize_tokens(&tokens);
        assert_eq!(bytes, vec![b'q', 0x80, 0xFF, 0x02, 0x01, 0x01, 0x00]);

        let out = decode(&bytes).unwrap();
        assert_eq!(out, vec![b'q'; 259]);
    }
}
