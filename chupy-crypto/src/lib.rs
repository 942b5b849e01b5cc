//! # Chupy Crypto
//!
//! Cryptographic primitives for the chupy archiver:
//!
//! - [`chacha20`]: the ChaCha20 stream cipher (RFC 7539 variant with a
//!   32-bit block counter and 96-bit nonce)
//! - [`sha256`]: SHA-256, used solely to derive a cipher key from a
//!   password
//!
//! The cipher is unauthenticated by construction: decrypting with the
//! wrong key silently yields garbage. Callers that need integrity must
//! layer it themselves.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod chacha20;
pub mod sha256;

// Re-exports
pub use chacha20::{BLOCK_SIZE, ChaCha20, KEY_SIZE, NONCE_SIZE, chacha20_block};
pub use sha256::{Sha256, derive_key, sha256};
