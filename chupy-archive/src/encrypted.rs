//! Encrypted file format.
//!
//! Layout: a 12-byte nonce followed by the ciphertext, which is the
//! plaintext XORed with the ChaCha20 keystream for (key, nonce) starting
//! at block counter 0.
//!
//! The nonce comes from the OS entropy source; if that source is
//! unavailable the operation fails rather than falling back to a weaker
//! generator. There is no authentication tag: decrypting with the wrong
//! key or over tampered ciphertext silently yields garbage.

use chupy_core::error::{ChupyError, Result};
use chupy_crypto::{ChaCha20, KEY_SIZE, NONCE_SIZE};
use rand::RngCore;
use rand::rngs::OsRng;

/// Encrypt `plaintext` with a freshly generated random nonce.
pub fn encrypt(plaintext: &[u8], key: &[u8; KEY_SIZE]) -> Result<Vec<u8>> {
    let mut nonce = [0u8; NONCE_SIZE];
    OsRng
        .try_fill_bytes(&mut nonce)
        .map_err(|e| ChupyError::random_source(e.to_string()))?;
    Ok(encrypt_with_nonce(plaintext, key, &nonce))
}

/// Encrypt `plaintext` under an explicit nonce.
///
/// A nonce must never repeat for the same key; [`encrypt`] is the normal
/// entry point.
pub fn encrypt_with_nonce(
    plaintext: &[u8],
    key: &[u8; KEY_SIZE],
    nonce: &[u8; NONCE_SIZE],
) -> Vec<u8> {
    let mut out = Vec::with_capacity(NONCE_SIZE + plaintext.len());
    out.extend_from_slice(nonce);
    out.extend_from_slice(plaintext);

    let mut cipher = ChaCha20::new(*key, *nonce, 0);
    cipher.apply_keystream(&mut out[NONCE_SIZE..]);
    out
}

/// Decrypt a nonce-prefixed ciphertext.
pub fn decrypt(file: &[u8], key: &[u8; KEY_SIZE]) -> Result<Vec<u8>> {
    if file.len() < NONCE_SIZE {
        return Err(ChupyError::unexpected_eof(NONCE_SIZE - file.len()));
    }

    let mut nonce = [0u8; NONCE_SIZE];
    nonce.copy_from_slice(&file[..NONCE_SIZE]);

    let mut out = file[NONCE_SIZE..].to_vec();
    let mut cipher = ChaCha20::new(*key, nonce, 0);
    cipher.apply_keystream(&mut out);
    Ok(out)
}
