//! ChaCha20 stream cipher.
//!
//! A counter-mode stream cipher: each 64-byte keystream block is a pure
//! function of (key, nonce, block counter), produced by a 20-round ARX
//! permutation over a 16-word state. Encryption and decryption are the
//! same XOR.
//!
//! Block independence is what makes the streaming driver simple: block
//! *i* of a call always uses counter `base + i`, and the context counter
//! advances by the number of blocks touched (a trailing partial block
//! included). Splitting an input across calls at 64-byte boundaries
//! therefore produces identical ciphertext.

use rayon::prelude::*;

/// Key size in bytes (256 bits).
pub const KEY_SIZE: usize = 32;

/// Nonce size in bytes (96 bits).
pub const NONCE_SIZE: usize = 12;

/// Keystream block size in bytes.
pub const BLOCK_SIZE: usize = 64;

/// Input size above which block generation goes parallel.
const PARALLEL_THRESHOLD: usize = 64 * 1024;

/// State constants: "expand 32-byte k" as little-endian words.
const CONSTANTS: [u32; 4] = [0x61707865, 0x3320646e, 0x79622d32, 0x6b206574];

/// The ChaCha20 quarter round over four state words.
#[inline(always)]
fn quarter_round(state: &mut [u32; 16], a: usize, b: usize, c: usize, d: usize) {
    state[a] = state[a].wrapping_add(state[b]);
    state[d] ^= state[a];
    state[d] = state[d].rotate_left(16);

    state[c] = state[c].wrapping_add(state[d]);
    state[b] ^= state[c];
    state[b] = state[b].rotate_left(12);

    state[a] = state[a].wrapping_add(state[b]);
    state[d] ^= state[a];
    state[d] = state[d].rotate_left(8);

    state[c] = state[c].wrapping_add(state[d]);
    state[b] ^= state[c];
    state[b] = state[b].rotate_left(7);
}

/// Build the initial 16-word state for one block.
#[inline]
fn init_state(key: &[u8; KEY_SIZE], nonce: &[u8; NONCE_SIZE], counter: u32) -> [u32; 16] {
    let mut state = [0u32; 16];
    state[..4].copy_from_slice(&CONSTANTS);
    for i in 0..8 {
        state[4 + i] = u32::from_le_bytes([
            key[4 * i],
            key[4 * i + 1],
            key[4 * i + 2],
            key[4 * i + 3],
        ]);
    }
    state[12] = counter;
    for i in 0..3 {
        state[13 + i] = u32::from_le_bytes([
            nonce[4 * i],
            nonce[4 * i + 1],
            nonce[4 * i + 2],
            nonce[4 * i + 3],
        ]);
    }
    state
}

/// Generate one 64-byte keystream block.
///
/// Pure in (key, nonce, counter): ten double rounds (four column quarter
/// rounds, four diagonal quarter rounds), then a wordwise add of the
/// initial state, serialized little-endian.
pub fn chacha20_block(
    key: &[u8; KEY_SIZE],
    nonce: &[u8; NONCE_SIZE],
    counter: u32,
) -> [u8; BLOCK_SIZE] {
    let initial = init_state(key, nonce, counter);
    let mut state = initial;

    for _ in 0..10 {
        // columns
        quarter_round(&mut state, 0, 4, 8, 12);
        quarter_round(&mut state, 1, 5, 9, 13);
        quarter_round(&mut state, 2, 6, 10, 14);
        quarter_round(&mut state, 3, 7, 11, 15);
        // diagonals
        quarter_round(&mut state, 0, 5, 10, 15);
        quarter_round(&mut state, 1, 6, 11, 12);
        quarter_round(&mut state, 2, 7, 8, 13);
        quarter_round(&mut state, 3, 4, 9, 14);
    }

    let mut output = [0u8; BLOCK_SIZE];
    for i in 0..16 {
        let word = state[i].wrapping_add(initial[i]);
        output[4 * i..4 * i + 4].copy_from_slice(&word.to_le_bytes());
    }
    output
}

/// A streaming cipher context.
///
/// The counter is strictly monotonic per (key, nonce) pair: every call
/// to [`ChaCha20::apply_keystream`] advances it by the number of blocks
/// it touched. Key material is wiped when the context drops.
#[derive(Debug)]
pub struct ChaCha20 {
    key: [u8; KEY_SIZE],
    nonce: [u8; NONCE_SIZE],
    counter: u32,
}

impl ChaCha20 {
    /// Create a context starting at the given block counter.
    pub fn new(key: [u8; KEY_SIZE], nonce: [u8; NONCE_SIZE], counter: u32) -> Self {
        Self {
            key,
            nonce,
            counter,
        }
    }

    /// The current block counter.
    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// XOR the keystream into `data` in place.
    ///
    /// Block *i* of `data` uses counter `base + i`; a trailing partial
    /// block consumes only its first bytes of keystream but still counts
    /// as one block when the counter advances. Blocks are independent,
    /// so generation runs in parallel for large inputs without changing
    /// a single output byte.
    pub fn apply_keystream(&mut self, data: &mut [u8]) {
        if data.is_empty() {
            return;
        }

        let base = self.counter;
        let key = self.key;
        let nonce = self.nonce;

        let xor_block = |(i, chunk): (usize, &mut [u8])| {
            let keystream = chacha20_block(&key, &nonce, base.wrapping_add(i as u32));
            for (byte, ks) in chunk.iter_mut().zip(keystream.iter()) {
                *byte ^= ks;
            }
        };

        if data.len() >= PARALLEL_THRESHOLD {
            data.par_chunks_mut(BLOCK_SIZE).enumerate().for_each(xor_block);
        } else {
            data.chunks_mut(BLOCK_SIZE).enumerate().for_each(xor_block);
        }

        let blocks = data.len().div_ceil(BLOCK_SIZE) as u32;
        self.counter = self.counter.wrapping_add(blocks);
    }
}

impl Drop for ChaCha20 {
    fn drop(&mut self) {
        self.key.fill(0);
    }
}
