//! bcrypt-pbkdf, the key derivation function of OpenSSH private key files.
//!
//! A PBKDF2-like construction where the pseudo random function is a
//! bcrypt-style hash of SHA-512 digests. The output is striped across the
//! blocks so that every requested byte depends on all rounds of every block.

use blowfish::Blowfish;
use sha2::{Digest, Sha512};
use tracing::trace;
use zeroize::{Zeroize, Zeroizing};

pub mod error;

pub use error::{Error, Result};

const BHASH_WORDS: usize = 8;
const BHASH_OUTPUT_SIZE: usize = BHASH_WORDS * 4;
const BHASH_SEED: &[u8; BHASH_OUTPUT_SIZE] = b"OxychromaticBlowfishSwatDynamite";

pub const MAX_SALT_LEN: usize = 1 << 20;
pub const MAX_KEY_LEN: usize = 1024;

/// Derives `key_len` bytes from `password` and `salt`.
///
/// OpenSSH splits the result into the cipher key followed by the IV.
pub fn derive(password: &[u8], salt: &[u8], rounds: u32, key_len: usize) -> Result<Zeroizing<Vec<u8>>> {
    if password.is_empty() {
        return Err(Error::EmptyPassword);
    }
    if salt.is_empty() || salt.len() > MAX_SALT_LEN {
        return Err(Error::InvalidSaltLength(salt.len()));
    }
    if rounds < 1 {
        return Err(Error::RoundsTooSmall);
    }
    if key_len > MAX_KEY_LEN {
        return Err(Error::KeyLengthTooLarge(key_len));
    }
    trace!(rounds, salt_len = salt.len(), key_len, "bcrypt-pbkdf");

    let blocks = key_len.div_ceil(BHASH_OUTPUT_SIZE);
    let mut output = Zeroizing::new(vec![0u8; key_len]);
    let mut sha_pass = Zeroizing::new([0u8; 64]);
    sha_pass.copy_from_slice(&Sha512::digest(password));
    let mut sha_salt = Zeroizing::new([0u8; 64]);

    for block in 1..=blocks {
        let counter = block as u32;
        sha_salt.copy_from_slice(
            &Sha512::new()
                .chain_update(salt)
                .chain_update(counter.to_be_bytes())
                .finalize(),
        );
        let mut tmp = bhash(sha_pass.as_slice(), sha_salt.as_slice());
        let mut acc = tmp;
        for _ in 1..rounds {
            sha_salt.copy_from_slice(&Sha512::digest(tmp));
            tmp = bhash(sha_pass.as_slice(), sha_salt.as_slice());
            acc.iter_mut().zip(tmp.iter()).for_each(|(a, t)| *a ^= t);
        }

        for (i, byte) in acc.iter().enumerate() {
            let dest = i * blocks + (block - 1);
            if dest >= key_len {
                break;
            }
            output[dest] = *byte;
        }
        tmp.zeroize();
        acc.zeroize();
    }

    Ok(output)
}

fn bhash(sha_pass: &[u8], sha_salt: &[u8]) -> [u8; BHASH_OUTPUT_SIZE] {
    let mut bf: Blowfish = Blowfish::bc_init_state();
    bf.salted_expand_key(sha_salt, sha_pass);
    for _ in 0..64 {
        bf.bc_expand_key(sha_salt);
        bf.bc_expand_key(sha_pass);
    }

    let mut words = [0u32; BHASH_WORDS];
    for (word, chunk) in words.iter_mut().zip(BHASH_SEED.chunks_exact(4)) {
        *word = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    for _ in 0..64 {
        for pair in words.chunks_exact_mut(2) {
            let [l, r] = bf.bc_encrypt([pair[0], pair[1]]);
            pair[0] = l;
            pair[1] = r;
        }
    }

    let mut out = [0u8; BHASH_OUTPUT_SIZE];
    for (chunk, word) in out.chunks_exact_mut(4).zip(words.iter()) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }
    words.zeroize();
    out
}
