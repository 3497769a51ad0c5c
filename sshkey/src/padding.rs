//! The deterministic `1, 2, 3, ...` padding of openssh-key-v1 inner records.

use crate::error::{Error, Result};

/// Number of padding bytes that brings `len` to a multiple of `block_size`.
pub fn padding_len(len: usize, block_size: usize) -> usize {
    match len % block_size {
        0 => 0,
        rem => block_size - rem,
    }
}

/// Appends `1, 2, 3, ...` until `buf` is block aligned.
pub fn pad(buf: &mut Vec<u8>, block_size: usize) {
    let n = padding_len(buf.len(), block_size);
    buf.extend((1..=n).map(|i| i as u8));
}

/// Checks that `padding` reads `1, 2, 3, ...` from the left.
///
/// Any run length is accepted: OpenSSH itself pads unencrypted records to
/// eight bytes.
pub fn validate(padding: &[u8]) -> Result<()> {
    if padding.len() > u8::MAX as usize {
        return Err(Error::InvalidPadding);
    }
    let ok = padding
        .iter()
        .enumerate()
        .all(|(i, b)| *b as usize == i + 1);
    if ok { Ok(()) } else { Err(Error::InvalidPadding) }
}
