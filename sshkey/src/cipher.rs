//! Symmetric ciphers of the openssh-key-v1 private block.
//!
//! Ciphers are looked up by `(kdf, cipher)` name pair in a [`CipherTable`].
//! Supporting another cipher means adding a [`CipherSpec`] entry.

use aes::Aes256;
use aes::cipher::block_padding::NoPadding;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, StreamCipher};

use crate::error::{Error, Result};

pub const CIPHER_NONE: &str = "none";
pub const CIPHER_AES256_CBC: &str = "aes256-cbc";
pub const CIPHER_AES256_CTR: &str = "aes256-ctr";
pub const KDF_NONE: &str = "none";
pub const KDF_BCRYPT: &str = "bcrypt";

type CipherFn = fn(key: &[u8], iv: &[u8], buf: &mut [u8]) -> Result<()>;

#[derive(Debug, Clone, Copy)]
pub struct CipherSpec {
    pub kdf: &'static str,
    pub cipher: &'static str,
    pub block_size: usize,
    pub key_len: usize,
    pub iv_len: usize,
    encrypt: CipherFn,
    decrypt: CipherFn,
}

impl CipherSpec {
    pub const fn new(
        kdf: &'static str,
        cipher: &'static str,
        block_size: usize,
        key_len: usize,
        iv_len: usize,
        encrypt: CipherFn,
        decrypt: CipherFn,
    ) -> Self {
        CipherSpec {
            kdf,
            cipher,
            block_size,
            key_len,
            iv_len,
            encrypt,
            decrypt,
        }
    }

    pub fn is_encrypted(&self) -> bool {
        self.kdf != KDF_NONE
    }

    /// Bytes the KDF must produce: the key followed by the IV.
    pub fn key_iv_len(&self) -> usize {
        self.key_len + self.iv_len
    }

    /// Encrypts `buf` in place. `key_iv` is the KDF output.
    pub fn encrypt(&self, key_iv: &[u8], buf: &mut [u8]) -> Result<()> {
        let (key, iv) = self.split(key_iv)?;
        (self.encrypt)(key, iv, buf)
    }

    /// Decrypts `buf` in place. `key_iv` is the KDF output.
    pub fn decrypt(&self, key_iv: &[u8], buf: &mut [u8]) -> Result<()> {
        let (key, iv) = self.split(key_iv)?;
        (self.decrypt)(key, iv, buf)
    }

    fn split<'a>(&self, key_iv: &'a [u8]) -> Result<(&'a [u8], &'a [u8])> {
        if key_iv.len() != self.key_iv_len() {
            return Err(Error::Cipher("derived key material has the wrong length"));
        }
        Ok(key_iv.split_at(self.key_len))
    }
}

fn identity(_key: &[u8], _iv: &[u8], _buf: &mut [u8]) -> Result<()> {
    Ok(())
}

fn aes256_cbc_encrypt(key: &[u8], iv: &[u8], buf: &mut [u8]) -> Result<()> {
    let len = buf.len();
    cbc::Encryptor::<Aes256>::new_from_slices(key, iv)
        .map_err(|_| Error::Cipher("invalid AES-256-CBC key or IV length"))?
        .encrypt_padded_mut::<NoPadding>(buf, len)
        .map_err(|_| Error::Cipher("data is not a multiple of the block size"))?;
    Ok(())
}

fn aes256_cbc_decrypt(key: &[u8], iv: &[u8], buf: &mut [u8]) -> Result<()> {
    cbc::Decryptor::<Aes256>::new_from_slices(key, iv)
        .map_err(|_| Error::Cipher("invalid AES-256-CBC key or IV length"))?
        .decrypt_padded_mut::<NoPadding>(buf)
        .map_err(|_| Error::Cipher("data is not a multiple of the block size"))?;
    Ok(())
}

// CTR is its own inverse.
fn aes256_ctr(key: &[u8], iv: &[u8], buf: &mut [u8]) -> Result<()> {
    let mut cipher = ctr::Ctr128BE::<Aes256>::new_from_slices(key, iv)
        .map_err(|_| Error::Cipher("invalid AES-256-CTR key or IV length"))?;
    cipher.apply_keystream(buf);
    Ok(())
}

const STANDARD_CIPHERS: &[CipherSpec] = &[
    CipherSpec::new(KDF_NONE, CIPHER_NONE, 1, 0, 0, identity, identity),
    CipherSpec::new(
        KDF_BCRYPT,
        CIPHER_AES256_CBC,
        16,
        32,
        16,
        aes256_cbc_encrypt,
        aes256_cbc_decrypt,
    ),
    CipherSpec::new(KDF_BCRYPT, CIPHER_AES256_CTR, 16, 32, 16, aes256_ctr, aes256_ctr),
];

static STANDARD: CipherTable<'static> = CipherTable::new(STANDARD_CIPHERS);

/// Immutable lookup table of the ciphers a codec call may use.
#[derive(Debug, Clone, Copy)]
pub struct CipherTable<'a> {
    ciphers: &'a [CipherSpec],
}

impl<'a> CipherTable<'a> {
    pub const fn new(ciphers: &'a [CipherSpec]) -> Self {
        CipherTable { ciphers }
    }

    /// `none`, `aes256-cbc` and `aes256-ctr`.
    pub fn standard() -> &'static CipherTable<'static> {
        &STANDARD
    }

    pub fn get(&self, kdf: &str, cipher: &str) -> Result<&'a CipherSpec> {
        self.ciphers
            .iter()
            .find(|spec| spec.kdf == kdf && spec.cipher == cipher)
            .ok_or_else(|| Error::UnknownCipherOrKdf {
                cipher: cipher.to_string(),
                kdf: kdf.to_string(),
            })
    }
}
