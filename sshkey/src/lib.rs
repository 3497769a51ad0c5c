//! Private-key containers for SSH.
//!
//! Two on-disk formats are read and written:
//!
//! - `OPENSSH PRIVATE KEY`, the `openssh-key-v1` container. Encrypted
//!   containers use bcrypt-pbkdf and AES-256 (CBC on encode, CBC or CTR on
//!   decode). A pair of check values inside the encrypted record tells a
//!   wrong passphrase apart from a damaged file.
//! - Classic PEM (`RSA PRIVATE KEY`, `EC PRIVATE KEY`, `DSA PRIVATE KEY`),
//!   optionally encrypted with the RFC 1421 `Proc-Type`/`DEK-Info` scheme.
//!
//! # Example
//!
//! ```no_run
//! use sshkey::{MarshalOptions, key::{Ed25519Key, KeyMaterial}};
//!
//! let key = KeyMaterial::Ed25519(Ed25519Key::from_seed([7; 32]));
//! let options = MarshalOptions::default().with_passphrase(b"s3cret");
//! let encoded = sshkey::marshal(&key, &options)?;
//!
//! let decoded = sshkey::parse_encrypted_raw_private_key(&encoded, Some(b"s3cret"))?;
//! assert_eq!(key, decoded);
//! # Ok::<(), sshkey::error::Error>(())
//! ```

#![forbid(unsafe_code)]

pub mod cipher;
pub mod classic;
pub mod error;
pub mod key;
pub mod openssh;
pub mod padding;
pub mod signer;

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use kagi::decoder::Decoder;
use pem::{Label, Pem};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use tracing::debug;
use zeroize::Zeroizing;

pub use cipher::CipherTable;
pub use error::{Error, Result};
pub use key::KeyMaterial;
pub use signer::{SignatureAlgorithm, Signer};

/// Output container for [`marshal`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    #[default]
    OpenSSHv1,
    ClassicPem,
}

impl Display for Format {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Format::OpenSSHv1 => write!(f, "openssh"),
            Format::ClassicPem => write!(f, "pem"),
        }
    }
}

/// An empty passphrase is the same as none: the key is written unencrypted.
#[derive(Clone, Default)]
pub struct MarshalOptions {
    pub passphrase: Option<Zeroizing<Vec<u8>>>,
    pub format: Format,
}

impl std::fmt::Debug for MarshalOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarshalOptions")
            .field("passphrase", &self.passphrase().map(|_| "<redacted>"))
            .field("format", &self.format)
            .finish()
    }
}

impl MarshalOptions {
    pub fn with_passphrase(mut self, passphrase: &[u8]) -> Self {
        self.passphrase = Some(Zeroizing::new(passphrase.to_vec()));
        self
    }

    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    fn passphrase(&self) -> Option<&[u8]> {
        self.passphrase
            .as_deref()
            .map(Vec::as_slice)
            .filter(|p| !p.is_empty())
    }
}

/// Encodes `key` as PEM text, drawing salts and check values from the
/// operating system RNG.
pub fn marshal(key: &KeyMaterial, options: &MarshalOptions) -> Result<Vec<u8>> {
    marshal_with_rng(key, options, &mut OsRng)
}

pub fn marshal_with_rng<R: RngCore + CryptoRng>(
    key: &KeyMaterial,
    options: &MarshalOptions,
    rng: &mut R,
) -> Result<Vec<u8>> {
    debug!(
        format = %options.format,
        key_type = key.key_type(),
        encrypted = options.passphrase().is_some(),
        "marshal"
    );
    let text = match options.format {
        Format::OpenSSHv1 => {
            openssh::encode(key, options.passphrase(), CipherTable::standard(), rng)?
        }
        Format::ClassicPem => classic::encode(key, options.passphrase(), rng)?,
    };
    Ok(text.into_bytes())
}

/// Decodes a private key in either format.
pub fn parse_encrypted_raw_private_key(
    data: &[u8],
    passphrase: Option<&[u8]>,
) -> Result<KeyMaterial> {
    parse_encrypted_raw_private_key_with_table(data, passphrase, CipherTable::standard())
}

/// Same as [`parse_encrypted_raw_private_key`] with a caller-supplied cipher
/// table for `openssh-key-v1` containers.
pub fn parse_encrypted_raw_private_key_with_table(
    data: &[u8],
    passphrase: Option<&[u8]>,
    table: &CipherTable<'_>,
) -> Result<KeyMaterial> {
    let pem = read_pem(data)?;
    debug!(label = %pem.label(), encrypted = pem.is_encrypted(), "parse private key");
    match pem.label() {
        Label::OpenSSHPrivateKey => {
            let body: Zeroizing<Vec<u8>> = Zeroizing::new(pem.decode()?);
            openssh::decode(&body, passphrase, table)
        }
        Label::RSAPrivateKey | Label::ECPrivateKey | Label::DSAPrivateKey => {
            classic::decode(&pem, passphrase)
        }
        other => Err(Error::UnsupportedKeyType(other.to_string())),
    }
}

/// Decodes a private key and wraps it in a [`Signer`].
pub fn parse_encrypted_private_key(data: &[u8], passphrase: Option<&[u8]>) -> Result<Signer> {
    Signer::new(parse_encrypted_raw_private_key(data, passphrase)?)
}

pub(crate) fn read_pem(data: &[u8]) -> Result<Pem> {
    let text = std::str::from_utf8(data).map_err(|_| Error::NotUtf8)?;
    Ok(Pem::from_str(text)?)
}
