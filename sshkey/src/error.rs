use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Wrong passphrase, or no passphrase for an encrypted key.
    #[error("incorrect passphrase")]
    IncorrectPassphrase,

    #[error("unsupported key type: {0}")]
    UnsupportedKeyType(String),

    #[error("unknown cipher {cipher:?} or kdf {kdf:?}")]
    UnknownCipherOrKdf { cipher: String, kdf: String },

    #[error("invalid openssh-key-v1 container: {0}")]
    InvalidContainer(String),

    #[error("invalid padding")]
    InvalidPadding,

    #[error("invalid key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("input is not UTF-8 text")]
    NotUtf8,

    #[error("signing failed: {0}")]
    Signature(#[from] rsa::signature::Error),

    #[error("cipher error: {0}")]
    Cipher(&'static str),

    #[error("PEM error: {0}")]
    Pem(#[from] pem::error::Error),

    #[error("PKCS error: {0}")]
    Pkcs(#[from] pkcs::Error),

    #[error("ASN.1 error: {0}")]
    Asn1(#[from] asn1::error::Error),

    #[error("SSH wire error: {0}")]
    Wire(#[from] sshwire::Error),

    #[error("KDF error: {0}")]
    Kdf(#[from] kdf::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
