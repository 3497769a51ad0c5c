//! SEC1 (RFC 5915) error types

use thiserror::Error;

/// Errors that can occur when parsing or encoding SEC1 structures.
#[derive(Debug, Error)]
pub enum Error {
    /// ASN.1 parsing error
    #[error("ASN.1 error: {0}")]
    Asn1(#[from] asn1::error::Error),

    #[error("expected SEQUENCE")]
    ExpectedSequence,

    #[error("expected INTEGER for {0}")]
    ExpectedInteger(&'static str),

    #[error("expected OCTET STRING")]
    ExpectedOctetString,

    /// The sequence has fewer elements than required
    #[error("insufficient elements: {0}")]
    InsufficientElements(&'static str),

    /// Invalid version number (must be 1 for ecPrivkeyVer1)
    #[error("invalid version: expected 1 (ecPrivkeyVer1), got {0}")]
    InvalidVersion(i64),

    #[error("version integer out of range")]
    VersionOutOfRange,

    /// Unknown or unsupported elliptic curve OID
    #[error("unknown curve OID: {0}")]
    UnknownCurve(String),

    #[error("publicKey [1] must be a BIT STRING")]
    ExpectedBitString,
}

pub type Result<T> = std::result::Result<T, Error>;
