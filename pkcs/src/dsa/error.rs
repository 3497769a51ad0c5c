use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("ASN.1 error: {0}")]
    Asn1(#[from] asn1::error::Error),

    #[error("expected SEQUENCE")]
    ExpectedSequence,

    #[error("expected 6 elements, got {0}")]
    InvalidElementCount(usize),

    #[error("expected non-negative INTEGER for {0}")]
    ExpectedInteger(&'static str),

    #[error("invalid version: expected 0")]
    InvalidVersion,
}

pub type Result<T> = std::result::Result<T, Error>;
