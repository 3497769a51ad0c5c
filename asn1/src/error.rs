//! Error types for ASN.1 parsing and encoding.

use std::num::ParseIntError;

use thiserror::Error;

/// Errors that can occur during ASN.1 parsing and encoding operations.
#[derive(Debug, Error)]
pub enum Error {
    // Integer errors
    #[error("INTEGER: no data")]
    IntegerNoData,

    // ObjectIdentifier errors
    #[error("OBJECT IDENTIFIER: no data")]
    ObjectIdentifierNoData,
    #[error("OBJECT IDENTIFIER: incomplete encoding")]
    ObjectIdentifierIncompleteEncoding,
    #[error("OBJECT IDENTIFIER: too few components (need at least 2)")]
    ObjectIdentifierTooFewComponents,
    #[error("OBJECT IDENTIFIER: first arcs {0}.{1} out of range")]
    ObjectIdentifierArcOutOfRange(u64, u64),
    #[error("parse int error: {0}")]
    ParseInt(#[from] ParseIntError),

    // BitString errors
    #[error("BIT STRING: no data")]
    BitStringNoData,
    #[error("BIT STRING: unused bits {0} out of range (must be 0-7)")]
    BitStringUnusedBitsOutOfRange(u8),

    // Null errors
    #[error("NULL: unexpected content of {0} bytes")]
    NullWithContent(usize),

    // Context-specific errors
    #[error("context-specific [{0}]: expected exactly one explicit element")]
    InvalidContextSpecific(u8),

    // DER errors
    #[error("invalid DER encoding: {0}")]
    FailedToDecodeDer(#[source] der::error::Error),
    #[error("failed to encode DER: {0}")]
    FailedToEncodeDer(#[source] der::error::Error),

    // Element errors
    #[error("element: cannot encode {0}")]
    ElementCannotEncode(&'static str),
    #[error("expected a single top-level element, found {0}")]
    UnexpectedElementCount(usize),
}
