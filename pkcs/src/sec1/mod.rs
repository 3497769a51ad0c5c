//! SEC1 - Elliptic Curve Private Key Structure
//!
//! This module implements the ECPrivateKey structure as defined in
//! [RFC 5915](https://datatracker.ietf.org/doc/html/rfc5915), restricted to
//! the NIST prime curves OpenSSH knows by name.

pub mod error;
mod types;

pub use error::{Error, Result};
pub use types::{ECPrivateKey, NamedCurve, Version};
