//! Decoder trait for typed, step-by-step conversions.
//!
//! A key file is never parsed in one go. Each layer (PEM text, DER, ASN.1,
//! SSH wire structures) knows how to turn its own input into the next
//! representation, and the `Decoder` trait is the common shape of that step.
//!
//! # Two traits
//!
//! 1. `Decoder<T, D>` is implemented on the source type and does the work.
//! 2. `DecodableFrom<T>` is implemented on the destination type and states
//!    that the conversion exists at all.
//!
//! ```no_run
//! use kagi::decoder::{DecodableFrom, Decoder};
//!
//! struct Wire(Vec<u8>);
//! struct Check(u32);
//!
//! #[derive(Debug)]
//! struct Short;
//!
//! impl DecodableFrom<Wire> for Check {}
//!
//! impl Decoder<Wire, Check> for Wire {
//!     type Error = Short;
//!
//!     fn decode(&self) -> Result<Check, Self::Error> {
//!         let bytes: [u8; 4] = self.0.get(..4).ok_or(Short)?.try_into().map_err(|_| Short)?;
//!         Ok(Check(u32::from_be_bytes(bytes)))
//!     }
//! }
//! ```
//!
//! # Example
//!
//! The container codec decodes the body of an `OPENSSH PRIVATE KEY` block:
//!
//! ```ignore
//! use kagi::decoder::Decoder;
//! use sshkey::openssh::Container;
//!
//! let container: Container = pem_body.decode()?;
//! ```

/// Decoder trait for converting from type `T` to type `D`.
///
/// `T` is usually `Self`. The destination must implement
/// [`DecodableFrom<T>`], which keeps the set of possible conversions closed.
pub trait Decoder<T, D: DecodableFrom<T>> {
    /// The error type returned when decoding fails.
    type Error;

    /// Decodes `self` into type `D`.
    ///
    /// # Errors
    ///
    /// Returns an error if `self` is not a valid encoding of `D`.
    fn decode(&self) -> Result<D, Self::Error>;
}

/// Marker trait indicating that type `D` can be decoded from type `T`.
///
/// It has no methods. Implement it next to the matching [`Decoder`]:
///
/// ```no_run
/// use kagi::decoder::DecodableFrom;
///
/// struct PemBody;
/// struct Container;
///
/// impl DecodableFrom<PemBody> for Container {}
/// ```
pub trait DecodableFrom<T> {}
