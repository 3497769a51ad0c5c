//! Encoder trait, the mirror image of [`crate::decoder::Decoder`].
//!
//! `Encoder<T, E>` is implemented on the source type `T` and produces `E`.
//! `E` must opt in through `EncodableTo<T>`.
//!
//! ```no_run
//! use kagi::encoder::{EncodableTo, Encoder};
//!
//! struct Header(u32);
//!
//! impl EncodableTo<Header> for Vec<u8> {}
//!
//! impl Encoder<Header, Vec<u8>> for Header {
//!     type Error = std::convert::Infallible;
//!
//!     fn encode(&self) -> Result<Vec<u8>, Self::Error> {
//!         Ok(self.0.to_be_bytes().to_vec())
//!     }
//! }
//! ```

/// Encoder trait for converting from type `T` into type `E`.
pub trait Encoder<T, E: EncodableTo<T>> {
    /// The error type returned when encoding fails.
    type Error;

    /// Encodes `self` into type `E`.
    ///
    /// # Errors
    ///
    /// Returns an error if `self` cannot be represented as `E`.
    fn encode(&self) -> Result<E, Self::Error>;
}

/// Marker trait indicating that type `E` can be produced from type `T`.
pub trait EncodableTo<T> {}
