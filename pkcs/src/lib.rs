//! Legacy private key layouts carried inside classic PEM blocks.
//!
//! - [`pkcs1`]: `RSA PRIVATE KEY` (RFC 8017)
//! - [`sec1`]: `EC PRIVATE KEY` (RFC 5915)
//! - [`dsa`]: `DSA PRIVATE KEY`, the OpenSSL sequence of six integers
//!
//! Each type decodes from an [`asn1::Element`] and from raw DER bytes, and
//! encodes back to both.

use asn1::{ASN1Object, Element};
use kagi::decoder::Decoder;
use kagi::encoder::Encoder;

pub mod dsa;
pub mod error;
pub mod pkcs1;
pub mod sec1;

pub use error::{Error, Result};

/// Parses DER bytes holding exactly one top-level element.
pub(crate) fn single_element(bytes: &[u8]) -> std::result::Result<Element, asn1::error::Error> {
    let obj: ASN1Object = bytes.decode()?;
    match obj.elements() {
        [element] => Ok(element.clone()),
        elements => Err(asn1::error::Error::UnexpectedElementCount(elements.len())),
    }
}

pub(crate) fn element_to_der(element: Element) -> std::result::Result<Vec<u8>, asn1::error::Error> {
    ASN1Object::new(vec![element]).encode()
}
