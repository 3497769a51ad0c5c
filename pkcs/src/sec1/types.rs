use std::fmt::Display;

use asn1::{BitString, Element, Integer, ObjectIdentifier, OctetString};
use kagi::decoder::{DecodableFrom, Decoder};
use kagi::encoder::{EncodableTo, Encoder};
use num_bigint::BigInt;

use super::error::{Error, Result};

/*
RFC 5915 - Elliptic Curve Private Key Structure

ECPrivateKey ::= SEQUENCE {
    version        INTEGER { ecPrivkeyVer1(1) } (ecPrivkeyVer1),
    privateKey     OCTET STRING,
    parameters [0] ECParameters {{ NamedCurve }} OPTIONAL,
    publicKey  [1] BIT STRING OPTIONAL
}
*/

const OID_SECP256R1: &[u64] = &[1, 2, 840, 10045, 3, 1, 7];
const OID_SECP384R1: &[u64] = &[1, 3, 132, 0, 34];
const OID_SECP521R1: &[u64] = &[1, 3, 132, 0, 35];

/// Named curves with an OpenSSH name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedCurve {
    P256,
    P384,
    P521,
}

impl NamedCurve {
    pub fn oid(&self) -> ObjectIdentifier {
        ObjectIdentifier::from(self.arcs())
    }

    fn arcs(&self) -> &'static [u64] {
        match self {
            NamedCurve::P256 => OID_SECP256R1,
            NamedCurve::P384 => OID_SECP384R1,
            NamedCurve::P521 => OID_SECP521R1,
        }
    }

    /// Length of a field element (and of the private scalar) in bytes.
    pub fn field_size(&self) -> usize {
        match self {
            NamedCurve::P256 => 32,
            NamedCurve::P384 => 48,
            NamedCurve::P521 => 66,
        }
    }

    /// Curve identifier used in `ecdsa-sha2-<name>`.
    pub fn ssh_name(&self) -> &'static str {
        match self {
            NamedCurve::P256 => "nistp256",
            NamedCurve::P384 => "nistp384",
            NamedCurve::P521 => "nistp521",
        }
    }
}

impl Display for NamedCurve {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.ssh_name())
    }
}

impl TryFrom<&ObjectIdentifier> for NamedCurve {
    type Error = Error;

    fn try_from(oid: &ObjectIdentifier) -> Result<Self> {
        match oid.components() {
            OID_SECP256R1 => Ok(NamedCurve::P256),
            OID_SECP384R1 => Ok(NamedCurve::P384),
            OID_SECP521R1 => Ok(NamedCurve::P521),
            _ => Err(Error::UnknownCurve(oid.to_string())),
        }
    }
}

impl From<NamedCurve> for ObjectIdentifier {
    fn from(curve: NamedCurve) -> Self {
        curve.oid()
    }
}

/// SEC1 ECPrivateKey version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    /// ecPrivkeyVer1 (value 1)
    V1 = 1,
}

impl From<Version> for Integer {
    fn from(v: Version) -> Self {
        Integer::from(BigInt::from(v as i64))
    }
}

impl DecodableFrom<Element> for Version {}

impl Decoder<Element, Version> for Element {
    type Error = Error;

    fn decode(&self) -> Result<Version> {
        match self {
            Element::Integer(int) => match int.to_i64().ok_or(Error::VersionOutOfRange)? {
                1 => Ok(Version::V1),
                v => Err(Error::InvalidVersion(v)),
            },
            _ => Err(Error::ExpectedInteger("version")),
        }
    }
}

/// SEC1 EC Private Key structure (RFC 5915)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ECPrivateKey {
    pub version: Version,
    /// Big-endian private scalar
    pub private_key: OctetString,
    /// EC parameters (named curve) - OPTIONAL [0]
    pub parameters: Option<NamedCurve>,
    /// Public point - OPTIONAL [1]
    pub public_key: Option<BitString>,
}

impl ECPrivateKey {
    pub fn new(
        private_key: OctetString,
        parameters: Option<NamedCurve>,
        public_key: Option<BitString>,
    ) -> Self {
        Self {
            version: Version::V1,
            private_key,
            parameters,
            public_key,
        }
    }
}

impl DecodableFrom<Element> for ECPrivateKey {}

impl Decoder<Element, ECPrivateKey> for Element {
    type Error = Error;

    fn decode(&self) -> Result<ECPrivateKey> {
        let elements = match self {
            Element::Sequence(elements) => elements,
            _ => return Err(Error::ExpectedSequence),
        };

        let mut iter = elements.iter();

        let version = iter
            .next()
            .ok_or(Error::InsufficientElements("missing version"))?
            .decode()?;

        let private_key = match iter.next() {
            Some(Element::OctetString(octets)) => octets.clone(),
            Some(_) => return Err(Error::ExpectedOctetString),
            None => return Err(Error::InsufficientElements("missing privateKey")),
        };

        let mut parameters = None;
        let mut public_key = None;
        for element in iter {
            match element {
                Element::ContextSpecific { slot: 0, element } => match element.as_ref() {
                    Element::ObjectIdentifier(oid) => parameters = Some(NamedCurve::try_from(oid)?),
                    _ => return Err(Error::UnknownCurve("non-OID parameters".to_string())),
                },
                Element::ContextSpecific { slot: 1, element } => match element.as_ref() {
                    Element::BitString(bits) => public_key = Some(bits.clone()),
                    _ => return Err(Error::ExpectedBitString),
                },
                _ => {}
            }
        }

        Ok(ECPrivateKey {
            version,
            private_key,
            parameters,
            public_key,
        })
    }
}

impl EncodableTo<ECPrivateKey> for Element {}

impl Encoder<ECPrivateKey, Element> for ECPrivateKey {
    type Error = Error;

    fn encode(&self) -> Result<Element> {
        let mut elements = vec![
            Element::Integer(Integer::from(self.version)),
            Element::OctetString(self.private_key.clone()),
        ];
        if let Some(curve) = self.parameters {
            elements.push(Element::ContextSpecific {
                slot: 0,
                element: Box::new(Element::ObjectIdentifier(curve.into())),
            });
        }
        if let Some(public_key) = &self.public_key {
            elements.push(Element::ContextSpecific {
                slot: 1,
                element: Box::new(Element::BitString(public_key.clone())),
            });
        }
        Ok(Element::Sequence(elements))
    }
}

impl DecodableFrom<&[u8]> for ECPrivateKey {}

impl Decoder<&[u8], ECPrivateKey> for &[u8] {
    type Error = Error;

    fn decode(&self) -> Result<ECPrivateKey> {
        let element = crate::single_element(self)?;
        element.decode()
    }
}

impl EncodableTo<ECPrivateKey> for Vec<u8> {}

impl Encoder<ECPrivateKey, Vec<u8>> for ECPrivateKey {
    type Error = Error;

    fn encode(&self) -> Result<Vec<u8>> {
        let element: Element = self.encode()?;
        Ok(crate::element_to_der(element)?)
    }
}
