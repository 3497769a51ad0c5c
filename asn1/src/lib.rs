use std::{fmt::Display, str::FromStr};

use der::{Der, Tag, Tlv};
use error::Error;
use kagi::decoder::{DecodableFrom, Decoder};
use kagi::encoder::{EncodableTo, Encoder};
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{Signed, ToPrimitive};

pub mod error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ASN1Object {
    elements: Vec<Element>,
}

impl ASN1Object {
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn new(elements: Vec<Element>) -> Self {
        ASN1Object { elements }
    }
}

impl DecodableFrom<Der> for ASN1Object {}

impl Decoder<Der, ASN1Object> for Der {
    type Error = Error;
    fn decode(&self) -> Result<ASN1Object, Error> {
        let elements = self
            .elements()
            .iter()
            .map(Element::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ASN1Object { elements })
    }
}

impl DecodableFrom<&[u8]> for ASN1Object {}

impl Decoder<&[u8], ASN1Object> for &[u8] {
    type Error = Error;

    fn decode(&self) -> Result<ASN1Object, Error> {
        let der: Der = self.decode().map_err(Error::FailedToDecodeDer)?;
        der.decode()
    }
}

impl EncodableTo<ASN1Object> for Der {}

impl Encoder<ASN1Object, Der> for ASN1Object {
    type Error = Error;

    fn encode(&self) -> Result<Der, Self::Error> {
        let tlvs = self
            .elements
            .iter()
            .map(|e| e.encode())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Der::new(tlvs))
    }
}

impl EncodableTo<ASN1Object> for Vec<u8> {}

impl Encoder<ASN1Object, Vec<u8>> for ASN1Object {
    type Error = Error;

    fn encode(&self) -> Result<Vec<u8>, Self::Error> {
        let der: Der = self.encode()?;
        der.encode().map_err(Error::FailedToEncodeDer)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    Integer(Integer),
    BitString(BitString),
    OctetString(OctetString),
    Null,
    ObjectIdentifier(ObjectIdentifier),
    Sequence(Vec<Element>),
    /// EXPLICIT context-specific tagging, as used by SEC1 `[0]` and `[1]`.
    ContextSpecific {
        slot: u8,
        element: Box<Element>,
    },
    Unimplemented(Tlv),
}

impl TryFrom<&Tlv> for Element {
    type Error = Error;

    fn try_from(tlv: &Tlv) -> Result<Self, Self::Error> {
        match (tlv.tag(), tlv.data(), tlv.tlvs()) {
            (Tag::Integer, Some(data), _) => {
                if data.is_empty() {
                    return Err(Error::IntegerNoData);
                }
                Ok(Element::Integer(Integer::from(data)))
            }
            (Tag::BitString, Some(data), _) => Ok(Element::BitString(BitString::try_from(data)?)),
            (Tag::OctetString, Some(data), _) => Ok(Element::OctetString(OctetString::from(data))),
            (Tag::Null, Some(data), _) => {
                if !data.is_empty() {
                    return Err(Error::NullWithContent(data.len()));
                }
                Ok(Element::Null)
            }
            (Tag::ObjectIdentifier, Some(data), _) => Ok(Element::ObjectIdentifier(
                ObjectIdentifier::try_from(data)?,
            )),
            (Tag::Sequence, _, Some(tlvs)) => Ok(Element::Sequence(
                tlvs.iter()
                    .map(Element::try_from)
                    .collect::<Result<Vec<_>, _>>()?,
            )),
            (
                Tag::ContextSpecific {
                    slot,
                    constructed: true,
                },
                _,
                Some(tlvs),
            ) => match tlvs {
                [inner] => Ok(Element::ContextSpecific {
                    slot,
                    element: Box::new(Element::try_from(inner)?),
                }),
                _ => Err(Error::InvalidContextSpecific(slot)),
            },
            _ => Ok(Element::Unimplemented(tlv.clone())),
        }
    }
}

impl Display for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Element::Integer(i) => write!(f, "INTEGER {}", i),
            Element::BitString(b) => write!(f, "BIT STRING ({} bits)", b.bit_len()),
            Element::OctetString(o) => write!(f, "OCTET STRING ({} bytes)", o.as_bytes().len()),
            Element::Null => write!(f, "NULL"),
            Element::ObjectIdentifier(oid) => write!(f, "OBJECT IDENTIFIER {}", oid),
            Element::Sequence(e) => write!(f, "SEQUENCE ({} elements)", e.len()),
            Element::ContextSpecific { slot, element } => write!(f, "[{}] {}", slot, element),
            Element::Unimplemented(tlv) => write!(f, "Unimplemented({:?})", tlv.tag()),
        }
    }
}

impl TryFrom<&Element> for Tlv {
    type Error = Error;

    fn try_from(element: &Element) -> Result<Self, Self::Error> {
        match element {
            Element::Integer(i) => Ok(Tlv::new_primitive(
                Tag::Integer,
                i.as_bigint().to_signed_bytes_be(),
            )),
            Element::BitString(bs) => {
                let mut data = Vec::with_capacity(bs.as_bytes().len() + 1);
                data.push(bs.unused_bits());
                data.extend_from_slice(bs.as_bytes());
                Ok(Tlv::new_primitive(Tag::BitString, data))
            }
            Element::OctetString(os) => {
                Ok(Tlv::new_primitive(Tag::OctetString, os.as_bytes().to_vec()))
            }
            Element::Null => Ok(Tlv::new_primitive(Tag::Null, vec![])),
            Element::ObjectIdentifier(oid) => {
                Ok(Tlv::new_primitive(Tag::ObjectIdentifier, oid.to_der_bytes()?))
            }
            Element::Sequence(elements) => {
                let tlvs = elements
                    .iter()
                    .map(Tlv::try_from)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Tlv::new_constructed(Tag::Sequence, tlvs))
            }
            Element::ContextSpecific { slot, element } => {
                let inner = Tlv::try_from(element.as_ref())?;
                Ok(Tlv::new_constructed(
                    Tag::ContextSpecific {
                        slot: *slot,
                        constructed: true,
                    },
                    vec![inner],
                ))
            }
            Element::Unimplemented(_) => Err(Error::ElementCannotEncode("Unimplemented")),
        }
    }
}

impl EncodableTo<Element> for Tlv {}

impl Encoder<Element, Tlv> for Element {
    type Error = Error;

    fn encode(&self) -> Result<Tlv, Self::Error> {
        Tlv::try_from(self)
    }
}

// ASN1 integer is possible to be a positive and negative value.
// This can be arbitrary sized values.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Integer {
    inner: BigInt,
}

impl Integer {
    /// Returns a reference to the inner BigInt
    pub fn as_bigint(&self) -> &BigInt {
        &self.inner
    }

    /// The magnitude, or `None` for negative values.
    pub fn to_biguint(&self) -> Option<BigUint> {
        if self.inner.is_negative() {
            return None;
        }
        self.inner.to_biguint()
    }

    pub fn to_i64(&self) -> Option<i64> {
        self.inner.to_i64()
    }

    pub fn bits(&self) -> u64 {
        self.inner.bits()
    }
}

impl From<&[u8]> for Integer {
    fn from(value: &[u8]) -> Self {
        Integer {
            inner: BigInt::from_signed_bytes_be(value),
        }
    }
}

impl From<BigInt> for Integer {
    fn from(inner: BigInt) -> Self {
        Integer { inner }
    }
}

impl From<&BigUint> for Integer {
    fn from(value: &BigUint) -> Self {
        Integer {
            inner: BigInt::from_biguint(Sign::Plus, value.clone()),
        }
    }
}

impl From<i64> for Integer {
    fn from(value: i64) -> Self {
        Integer {
            inner: BigInt::from(value),
        }
    }
}

impl Display for Integer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectIdentifier {
    inner: Vec<u64>,
}

impl ObjectIdentifier {
    pub fn components(&self) -> &[u64] {
        &self.inner
    }

    fn to_der_bytes(&self) -> Result<Vec<u8>, Error> {
        let (first, second) = match self.inner.as_slice() {
            [first, second, ..] => (*first, *second),
            _ => return Err(Error::ObjectIdentifierTooFewComponents),
        };
        if first > 2 || (first < 2 && second >= 40) {
            return Err(Error::ObjectIdentifierArcOutOfRange(first, second));
        }

        let mut result = Vec::new();
        push_base128(&mut result, first * 40 + second);
        for v in self.inner[2..].iter() {
            push_base128(&mut result, *v);
        }
        Ok(result)
    }
}

impl From<&[u64]> for ObjectIdentifier {
    fn from(arcs: &[u64]) -> Self {
        ObjectIdentifier {
            inner: arcs.to_vec(),
        }
    }
}

fn push_base128(out: &mut Vec<u8>, mut value: u64) {
    let mut encoded = vec![(value & 0x7f) as u8];
    value >>= 7;
    while value > 0 {
        encoded.push((value & 0x7f) as u8 | 0x80);
        value >>= 7;
    }
    out.extend(encoded.iter().rev());
}

impl TryFrom<&[u8]> for ObjectIdentifier {
    type Error = Error;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        if value.is_empty() {
            return Err(Error::ObjectIdentifierNoData);
        }

        let mut arcs = Vec::new();
        let mut val = 0u64;
        let mut pending = false;
        for v in value.iter() {
            val = (val << 7) | (*v as u64 & 0x7F);
            pending = true;
            if *v & 0x80 == 0 {
                // If the continuation bit is not set, we have reached the end of this value
                arcs.push(val);
                val = 0;
                pending = false;
            }
        }
        if pending {
            return Err(Error::ObjectIdentifierIncompleteEncoding);
        }

        let mut values = Vec::with_capacity(arcs.len() + 1);
        match arcs[0] {
            first if first < 80 => {
                values.push(first / 40);
                values.push(first % 40);
            }
            first => {
                values.push(2);
                values.push(first - 80);
            }
        }
        values.extend_from_slice(&arcs[1..]);

        Ok(ObjectIdentifier { inner: values })
    }
}

impl Display for ObjectIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = self
            .inner
            .iter()
            .map(|n| n.to_string())
            .collect::<Vec<_>>()
            .join(".");
        write!(f, "{}", s)
    }
}

impl FromStr for ObjectIdentifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split('.')
            .map(|s| s.parse::<u64>().map_err(Error::ParseInt))
            .collect::<Result<Vec<u64>, Error>>()?;
        if values.len() < 2 {
            return Err(Error::ObjectIdentifierTooFewComponents);
        }
        Ok(ObjectIdentifier { inner: values })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitString {
    unused: u8,
    data: Vec<u8>,
}

impl BitString {
    /// Creates a new BitString with the specified number of unused bits and data
    pub fn new(unused: u8, data: Vec<u8>) -> Self {
        BitString { unused, data }
    }

    /// Returns the number of unused bits in the last byte
    pub fn unused_bits(&self) -> u8 {
        self.unused
    }

    /// Returns a reference to the underlying byte data
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Returns the total number of bits (excluding unused bits)
    pub fn bit_len(&self) -> usize {
        if self.data.is_empty() {
            0
        } else {
            self.data.len() * 8 - self.unused as usize
        }
    }
}

impl TryFrom<&[u8]> for BitString {
    type Error = Error;
    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        match value.split_first() {
            Some((&unused, _)) if unused > 7 => Err(Error::BitStringUnusedBitsOutOfRange(unused)),
            Some((&unused, data)) => Ok(BitString {
                unused,
                data: data.to_vec(),
            }),
            None => Err(Error::BitStringNoData),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OctetString {
    inner: Vec<u8>,
}

impl OctetString {
    /// Returns the inner bytes as a slice
    pub fn as_bytes(&self) -> &[u8] {
        &self.inner
    }

    /// Consumes self and returns the inner bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.inner
    }
}

impl AsRef<[u8]> for OctetString {
    fn as_ref(&self) -> &[u8] {
        &self.inner
    }
}

impl From<Vec<u8>> for OctetString {
    fn from(inner: Vec<u8>) -> Self {
        OctetString { inner }
    }
}

impl From<&[u8]> for OctetString {
    fn from(value: &[u8]) -> Self {
        OctetString {
            inner: value.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use kagi::decoder::Decoder;
    use kagi::encoder::Encoder;
    use num_bigint::BigInt;
    use rstest::rstest;

    use crate::{ASN1Object, BitString, Element, Integer, ObjectIdentifier, OctetString};

    #[rstest(input, expected,
        case(vec![0x02, 0x01, 0x00], Element::Integer(Integer::from(0i64))),
        case(vec![0x02, 0x01, 0x7f], Element::Integer(Integer::from(127i64))),
        case(vec![0x02, 0x02, 0x00, 0x80], Element::Integer(Integer::from(128i64))),
        case(vec![0x02, 0x01, 0x80], Element::Integer(Integer::from(-128i64))),
        case(vec![0x02, 0x03, 0x01, 0x00, 0x01], Element::Integer(Integer::from(65537i64))),
        case(vec![0x05, 0x00], Element::Null),
        case(vec![0x04, 0x02, 0xde, 0xad], Element::OctetString(OctetString::from(vec![0xde, 0xad]))),
        case(vec![0x03, 0x03, 0x00, 0x04, 0x01], Element::BitString(BitString::new(0, vec![0x04, 0x01]))),
        case(vec![0x06, 0x08, 0x2a, 0x86, 0x48, 0xce, 0x3d, 0x03, 0x01, 0x07], Element::ObjectIdentifier(ObjectIdentifier::from_str("1.2.840.10045.3.1.7").unwrap())),
        case(vec![0x06, 0x05, 0x2b, 0x81, 0x04, 0x00, 0x22], Element::ObjectIdentifier(ObjectIdentifier::from_str("1.3.132.0.34").unwrap())),
        case(vec![0x30, 0x06, 0x02, 0x01, 0x00, 0x02, 0x01, 0x01], Element::Sequence(vec![Element::Integer(Integer::from(0i64)), Element::Integer(Integer::from(1i64))])),
        case(vec![0xa1, 0x04, 0x03, 0x02, 0x00, 0xff], Element::ContextSpecific { slot: 1, element: Box::new(Element::BitString(BitString::new(0, vec![0xff]))) }),
    )]
    fn test_element_decode_encode(input: Vec<u8>, expected: Element) {
        let obj: ASN1Object = input.as_slice().decode().unwrap();
        assert_eq!(&[expected], obj.elements());

        let encoded: Vec<u8> = obj.encode().unwrap();
        assert_eq!(input, encoded);
    }

    #[rstest(input,
        case(vec![0x02, 0x00]),
        case(vec![0x06, 0x00]),
        case(vec![0x06, 0x02, 0x2a, 0x86]),
        case(vec![0x03, 0x00]),
        case(vec![0x03, 0x02, 0x08, 0x00]),
        case(vec![0x05, 0x01, 0x00]),
        case(vec![0xa0, 0x06, 0x02, 0x01, 0x00, 0x02, 0x01, 0x00]),
    )]
    fn test_element_decode_rejects(input: Vec<u8>) {
        let result: Result<ASN1Object, _> = input.as_slice().decode();
        assert!(result.is_err());
    }

    #[rstest(oid, case("1.2.840.113549.1.1.1"), case("1.3.132.0.35"), case("2.5.4.3"), case("1.2.0.5"))]
    fn test_object_identifier_string_round_trip(oid: &str) {
        let parsed = ObjectIdentifier::from_str(oid).unwrap();
        let bytes = parsed.to_der_bytes().unwrap();
        let back = ObjectIdentifier::try_from(bytes.as_slice()).unwrap();
        assert_eq!(oid, back.to_string());
    }

    #[test]
    fn test_integer_to_biguint() {
        assert!(Integer::from(-1i64).to_biguint().is_none());
        let big = Integer::from(BigInt::from(1u64 << 40));
        assert_eq!(Some(1u64 << 40), big.to_biguint().and_then(|b| u64::try_from(b).ok()));
        assert_eq!(41, big.bits());
    }
}
