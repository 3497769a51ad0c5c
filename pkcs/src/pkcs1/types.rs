use asn1::{Element, Integer};
use kagi::decoder::{DecodableFrom, Decoder};
use kagi::encoder::{EncodableTo, Encoder};
use num_bigint::{BigInt, BigUint};
use num_traits::One;

use super::error::{Error, Result};

/*
RFC 8017 - PKCS #1: RSA Cryptography Specifications

RSAPrivateKey ::= SEQUENCE {
    version           Version,
    modulus           INTEGER,  -- n
    publicExponent    INTEGER,  -- e
    privateExponent   INTEGER,  -- d
    prime1            INTEGER,  -- p
    prime2            INTEGER,  -- q
    exponent1         INTEGER,  -- d mod (p-1)
    exponent2         INTEGER,  -- d mod (q-1)
    coefficient       INTEGER,  -- (inverse of q) mod p
    otherPrimeInfos   OtherPrimeInfos OPTIONAL
}

Version ::= INTEGER { two-prime(0), multi(1) }
*/

/// PKCS#1 RSAPrivateKey version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    TwoPrime = 0,
    Multi = 1,
}

impl From<Version> for Integer {
    fn from(v: Version) -> Self {
        Integer::from(BigInt::from(v as i64))
    }
}

impl TryFrom<i64> for Version {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self> {
        match value {
            0 => Ok(Version::TwoPrime),
            1 => Ok(Version::Multi),
            _ => Err(Error::InvalidVersion(value)),
        }
    }
}

impl DecodableFrom<Element> for Version {}

impl Decoder<Element, Version> for Element {
    type Error = Error;

    fn decode(&self) -> Result<Version> {
        match self {
            Element::Integer(int) => {
                let value = int.to_i64().ok_or(Error::VersionOutOfRange)?;
                Version::try_from(value)
            }
            _ => Err(Error::ExpectedInteger { field: "version" }),
        }
    }
}

/// PKCS#1 RSA private key. All values are non-negative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RSAPrivateKey {
    pub version: Version,
    pub modulus: BigUint,          // n
    pub public_exponent: BigUint,  // e
    pub private_exponent: BigUint, // d
    pub prime1: BigUint,           // p
    pub prime2: BigUint,           // q
    pub exponent1: BigUint,        // d mod (p-1)
    pub exponent2: BigUint,        // d mod (q-1)
    pub coefficient: BigUint,      // (inverse of q) mod p
}

impl RSAPrivateKey {
    /// Builds a two-prime key, computing the CRT exponents from `d`, `p` and `q`.
    pub fn from_components(
        modulus: BigUint,
        public_exponent: BigUint,
        private_exponent: BigUint,
        prime1: BigUint,
        prime2: BigUint,
        coefficient: BigUint,
    ) -> Result<Self> {
        if prime1 <= BigUint::one() {
            return Err(Error::InvalidPrime("prime1"));
        }
        if prime2 <= BigUint::one() {
            return Err(Error::InvalidPrime("prime2"));
        }
        let exponent1 = &private_exponent % (&prime1 - 1u32);
        let exponent2 = &private_exponent % (&prime2 - 1u32);
        Ok(RSAPrivateKey {
            version: Version::TwoPrime,
            modulus,
            public_exponent,
            private_exponent,
            prime1,
            prime2,
            exponent1,
            exponent2,
            coefficient,
        })
    }

    /// Key size in bits.
    pub fn key_size(&self) -> u64 {
        self.modulus.bits()
    }
}

impl DecodableFrom<Element> for RSAPrivateKey {}

impl Decoder<Element, RSAPrivateKey> for Element {
    type Error = Error;

    fn decode(&self) -> Result<RSAPrivateKey> {
        let elements = match self {
            Element::Sequence(elements) => elements,
            _ => return Err(Error::ExpectedSequence),
        };
        if elements.len() < 9 {
            return Err(Error::InvalidElementCount {
                expected: "at least 9",
                actual: elements.len(),
            });
        }

        let get_integer = |idx: usize, field: &'static str| -> Result<BigUint> {
            match &elements[idx] {
                Element::Integer(int) => int.to_biguint().ok_or(Error::NegativeInteger { field }),
                _ => Err(Error::ExpectedInteger { field }),
            }
        };

        let version: Version = elements[0].decode()?;

        Ok(RSAPrivateKey {
            version,
            modulus: get_integer(1, "modulus")?,
            public_exponent: get_integer(2, "publicExponent")?,
            private_exponent: get_integer(3, "privateExponent")?,
            prime1: get_integer(4, "prime1")?,
            prime2: get_integer(5, "prime2")?,
            exponent1: get_integer(6, "exponent1")?,
            exponent2: get_integer(7, "exponent2")?,
            coefficient: get_integer(8, "coefficient")?,
        })
    }
}

impl EncodableTo<RSAPrivateKey> for Element {}

impl Encoder<RSAPrivateKey, Element> for RSAPrivateKey {
    type Error = Error;

    fn encode(&self) -> Result<Element> {
        Ok(Element::Sequence(vec![
            Element::Integer(Integer::from(self.version)),
            Element::Integer(Integer::from(&self.modulus)),
            Element::Integer(Integer::from(&self.public_exponent)),
            Element::Integer(Integer::from(&self.private_exponent)),
            Element::Integer(Integer::from(&self.prime1)),
            Element::Integer(Integer::from(&self.prime2)),
            Element::Integer(Integer::from(&self.exponent1)),
            Element::Integer(Integer::from(&self.exponent2)),
            Element::Integer(Integer::from(&self.coefficient)),
        ]))
    }
}

// DER bytes -> RSAPrivateKey
impl DecodableFrom<&[u8]> for RSAPrivateKey {}

impl Decoder<&[u8], RSAPrivateKey> for &[u8] {
    type Error = Error;

    fn decode(&self) -> Result<RSAPrivateKey> {
        let element = crate::single_element(self)?;
        element.decode()
    }
}

impl EncodableTo<RSAPrivateKey> for Vec<u8> {}

impl Encoder<RSAPrivateKey, Vec<u8>> for RSAPrivateKey {
    type Error = Error;

    fn encode(&self) -> Result<Vec<u8>> {
        let element: Element = self.encode()?;
        Ok(crate::element_to_der(element)?)
    }
}

#[cfg(test)]
mod tests {
    use asn1::{Element, Integer};
    use kagi::decoder::Decoder;
    use kagi::encoder::Encoder;
    use num_bigint::BigUint;
    use rstest::rstest;

    use super::*;

    // p = 61, q = 53, n = 3233, e = 17, d = 2753, iqmp = 38
    fn toy_key() -> RSAPrivateKey {
        RSAPrivateKey::from_components(
            BigUint::from(3233u32),
            BigUint::from(17u32),
            BigUint::from(2753u32),
            BigUint::from(61u32),
            BigUint::from(53u32),
            BigUint::from(38u32),
        )
        .unwrap()
    }

    #[test]
    fn test_from_components_computes_exponents() {
        let key = toy_key();
        assert_eq!(BigUint::from(53u32), key.exponent1);
        assert_eq!(BigUint::from(49u32), key.exponent2);
        assert_eq!(12, key.key_size());
    }

    #[test]
    fn test_der_round_trip() {
        let key = toy_key();
        let der: Vec<u8> = key.encode().unwrap();
        assert_eq!(0x30, der[0]);
        // version INTEGER 0 follows the sequence header
        assert_eq!(&[0x02, 0x01, 0x00], &der[2..5]);

        let decoded: RSAPrivateKey = der.as_slice().decode().unwrap();
        assert_eq!(key, decoded);
    }

    #[rstest(element,
        case(Element::Null),
        case(Element::Sequence(vec![Element::Integer(Integer::from(0i64)); 8])),
        case(Element::Sequence(vec![Element::Integer(Integer::from(2i64)); 9])),
        case(Element::Sequence({
            let mut v = vec![Element::Integer(Integer::from(0i64)); 9];
            v[3] = Element::Null;
            v
        })),
        case(Element::Sequence({
            let mut v = vec![Element::Integer(Integer::from(0i64)); 9];
            v[1] = Element::Integer(Integer::from(-5i64));
            v
        })),
    )]
    fn test_decode_rejects(element: Element) {
        let result: Result<RSAPrivateKey> = element.decode();
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_rejects_trailing_element() {
        let mut der: Vec<u8> = toy_key().encode().unwrap();
        der.extend_from_slice(&[0x05, 0x00]);
        let result: Result<RSAPrivateKey> = der.as_slice().decode();
        assert!(matches!(
            result,
            Err(Error::Asn1(asn1::error::Error::UnexpectedElementCount(2)))
        ));
    }
}
