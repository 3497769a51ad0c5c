use asn1::{Element, Integer};
use kagi::decoder::{DecodableFrom, Decoder};
use kagi::encoder::{EncodableTo, Encoder};
use num_bigint::BigUint;
use num_traits::Zero;

use super::error::{Error, Result};

/*
OpenSSL DSA private key (no RFC; the layout OpenSSL writes for "DSA PRIVATE KEY")

DSAPrivateKey ::= SEQUENCE {
    version  INTEGER,  -- 0
    p        INTEGER,
    q        INTEGER,
    g        INTEGER,
    y        INTEGER,  -- public value
    x        INTEGER   -- private value
}
*/

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DsaPrivateKey {
    pub p: BigUint,
    pub q: BigUint,
    pub g: BigUint,
    pub y: BigUint,
    pub x: BigUint,
}

impl DecodableFrom<Element> for DsaPrivateKey {}

impl Decoder<Element, DsaPrivateKey> for Element {
    type Error = Error;

    fn decode(&self) -> Result<DsaPrivateKey> {
        let elements = match self {
            Element::Sequence(elements) => elements,
            _ => return Err(Error::ExpectedSequence),
        };
        let [version, p, q, g, y, x] = elements.as_slice() else {
            return Err(Error::InvalidElementCount(elements.len()));
        };

        let get_integer = |element: &Element, field: &'static str| -> Result<BigUint> {
            match element {
                Element::Integer(int) => int.to_biguint().ok_or(Error::ExpectedInteger(field)),
                _ => Err(Error::ExpectedInteger(field)),
            }
        };

        if !get_integer(version, "version")?.is_zero() {
            return Err(Error::InvalidVersion);
        }

        Ok(DsaPrivateKey {
            p: get_integer(p, "p")?,
            q: get_integer(q, "q")?,
            g: get_integer(g, "g")?,
            y: get_integer(y, "y")?,
            x: get_integer(x, "x")?,
        })
    }
}

impl EncodableTo<DsaPrivateKey> for Element {}

impl Encoder<DsaPrivateKey, Element> for DsaPrivateKey {
    type Error = Error;

    fn encode(&self) -> Result<Element> {
        Ok(Element::Sequence(vec![
            Element::Integer(Integer::from(0i64)),
            Element::Integer(Integer::from(&self.p)),
            Element::Integer(Integer::from(&self.q)),
            Element::Integer(Integer::from(&self.g)),
            Element::Integer(Integer::from(&self.y)),
            Element::Integer(Integer::from(&self.x)),
        ]))
    }
}

impl DecodableFrom<&[u8]> for DsaPrivateKey {}

impl Decoder<&[u8], DsaPrivateKey> for &[u8] {
    type Error = Error;

    fn decode(&self) -> Result<DsaPrivateKey> {
        let element = crate::single_element(self)?;
        element.decode()
    }
}

impl EncodableTo<DsaPrivateKey> for Vec<u8> {}

impl Encoder<DsaPrivateKey, Vec<u8>> for DsaPrivateKey {
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

    // p = 23, q = 11, g = 4, x = 3, y = 4^3 mod 23 = 18
    fn toy_key() -> DsaPrivateKey {
        DsaPrivateKey {
            p: BigUint::from(23u32),
            q: BigUint::from(11u32),
            g: BigUint::from(4u32),
            y: BigUint::from(18u32),
            x: BigUint::from(3u32),
        }
    }

    #[test]
    fn test_der_round_trip() {
        let key = toy_key();
        let der: Vec<u8> = key.encode().unwrap();
        assert_eq!(
            vec![
                0x30, 0x12, 0x02, 0x01, 0x00, 0x02, 0x01, 0x17, 0x02, 0x01, 0x0b, 0x02, 0x01,
                0x04, 0x02, 0x01, 0x12, 0x02, 0x01, 0x03
            ],
            der
        );
        let decoded: DsaPrivateKey = der.as_slice().decode().unwrap();
        assert_eq!(key, decoded);
    }

    #[rstest(element,
        case(Element::Null),
        case(Element::Sequence(vec![Element::Integer(Integer::from(0i64)); 5])),
        case(Element::Sequence(vec![Element::Integer(Integer::from(1i64)); 6])),
        case(Element::Sequence(vec![Element::Integer(Integer::from(0i64)); 7])),
        case(Element::Sequence({
            let mut v = vec![Element::Integer(Integer::from(0i64)); 6];
            v[5] = Element::Null;
            v
        })),
    )]
    fn test_decode_rejects(element: Element) {
        let result: Result<DsaPrivateKey> = element.decode();
        assert!(result.is_err());
    }
}
