use kagi::decoder::{DecodableFrom, Decoder};
use kagi::encoder::{EncodableTo, Encoder};
use nom::error::{ErrorKind, ParseError};
use nom::{IResult, Parser};

pub mod error;

use error::Error;

/// Constructed bit of an identifier octet.
pub const TAG_CONSTRUCTED: u8 = 0x20;
const TAG_CLASS_CONTEXT_SPECIFIC: u8 = 0x80;
const TAG_CLASS_MASK: u8 = 0xc0;
const TAG_NUMBER_MASK: u8 = 0x1f;

// Garbage input (a wrong legacy passphrase) must not recurse without bound.
const MAX_DEPTH: usize = 32;

/// A sequence of top-level TLVs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Der {
    elements: Vec<Tlv>,
}

impl Der {
    pub fn new(elements: Vec<Tlv>) -> Self {
        Der { elements }
    }

    pub fn elements(&self) -> &[Tlv] {
        &self.elements
    }
}

// Only the universal tags private key structures use are named.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tag {
    Integer,
    BitString,
    OctetString,
    Null,
    ObjectIdentifier,
    Sequence,
    Set,
    ContextSpecific { slot: u8, constructed: bool },
    Unimplemented(u8),
}

impl From<u8> for Tag {
    fn from(value: u8) -> Self {
        match value {
            0x02 => Self::Integer,
            0x03 => Self::BitString,
            0x04 => Self::OctetString,
            0x05 => Self::Null,
            0x06 => Self::ObjectIdentifier,
            0x30 => Self::Sequence,
            0x31 => Self::Set,
            v if v & TAG_CLASS_MASK == TAG_CLASS_CONTEXT_SPECIFIC => Self::ContextSpecific {
                slot: v & TAG_NUMBER_MASK,
                constructed: v & TAG_CONSTRUCTED != 0,
            },
            _ => Tag::Unimplemented(value),
        }
    }
}

impl From<Tag> for u8 {
    fn from(tag: Tag) -> Self {
        match tag {
            Tag::Integer => 0x02,
            Tag::BitString => 0x03,
            Tag::OctetString => 0x04,
            Tag::Null => 0x05,
            Tag::ObjectIdentifier => 0x06,
            Tag::Sequence => 0x30,
            Tag::Set => 0x31,
            Tag::ContextSpecific { slot, constructed } => {
                let c = if constructed { TAG_CONSTRUCTED } else { 0 };
                TAG_CLASS_CONTEXT_SPECIFIC | c | (slot & TAG_NUMBER_MASK)
            }
            Tag::Unimplemented(v) => v,
        }
    }
}

impl Tag {
    pub fn is_constructed(&self) -> bool {
        u8::from(*self) & TAG_CONSTRUCTED != 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tlv {
    tag: Tag,
    value: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Tlv(Vec<Tlv>),
    Data(Vec<u8>),
}

impl Tlv {
    pub fn new_primitive(tag: Tag, data: Vec<u8>) -> Self {
        Tlv {
            tag,
            value: Value::Data(data),
        }
    }

    pub fn new_constructed(tag: Tag, tlvs: Vec<Tlv>) -> Self {
        Tlv {
            tag,
            value: Value::Tlv(tlvs),
        }
    }

    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// Content octets of a primitive TLV.
    pub fn data(&self) -> Option<&[u8]> {
        match &self.value {
            Value::Data(d) => Some(d),
            Value::Tlv(_) => None,
        }
    }

    /// Children of a constructed TLV.
    pub fn tlvs(&self) -> Option<&[Tlv]> {
        match &self.value {
            Value::Tlv(t) => Some(t),
            Value::Data(_) => None,
        }
    }

    fn parse(input: &[u8]) -> IResult<&[u8], Tlv> {
        Self::parse_nested(input, 0)
    }

    fn parse_nested(input: &[u8], depth: usize) -> IResult<&[u8], Tlv> {
        if depth > MAX_DEPTH {
            return Err(nom::Err::Failure(nom::error::Error::from_error_kind(
                input,
                ErrorKind::TooLarge,
            )));
        }
        let (input, tag) = parse_tag(input)?;
        let (input, length) = parse_length(input)?;
        let (input, data) = take(input, length)?;

        if tag.is_constructed() {
            // parse TLV recursively.
            let mut tlvs = Vec::new();
            let mut data = data;
            while !data.is_empty() {
                let (rest, v) = Self::parse_nested(data, depth + 1)?;
                data = rest;
                tlvs.push(v);
            }
            return Ok((input, Tlv::new_constructed(tag, tlvs)));
        }

        Ok((input, Tlv::new_primitive(tag, data.to_vec())))
    }

    fn write(&self, out: &mut Vec<u8>) {
        out.push(u8::from(self.tag));
        match &self.value {
            Value::Data(data) => {
                write_length(out, data.len());
                out.extend_from_slice(data);
            }
            Value::Tlv(tlvs) => {
                let mut content = Vec::new();
                for tlv in tlvs {
                    tlv.write(&mut content);
                }
                write_length(out, content.len());
                out.extend_from_slice(&content);
            }
        }
    }
}

fn take(input: &[u8], length: usize) -> IResult<&[u8], &[u8]> {
    nom::bytes::complete::take(length).parse(input)
}

fn be_u8(input: &[u8]) -> IResult<&[u8], u8> {
    nom::number::complete::be_u8(input)
}

fn parse_tag(input: &[u8]) -> IResult<&[u8], Tag> {
    let (input, n) = be_u8(input)?;
    if n & TAG_NUMBER_MASK == TAG_NUMBER_MASK {
        // high-tag-number form never appears in key structures
        return Err(nom::Err::Error(nom::error::Error::from_error_kind(
            input,
            ErrorKind::Tag,
        )));
    }
    Ok((input, Tag::from(n)))
}

fn parse_length(input: &[u8]) -> IResult<&[u8], usize> {
    let (input, n) = be_u8(input)?;
    if n & 0x80 == 0x80 {
        // long form
        // First 1 bit is a marker for long form.
        // Other bits represent bytes length of the length field.
        let count = (n & 0x7f) as usize;
        if count == 0 || count > std::mem::size_of::<usize>() {
            // 0x80 is the BER indefinite form, which DER forbids.
            return Err(nom::Err::Error(nom::error::Error::from_error_kind(
                input,
                ErrorKind::LengthValue,
            )));
        }
        let (input, bs) = take(input, count)?;
        let n = bs.iter().fold(0usize, |n, &b| (n << 8) | b as usize);
        return Ok((input, n));
    }
    // short form: 0-127
    Ok((input, n as usize))
}

fn write_length(out: &mut Vec<u8>, length: usize) {
    if length < 0x80 {
        out.push(length as u8);
        return;
    }
    let bytes = length.to_be_bytes();
    let skip = bytes.iter().take_while(|&&b| b == 0).count();
    out.push(0x80 | (bytes.len() - skip) as u8);
    out.extend_from_slice(&bytes[skip..]);
}

impl DecodableFrom<&[u8]> for Der {}

impl Decoder<&[u8], Der> for &[u8] {
    type Error = Error;

    fn decode(&self) -> Result<Der, Self::Error> {
        let mut input = *self;
        let mut elements = Vec::new();
        while !input.is_empty() {
            let (rest, tlv) = Tlv::parse(input)?;
            input = rest;
            elements.push(tlv);
        }
        if elements.is_empty() {
            return Err(Error::Empty);
        }
        Ok(Der { elements })
    }
}

impl DecodableFrom<Vec<u8>> for Der {}

impl Decoder<Vec<u8>, Der> for Vec<u8> {
    type Error = Error;

    fn decode(&self) -> Result<Der, Self::Error> {
        self.as_slice().decode()
    }
}

impl EncodableTo<Der> for Vec<u8> {}

impl Encoder<Der, Vec<u8>> for Der {
    type Error = Error;

    fn encode(&self) -> Result<Vec<u8>, Self::Error> {
        let mut out = Vec::new();
        for tlv in &self.elements {
            if let Tag::Unimplemented(_) = tlv.tag {
                return Err(Error::UnencodableTag(tlv.tag));
            }
            tlv.write(&mut out);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use kagi::decoder::Decoder;
    use kagi::encoder::Encoder;
    use rstest::rstest;

    use crate::error::Error;
    use crate::{Der, Tag, Tlv, parse_length, parse_tag};

    #[rstest(input, expected,
        case(vec![0x02], Tag::Integer),
        case(vec![0x02, 0x01], Tag::Integer),
        case(vec![0x30, 0x01], Tag::Sequence),
        case(vec![0xa0, 0x0a], Tag::ContextSpecific { slot: 0, constructed: true }),
        case(vec![0xa1, 0x44], Tag::ContextSpecific { slot: 1, constructed: true }),
        case(vec![0x81, 0x01], Tag::ContextSpecific { slot: 1, constructed: false }),
        case(vec![0x0c], Tag::Unimplemented(0x0c)),
    )]
    fn test_parse_tag(input: Vec<u8>, expected: Tag) {
        let actual = parse_tag(&input).unwrap();
        assert_eq!(expected, actual.1);
        assert_eq!(input[0], u8::from(actual.1));
    }

    #[rstest(input, expected,
        case(vec![0x02], 0x02),
        case(vec![0x7f], 0x7f),
        case(vec![0x81, 0x80], 0x80),
        case(vec![0x82, 0x02, 0x10], 256 * 0x02 + 0x10),
        case(vec![0x83, 0x01, 0x00, 0x00], 256 * 256),
        case(vec![0x82, 0xff, 0xff], 256 * 0xff + 0xff),
    )]
    fn test_parse_length(input: Vec<u8>, expected: usize) {
        let actual = parse_length(&input).unwrap();
        assert_eq!(expected, actual.1);

        let mut written = Vec::new();
        crate::write_length(&mut written, expected);
        let (rest, reparsed) = parse_length(&written).unwrap();
        assert!(rest.is_empty());
        assert_eq!(expected, reparsed);
    }

    #[rstest(input,
        case(vec![0x80]),
        case(vec![0x82, 0x01]),
    )]
    fn test_parse_length_rejects(input: Vec<u8>) {
        assert!(parse_length(&input).is_err());
    }

    #[rstest(input, expected,
        case(vec![0x02, 0x01, 0x01], Tlv::new_primitive(Tag::Integer, vec![0x01])),
        case(vec![0x02, 0x09, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01], Tlv::new_primitive(Tag::Integer, vec![0x00, 0x80, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01])),
        case(vec![0x06, 0x08, 0x2a, 0x86, 0x48, 0xce, 0x3d, 0x03, 0x01, 0x07], Tlv::new_primitive(Tag::ObjectIdentifier, vec![0x2a, 0x86, 0x48, 0xce, 0x3d, 0x03, 0x01, 0x07])),
        case(vec![0x05, 0x00], Tlv::new_primitive(Tag::Null, vec![])),
        case(vec![0x04, 0x04, 0x03, 0x02, 0x06, 0xa0], Tlv::new_primitive(Tag::OctetString, vec![0x03, 0x02, 0x06, 0xa0])),
        case(vec![0x03, 0x04, 0x00, 0x04, 0x5d, 0xc0], Tlv::new_primitive(Tag::BitString, vec![0x00, 0x04, 0x5d, 0xc0])),
        case(vec![0x30, 0x09, 0x02, 0x01, 0x07, 0x02, 0x01, 0x08, 0x02, 0x01, 0x09], Tlv::new_constructed(Tag::Sequence, vec![
            Tlv::new_primitive(Tag::Integer, vec![0x07]),
            Tlv::new_primitive(Tag::Integer, vec![0x08]),
            Tlv::new_primitive(Tag::Integer, vec![0x09]),
        ])),
        case(vec![0xa0, 0x03, 0x02, 0x01, 0x01], Tlv::new_constructed(Tag::ContextSpecific { slot: 0, constructed: true }, vec![
            Tlv::new_primitive(Tag::Integer, vec![0x01]),
        ])),
    )]
    fn test_tlv_parse_and_encode(input: Vec<u8>, expected: Tlv) {
        let der: Der = input.decode().unwrap();
        assert_eq!(&[expected], der.elements());

        let encoded: Vec<u8> = der.encode().unwrap();
        assert_eq!(input, encoded);
    }

    #[test]
    fn test_encode_long_form_length() {
        let der = Der::new(vec![Tlv::new_primitive(Tag::OctetString, vec![0xab; 300])]);
        let encoded: Vec<u8> = der.encode().unwrap();
        assert_eq!(&[0x04, 0x82, 0x01, 0x2c], &encoded[..4]);
        assert_eq!(304, encoded.len());
    }

    #[rstest(input,
        case(vec![]),
        case(vec![0x30, 0x05, 0x02, 0x01]),
        case(vec![0x30, 0x03, 0x02, 0x05, 0x00]),
    )]
    fn test_decode_malformed(input: Vec<u8>) {
        let result: Result<Der, Error> = input.decode();
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_nesting_limit() {
        // 40 nested SEQUENCEs, each wrapping the next
        let mut bytes = vec![0x05, 0x00];
        for _ in 0..40 {
            let mut outer = vec![0x30, bytes.len() as u8];
            outer.extend_from_slice(&bytes);
            bytes = outer;
        }
        let result: Result<Der, Error> = bytes.decode();
        assert_eq!(Err(Error::Parser(nom::error::ErrorKind::TooLarge)), result);
    }
}
