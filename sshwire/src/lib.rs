//! SSH wire primitives (RFC 4251 section 5).
//!
//! Every structured field of an OpenSSH key file is one of three encodings:
//! a big-endian `uint32`, a `string` (uint32 length followed by that many
//! bytes) or an `mpint` (a `string` holding a two's complement big-endian
//! integer). [`Reader`] consumes them with bounds checks and [`Writer`]
//! produces them.

use nom::{IResult, Parser};
use num_bigint::BigUint;

pub mod error;

pub use error::{Error, Result};

fn take(input: &[u8], len: usize) -> IResult<&[u8], &[u8]> {
    nom::bytes::complete::take(len).parse(input)
}

/// `uint32`
pub fn be_u32(input: &[u8]) -> IResult<&[u8], u32> {
    nom::number::complete::be_u32(input)
}

/// `string`, as raw bytes.
pub fn string(input: &[u8]) -> IResult<&[u8], &[u8]> {
    let (input, len) = be_u32(input)?;
    take(input, len as usize)
}

/// Cursor over a wire-encoded buffer.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    input: &'a [u8],
}

impl<'a> Reader<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Reader { input }
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let (rest, v) = be_u32(self.input)?;
        self.input = rest;
        Ok(v)
    }

    pub fn read_string(&mut self) -> Result<&'a [u8]> {
        let (rest, v) = string(self.input)?;
        self.input = rest;
        Ok(v)
    }

    /// A `string` that must be UTF-8, such as an algorithm name or comment.
    pub fn read_str(&mut self) -> Result<&'a str> {
        let bytes = self.read_string()?;
        std::str::from_utf8(bytes).map_err(|_| Error::InvalidUtf8)
    }

    /// A non-negative `mpint`. Leading zero bytes are tolerated.
    pub fn read_mpint(&mut self) -> Result<BigUint> {
        let bytes = self.read_string()?;
        match bytes.first() {
            Some(b) if b & 0x80 != 0 => Err(Error::NegativeMpint),
            _ => Ok(BigUint::from_bytes_be(bytes)),
        }
    }

    /// Unread bytes.
    pub fn remaining(&self) -> &'a [u8] {
        self.input
    }

    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }

    /// Fails if anything is left unread.
    pub fn finish(self) -> Result<()> {
        if self.input.is_empty() {
            Ok(())
        } else {
            Err(Error::TrailingData(self.input.len()))
        }
    }
}

/// Growable buffer of wire-encoded fields.
#[derive(Debug, Clone, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn put_string(&mut self, v: &[u8]) -> Result<()> {
        let len = u32::try_from(v.len()).map_err(|_| Error::TooLong(v.len()))?;
        self.put_u32(len);
        self.buf.extend_from_slice(v);
        Ok(())
    }

    pub fn put_str(&mut self, v: &str) -> Result<()> {
        self.put_string(v.as_bytes())
    }

    /// Zero encodes as an empty string; a set high bit gets a 0x00 prefix.
    pub fn put_mpint(&mut self, v: &BigUint) -> Result<()> {
        if v.bits() == 0 {
            return self.put_string(&[]);
        }
        let bytes = v.to_bytes_be();
        if bytes[0] & 0x80 != 0 {
            let mut prefixed = Vec::with_capacity(bytes.len() + 1);
            prefixed.push(0);
            prefixed.extend_from_slice(&bytes);
            self.put_string(&prefixed)
        } else {
            self.put_string(&bytes)
        }
    }

    /// Appends bytes with no length prefix.
    pub fn put_raw(&mut self, v: &[u8]) {
        self.buf.extend_from_slice(v);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}
