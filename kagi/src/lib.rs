//! # kagi
//!
//! Core traits for encoding and decoding in the kagi private key toolkit.
//!
//! This crate defines the `Decoder` and `Encoder` traits that every layer
//! of the toolkit implements, so a key file can be walked from text to key
//! material one typed step at a time.
//!
//! ## Overview
//!
//! Two pipelines share these traits:
//! ```text
//! PEM → Vec<u8> → DER → ASN1Object → RSAPrivateKey     (classic PEM)
//! PEM → Vec<u8> → Container → InnerKeyRecord            (openssh-key-v1)
//! ```
//!
//! Each step uses `Decoder` to move towards key material, and `Encoder`
//! to move back towards bytes.
//!
//! ## Type Safety
//!
//! The traits use marker traits (`DecodableFrom` and `EncodableTo`) so that
//! only conversions someone declared can be requested. An attempt to decode
//! a `Pem` straight into a `Container` is a compile error, not a runtime one.
//!
//! ## Example
//!
//! ```ignore
//! use kagi::decoder::Decoder;
//! use der::Der;
//! use asn1::ASN1Object;
//!
//! let bytes = vec![0x30, 0x03, 0x02, 0x01, 0x00];
//! let der: Der = bytes.decode().unwrap();
//! let asn1: ASN1Object = der.decode().unwrap();
//! ```

#![forbid(unsafe_code)]

pub mod decoder;
pub mod encoder;
