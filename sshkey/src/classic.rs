//! Classic single-key PEM: `RSA PRIVATE KEY`, `EC PRIVATE KEY` and
//! `DSA PRIVATE KEY`, optionally under RFC 1421 legacy encryption.
//!
//! Legacy encryption stores the cipher and IV in a `DEK-Info` header and
//! derives the key with OpenSSL's `EVP_BytesToKey` (one MD5 iteration,
//! salted with the first eight IV bytes). There is no integrity check, so a
//! wrong passphrase is recognised by bad PKCS#7 padding or by plaintext that
//! does not parse as a key.

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockCipher, BlockDecryptMut, BlockEncryptMut, KeyInit, KeyIvInit};
use aes::{Aes128, Aes192, Aes256};
use kagi::decoder::Decoder;
use md5::{Digest, Md5};
use pem::{DEK_INFO_HEADER, Label, PROC_TYPE_HEADER, Pem};
use rand::{CryptoRng, RngCore};
use tracing::debug;
use zeroize::Zeroizing;

use crate::error::{Error, Result};
use crate::key::KeyMaterial;

const PROC_TYPE_ENCRYPTED: &str = "4,ENCRYPTED";
const AES_BLOCK_SIZE: usize = 16;
const SALT_LEN: usize = 8;
const KDF_NAME: &str = "EVP_BytesToKey";

/// Legacy PEM ciphers this codec decrypts. Encoding always uses AES-128-CBC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyCipher {
    Aes128Cbc,
    Aes192Cbc,
    Aes256Cbc,
}

impl LegacyCipher {
    pub fn name(&self) -> &'static str {
        match self {
            LegacyCipher::Aes128Cbc => "AES-128-CBC",
            LegacyCipher::Aes192Cbc => "AES-192-CBC",
            LegacyCipher::Aes256Cbc => "AES-256-CBC",
        }
    }

    pub fn key_len(&self) -> usize {
        match self {
            LegacyCipher::Aes128Cbc => 16,
            LegacyCipher::Aes192Cbc => 24,
            LegacyCipher::Aes256Cbc => 32,
        }
    }

    fn from_name(name: &str) -> Result<Self> {
        match name {
            "AES-128-CBC" => Ok(LegacyCipher::Aes128Cbc),
            "AES-192-CBC" => Ok(LegacyCipher::Aes192Cbc),
            "AES-256-CBC" => Ok(LegacyCipher::Aes256Cbc),
            other => Err(Error::UnknownCipherOrKdf {
                cipher: other.to_string(),
                kdf: KDF_NAME.to_string(),
            }),
        }
    }
}

/// Parsed `DEK-Info` header.
#[derive(Debug, Clone, PartialEq, Eq)]
struct DekInfo {
    cipher: LegacyCipher,
    iv: [u8; AES_BLOCK_SIZE],
}

impl DekInfo {
    fn from_pem(pem: &Pem) -> Result<Self> {
        match pem.header(PROC_TYPE_HEADER) {
            Some(PROC_TYPE_ENCRYPTED) => {}
            other => {
                return Err(pem::error::Error::InvalidHeader(format!(
                    "{}: {}",
                    PROC_TYPE_HEADER,
                    other.unwrap_or_default()
                ))
                .into());
            }
        }
        let value = pem.header(DEK_INFO_HEADER).ok_or_else(|| {
            pem::error::Error::InvalidHeader(format!("missing {}", DEK_INFO_HEADER))
        })?;
        let (name, iv_hex) = value
            .split_once(',')
            .ok_or_else(|| pem::error::Error::InvalidHeader(value.to_string()))?;
        let cipher = LegacyCipher::from_name(name.trim())?;
        let iv = hex::decode(iv_hex.trim())
            .ok()
            .and_then(|iv| <[u8; AES_BLOCK_SIZE]>::try_from(iv).ok())
            .ok_or_else(|| pem::error::Error::InvalidHeader(value.to_string()))?;
        Ok(DekInfo { cipher, iv })
    }
}

/// OpenSSL `EVP_BytesToKey` with MD5 and a single iteration.
pub fn evp_bytes_to_key(passphrase: &[u8], salt: &[u8], key_len: usize) -> Zeroizing<Vec<u8>> {
    let mut key = Zeroizing::new(Vec::with_capacity(key_len + 16));
    let mut prev: Option<Zeroizing<Vec<u8>>> = None;
    while key.len() < key_len {
        let mut md5 = Md5::new();
        if let Some(prev) = &prev {
            md5.update(prev.as_slice());
        }
        md5.update(passphrase);
        md5.update(salt);
        let digest = Zeroizing::new(md5.finalize().to_vec());
        key.extend_from_slice(&digest);
        prev = Some(digest);
    }
    key.truncate(key_len);
    key
}

fn cbc_decrypt<C>(key: &[u8], iv: &[u8], buf: &mut [u8]) -> Result<usize>
where
    C: BlockCipher + BlockDecryptMut + KeyInit,
{
    let plain = cbc::Decryptor::<C>::new_from_slices(key, iv)
        .map_err(|_| Error::Cipher("invalid key or IV length"))?
        .decrypt_padded_mut::<Pkcs7>(buf)
        .map_err(|_| {
            debug!("legacy PEM padding check failed");
            Error::IncorrectPassphrase
        })?;
    Ok(plain.len())
}

fn cbc_encrypt<C>(key: &[u8], iv: &[u8], plain: &[u8]) -> Result<Vec<u8>>
where
    C: BlockCipher + BlockEncryptMut + KeyInit,
{
    let padded_len = (plain.len() / AES_BLOCK_SIZE + 1) * AES_BLOCK_SIZE;
    let mut buf = vec![0u8; padded_len];
    buf[..plain.len()].copy_from_slice(plain);
    cbc::Encryptor::<C>::new_from_slices(key, iv)
        .map_err(|_| Error::Cipher("invalid key or IV length"))?
        .encrypt_padded_mut::<Pkcs7>(&mut buf, plain.len())
        .map_err(|_| Error::Cipher("buffer too small for padding"))?;
    Ok(buf)
}

fn decrypt(pem: &Pem, body: &[u8], passphrase: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    let dek = DekInfo::from_pem(pem)?;
    if body.is_empty() || body.len() % AES_BLOCK_SIZE != 0 {
        return Err(Error::Cipher(
            "encrypted PEM data is not a multiple of the block size",
        ));
    }
    debug!(cipher = dek.cipher.name(), "decrypting legacy PEM");
    let key = evp_bytes_to_key(passphrase, &dek.iv[..SALT_LEN], dek.cipher.key_len());
    let mut buf = Zeroizing::new(body.to_vec());
    let len = match dek.cipher {
        LegacyCipher::Aes128Cbc => cbc_decrypt::<Aes128>(&key, &dek.iv, &mut buf)?,
        LegacyCipher::Aes192Cbc => cbc_decrypt::<Aes192>(&key, &dek.iv, &mut buf)?,
        LegacyCipher::Aes256Cbc => cbc_decrypt::<Aes256>(&key, &dek.iv, &mut buf)?,
    };
    buf.truncate(len);
    Ok(buf)
}

/// Encodes `key` in its classic PEM layout, AES-128-CBC encrypted when a
/// non-empty passphrase is given.
pub fn encode<R: RngCore + CryptoRng>(
    key: &KeyMaterial,
    passphrase: Option<&[u8]>,
    rng: &mut R,
) -> Result<String> {
    let (label, der) = key.to_classic()?;
    let der = Zeroizing::new(der);
    let pem = match passphrase.filter(|p| !p.is_empty()) {
        None => Pem::from_bytes(label, &der),
        Some(passphrase) => {
            let cipher = LegacyCipher::Aes128Cbc;
            let mut iv = [0u8; AES_BLOCK_SIZE];
            rng.fill_bytes(&mut iv);
            let key = evp_bytes_to_key(passphrase, &iv[..SALT_LEN], cipher.key_len());
            let encrypted = cbc_encrypt::<Aes128>(&key, &iv, &der)?;
            Pem::from_bytes(label, &encrypted)
                .with_header(PROC_TYPE_HEADER, PROC_TYPE_ENCRYPTED)
                .with_header(
                    DEK_INFO_HEADER,
                    &format!("{},{}", cipher.name(), hex::encode_upper(iv)),
                )
        }
    };
    debug!(label = %pem.label(), encrypted = pem.is_encrypted(), "encoded classic PEM");
    Ok(format!("{}\n", pem))
}

/// Decodes a classic PEM block.
///
/// After a legacy decrypt any failure to read a valid key is reported as
/// [`Error::IncorrectPassphrase`]. Unencrypted blocks report the parse error.
pub fn decode(pem: &Pem, passphrase: Option<&[u8]>) -> Result<KeyMaterial> {
    if !matches!(
        pem.label(),
        Label::RSAPrivateKey | Label::ECPrivateKey | Label::DSAPrivateKey
    ) {
        return Err(Error::UnsupportedKeyType(pem.label().to_string()));
    }
    let body: Zeroizing<Vec<u8>> = Zeroizing::new(pem.decode()?);

    if !pem.is_encrypted() {
        let key = KeyMaterial::from_classic(pem.label(), &body)?;
        key.validate()?;
        return Ok(key);
    }

    let Some(passphrase) = passphrase.filter(|p| !p.is_empty()) else {
        debug!("encrypted PEM without a passphrase");
        return Err(Error::IncorrectPassphrase);
    };
    let der = decrypt(pem, &body, passphrase)?;
    let parsed = KeyMaterial::from_classic(pem.label(), &der)
        .and_then(|key| key.validate().map(|_| key));
    match parsed {
        Ok(key) => Ok(key),
        Err(Error::UnsupportedKeyType(t)) => Err(Error::UnsupportedKeyType(t)),
        Err(e) => {
            debug!(error = %e, "decrypted PEM is not a valid key");
            Err(Error::IncorrectPassphrase)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rstest::rstest;

    use super::*;
    use crate::key::Ed25519Key;
    use crate::key::tests::{toy_dsa, toy_ec, toy_rsa};

    fn rng() -> StdRng {
        StdRng::seed_from_u64(11)
    }

    #[rstest(salt, key_len, expected,
        case(&[0u8, 1, 2, 3, 4, 5, 6, 7], 16, "b03096345e805d3aa4392d2e72791dfb"),
        case(&[0u8, 1, 2, 3, 4, 5, 6, 7], 32, "b03096345e805d3aa4392d2e72791dfb13e12d3f61094a3fc347ace86b99ada6"),
        case(&[0u8, 1, 2, 3, 4, 5, 6, 7], 24, "b03096345e805d3aa4392d2e72791dfb13e12d3f61094a3f"),
    )]
    fn test_evp_bytes_to_key(salt: &[u8], key_len: usize, expected: &str) {
        let key = evp_bytes_to_key(b"password", salt, key_len);
        assert_eq!(expected, hex::encode(key.as_slice()));
    }

    #[rstest(key, label, passphrase,
        case(KeyMaterial::Rsa(toy_rsa()), "RSA PRIVATE KEY", None),
        case(KeyMaterial::Rsa(toy_rsa()), "RSA PRIVATE KEY", Some(b"correct-phrase".as_slice())),
        case(KeyMaterial::Dsa(toy_dsa()), "DSA PRIVATE KEY", None),
        case(KeyMaterial::Dsa(toy_dsa()), "DSA PRIVATE KEY", Some(b"correct-phrase".as_slice())),
        case(KeyMaterial::Ec(toy_ec()), "EC PRIVATE KEY", None),
        case(KeyMaterial::Ec(toy_ec()), "EC PRIVATE KEY", Some(b"correct-phrase".as_slice())),
    )]
    fn test_round_trip(key: KeyMaterial, label: &str, passphrase: Option<&[u8]>) {
        let encoded = encode(&key, passphrase, &mut rng()).unwrap();
        assert!(encoded.starts_with(&format!("-----BEGIN {}-----\n", label)));
        let pem = Pem::from_str(&encoded).unwrap();
        assert_eq!(passphrase.is_some(), pem.is_encrypted());
        assert_eq!(key, decode(&pem, passphrase).unwrap());
    }

    #[test]
    fn test_encrypted_headers() {
        let encoded = encode(&KeyMaterial::Rsa(toy_rsa()), Some(b"pw".as_slice()), &mut rng()).unwrap();
        let pem = Pem::from_str(&encoded).unwrap();
        assert_eq!(Some("4,ENCRYPTED"), pem.header(PROC_TYPE_HEADER));
        let dek = pem.header(DEK_INFO_HEADER).unwrap();
        let (name, iv) = dek.split_once(',').unwrap();
        assert_eq!("AES-128-CBC", name);
        assert_eq!(32, iv.len());
        assert_eq!(iv.to_uppercase(), iv);
    }

    #[rstest(key,
        case(KeyMaterial::Rsa(toy_rsa())),
        case(KeyMaterial::Dsa(toy_dsa())),
        case(KeyMaterial::Ec(toy_ec())),
    )]
    fn test_wrong_passphrase(key: KeyMaterial) {
        let encoded = encode(&key, Some(b"right".as_slice()), &mut rng()).unwrap();
        let pem = Pem::from_str(&encoded).unwrap();
        for passphrase in [Some(b"wrong".as_slice()), Some(b"".as_slice()), None] {
            assert!(matches!(decode(&pem, passphrase), Err(Error::IncorrectPassphrase)));
        }
    }

    #[test]
    fn test_ed25519_rejected() {
        let key = KeyMaterial::Ed25519(Ed25519Key::from_seed([1; 32]));
        match encode(&key, None, &mut rng()) {
            Err(Error::UnsupportedKeyType(msg)) => assert_eq!("ed25519 keys must use OpenSSHv1", msg),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unencrypted_structural_error_is_surfaced() {
        let pem = Pem::from_bytes(Label::RSAPrivateKey, &[0x30, 0x03, 0x02, 0x01, 0x00]);
        assert!(matches!(decode(&pem, None), Err(Error::Pkcs(_))));
    }

    #[test]
    fn test_unencrypted_invalid_key() {
        let mut key = toy_rsa();
        key.d += 1u32;
        let encoded = encode(&KeyMaterial::Rsa(key), None, &mut rng()).unwrap();
        let pem = Pem::from_str(&encoded).unwrap();
        assert!(matches!(decode(&pem, None), Err(Error::InvalidKey(_))));
    }

    #[rstest(dek, expected_cipher,
        case("DES-EDE3-CBC,0011223344556677", "DES-EDE3-CBC"),
        case("AES-128-GCM,00112233445566778899aabbccddeeff", "AES-128-GCM"),
    )]
    fn test_unknown_legacy_cipher(dek: &str, expected_cipher: &str) {
        let pem = Pem::from_bytes(Label::RSAPrivateKey, &[0u8; 32])
            .with_header(PROC_TYPE_HEADER, PROC_TYPE_ENCRYPTED)
            .with_header(DEK_INFO_HEADER, dek);
        match decode(&pem, Some(b"pw".as_slice())) {
            Err(Error::UnknownCipherOrKdf { cipher, .. }) => assert_eq!(expected_cipher, cipher),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[rstest(dek,
        case("AES-128-CBC"),
        case("AES-128-CBC,0011"),
        case("AES-128-CBC,zz112233445566778899aabbccddeeff"),
    )]
    fn test_malformed_dek_info(dek: &str) {
        let pem = Pem::from_bytes(Label::RSAPrivateKey, &[0u8; 32])
            .with_header(PROC_TYPE_HEADER, PROC_TYPE_ENCRYPTED)
            .with_header(DEK_INFO_HEADER, dek);
        assert!(matches!(decode(&pem, Some(b"pw".as_slice())), Err(Error::Pem(_))));
    }

    #[test]
    fn test_unsupported_label() {
        let pem = Pem::from_bytes(Label::PrivateKey, &[0x30, 0x00]);
        assert!(matches!(decode(&pem, None), Err(Error::UnsupportedKeyType(_))));
    }
}
