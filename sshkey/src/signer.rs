//! SSH signatures from a decoded private key.
//!
//! Signatures are returned in SSH wire form: `string algorithm, string blob`.

use dsa::signature::RandomizedDigestSigner;
use ed25519_dalek::{Signer as _, SigningKey};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use rsa::RsaPrivateKey;
use rsa::pkcs1v15::SigningKey as RsaSigningKey;
use rsa::signature::{RandomizedSigner, SignatureEncoding};
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};
use sshwire::Writer;

use crate::error::{Error, Result};
use crate::key::{DsaKey, Ed25519Key, KeyMaterial, RsaKey};

const DSS_INTEGER_LEN: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    RsaSha256,
    RsaSha512,
    Ed25519,
    Dss,
}

impl SignatureAlgorithm {
    pub fn name(&self) -> &'static str {
        match self {
            SignatureAlgorithm::RsaSha256 => "rsa-sha2-256",
            SignatureAlgorithm::RsaSha512 => "rsa-sha2-512",
            SignatureAlgorithm::Ed25519 => "ssh-ed25519",
            SignatureAlgorithm::Dss => "ssh-dss",
        }
    }
}

impl std::str::FromStr for SignatureAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "rsa-sha2-256" => Ok(SignatureAlgorithm::RsaSha256),
            "rsa-sha2-512" => Ok(SignatureAlgorithm::RsaSha512),
            "ssh-ed25519" => Ok(SignatureAlgorithm::Ed25519),
            "ssh-dss" => Ok(SignatureAlgorithm::Dss),
            other => Err(Error::UnsupportedKeyType(other.to_string())),
        }
    }
}

/// A decoded private key that can sign.
#[derive(Debug, Clone)]
pub struct Signer {
    key: KeyMaterial,
}

impl Signer {
    /// EC keys decode but have no signer. DSA keys need the 160-bit
    /// subgroup that `ssh-dss` signatures are sized for.
    pub fn new(key: KeyMaterial) -> Result<Self> {
        match &key {
            KeyMaterial::Ec(_) => {
                return Err(Error::UnsupportedKeyType(format!(
                    "{} keys cannot sign",
                    key.key_type()
                )));
            }
            KeyMaterial::Dsa(k) if k.q.bits() != 160 => {
                return Err(Error::InvalidKey(format!(
                    "ssh-dss requires a 160-bit subgroup, got {} bits",
                    k.q.bits()
                )));
            }
            _ => {}
        }
        Ok(Signer { key })
    }

    pub fn key(&self) -> &KeyMaterial {
        &self.key
    }

    pub fn public_key_blob(&self) -> Result<Vec<u8>> {
        self.key.public_key_blob()
    }

    pub fn default_algorithm(&self) -> SignatureAlgorithm {
        match self.key {
            KeyMaterial::Rsa(_) => SignatureAlgorithm::RsaSha512,
            KeyMaterial::Ed25519(_) => SignatureAlgorithm::Ed25519,
            // Signer::new rejects EC
            KeyMaterial::Dsa(_) | KeyMaterial::Ec(_) => SignatureAlgorithm::Dss,
        }
    }

    /// Signs with the default algorithm and the operating system RNG.
    pub fn sign(&self, data: &[u8]) -> Result<Vec<u8>> {
        self.sign_with(self.default_algorithm(), data, &mut OsRng)
    }

    /// RSA signing is blinded with `rng`; DSA draws its nonce from it.
    pub fn sign_with<R: RngCore + CryptoRng>(
        &self,
        algorithm: SignatureAlgorithm,
        data: &[u8],
        rng: &mut R,
    ) -> Result<Vec<u8>> {
        let blob = match (&self.key, algorithm) {
            (KeyMaterial::Rsa(k), SignatureAlgorithm::RsaSha256) => {
                RsaSigningKey::<Sha256>::new(rsa_private_key(k)?)
                    .try_sign_with_rng(rng, data)?
                    .to_vec()
            }
            (KeyMaterial::Rsa(k), SignatureAlgorithm::RsaSha512) => {
                RsaSigningKey::<Sha512>::new(rsa_private_key(k)?)
                    .try_sign_with_rng(rng, data)?
                    .to_vec()
            }
            (KeyMaterial::Ed25519(k), SignatureAlgorithm::Ed25519) => ed25519_sign(k, data),
            (KeyMaterial::Dsa(k), SignatureAlgorithm::Dss) => dss_sign(k, data, rng)?,
            (key, algorithm) => {
                return Err(Error::UnsupportedKeyType(format!(
                    "{} cannot sign with {}",
                    key.key_type(),
                    algorithm.name()
                )));
            }
        };
        let mut w = Writer::new();
        w.put_str(algorithm.name())?;
        w.put_string(&blob)?;
        Ok(w.into_bytes())
    }
}

fn rsa_private_key(key: &RsaKey) -> Result<RsaPrivateKey> {
    let uint = |v: &num_bigint::BigUint| rsa::BigUint::from_bytes_be(&v.to_bytes_be());
    RsaPrivateKey::from_components(
        uint(&key.n),
        uint(&key.e),
        uint(&key.d),
        vec![uint(&key.p), uint(&key.q)],
    )
    .map_err(|e| Error::InvalidKey(e.to_string()))
}

fn ed25519_sign(key: &Ed25519Key, data: &[u8]) -> Vec<u8> {
    let signing_key = SigningKey::from_bytes(&key.seed());
    signing_key.sign(data).to_bytes().to_vec()
}

fn dsa_signing_key(key: &DsaKey) -> Result<dsa::SigningKey> {
    let uint = |v: &num_bigint::BigUint| dsa::BigUint::from_bytes_be(&v.to_bytes_be());
    let components = dsa::Components::from_components(uint(&key.p), uint(&key.q), uint(&key.g))?;
    let verifying = dsa::VerifyingKey::from_components(components, uint(&key.y))?;
    Ok(dsa::SigningKey::from_components(verifying, uint(&key.x))?)
}

/// DSA over a SHA-1 digest, `r || s` as two 20-byte integers.
fn dss_sign<R: RngCore + CryptoRng>(key: &DsaKey, data: &[u8], rng: &mut R) -> Result<Vec<u8>> {
    let signature = dsa_signing_key(key)?.try_sign_digest_with_rng(rng, Sha1::new_with_prefix(data))?;
    let mut blob = vec![0u8; 2 * DSS_INTEGER_LEN];
    for (value, slot) in [signature.r(), signature.s()]
        .into_iter()
        .zip(blob.chunks_exact_mut(DSS_INTEGER_LEN))
    {
        // r and s are below the 160-bit q
        let bytes = value.to_bytes_be();
        slot[DSS_INTEGER_LEN - bytes.len()..].copy_from_slice(&bytes);
    }
    Ok(blob)
}
