//! In-memory private keys and their per-family field layouts.
//!
//! [`KeyMaterial`] is closed over the four families this crate reads. Each
//! family lives in its own module and implements the layouts it takes part
//! in: [`OpenSshFields`] for the fields of an openssh-key-v1 inner record,
//! [`ClassicFields`] for the DER structure of a classic PEM block.

use base64::{Engine, engine::general_purpose::STANDARD};
use pem::Label;
use sshwire::{Reader, Writer};

use crate::error::{Error, Result};

mod dsa;
mod ec;
mod ed25519;
mod rsa;

pub use dsa::DsaKey;
pub use ec::EcKey;
pub use ed25519::Ed25519Key;
pub use pkcs::sec1::NamedCurve;
pub use rsa::RsaKey;

/// Type-specific fields of the openssh-key-v1 inner record, between the
/// key type string and the comment.
pub(crate) trait OpenSshFields: Sized {
    fn write_fields(&self, w: &mut Writer) -> Result<()>;

    fn read_fields(r: &mut Reader<'_>) -> Result<Self>;
}

/// DER layout carried by a classic PEM block.
pub(crate) trait ClassicFields: Sized {
    const LABEL: Label;

    fn to_der(&self) -> Result<Vec<u8>>;

    fn from_der(der: &[u8]) -> Result<Self>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyMaterial {
    Rsa(RsaKey),
    Ed25519(Ed25519Key),
    Dsa(DsaKey),
    Ec(EcKey),
}

impl KeyMaterial {
    /// SSH algorithm name of the public key.
    pub fn key_type(&self) -> &'static str {
        match self {
            KeyMaterial::Rsa(_) => rsa::KEY_TYPE,
            KeyMaterial::Ed25519(_) => ed25519::KEY_TYPE,
            KeyMaterial::Dsa(_) => dsa::KEY_TYPE,
            KeyMaterial::Ec(k) => k.key_type(),
        }
    }

    /// Size in bits: the modulus for RSA, the prime for DSA, the curve otherwise.
    pub fn key_size(&self) -> u64 {
        match self {
            KeyMaterial::Rsa(k) => k.n.bits(),
            KeyMaterial::Ed25519(_) => 256,
            KeyMaterial::Dsa(k) => k.p.bits(),
            KeyMaterial::Ec(k) => match k.curve {
                NamedCurve::P256 => 256,
                NamedCurve::P384 => 384,
                NamedCurve::P521 => 521,
            },
        }
    }

    /// SSH wire encoding of the public key (RFC 4253 section 6.6).
    pub fn public_key_blob(&self) -> Result<Vec<u8>> {
        let mut w = Writer::new();
        w.put_str(self.key_type())?;
        match self {
            KeyMaterial::Rsa(k) => {
                w.put_mpint(&k.e)?;
                w.put_mpint(&k.n)?;
            }
            KeyMaterial::Ed25519(k) => w.put_string(&k.public)?,
            KeyMaterial::Dsa(k) => {
                w.put_mpint(&k.p)?;
                w.put_mpint(&k.q)?;
                w.put_mpint(&k.g)?;
                w.put_mpint(&k.y)?;
            }
            KeyMaterial::Ec(k) => {
                let point = k
                    .public_key
                    .as_deref()
                    .ok_or_else(|| Error::InvalidKey("EC key has no public point".to_string()))?;
                w.put_str(k.curve.ssh_name())?;
                w.put_string(point)?;
            }
        }
        Ok(w.into_bytes())
    }

    /// `authorized_keys` line without a comment.
    pub fn authorized_key(&self) -> Result<String> {
        let blob = self.public_key_blob()?;
        Ok(format!("{} {}", self.key_type(), STANDARD.encode(blob)))
    }

    /// Checks the private half is consistent with the public half.
    pub fn validate(&self) -> Result<()> {
        match self {
            KeyMaterial::Rsa(k) => k.validate(),
            KeyMaterial::Ed25519(k) => k.validate(),
            KeyMaterial::Dsa(k) => k.validate(),
            KeyMaterial::Ec(k) => k.validate(),
        }
    }

    pub(crate) fn write_openssh_fields(&self, w: &mut Writer) -> Result<()> {
        match self {
            KeyMaterial::Rsa(k) => k.write_fields(w),
            KeyMaterial::Ed25519(k) => k.write_fields(w),
            KeyMaterial::Dsa(_) | KeyMaterial::Ec(_) => Err(Error::UnsupportedKeyType(format!(
                "{} keys are only supported in classic PEM",
                self.key_type()
            ))),
        }
    }

    pub(crate) fn read_openssh_fields(key_type: &str, r: &mut Reader<'_>) -> Result<Self> {
        match key_type {
            rsa::KEY_TYPE => Ok(KeyMaterial::Rsa(RsaKey::read_fields(r)?)),
            ed25519::KEY_TYPE => Ok(KeyMaterial::Ed25519(Ed25519Key::read_fields(r)?)),
            other => Err(Error::UnsupportedKeyType(other.to_string())),
        }
    }

    pub(crate) fn to_classic(&self) -> Result<(Label, Vec<u8>)> {
        match self {
            KeyMaterial::Rsa(k) => Ok((RsaKey::LABEL, k.to_der()?)),
            KeyMaterial::Dsa(k) => Ok((DsaKey::LABEL, k.to_der()?)),
            KeyMaterial::Ec(k) => Ok((EcKey::LABEL, k.to_der()?)),
            KeyMaterial::Ed25519(_) => Err(Error::UnsupportedKeyType(
                "ed25519 keys must use OpenSSHv1".to_string(),
            )),
        }
    }

    pub(crate) fn from_classic(label: &Label, der: &[u8]) -> Result<Self> {
        match label {
            Label::RSAPrivateKey => Ok(KeyMaterial::Rsa(RsaKey::from_der(der)?)),
            Label::DSAPrivateKey => Ok(KeyMaterial::Dsa(DsaKey::from_der(der)?)),
            Label::ECPrivateKey => Ok(KeyMaterial::Ec(EcKey::from_der(der)?)),
            other => Err(Error::UnsupportedKeyType(other.to_string())),
        }
    }
}

impl From<RsaKey> for KeyMaterial {
    fn from(key: RsaKey) -> Self {
        KeyMaterial::Rsa(key)
    }
}

impl From<Ed25519Key> for KeyMaterial {
    fn from(key: Ed25519Key) -> Self {
        KeyMaterial::Ed25519(key)
    }
}

impl From<DsaKey> for KeyMaterial {
    fn from(key: DsaKey) -> Self {
        KeyMaterial::Dsa(key)
    }
}

impl From<EcKey> for KeyMaterial {
    fn from(key: EcKey) -> Self {
        KeyMaterial::Ec(key)
    }
}
