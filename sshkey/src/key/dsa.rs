use kagi::decoder::Decoder;
use kagi::encoder::Encoder;
use num_bigint::BigUint;
use num_traits::{One, Zero};
use pem::Label;
use pkcs::dsa::DsaPrivateKey;

use super::ClassicFields;
use crate::error::{Error, Result};

pub(crate) const KEY_TYPE: &str = "ssh-dss";

#[derive(Clone, PartialEq, Eq)]
pub struct DsaKey {
    pub p: BigUint,
    pub q: BigUint,
    pub g: BigUint,
    /// public value
    pub y: BigUint,
    /// private value
    pub x: BigUint,
}

impl std::fmt::Debug for DsaKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DsaKey")
            .field("p_bits", &self.p.bits())
            .field("q_bits", &self.q.bits())
            .finish_non_exhaustive()
    }
}

impl DsaKey {
    pub fn validate(&self) -> Result<()> {
        let one = BigUint::one();
        if self.p <= one || self.q <= one || self.g <= one || self.g >= self.p {
            return Err(Error::InvalidKey("DSA domain parameters out of range".to_string()));
        }
        if self.x.is_zero() || self.x >= self.q {
            return Err(Error::InvalidKey("DSA private value out of range".to_string()));
        }
        if self.g.modpow(&self.x, &self.p) != self.y {
            return Err(Error::InvalidKey("DSA public value is not g^x mod p".to_string()));
        }
        Ok(())
    }
}

impl ClassicFields for DsaKey {
    const LABEL: Label = Label::DSAPrivateKey;

    fn to_der(&self) -> Result<Vec<u8>> {
        let key = DsaPrivateKey {
            p: self.p.clone(),
            q: self.q.clone(),
            g: self.g.clone(),
            y: self.y.clone(),
            x: self.x.clone(),
        };
        let der: Vec<u8> = key.encode().map_err(pkcs::Error::from)?;
        Ok(der)
    }

    fn from_der(der: &[u8]) -> Result<Self> {
        let key: DsaPrivateKey = der.decode().map_err(pkcs::Error::from)?;
        Ok(DsaKey {
            p: key.p,
            q: key.q,
            g: key.g,
            y: key.y,
            x: key.x,
        })
    }
}
