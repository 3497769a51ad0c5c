use kagi::decoder::Decoder;
use kagi::encoder::Encoder;
use num_bigint::BigUint;
use num_traits::One;
use pem::Label;
use pkcs::pkcs1::{RSAPrivateKey, Version};
use sshwire::{Reader, Writer};

use super::{ClassicFields, OpenSshFields};
use crate::error::{Error, Result};

pub(crate) const KEY_TYPE: &str = "ssh-rsa";

#[derive(Clone, PartialEq, Eq)]
pub struct RsaKey {
    pub n: BigUint,
    pub e: BigUint,
    pub d: BigUint,
    /// q^-1 mod p
    pub iqmp: BigUint,
    pub p: BigUint,
    pub q: BigUint,
}

impl std::fmt::Debug for RsaKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RsaKey")
            .field("n", &self.n)
            .field("e", &self.e)
            .finish_non_exhaustive()
    }
}

impl RsaKey {
    /// `n = p*q`, `e*d = 1` modulo `p-1` and `q-1`, `iqmp*q = 1 mod p`.
    pub fn validate(&self) -> Result<()> {
        let one = BigUint::one();
        if self.p <= one || self.q <= one {
            return Err(Error::InvalidKey("RSA prime is too small".to_string()));
        }
        if &self.p * &self.q != self.n {
            return Err(Error::InvalidKey("RSA modulus is not p*q".to_string()));
        }
        if self.e <= one {
            return Err(Error::InvalidKey("RSA public exponent is too small".to_string()));
        }
        let ed = &self.e * &self.d;
        for prime in [&self.p, &self.q] {
            if &ed % (prime - 1u32) != one {
                return Err(Error::InvalidKey(
                    "RSA exponents are inconsistent".to_string(),
                ));
            }
        }
        if (&self.iqmp * &self.q) % &self.p != one {
            return Err(Error::InvalidKey("RSA CRT coefficient is wrong".to_string()));
        }
        Ok(())
    }
}

impl OpenSshFields for RsaKey {
    // n, e, d, iqmp, p, q
    fn write_fields(&self, w: &mut Writer) -> Result<()> {
        w.put_mpint(&self.n)?;
        w.put_mpint(&self.e)?;
        w.put_mpint(&self.d)?;
        w.put_mpint(&self.iqmp)?;
        w.put_mpint(&self.p)?;
        w.put_mpint(&self.q)?;
        Ok(())
    }

    fn read_fields(r: &mut Reader<'_>) -> Result<Self> {
        let key = RsaKey {
            n: r.read_mpint()?,
            e: r.read_mpint()?,
            d: r.read_mpint()?,
            iqmp: r.read_mpint()?,
            p: r.read_mpint()?,
            q: r.read_mpint()?,
        };
        key.validate()?;
        Ok(key)
    }
}

impl ClassicFields for RsaKey {
    const LABEL: Label = Label::RSAPrivateKey;

    fn to_der(&self) -> Result<Vec<u8>> {
        let pkcs1 = RSAPrivateKey::from_components(
            self.n.clone(),
            self.e.clone(),
            self.d.clone(),
            self.p.clone(),
            self.q.clone(),
            self.iqmp.clone(),
        )
        .map_err(pkcs::Error::from)?;
        let der: Vec<u8> = pkcs1.encode().map_err(pkcs::Error::from)?;
        Ok(der)
    }

    fn from_der(der: &[u8]) -> Result<Self> {
        let pkcs1: RSAPrivateKey = der.decode().map_err(pkcs::Error::from)?;
        if pkcs1.version != Version::TwoPrime {
            return Err(Error::UnsupportedKeyType(
                "multi-prime RSA".to_string(),
            ));
        }
        Ok(RsaKey {
            n: pkcs1.modulus,
            e: pkcs1.public_exponent,
            d: pkcs1.private_exponent,
            iqmp: pkcs1.coefficient,
            p: pkcs1.prime1,
            q: pkcs1.prime2,
        })
    }
}
