use asn1::{BitString, OctetString};
use kagi::decoder::Decoder;
use kagi::encoder::Encoder;
use pem::Label;
use pkcs::sec1::{ECPrivateKey, NamedCurve};
use zeroize::Zeroizing;

use super::ClassicFields;
use crate::error::{Error, Result};

const UNCOMPRESSED_POINT: u8 = 0x04;

/// NIST prime curve key. Only the classic PEM form is supported.
#[derive(Clone, PartialEq, Eq)]
pub struct EcKey {
    pub curve: NamedCurve,
    /// Big-endian private scalar
    pub private_key: Zeroizing<Vec<u8>>,
    /// SEC1 encoded public point, when the file carries one
    pub public_key: Option<Vec<u8>>,
}

impl std::fmt::Debug for EcKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EcKey")
            .field("curve", &self.curve)
            .field("public_key", &self.public_key.as_deref().map(hex::encode))
            .finish_non_exhaustive()
    }
}

impl EcKey {
    pub fn new(curve: NamedCurve, private_key: Vec<u8>, public_key: Option<Vec<u8>>) -> Self {
        EcKey {
            curve,
            private_key: Zeroizing::new(private_key),
            public_key,
        }
    }

    pub fn key_type(&self) -> &'static str {
        match self.curve {
            NamedCurve::P256 => "ecdsa-sha2-nistp256",
            NamedCurve::P384 => "ecdsa-sha2-nistp384",
            NamedCurve::P521 => "ecdsa-sha2-nistp521",
        }
    }

    pub fn validate(&self) -> Result<()> {
        let size = self.curve.field_size();
        if self.private_key.is_empty() || self.private_key.len() > size {
            return Err(Error::InvalidKey(format!(
                "EC private scalar of {} bytes does not fit {}",
                self.private_key.len(),
                self.curve
            )));
        }
        if let Some(point) = &self.public_key {
            if point.first() != Some(&UNCOMPRESSED_POINT) || point.len() != 1 + 2 * size {
                return Err(Error::InvalidKey(format!(
                    "EC public point is not an uncompressed {} point",
                    self.curve
                )));
            }
        }
        Ok(())
    }
}

impl ClassicFields for EcKey {
    const LABEL: Label = Label::ECPrivateKey;

    fn to_der(&self) -> Result<Vec<u8>> {
        let key = ECPrivateKey::new(
            OctetString::from(self.private_key.as_slice()),
            Some(self.curve),
            self.public_key.clone().map(|point| BitString::new(0, point)),
        );
        let der: Vec<u8> = key.encode().map_err(pkcs::Error::from)?;
        Ok(der)
    }

    fn from_der(der: &[u8]) -> Result<Self> {
        let key: ECPrivateKey = der.decode().map_err(pkcs::Error::from)?;
        let curve = key
            .parameters
            .ok_or_else(|| Error::InvalidKey("EC key without named curve".to_string()))?;
        let public_key = match key.public_key {
            Some(bits) if bits.unused_bits() != 0 => {
                return Err(Error::InvalidKey("EC public point has unused bits".to_string()));
            }
            Some(bits) => Some(bits.as_bytes().to_vec()),
            None => None,
        };
        Ok(EcKey::new(curve, key.private_key.into_bytes(), public_key))
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::key::tests::toy_ec;

    #[test]
    fn test_classic_round_trip() {
        let key = toy_ec();
        let der = key.to_der().unwrap();
        assert_eq!(key, EcKey::from_der(&der).unwrap());
    }

    #[rstest(key,
        case(EcKey::new(NamedCurve::P256, vec![], None)),
        case(EcKey::new(NamedCurve::P256, vec![1; 33], None)),
        case(EcKey::new(NamedCurve::P256, vec![1; 32], Some(vec![0x02; 33]))),
        case(EcKey::new(NamedCurve::P384, vec![1; 48], Some(vec![0x04; 65]))),
    )]
    fn test_validate_rejects(key: EcKey) {
        assert!(matches!(key.validate(), Err(Error::InvalidKey(_))));
    }

    #[test]
    fn test_validate_accepts_short_scalar() {
        // leading zero bytes of the scalar may be dropped
        EcKey::new(NamedCurve::P521, vec![1; 65], None).validate().unwrap();
    }

    #[test]
    fn test_from_der_requires_curve() {
        let der: Vec<u8> = ECPrivateKey::new(OctetString::from(vec![1u8; 32]), None, None)
            .encode()
            .unwrap();
        assert!(matches!(EcKey::from_der(&der), Err(Error::InvalidKey(_))));
    }
}
