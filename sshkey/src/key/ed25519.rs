use ed25519_dalek::SigningKey;
use sshwire::{Reader, Writer};
use zeroize::Zeroizing;

use super::OpenSshFields;
use crate::error::{Error, Result};

pub(crate) const KEY_TYPE: &str = "ssh-ed25519";

pub const PUBLIC_KEY_LEN: usize = 32;
pub const PRIVATE_KEY_LEN: usize = 64;

#[derive(Clone, PartialEq, Eq)]
pub struct Ed25519Key {
    pub public: [u8; PUBLIC_KEY_LEN],
    /// Seed followed by the public key, as OpenSSH stores it.
    pub private: Zeroizing<[u8; PRIVATE_KEY_LEN]>,
}

impl std::fmt::Debug for Ed25519Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ed25519Key")
            .field("public", &hex::encode(self.public))
            .finish_non_exhaustive()
    }
}

impl Ed25519Key {
    pub fn from_seed(seed: [u8; 32]) -> Self {
        let seed = Zeroizing::new(seed);
        let public = SigningKey::from_bytes(&seed).verifying_key().to_bytes();
        let mut private = Zeroizing::new([0u8; PRIVATE_KEY_LEN]);
        private[..32].copy_from_slice(seed.as_slice());
        private[32..].copy_from_slice(&public);
        Ed25519Key { public, private }
    }

    pub fn seed(&self) -> Zeroizing<[u8; 32]> {
        let mut seed = Zeroizing::new([0u8; 32]);
        seed.copy_from_slice(&self.private[..32]);
        seed
    }

    pub fn validate(&self) -> Result<()> {
        if self.private[32..] != self.public {
            return Err(Error::InvalidKey(
                "ed25519 private key does not end with its public key".to_string(),
            ));
        }
        let derived = SigningKey::from_bytes(&self.seed()).verifying_key().to_bytes();
        if derived != self.public {
            return Err(Error::InvalidKey(
                "ed25519 seed does not derive the public key".to_string(),
            ));
        }
        Ok(())
    }
}

impl OpenSshFields for Ed25519Key {
    // string pub(32), string priv(64)
    fn write_fields(&self, w: &mut Writer) -> Result<()> {
        w.put_string(&self.public)?;
        w.put_string(self.private.as_slice())?;
        Ok(())
    }

    fn read_fields(r: &mut Reader<'_>) -> Result<Self> {
        let public = r.read_string()?;
        let public: [u8; PUBLIC_KEY_LEN] =
            public.try_into().map_err(|_| Error::InvalidKeyLength {
                expected: PUBLIC_KEY_LEN,
                actual: public.len(),
            })?;
        let private = r.read_string()?;
        if private.len() != PRIVATE_KEY_LEN {
            return Err(Error::InvalidKeyLength {
                expected: PRIVATE_KEY_LEN,
                actual: private.len(),
            });
        }
        let mut buf = Zeroizing::new([0u8; PRIVATE_KEY_LEN]);
        buf.copy_from_slice(private);

        let key = Ed25519Key {
            public,
            private: buf,
        };
        key.validate()?;
        Ok(key)
    }
}
