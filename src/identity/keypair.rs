use ed25519_dalek::{Signer as DalekSigner, SigningKey};
use rand::rngs::OsRng;
use thiserror::Error;

use crate::identity::{Identity, PublicKey, Signature, Signer};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum KeypairError {
    #[error("Invalid key length: expected {expected}, got {got}")]
    InvalidLength { expected: usize, got: usize },

    #[error("Invalid key bytes: {0}")]
    InvalidBytes(String),
}

/// Ed25519 keypair - the default claim signer
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a new random keypair
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self { signing_key }
    }

    /// Serialize the keypair to bytes (secret key bytes)
    pub fn to_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    /// Deserialize a keypair from secret key bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeypairError> {
        let bytes_array: [u8; 32] = bytes.try_into().map_err(|_| KeypairError::InvalidLength {
            expected: 32,
            got: bytes.len(),
        })?;

        let signing_key = SigningKey::from_bytes(&bytes_array);
        Ok(Self { signing_key })
    }

    /// Account identity bound to this keypair
    pub fn identity(&self) -> Identity {
        Identity::from_public_key(&self.public_key())
    }
}

impl Signer for Keypair {
    fn public_key(&self) -> PublicKey {
        PublicKey::Ed25519(self.signing_key.verifying_key())
    }

    fn sign(&self, message: &[u8]) -> Signature {
        let sig = self.signing_key.sign(message);
        Signature(sig.to_bytes().to_vec())
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keypair")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}
