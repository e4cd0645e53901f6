use secp256k1::{All, Secp256k1, SecretKey};

use crate::identity::signer::ecdsa_message;
use crate::identity::{Identity, KeypairError, PublicKey, Signature, Signer};

/// secp256k1 ECDSA keypair
///
/// Messages are hashed with SHA-256 before signing; signatures are the
/// 64-byte compact form.
#[derive(Clone)]
pub struct Secp256k1Keypair {
    ctx: Secp256k1<All>,
    secret: SecretKey,
}

impl Secp256k1Keypair {
    /// Generate a new random keypair
    pub fn generate() -> Self {
        let secret = SecretKey::new(&mut rand::thread_rng());
        Self {
            ctx: Secp256k1::new(),
            secret,
        }
    }

    /// Restore from 32 secret key bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeypairError> {
        if bytes.len() != 32 {
            return Err(KeypairError::InvalidLength {
                expected: 32,
                got: bytes.len(),
            });
        }
        let secret =
            SecretKey::from_slice(bytes).map_err(|e| KeypairError::InvalidBytes(e.to_string()))?;
        Ok(Self {
            ctx: Secp256k1::new(),
            secret,
        })
    }

    /// Secret key bytes
    pub fn to_bytes(&self) -> [u8; 32] {
        self.secret.secret_bytes()
    }

    /// Account identity bound to this keypair
    pub fn identity(&self) -> Identity {
        Identity::from_public_key(&self.public_key())
    }
}

impl Signer for Secp256k1Keypair {
    fn public_key(&self) -> PublicKey {
        PublicKey::Secp256k1(secp256k1::PublicKey::from_secret_key(
            &self.ctx,
            &self.secret,
        ))
    }

    fn sign(&self, message: &[u8]) -> Signature {
        let sig = self.ctx.sign_ecdsa(&ecdsa_message(message), &self.secret);
        Signature(sig.serialize_compact().to_vec())
    }
}

impl std::fmt::Debug for Secp256k1Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secp256k1Keypair")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}
