use ed25519_dalek::{Signature as DalekSignature, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;

use crate::identity::KeypairError;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Empty signature")]
    Empty,

    #[error("Invalid signature hex: {0}")]
    InvalidHex(String),
}

/// Signature algorithm behind a public key
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyScheme {
    Ed25519,
    Secp256k1,
}

/// Opaque signature bytes as produced by a [`Signer`]
///
/// The claim layer never looks inside; only the matching [`PublicKey`]
/// knows how to check it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature(pub(crate) Vec<u8>);

impl Signature {
    /// Wrap raw signature bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignatureError> {
        if bytes.is_empty() {
            return Err(SignatureError::Empty);
        }
        Ok(Self(bytes.to_vec()))
    }

    /// Parse a lowercase or uppercase hex signature
    pub fn from_hex(s: &str) -> Result<Self, SignatureError> {
        let bytes = hex::decode(s).map_err(|e| SignatureError::InvalidHex(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Stable textual form (lowercase hex)
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Verification key for any supported scheme
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PublicKeyRepr", into = "PublicKeyRepr")]
pub enum PublicKey {
    Ed25519(VerifyingKey),
    Secp256k1(secp256k1::PublicKey),
}

#[derive(Serialize, Deserialize)]
struct PublicKeyRepr {
    scheme: KeyScheme,
    bytes: Vec<u8>,
}

impl PublicKey {
    /// Parse a public key of the given scheme from raw bytes
    pub fn from_bytes(scheme: KeyScheme, bytes: &[u8]) -> Result<Self, KeypairError> {
        match scheme {
            KeyScheme::Ed25519 => {
                let bytes_array: [u8; 32] =
                    bytes.try_into().map_err(|_| KeypairError::InvalidLength {
                        expected: 32,
                        got: bytes.len(),
                    })?;
                let key = VerifyingKey::from_bytes(&bytes_array)
                    .map_err(|e| KeypairError::InvalidBytes(e.to_string()))?;
                Ok(Self::Ed25519(key))
            }
            KeyScheme::Secp256k1 => {
                let key = secp256k1::PublicKey::from_slice(bytes)
                    .map_err(|e| KeypairError::InvalidBytes(e.to_string()))?;
                Ok(Self::Secp256k1(key))
            }
        }
    }

    /// The scheme this key verifies
    pub fn scheme(&self) -> KeyScheme {
        match self {
            Self::Ed25519(_) => KeyScheme::Ed25519,
            Self::Secp256k1(_) => KeyScheme::Secp256k1,
        }
    }

    /// Raw key bytes (32 for Ed25519, 33 compressed for secp256k1)
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Ed25519(key) => key.as_bytes().to_vec(),
            Self::Secp256k1(key) => key.serialize().to_vec(),
        }
    }

    /// Check a signature over `message`. Malformed signatures verify false.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        match self {
            Self::Ed25519(key) => match DalekSignature::from_slice(signature.as_bytes()) {
                Ok(sig) => key.verify(message, &sig).is_ok(),
                Err(_) => false,
            },
            Self::Secp256k1(key) => {
                let sig = match secp256k1::ecdsa::Signature::from_compact(signature.as_bytes()) {
                    Ok(sig) => sig,
                    Err(_) => return false,
                };
                let msg = ecdsa_message(message);
                secp256k1::Secp256k1::verification_only()
                    .verify_ecdsa(&msg, &sig, key)
                    .is_ok()
            }
        }
    }
}

impl TryFrom<PublicKeyRepr> for PublicKey {
    type Error = KeypairError;

    fn try_from(repr: PublicKeyRepr) -> Result<Self, Self::Error> {
        PublicKey::from_bytes(repr.scheme, &repr.bytes)
    }
}

impl From<PublicKey> for PublicKeyRepr {
    fn from(key: PublicKey) -> Self {
        Self {
            scheme: key.scheme(),
            bytes: key.to_bytes(),
        }
    }
}

/// ECDSA signs fixed 32-byte digests
pub(crate) fn ecdsa_message(message: &[u8]) -> secp256k1::Message {
    let digest: [u8; 32] = Sha256::digest(message).into();
    secp256k1::Message::from_digest(digest)
}

/// A signing capability. Claims only need "sign bytes" and "who am I".
pub trait Signer {
    /// Public half used by auditors to verify
    fn public_key(&self) -> PublicKey;

    /// Sign an arbitrary message
    fn sign(&self, message: &[u8]) -> Signature;
}
