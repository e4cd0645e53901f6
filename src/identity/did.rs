use crate::identity::PublicKey;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const DID_SCHEME: &str = "did";
const DID_METHOD: &str = "dbr";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum IdentityError {
    #[error("Invalid identity format: {0}")]
    InvalidFormat(String),

    #[error("Invalid identity method: expected 'dbr', got '{0}'")]
    InvalidMethod(String),

    #[error("Invalid base58 encoding: {0}")]
    InvalidBase58(String),
}

/// Opaque account identifier in the format: did:dbr:<base58_key_material>
///
/// Identities act on the registry (bidders, offerers, the owner). They are
/// compared and hashed by value; nothing in the registry interprets the key
/// material behind them.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identity {
    key_part: String,
}

impl Identity {
    /// Create an identity bound to a public key
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        let key_part = bs58::encode(public_key.to_bytes()).into_string();
        Self { key_part }
    }

    /// Create a stable identity from a human label (accounts without a signing key)
    pub fn named(label: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"identity:");
        hasher.update(label.as_bytes());
        let key_part = bs58::encode(hasher.finalize()).into_string();
        Self { key_part }
    }

    /// Parse an identity from its textual form
    pub fn parse(s: &str) -> Result<Self, IdentityError> {
        if s.is_empty() {
            return Err(IdentityError::InvalidFormat(
                "identity cannot be empty".into(),
            ));
        }

        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 3 {
            return Err(IdentityError::InvalidFormat(format!(
                "Expected 3 parts separated by ':', got {}",
                parts.len()
            )));
        }

        if parts[0] != DID_SCHEME {
            return Err(IdentityError::InvalidFormat(format!(
                "Expected '{}' scheme, got '{}'",
                DID_SCHEME, parts[0]
            )));
        }

        if parts[1] != DID_METHOD {
            return Err(IdentityError::InvalidMethod(parts[1].to_string()));
        }

        if parts[2].is_empty() {
            return Err(IdentityError::InvalidFormat(
                "Key part cannot be empty".into(),
            ));
        }

        bs58::decode(parts[2])
            .into_vec()
            .map_err(|e| IdentityError::InvalidBase58(e.to_string()))?;

        Ok(Self {
            key_part: parts[2].to_string(),
        })
    }

    /// The base58 key part
    pub fn key_part(&self) -> &str {
        &self.key_part
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", DID_SCHEME, DID_METHOD, self.key_part)
    }
}

impl FromStr for Identity {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Identity {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Identity> for String {
    fn from(identity: Identity) -> Self {
        identity.to_string()
    }
}
