use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors from decoding a multihash
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MultihashError {
    #[error("Invalid base58 encoding: {0}")]
    InvalidBase58(String),

    #[error("Multihash too short: {0} bytes")]
    TooShort(usize),

    #[error("Unsupported hash function code: 0x{0:02x}")]
    UnsupportedCode(u8),

    #[error("Digest size mismatch: header says {declared}, got {actual}")]
    SizeMismatch { declared: usize, actual: usize },

    #[error("Invalid digest length for {code:?}: expected {expected}, got {got}")]
    InvalidDigestLength {
        code: HashCode,
        expected: usize,
        got: usize,
    },
}

/// Hash function codes from the multihash table
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum HashCode {
    Sha2_256 = 0x12,
    Sha3_256 = 0x16,
}

impl HashCode {
    /// Wire value
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Digest length produced by this algorithm
    pub fn digest_size(self) -> usize {
        match self {
            HashCode::Sha2_256 | HashCode::Sha3_256 => 32,
        }
    }

    pub fn from_code(code: u8) -> Result<Self, MultihashError> {
        match code {
            0x12 => Ok(HashCode::Sha2_256),
            0x16 => Ok(HashCode::Sha3_256),
            other => Err(MultihashError::UnsupportedCode(other)),
        }
    }
}

/// A content identifier: (hash code, digest size, digest bytes)
///
/// Always internally consistent: the size byte equals the digest length,
/// which equals the length the algorithm produces. Compared by value.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MultihashId {
    code: HashCode,
    digest: Vec<u8>,
}

impl MultihashId {
    /// Wrap a digest produced by `code`
    pub fn new(code: HashCode, digest: &[u8]) -> Result<Self, MultihashError> {
        if digest.len() != code.digest_size() {
            return Err(MultihashError::InvalidDigestLength {
                code,
                expected: code.digest_size(),
                got: digest.len(),
            });
        }
        Ok(Self {
            code,
            digest: digest.to_vec(),
        })
    }

    // Digest length is fixed by the hasher that produced it
    pub(crate) fn from_digest(code: HashCode, digest: Vec<u8>) -> Self {
        debug_assert_eq!(digest.len(), code.digest_size());
        Self { code, digest }
    }

    /// Decode `code‖size‖digest`
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MultihashError> {
        if bytes.len() < 2 {
            return Err(MultihashError::TooShort(bytes.len()));
        }
        let code = HashCode::from_code(bytes[0])?;
        let declared = bytes[1] as usize;
        let digest = &bytes[2..];
        if declared != digest.len() {
            return Err(MultihashError::SizeMismatch {
                declared,
                actual: digest.len(),
            });
        }
        Self::new(code, digest)
    }

    /// Decode the external base58 form
    pub fn from_base58(s: &str) -> Result<Self, MultihashError> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| MultihashError::InvalidBase58(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    pub fn code(&self) -> HashCode {
        self.code
    }

    pub fn digest_size(&self) -> usize {
        self.digest.len()
    }

    pub fn digest(&self) -> &[u8] {
        &self.digest
    }

    /// Self-describing byte form: code, size, digest
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(2 + self.digest.len());
        bytes.push(self.code.code());
        // digest_size() is at most 32, always fits the single size byte
        bytes.push(self.digest.len() as u8);
        bytes.extend_from_slice(&self.digest);
        bytes
    }

    /// External textual form
    pub fn to_base58(&self) -> String {
        bs58::encode(self.to_bytes()).into_string()
    }
}

impl fmt::Display for MultihashId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl fmt::Debug for MultihashId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MultihashId({})", self.to_base58())
    }
}

impl FromStr for MultihashId {
    type Err = MultihashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_base58(s)
    }
}

impl TryFrom<String> for MultihashId {
    type Error = MultihashError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_base58(&value)
    }
}

impl From<MultihashId> for String {
    fn from(id: MultihashId) -> Self {
        id.to_base58()
    }
}
