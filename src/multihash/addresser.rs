use sha2::{Digest, Sha256};
use sha3::Sha3_256;

use crate::multihash::{HashCode, MultihashId};

/// Turns arbitrary bytes into a stable multihash identifier
pub struct ContentAddresser;

impl ContentAddresser {
    /// SHA-256 multihash of `content` (code 0x12, 32-byte digest)
    pub fn address_of(content: &[u8]) -> MultihashId {
        Self::address_with(HashCode::Sha2_256, content)
    }

    /// Multihash of `content` under a chosen algorithm
    pub fn address_with(code: HashCode, content: &[u8]) -> MultihashId {
        let digest: Vec<u8> = match code {
            HashCode::Sha2_256 => Sha256::digest(content).to_vec(),
            HashCode::Sha3_256 => Sha3_256::digest(content).to_vec(),
        };
        MultihashId::from_digest(code, digest)
    }
}
