use serde::{Deserialize, Serialize};

use crate::identity::{PublicKey, Signature};
use crate::multihash::{ContentAddresser, MultihashId};

/// Content-addressed identifier of a serialized claim
pub type ClaimId = MultihashId;

/// A signed claim over a dataset specification
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    spec_hash: MultihashId,
    signature: Signature,
}

impl Claim {
    /// Create a claim from parts
    pub fn from_parts(spec_hash: MultihashId, signature: Signature) -> Self {
        Self {
            spec_hash,
            signature,
        }
    }

    /// Multihash of the dataset specification
    pub fn spec_hash(&self) -> &MultihashId {
        &self.spec_hash
    }

    /// Signature over the spec hash
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Bytes the signer signs: the base58 text of the spec hash
    pub fn signing_bytes(spec_hash: &MultihashId) -> Vec<u8> {
        spec_hash.to_base58().into_bytes()
    }

    /// Canonical JSON serialization.
    ///
    /// Compact, keys in sorted order, both values text so the bytes are
    /// identical across implementations.
    pub fn to_canonical_bytes(&self) -> Vec<u8> {
        let document = serde_json::json!({
            "dataset_spec_hash": self.spec_hash.to_base58(),
            "signature": self.signature.to_hex(),
        });
        // Value's Display is the compact form and cannot fail
        document.to_string().into_bytes()
    }

    /// Content-addressed identifier of this claim
    pub fn id(&self) -> ClaimId {
        ContentAddresser::address_of(&self.to_canonical_bytes())
    }

    /// Check the signature against a public key
    pub fn verify(&self, public_key: &PublicKey) -> bool {
        public_key.verify(&Self::signing_bytes(&self.spec_hash), &self.signature)
    }
}
