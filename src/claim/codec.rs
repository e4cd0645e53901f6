use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::claim::{Claim, ClaimId, ClaimValidationError, ClaimValidator};
use crate::identity::PublicKey;

/// Errors that can occur during encoding/decoding
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Failed to encode claim envelope: {0}")]
    EncodeError(String),

    #[error("Failed to decode claim envelope: {0}")]
    DecodeError(String),

    #[error("Invalid hex string: {0}")]
    InvalidHex(String),
}

/// Audit material handed over out of band: the claim plus the signer's key
///
/// The registry never sees this; it only stores the claim id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimEnvelope {
    claim: Claim,
    public_key: PublicKey,
}

impl ClaimEnvelope {
    pub fn new(claim: Claim, public_key: PublicKey) -> Self {
        Self { claim, public_key }
    }

    pub fn claim(&self) -> &Claim {
        &self.claim
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Check this envelope against the specification and a registered claim id
    pub fn audit(
        &self,
        specification: &[u8],
        claim_id: &ClaimId,
    ) -> Result<(), ClaimValidationError> {
        ClaimValidator::validate_with(
            self.claim.spec_hash().code(),
            specification,
            self.claim.signature(),
            claim_id,
            &self.public_key,
        )
        .map(|_| ())
    }
}

/// Codec for serializing/deserializing claim envelopes
pub struct ClaimCodec;

impl ClaimCodec {
    /// Encode to binary bytes (postcard)
    pub fn encode(envelope: &ClaimEnvelope) -> Result<Vec<u8>, CodecError> {
        postcard::to_allocvec(envelope).map_err(|e| CodecError::EncodeError(e.to_string()))
    }

    /// Decode from binary bytes
    pub fn decode(bytes: &[u8]) -> Result<ClaimEnvelope, CodecError> {
        postcard::from_bytes(bytes).map_err(|e| CodecError::DecodeError(e.to_string()))
    }

    /// Encode to hex string
    pub fn encode_hex(envelope: &ClaimEnvelope) -> Result<String, CodecError> {
        Ok(hex::encode(Self::encode(envelope)?))
    }

    /// Decode from hex string
    pub fn decode_hex(hex_str: &str) -> Result<ClaimEnvelope, CodecError> {
        let bytes =
            hex::decode(hex_str.trim()).map_err(|e| CodecError::InvalidHex(e.to_string()))?;
        Self::decode(&bytes)
    }
}
