use thiserror::Error;

use crate::claim::{Claim, ClaimId};
use crate::identity::{PublicKey, Signature};
use crate::multihash::{ContentAddresser, HashCode};

/// Reasons a claim fails an audit
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ClaimValidationError {
    #[error("Invalid signature: signature does not match the specification hash")]
    InvalidSignature,

    #[error("Claim id mismatch: expected {expected}, recomputed {actual}")]
    ClaimIdMismatch { expected: ClaimId, actual: ClaimId },
}

/// Audits a registered claim id against out-of-band specification and signature
pub struct ClaimValidator;

impl ClaimValidator {
    /// Recompute the claim and report why it does not match, if it doesn't
    ///
    /// This performs:
    /// - SHA-256 specification hashing
    /// - Signature verification over the spec hash
    /// - Claim id recomputation and comparison
    pub fn validate(
        specification: &[u8],
        signature: &Signature,
        claim_id: &ClaimId,
        public_key: &PublicKey,
    ) -> Result<Claim, ClaimValidationError> {
        Self::validate_with(
            HashCode::Sha2_256,
            specification,
            signature,
            claim_id,
            public_key,
        )
    }

    /// Same as [`ClaimValidator::validate`] for specs hashed with `code`
    pub fn validate_with(
        code: HashCode,
        specification: &[u8],
        signature: &Signature,
        claim_id: &ClaimId,
        public_key: &PublicKey,
    ) -> Result<Claim, ClaimValidationError> {
        let spec_hash = ContentAddresser::address_with(code, specification);
        let claim = Claim::from_parts(spec_hash, signature.clone());

        if !claim.verify(public_key) {
            return Err(ClaimValidationError::InvalidSignature);
        }

        let actual = claim.id();
        if &actual != claim_id {
            return Err(ClaimValidationError::ClaimIdMismatch {
                expected: claim_id.clone(),
                actual,
            });
        }

        Ok(claim)
    }

    /// True when the signature is valid and the recomputed id matches
    pub fn verify_claim(
        specification: &[u8],
        signature: &Signature,
        claim_id: &ClaimId,
        public_key: &PublicKey,
    ) -> bool {
        Self::validate(specification, signature, claim_id, public_key).is_ok()
    }
}
