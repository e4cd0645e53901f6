use thiserror::Error;

use crate::claim::{Claim, ClaimId};
use crate::identity::Signer;
use crate::multihash::{ContentAddresser, HashCode};

/// Errors that can occur when building a claim
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ClaimBuildError {
    #[error("Missing specification: dataset specification bytes are required")]
    MissingSpecification,

    #[error("Missing signer: a signing capability is required")]
    MissingSigner,
}

/// Builder for signed claims
///
/// ```ignore
/// let claim = ClaimBuilder::new()
///     .specification(spec_bytes)
///     .signer(&keypair)
///     .build()?;
/// let claim_id = claim.id();
/// ```
pub struct ClaimBuilder<'a> {
    specification: Option<&'a [u8]>,
    signer: Option<&'a dyn Signer>,
    hash_code: HashCode,
}

impl<'a> ClaimBuilder<'a> {
    /// Create a new ClaimBuilder (SHA-256 spec hashing)
    pub fn new() -> Self {
        Self {
            specification: None,
            signer: None,
            hash_code: HashCode::Sha2_256,
        }
    }

    /// Set the dataset specification (required)
    pub fn specification(mut self, specification: &'a [u8]) -> Self {
        self.specification = Some(specification);
        self
    }

    /// Set the signer (required)
    pub fn signer(mut self, signer: &'a dyn Signer) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Hash the specification with a different algorithm
    pub fn hash_code(mut self, code: HashCode) -> Self {
        self.hash_code = code;
        self
    }

    /// Hash, sign, and assemble the claim
    pub fn build(self) -> Result<Claim, ClaimBuildError> {
        let specification = self
            .specification
            .ok_or(ClaimBuildError::MissingSpecification)?;
        let signer = self.signer.ok_or(ClaimBuildError::MissingSigner)?;

        let spec_hash = ContentAddresser::address_with(self.hash_code, specification);
        let signature = signer.sign(&Claim::signing_bytes(&spec_hash));

        Ok(Claim::from_parts(spec_hash, signature))
    }

    /// Build a claim and return only its identifier.
    ///
    /// The caller keeps the specification and signature if it wants the claim
    /// to be auditable later; use [`ClaimBuilder::build`] to get them.
    pub fn build_claim(specification: &[u8], signer: &dyn Signer) -> ClaimId {
        let spec_hash = ContentAddresser::address_of(specification);
        let signature = signer.sign(&Claim::signing_bytes(&spec_hash));
        Claim::from_parts(spec_hash, signature).id()
    }
}

impl<'a> Default for ClaimBuilder<'a> {
    fn default() -> Self {
        Self::new()
    }
}
