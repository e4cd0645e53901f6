// Identity module - who signs claims and who acts on the registry
// Ed25519 and secp256k1 signing keys behind a curve-agnostic Signer trait

mod did;
mod keypair;
mod secp;
mod signer;

pub use did::*;
pub use keypair::*;
pub use secp::*;
pub use signer::*;
