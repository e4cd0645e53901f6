// Claim module - signed, content-addressed assertions over dataset specifications
// Only the resulting ClaimId ever reaches the registry

mod builder;
mod codec;
mod model;
mod validator;

pub use builder::*;
pub use codec::*;
pub use model::*;
pub use validator::*;
