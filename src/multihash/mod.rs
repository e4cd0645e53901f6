// Multihash module - content addressing
// Self-describing digests: <hash code><digest size><digest>, base58 on the outside

mod addresser;
mod id;

pub use addresser::*;
pub use id::*;
