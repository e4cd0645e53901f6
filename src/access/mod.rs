// Access module - single-owner gate for administrative registry operations

mod ownable;

pub use ownable::{AccessControl, AccessError};
