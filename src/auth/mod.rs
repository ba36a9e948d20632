pub mod claims;
pub mod role;

pub use claims::{decode_claims, Claims};
pub use role::{resolve_role, ResolvedRole};
