//! # Auth
//!
//! User records, credential hashing and the point mutation policy.
//! Session handling and credential UI live outside this crate.

pub mod crypto;
pub mod errors;
pub mod policy;
pub mod user;

pub use crypto::hash_password;
pub use errors::{AuthError, AuthResult};
pub use policy::{may_mutate, require_admin, require_mutation};
pub use user::{Role, User};
