//! Auth module: account records, the active session and signed tokens.
//!
//! `IdentityStore` owns the `users` and `session` collections; `TokenService`
//! turns a session into a bearer token for HTTP callers and back;
//! `TokenRevocations` remembers tokens ended by logout until they expire.

pub mod domain;
pub mod errors;
pub mod identity;
pub mod password;
pub mod revocation;
pub mod token;

pub use errors::AuthError;
pub use identity::IdentityStore;
pub use revocation::TokenRevocations;
pub use token::{TokenService, VerifiedToken};
