//! Service layer for rentpal: identity and listing stores over a pluggable
//! collection store.
//! - `storage` defines the persistence port and its file/memory adapters.
//! - `auth` owns accounts, the active session and bearer tokens.
//! - `listings` owns rental items and enforces ownership on every mutation.

pub mod errors;
pub mod auth;
pub mod listings;
pub mod runtime;
#[cfg(test)]
pub mod test_support;
pub mod storage;
