//! Rental listings: create, browse, filter by owner, and owner-only edits.

pub mod store;

pub use store::ListingStore;
