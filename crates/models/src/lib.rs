//! Domain records shared by the stores and the HTTP layer.
//!
//! Field names follow the persisted layout of the `users`, `session` and
//! `items` collections.

pub mod errors;
pub mod item;
pub mod session;
pub mod user;

pub use item::{ItemInput, RentalItem};
pub use session::Session;
pub use user::User;
