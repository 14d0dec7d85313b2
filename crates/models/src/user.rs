use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ModelError;

/// Stored account record. The password is kept only as an argon2 PHC string.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub password_hash: String,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("password_hash", &"<redacted>")
            .finish()
    }
}

impl User {
    pub fn new(name: &str, password_hash: String) -> Self {
        Self { id: Uuid::new_v4(), name: name.to_string(), password_hash }
    }
}

pub fn validate_name(name: &str) -> Result<(), ModelError> {
    if name.trim().is_empty() {
        return Err(ModelError::Validation("name required".into()));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), ModelError> {
    if password.is_empty() {
        return Err(ModelError::Validation("password required".into()));
    }
    Ok(())
}
