use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::user::User;

/// Public identity of the authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub name: String,
}

impl From<&User> for Session {
    fn from(user: &User) -> Self {
        Self { id: user.id, name: user.name.clone() }
    }
}
