#![cfg(test)]
use models::{ItemInput, Session};
use uuid::Uuid;

pub fn session(name: &str) -> Session {
    Session { id: Uuid::new_v4(), name: name.to_string() }
}

pub fn drill() -> ItemInput {
    ItemInput {
        title: "Drill".into(),
        description: String::new(),
        phone_number: "555-1234".into(),
        address: "1 Main St".into(),
        image_url: "data:image/png;base64,iVBORw0KGgo=".into(),
    }
}
