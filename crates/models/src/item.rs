use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ModelError;

/// A posted rental listing.
///
/// `id`, `user_id` and `created_at` are fixed at creation; the remaining
/// fields are replaced wholesale by an update from the owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RentalItem {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Inline `data:` URI carrying the photo bytes.
    pub image_url: String,
    pub phone_number: String,
    pub address: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Mutable field set accepted by create and update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemInput {
    pub title: String,
    pub description: String,
    pub phone_number: String,
    pub address: String,
    pub image_url: String,
}

impl ItemInput {
    /// Check required fields, reporting every missing one by its wire name.
    pub fn validate(&self, max_image_url_len: usize) -> Result<(), ModelError> {
        let required = [
            ("title", &self.title),
            ("phoneNumber", &self.phone_number),
            ("address", &self.address),
            ("imageUrl", &self.image_url),
        ];
        let missing: Vec<&'static str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(field, _)| *field)
            .collect();
        if !missing.is_empty() {
            return Err(ModelError::MissingFields(missing));
        }
        if self.image_url.len() > max_image_url_len {
            return Err(ModelError::Validation(format!(
                "imageUrl exceeds {max_image_url_len} bytes"
            )));
        }
        Ok(())
    }
}

impl RentalItem {
    pub fn new(input: ItemInput, owner: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            image_url: input.image_url,
            phone_number: input.phone_number,
            address: input.address,
            user_id: owner,
            created_at: now,
        }
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }

    /// Replace the mutable fields in place.
    pub fn apply(&mut self, input: ItemInput) {
        self.title = input.title;
        self.description = input.description;
        self.phone_number = input.phone_number;
        self.address = input.address;
        self.image_url = input.image_url;
    }
}
