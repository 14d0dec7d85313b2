use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use models::{ItemInput, RentalItem, Session};

use crate::errors::ServiceError;
use crate::storage::{collections, load_vec, save_value, CollectionStore};

/// Durable collection of rental items.
///
/// Items keep insertion order. Mutations re-check existence and ownership
/// under the write lock, so a delete cannot race an update on the same id.
pub struct ListingStore {
    store: Arc<dyn CollectionStore>,
    write: Mutex<()>,
    max_image_url_len: usize,
}

impl ListingStore {
    pub fn new(store: Arc<dyn CollectionStore>, max_image_url_len: usize) -> Self {
        Self { store, write: Mutex::new(()), max_image_url_len }
    }

    async fn load(&self) -> Result<Vec<RentalItem>, ServiceError> {
        Ok(load_vec(&*self.store, collections::ITEMS).await?)
    }

    /// Post a new item owned by the session's user.
    #[instrument(skip(self, session, input), fields(title = %input.title))]
    pub async fn create_item(&self, session: Option<&Session>, input: ItemInput) -> Result<RentalItem, ServiceError> {
        let session = session.ok_or(ServiceError::Unauthenticated)?;
        input.validate(self.max_image_url_len)?;

        let _guard = self.write.lock().await;
        let mut items = self.load().await?;
        let item = RentalItem::new(input, session.id, Utc::now());
        items.push(item.clone());
        save_value(&*self.store, collections::ITEMS, &items).await?;
        info!(item_id = %item.id, user_id = %session.id, "item_created");
        Ok(item)
    }

    /// Every item, in insertion order.
    pub async fn list_all(&self) -> Result<Vec<RentalItem>, ServiceError> {
        self.load().await
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<RentalItem>, ServiceError> {
        Ok(self.load().await?.into_iter().find(|i| i.id == id))
    }

    /// Items posted by `user_id`, keeping their relative order.
    pub async fn list_by_owner(&self, user_id: Uuid) -> Result<Vec<RentalItem>, ServiceError> {
        let mut items = self.load().await?;
        items.retain(|i| i.is_owned_by(user_id));
        Ok(items)
    }

    /// Replace the mutable fields of an item the caller owns.
    #[instrument(skip(self, session, input))]
    pub async fn update_item(
        &self,
        session: Option<&Session>,
        id: Uuid,
        input: ItemInput,
    ) -> Result<RentalItem, ServiceError> {
        let session = session.ok_or(ServiceError::Unauthenticated)?;

        let _guard = self.write.lock().await;
        let mut items = self.load().await?;
        let item = items.iter_mut().find(|i| i.id == id).ok_or_else(|| ServiceError::not_found("item"))?;
        if !item.is_owned_by(session.id) {
            warn!(user_id = %session.id, owner = %item.user_id, "update refused: not owner");
            return Err(ServiceError::forbidden("item"));
        }
        input.validate(self.max_image_url_len)?;
        item.apply(input);
        let updated = item.clone();

        save_value(&*self.store, collections::ITEMS, &items).await?;
        info!(item_id = %id, user_id = %session.id, "item_updated");
        Ok(updated)
    }

    /// Remove an item the caller owns.
    #[instrument(skip(self, session))]
    pub async fn delete_item(&self, session: Option<&Session>, id: Uuid) -> Result<(), ServiceError> {
        let session = session.ok_or(ServiceError::Unauthenticated)?;

        let _guard = self.write.lock().await;
        let mut items = self.load().await?;
        let pos = items.iter().position(|i| i.id == id).ok_or_else(|| ServiceError::not_found("item"))?;
        if !items[pos].is_owned_by(session.id) {
            warn!(user_id = %session.id, owner = %items[pos].user_id, "delete refused: not owner");
            return Err(ServiceError::forbidden("item"));
        }
        items.remove(pos);

        save_value(&*self.store, collections::ITEMS, &items).await?;
        info!(item_id = %id, user_id = %session.id, "item_deleted");
        Ok(())
    }
}
