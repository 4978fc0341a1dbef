use async_trait::async_trait;
use bson::{doc, Document};
use futures::TryStreamExt;
use log::info;
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, IndexModel};
use std::fmt;
use std::sync::Arc;

use crate::models::saved::SavedItem;

const DUPLICATE_KEY: i32 = 11000;
const USER_ITEM_INDEX: &str = "user_id_item_id_unique";

#[derive(Debug, Clone, PartialEq)]
pub enum SavedStoreError {
    /// The write raced another one: already inserted or already removed.
    Conflict(String),
    Transport(String),
}

impl fmt::Display for SavedStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SavedStoreError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            SavedStoreError::Transport(msg) => write!(f, "Transport error: {}", msg),
        }
    }
}

impl std::error::Error for SavedStoreError {}

impl From<mongodb::error::Error> for SavedStoreError {
    fn from(err: mongodb::error::Error) -> Self {
        match err.kind.as_ref() {
            ErrorKind::Write(WriteFailure::WriteError(write_error))
                if write_error.code == DUPLICATE_KEY =>
            {
                SavedStoreError::Conflict(err.to_string())
            }
            _ => SavedStoreError::Transport(err.to_string()),
        }
    }
}

#[async_trait]
pub trait SavedItemStore: Send + Sync {
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<SavedItem>, SavedStoreError>;
    async fn insert(&self, item: &SavedItem) -> Result<(), SavedStoreError>;
    async fn remove(&self, user_id: &str, item_id: &str) -> Result<(), SavedStoreError>;
}

pub struct MongoSavedItemStore {
    client: Arc<Client>,
    database: String,
    collection: String,
}

impl MongoSavedItemStore {
    pub fn new(client: Arc<Client>, database: &str, collection: &str) -> Self {
        Self {
            client,
            database: database.to_string(),
            collection: collection.to_string(),
        }
    }

    fn collection(&self) -> Collection<SavedItem> {
        self.client
            .database(&self.database)
            .collection(&self.collection)
    }

    /// Creates the unique (user_id, item_id) index. Safe to call on every
    /// startup; an existing identical index is left alone.
    pub async fn ensure_indexes(&self) -> Result<(), SavedStoreError> {
        self.collection().create_index(user_item_index()).await?;
        info!("Ensured index {} on {}", USER_ITEM_INDEX, self.collection);
        Ok(())
    }
}

pub fn user_item_index() -> IndexModel {
    IndexModel::builder()
        .keys(doc! { "user_id": 1, "item_id": 1 })
        .options(
            IndexOptions::builder()
                .unique(true)
                .name(USER_ITEM_INDEX.to_string())
                .build(),
        )
        .build()
}

/// Filter and update for an insert-if-absent upsert keyed on (user_id, item_id).
pub fn insert_if_absent(item: &SavedItem) -> Result<(Document, Document), SavedStoreError> {
    let filter = doc! { "user_id": item.user_id.as_str(), "item_id": item.item_id.as_str() };
    let fields =
        bson::to_document(item).map_err(|e| SavedStoreError::Transport(e.to_string()))?;
    Ok((filter, doc! { "$setOnInsert": fields }))
}

#[async_trait]
impl SavedItemStore for MongoSavedItemStore {
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<SavedItem>, SavedStoreError> {
        let cursor = self
            .collection()
            .find(doc! { "user_id": user_id })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn insert(&self, item: &SavedItem) -> Result<(), SavedStoreError> {
        let (filter, update) = insert_if_absent(item)?;
        let result = self
            .collection()
            .update_one(filter, update)
            .upsert(true)
            .await?;

        // Matched an existing row; a concurrent upsert instead fails on the
        // unique index with a duplicate key.
        if result.upserted_id.is_none() {
            return Err(SavedStoreError::Conflict("Item already saved".to_string()));
        }
        Ok(())
    }

    async fn remove(&self, user_id: &str, item_id: &str) -> Result<(), SavedStoreError> {
        let result = self
            .collection()
            .delete_one(doc! { "user_id": user_id, "item_id": item_id })
            .await?;

        if result.deleted_count == 0 {
            return Err(SavedStoreError::Conflict("Item already removed".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::trip::TripListing;
    use serde_json::json;

    fn saved_item() -> SavedItem {
        let trip: TripListing = serde_json::from_value(json!({
            "id": "t1",
            "name": "Hampi Ruins",
            "budget": { "min": 8000, "max": 12000 }
        }))
        .unwrap();
        SavedItem::from_trip("user-1", &trip)
    }

    #[test]
    fn test_index_is_unique_on_user_and_item() {
        let index = user_item_index();
        assert_eq!(index.keys, doc! { "user_id": 1, "item_id": 1 });
        let options = index.options.unwrap();
        assert_eq!(options.unique, Some(true));
        assert_eq!(options.name.as_deref(), Some(USER_ITEM_INDEX));
    }

    #[test]
    fn test_upsert_filters_on_index_keys_and_only_sets_on_insert() {
        let item = saved_item();
        let (filter, update) = insert_if_absent(&item).unwrap();

        assert_eq!(filter, doc! { "user_id": "user-1", "item_id": "t1" });
        assert_eq!(update.len(), 1);

        let fields = update.get_document("$setOnInsert").unwrap();
        assert_eq!(fields.get_str("_id").unwrap(), item.id);
        assert_eq!(fields.get_str("item_id").unwrap(), "t1");
    }
}
