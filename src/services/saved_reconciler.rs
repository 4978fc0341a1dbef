use log::{info, warn};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{OnceCell, RwLock};

use crate::db::saved_store::{SavedItemStore, SavedStoreError};
use crate::models::saved::SavedItem;
use crate::models::trip::TripListing;
use crate::services::fallback_corpus::is_fallback_id;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToggleOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Whether the item is saved after this call.
    pub saved: bool,
}

impl ToggleOutcome {
    fn ok(saved: bool) -> Self {
        Self {
            success: true,
            error: None,
            saved,
        }
    }

    fn failed(error: String, saved: bool) -> Self {
        Self {
            success: false,
            error: Some(error),
            saved,
        }
    }
}

/// Holds an item id in the in-flight set until dropped, so a toggle that is
/// cancelled mid-write still releases its slot.
struct InFlightGuard<'a> {
    in_flight: &'a Mutex<HashSet<String>>,
    item_id: String,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(in_flight: &'a Mutex<HashSet<String>>, item_id: &str) -> Option<Self> {
        let inserted = in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(item_id.to_string());

        inserted.then(|| Self {
            in_flight,
            item_id: item_id.to_string(),
        })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.item_id);
    }
}

/// Tracks which listings one user has saved. Local state only changes after
/// the remote write succeeds, so a failed write needs no rollback.
pub struct SavedItemReconciler {
    user_id: String,
    store: Arc<dyn SavedItemStore>,
    saved_ids: RwLock<HashSet<String>>,
    in_flight: Mutex<HashSet<String>>,
    seeded: OnceCell<()>,
}

impl SavedItemReconciler {
    pub fn new(user_id: &str, store: Arc<dyn SavedItemStore>) -> Self {
        Self {
            user_id: user_id.to_string(),
            store,
            saved_ids: RwLock::new(HashSet::new()),
            in_flight: Mutex::new(HashSet::new()),
            seeded: OnceCell::new(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Loads the remote saved set once per session. A failed load leaves the
    /// set empty and is retried on the next call.
    pub async fn seed(&self) -> Result<(), SavedStoreError> {
        self.seeded
            .get_or_try_init(|| async {
                let items = self.store.list_for_user(&self.user_id).await?;
                let mut saved_ids = self.saved_ids.write().await;
                saved_ids.extend(items.into_iter().map(|item| item.item_id));
                info!(
                    "Seeded {} saved items for user {}",
                    saved_ids.len(),
                    self.user_id
                );
                Ok::<(), SavedStoreError>(())
            })
            .await
            .map(|_| ())
    }

    pub async fn saved_ids(&self) -> HashSet<String> {
        self.saved_ids.read().await.clone()
    }

    pub async fn is_saved(&self, item_id: &str) -> bool {
        self.saved_ids.read().await.contains(item_id)
    }

    pub async fn toggle(&self, trip: &TripListing) -> ToggleOutcome {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight, &trip.id) else {
            return ToggleOutcome::failed(
                "A save for this item is already in progress".to_string(),
                self.is_saved(&trip.id).await,
            );
        };

        self.toggle_inner(trip).await
    }

    async fn toggle_inner(&self, trip: &TripListing) -> ToggleOutcome {
        let item_id = trip.id.as_str();
        let currently_saved = self.is_saved(item_id).await;

        // Bundled listings are unknown to the store: flip locally only.
        if is_fallback_id(item_id) {
            self.set_saved(item_id, !currently_saved).await;
            return ToggleOutcome::ok(!currently_saved);
        }

        let result = if currently_saved {
            self.store.remove(&self.user_id, item_id).await
        } else {
            let snapshot = SavedItem::from_trip(&self.user_id, trip);
            self.store.insert(&snapshot).await
        };

        match result {
            Ok(()) => {
                self.set_saved(item_id, !currently_saved).await;
                ToggleOutcome::ok(!currently_saved)
            }
            // Already inserted or already removed: the remote agrees with the flip.
            Err(SavedStoreError::Conflict(msg)) => {
                info!("Saved item {} conflict treated as success: {}", item_id, msg);
                self.set_saved(item_id, !currently_saved).await;
                ToggleOutcome::ok(!currently_saved)
            }
            Err(err) => {
                warn!("Failed to toggle saved item {}: {}", item_id, err);
                ToggleOutcome::failed(err.to_string(), currently_saved)
            }
        }
    }

    async fn set_saved(&self, item_id: &str, saved: bool) {
        let mut saved_ids = self.saved_ids.write().await;
        if saved {
            saved_ids.insert(item_id.to_string());
        } else {
            saved_ids.remove(item_id);
        }
    }
}
