#![allow(dead_code)]

use async_trait::async_trait;
use bson::Document;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

use trip_discovery::config::DiscoveryConfig;
use trip_discovery::db::gateway::{CatalogGateway, Condition, GatewayError};
use trip_discovery::db::saved_store::{SavedItemStore, SavedStoreError};
use trip_discovery::db::trip_writer::TripWriter;
use trip_discovery::models::saved::SavedItem;
use trip_discovery::models::trip::{Rating, RatingSummary, TripListing, TripType};
use trip_discovery::services::completion_client::{CompletionClient, GenerativeError};

pub fn trip(id: &str, name: &str, trip_type: TripType, usage: u32, average: f64) -> TripListing {
    let mut trip: TripListing = serde_json::from_value(json!({
        "id": id,
        "name": name,
        "description": format!("{} for a week", name),
        "location": "India",
        "budget": { "min": 10000, "max": 20000 },
    }))
    .unwrap();
    trip.trip_type = trip_type;
    trip.usage_count = usage;
    trip.rating = RatingSummary {
        average,
        total_count: 10,
    };
    trip
}

pub fn remote_catalog() -> Vec<TripListing> {
    vec![
        trip("r1", "Goa Beach Hop", TripType::Beach, 40, 4.1),
        trip("r2", "Kerala Backwaters", TripType::Nature, 90, 4.8),
        trip("r3", "Jaipur Heritage Walk", TripType::Cultural, 15, 4.5),
    ]
}

pub fn test_config() -> DiscoveryConfig {
    DiscoveryConfig {
        popular_limit: 3,
        trending_limit: 3,
        ..DiscoveryConfig::default()
    }
}

/// Catalog gateway that serves a fixed list or a fixed error.
pub struct FakeGateway {
    result: Mutex<Result<Vec<TripListing>, GatewayError>>,
    delays: Mutex<VecDeque<Duration>>,
    raw: Mutex<Vec<Document>>,
    pub calls: Mutex<Vec<Vec<Condition>>>,
}

impl FakeGateway {
    pub fn serving(trips: Vec<TripListing>) -> Arc<Self> {
        Arc::new(Self {
            result: Mutex::new(Ok(trips)),
            delays: Mutex::new(VecDeque::new()),
            raw: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(err: GatewayError) -> Arc<Self> {
        Arc::new(Self {
            result: Mutex::new(Err(err)),
            delays: Mutex::new(VecDeque::new()),
            raw: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn set_result(&self, result: Result<Vec<TripListing>, GatewayError>) {
        *self.result.lock().unwrap() = result;
    }

    /// Each subsequent query sleeps for the next queued delay.
    pub fn queue_delay(&self, delay: Duration) {
        self.delays.lock().unwrap().push_back(delay);
    }

    /// Appends a document as stored, bypassing `TripListing` encoding.
    pub fn push_raw(&self, document: Document) {
        self.raw.lock().unwrap().push(document);
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl CatalogGateway for FakeGateway {
    async fn query(
        &self,
        _collection: &str,
        conditions: &[Condition],
    ) -> Result<Vec<Document>, GatewayError> {
        self.calls.lock().unwrap().push(conditions.to_vec());
        let delay = self.delays.lock().unwrap().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let result = self.result.lock().unwrap().clone();
        let raw = self.raw.lock().unwrap().clone();
        result.map(|trips| {
            trips
                .iter()
                .map(|trip| bson::to_document(trip).unwrap())
                .chain(raw)
                .collect()
        })
    }
}

#[derive(Default)]
pub struct FakeSavedStore {
    pub items: Mutex<Vec<SavedItem>>,
    pub fail_with: Mutex<Option<SavedStoreError>>,
    pub gate: Option<Arc<Notify>>,
    pub lists: AtomicUsize,
    pub inserts: AtomicUsize,
    pub removes: AtomicUsize,
}

impl FakeSavedStore {
    pub fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn writes(&self) -> usize {
        self.inserts.load(Ordering::SeqCst) + self.removes.load(Ordering::SeqCst)
    }

    fn failure(&self) -> Option<SavedStoreError> {
        self.fail_with.lock().unwrap().clone()
    }
}

#[async_trait]
impl SavedItemStore for FakeSavedStore {
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<SavedItem>, SavedStoreError> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.failure() {
            return Err(err);
        }
        Ok(self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|item| item.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn insert(&self, item: &SavedItem) -> Result<(), SavedStoreError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if let Some(err) = self.failure() {
            return Err(err);
        }
        let mut items = self.items.lock().unwrap();
        if items
            .iter()
            .any(|saved| saved.user_id == item.user_id && saved.item_id == item.item_id)
        {
            return Err(SavedStoreError::Conflict("Item already saved".to_string()));
        }
        items.push(item.clone());
        Ok(())
    }

    async fn remove(&self, user_id: &str, item_id: &str) -> Result<(), SavedStoreError> {
        self.removes.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if let Some(err) = self.failure() {
            return Err(err);
        }
        let mut items = self.items.lock().unwrap();
        let before = items.len();
        items.retain(|saved| !(saved.user_id == user_id && saved.item_id == item_id));
        if items.len() == before {
            return Err(SavedStoreError::Conflict("Item already removed".to_string()));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeTripWriter {
    pub usage_calls: Mutex<Vec<String>>,
    pub ratings: Mutex<Vec<(String, Rating)>>,
}

impl FakeTripWriter {
    pub fn call_count(&self) -> usize {
        self.usage_calls.lock().unwrap().len() + self.ratings.lock().unwrap().len()
    }
}

#[async_trait]
impl TripWriter for FakeTripWriter {
    async fn increment_usage(&self, trip_id: &str) -> Result<(), GatewayError> {
        self.usage_calls.lock().unwrap().push(trip_id.to_string());
        Ok(())
    }

    async fn push_rating(&self, trip_id: &str, rating: &Rating) -> Result<(), GatewayError> {
        self.ratings
            .lock()
            .unwrap()
            .push((trip_id.to_string(), rating.clone()));
        Ok(())
    }
}

/// Completion service that replies with canned text or fails.
pub struct ScriptedCompletion {
    reply: Result<String, String>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedCompletion {
    pub fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(message.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl CompletionClient for ScriptedCompletion {
    async fn complete(&self, prompt: &str) -> Result<String, GenerativeError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply
            .clone()
            .map_err(GenerativeError::Response)
    }
}
