use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::trip::TripListing;

pub const TRIP_ITEM_TYPE: &str = "trip";

/// Display fields captured when the item is saved, so the saved list renders
/// without refetching the listing.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SavedSnapshot {
    pub title: String,
    pub subtitle: String,
    pub price: f64,
    pub image: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SavedItem {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub item_id: String,
    pub item_type: String,
    pub snapshot: SavedSnapshot,
    pub saved_at: DateTime<Utc>,
}

impl SavedItem {
    pub fn from_trip(user_id: &str, trip: &TripListing) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            item_id: trip.id.clone(),
            item_type: TRIP_ITEM_TYPE.to_string(),
            snapshot: SavedSnapshot {
                title: trip.name.clone(),
                subtitle: format!("{} · {} days", trip.location, trip.duration_days),
                price: trip.budget.min,
                image: trip.image_url.clone(),
            },
            saved_at: Utc::now(),
        }
    }
}
