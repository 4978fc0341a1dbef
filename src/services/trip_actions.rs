use chrono::Utc;
use log::{info, warn};
use serde::Serialize;
use std::sync::Arc;

use crate::db::trip_writer::TripWriter;
use crate::models::trip::Rating;
use crate::services::fallback_corpus::is_fallback_id;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Set when the action was simulated against a bundled listing.
    pub simulated: bool,
}

impl ActionOutcome {
    fn ok() -> Self {
        Self {
            success: true,
            error: None,
            simulated: false,
        }
    }

    fn simulated() -> Self {
        Self {
            success: true,
            error: None,
            simulated: true,
        }
    }

    fn failed(error: String) -> Self {
        Self {
            success: false,
            error: Some(error),
            simulated: false,
        }
    }
}

/// "Use this plan" and "rate" against catalog listings.
pub struct TripActions {
    writer: Arc<dyn TripWriter>,
}

impl TripActions {
    pub fn new(writer: Arc<dyn TripWriter>) -> Self {
        Self { writer }
    }

    pub async fn use_plan(&self, trip_id: &str) -> ActionOutcome {
        if is_fallback_id(trip_id) {
            return ActionOutcome::simulated();
        }

        match self.writer.increment_usage(trip_id).await {
            Ok(()) => {
                info!("Usage recorded for trip {}", trip_id);
                ActionOutcome::ok()
            }
            Err(err) => {
                warn!("Failed to record usage for trip {}: {}", trip_id, err);
                ActionOutcome::failed(err.to_string())
            }
        }
    }

    pub async fn rate(&self, trip_id: &str, user_id: &str, value: u8, comment: &str) -> ActionOutcome {
        if !(1..=5).contains(&value) {
            return ActionOutcome::failed(format!("Rating must be between 1 and 5, got {}", value));
        }

        if is_fallback_id(trip_id) {
            return ActionOutcome::simulated();
        }

        let rating = Rating {
            user_id: user_id.to_string(),
            value,
            comment: comment.trim().to_string(),
            date: Utc::now(),
        };

        match self.writer.push_rating(trip_id, &rating).await {
            Ok(()) => ActionOutcome::ok(),
            Err(err) => {
                warn!("Failed to rate trip {}: {}", trip_id, err);
                ActionOutcome::failed(err.to_string())
            }
        }
    }
}
