use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use mongodb::{Client, Collection};
use std::sync::Arc;

use crate::db::gateway::GatewayError;
use crate::models::trip::Rating;

/// The two writes this layer makes against listings: bumping the usage
/// counter and appending an individual rating.
#[async_trait]
pub trait TripWriter: Send + Sync {
    async fn increment_usage(&self, trip_id: &str) -> Result<(), GatewayError>;
    async fn push_rating(&self, trip_id: &str, rating: &Rating) -> Result<(), GatewayError>;
}

pub struct MongoTripWriter {
    client: Arc<Client>,
    database: String,
    collection: String,
}

impl MongoTripWriter {
    pub fn new(client: Arc<Client>, database: &str, collection: &str) -> Self {
        Self {
            client,
            database: database.to_string(),
            collection: collection.to_string(),
        }
    }

    fn collection(&self) -> Collection<bson::Document> {
        self.client
            .database(&self.database)
            .collection(&self.collection)
    }
}

// Listings authored through the store carry ObjectIds; imported ones may use strings.
fn id_filter(trip_id: &str) -> bson::Document {
    match ObjectId::parse_str(trip_id) {
        Ok(oid) => doc! { "_id": oid },
        Err(_) => doc! { "_id": trip_id },
    }
}

#[async_trait]
impl TripWriter for MongoTripWriter {
    async fn increment_usage(&self, trip_id: &str) -> Result<(), GatewayError> {
        let result = self
            .collection()
            .update_one(id_filter(trip_id), doc! { "$inc": { "usage_count": 1 } })
            .await?;

        if result.matched_count == 0 {
            return Err(GatewayError::MalformedQuery(format!(
                "No listing with id {}",
                trip_id
            )));
        }
        Ok(())
    }

    async fn push_rating(&self, trip_id: &str, rating: &Rating) -> Result<(), GatewayError> {
        let rating = bson::to_bson(rating).map_err(|e| GatewayError::Decode(e.to_string()))?;

        // The aggregate is derived from the list in the same update so the two
        // never disagree on the stored document.
        let pipeline = vec![
            doc! { "$set": { "ratings": { "$concatArrays": [ { "$ifNull": ["$ratings", []] }, [rating] ] } } },
            doc! { "$set": {
                "rating.average": { "$avg": "$ratings.value" },
                "rating.total_count": { "$size": "$ratings" },
            } },
        ];

        let result = self
            .collection()
            .update_one(id_filter(trip_id), pipeline)
            .await?;

        if result.matched_count == 0 {
            return Err(GatewayError::MalformedQuery(format!(
                "No listing with id {}",
                trip_id
            )));
        }
        Ok(())
    }
}
