use async_trait::async_trait;
use bson::{Bson, Document};
use futures::TryStreamExt;
use log::warn;
use mongodb::error::ErrorKind;
use mongodb::{Client, Collection};
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// Declarative query conditions, applied in the order supplied.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq { field: String, value: Bson },
    OrderBy { field: String, direction: Direction },
    Limit(i64),
}

impl Condition {
    pub fn eq(field: &str, value: impl Into<Bson>) -> Self {
        Condition::Eq {
            field: field.to_string(),
            value: value.into(),
        }
    }

    pub fn order_by(field: &str, direction: Direction) -> Self {
        Condition::OrderBy {
            field: field.to_string(),
            direction,
        }
    }

    pub fn limit(value: usize) -> Self {
        Condition::Limit(value as i64)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GatewayError {
    AccessDenied(String),
    Transport(String),
    MalformedQuery(String),
    Decode(String),
}

impl GatewayError {
    pub fn is_access_error(&self) -> bool {
        matches!(self, GatewayError::AccessDenied(_))
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::AccessDenied(msg) => write!(f, "Access denied: {}", msg),
            GatewayError::Transport(msg) => write!(f, "Transport error: {}", msg),
            GatewayError::MalformedQuery(msg) => write!(f, "Malformed query: {}", msg),
            GatewayError::Decode(msg) => write!(f, "Decode error: {}", msg),
        }
    }
}

impl std::error::Error for GatewayError {}

impl From<mongodb::error::Error> for GatewayError {
    fn from(err: mongodb::error::Error) -> Self {
        match err.kind.as_ref() {
            ErrorKind::Authentication { .. } => GatewayError::AccessDenied(err.to_string()),
            // 13 Unauthorized, 18 AuthenticationFailed
            ErrorKind::Command(command) if matches!(command.code, 13 | 18) => {
                GatewayError::AccessDenied(err.to_string())
            }
            ErrorKind::InvalidArgument { .. } => GatewayError::MalformedQuery(err.to_string()),
            _ => GatewayError::Transport(err.to_string()),
        }
    }
}

/// Read façade over the remote document store. Failures come back as
/// values; no retries happen here.
#[async_trait]
pub trait CatalogGateway: Send + Sync {
    async fn query(
        &self,
        collection: &str,
        conditions: &[Condition],
    ) -> Result<Vec<Document>, GatewayError>;
}

/// Runs a query and decodes each document into `T`. Documents that fail to
/// decode are logged and skipped; the rest of the batch is kept.
pub async fn query_as<T: DeserializeOwned>(
    gateway: &dyn CatalogGateway,
    collection: &str,
    conditions: &[Condition],
) -> Result<Vec<T>, GatewayError> {
    let documents = gateway.query(collection, conditions).await?;
    Ok(documents
        .into_iter()
        .filter_map(|document| {
            let id = document.get("_id").map(|id| id.to_string());
            match bson::from_document(document) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!(
                        "Skipping undecodable document {} in {}: {}",
                        id.unwrap_or_else(|| "<no id>".to_string()),
                        collection,
                        e
                    );
                    None
                }
            }
        })
        .collect())
}

pub struct MongoCatalogGateway {
    client: Arc<Client>,
    database: String,
}

impl MongoCatalogGateway {
    pub fn new(client: Arc<Client>, database: &str) -> Self {
        Self {
            client,
            database: database.to_string(),
        }
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct MongoQuery {
    pub filter: Document,
    pub sort: Option<Document>,
    pub limit: Option<i64>,
}

/// Folds conditions into a filter/sort/limit triple. Later sorts on the same
/// field replace earlier ones; a second limit replaces the first.
pub fn build_query(conditions: &[Condition]) -> Result<MongoQuery, GatewayError> {
    let mut query = MongoQuery::default();

    for condition in conditions {
        match condition {
            Condition::Eq { field, value } => {
                if field.is_empty() {
                    return Err(GatewayError::MalformedQuery(
                        "equality condition without a field".to_string(),
                    ));
                }
                query.filter.insert(field.clone(), value.clone());
            }
            Condition::OrderBy { field, direction } => {
                if field.is_empty() {
                    return Err(GatewayError::MalformedQuery(
                        "ordering condition without a field".to_string(),
                    ));
                }
                let order = match direction {
                    Direction::Asc => 1,
                    Direction::Desc => -1,
                };
                query
                    .sort
                    .get_or_insert_with(Document::new)
                    .insert(field.clone(), order);
            }
            Condition::Limit(value) => {
                if *value <= 0 {
                    return Err(GatewayError::MalformedQuery(format!(
                        "limit must be positive, got {}",
                        value
                    )));
                }
                query.limit = Some(*value);
            }
        }
    }

    Ok(query)
}

#[async_trait]
impl CatalogGateway for MongoCatalogGateway {
    async fn query(
        &self,
        collection: &str,
        conditions: &[Condition],
    ) -> Result<Vec<Document>, GatewayError> {
        let query = build_query(conditions)?;
        let collection: Collection<Document> =
            self.client.database(&self.database).collection(collection);

        let mut find = collection.find(query.filter);
        if let Some(sort) = query.sort {
            find = find.sort(sort);
        }
        if let Some(limit) = query.limit {
            find = find.limit(limit);
        }

        let cursor = find.await?;
        let documents = cursor.try_collect().await?;

        Ok(documents)
    }
}
