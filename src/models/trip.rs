use bson::Bson;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    /// Unknown labels resolve to `medium`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "easy" => Difficulty::Easy,
            "hard" | "difficult" | "challenging" => Difficulty::Hard,
            _ => Difficulty::Medium,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompanionType {
    #[default]
    Solo,
    Couple,
    Family,
    Friends,
    Group,
}

impl CompanionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompanionType::Solo => "solo",
            CompanionType::Couple => "couple",
            CompanionType::Family => "family",
            CompanionType::Friends => "friends",
            CompanionType::Group => "group",
        }
    }

    /// Unknown labels resolve to `solo`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "couple" => CompanionType::Couple,
            "family" => CompanionType::Family,
            "friends" => CompanionType::Friends,
            "group" => CompanionType::Group,
            _ => CompanionType::Solo,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TripType {
    #[default]
    Adventure,
    Relaxation,
    Spiritual,
    Cultural,
    Nature,
    Wildlife,
    Beach,
    Other,
}

impl TripType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripType::Adventure => "adventure",
            TripType::Relaxation => "relaxation",
            TripType::Spiritual => "spiritual",
            TripType::Cultural => "cultural",
            TripType::Nature => "nature",
            TripType::Wildlife => "wildlife",
            TripType::Beach => "beach",
            TripType::Other => "other",
        }
    }

    /// Unknown labels resolve to `other`, an empty label to the default.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "" | "adventure" => TripType::Adventure,
            "relaxation" => TripType::Relaxation,
            "spiritual" => TripType::Spiritual,
            "cultural" => TripType::Cultural,
            "nature" => TripType::Nature,
            "wildlife" => TripType::Wildlife,
            "beach" => TripType::Beach,
            _ => TripType::Other,
        }
    }
}

// Labels are stored lowercase but remote documents and generated plans are
// not always consistent about casing, so all three enums go through a string.
impl Serialize for Difficulty {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Difficulty {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Difficulty::from_label(&String::deserialize(deserializer)?))
    }
}

impl Serialize for CompanionType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CompanionType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(CompanionType::from_label(&String::deserialize(deserializer)?))
    }
}

impl Serialize for TripType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TripType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(TripType::from_label(&String::deserialize(deserializer)?))
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Default)]
pub struct BudgetRange {
    #[serde(default, deserialize_with = "deserialize_number")]
    pub min: f64,
    #[serde(default, deserialize_with = "deserialize_number")]
    pub max: f64,
}

impl BudgetRange {
    pub fn new(min: f64, max: f64) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn overlaps(&self, min: f64, max: f64) -> bool {
        self.max >= min && self.min <= max
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Default)]
pub struct RatingSummary {
    #[serde(default, deserialize_with = "deserialize_number")]
    pub average: f64,
    #[serde(default, alias = "totalCount")]
    pub total_count: u32,
}

/// One user's score. A value of 0 marks an unreadable score and is left out
/// of the aggregate.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Rating {
    #[serde(default, alias = "userId")]
    pub user_id: String,
    #[serde(default, deserialize_with = "deserialize_rating_value")]
    pub value: u8,
    #[serde(default)]
    pub comment: String,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub date: DateTime<Utc>,
}

impl Rating {
    pub fn is_scored(&self) -> bool {
        (1..=5).contains(&self.value)
    }
}

/// A shareable trip template. Authored elsewhere, read-only to this crate
/// except for the usage counter and ratings list.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TripListing {
    #[serde(rename = "_id", alias = "id", default, deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default, alias = "title")]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    #[serde(default, alias = "imageUrl")]
    pub image_url: String,
    #[serde(
        default = "default_duration_days",
        alias = "durationDays",
        alias = "duration",
        deserialize_with = "deserialize_count"
    )]
    pub duration_days: u32,
    #[serde(default)]
    pub budget: BudgetRange,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default, alias = "companionType")]
    pub companion_type: CompanionType,
    #[serde(default, alias = "tripType")]
    pub trip_type: TripType,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, alias = "createdBy")]
    pub created_by: String,
    #[serde(default, alias = "usageCount", deserialize_with = "deserialize_count")]
    pub usage_count: u32,
    #[serde(default)]
    pub rating: RatingSummary,
    #[serde(default)]
    pub ratings: Vec<Rating>,
    #[serde(
        default,
        alias = "createdAt",
        deserialize_with = "deserialize_optional_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_duration_days() -> u32 {
    1
}

impl TripListing {
    /// Resolves the invariants a remote document may not hold: an inverted
    /// budget range is swapped and the aggregate is recomputed from the
    /// individual ratings. A document carrying only the aggregate keeps it.
    pub fn normalized(mut self) -> Self {
        self.budget = BudgetRange::new(self.budget.min, self.budget.max);
        self.ratings.retain(Rating::is_scored);
        if !self.ratings.is_empty() {
            self.rating = summarize(&self.ratings);
        }
        self.duration_days = self.duration_days.max(1);
        self
    }

    /// Case-insensitive category match against the trip type or any tag.
    pub fn in_category(&self, category: &str) -> bool {
        let category = category.trim().to_lowercase();
        self.trip_type.as_str() == category
            || self.tags.iter().any(|tag| tag.to_lowercase() == category)
    }

    /// Case-insensitive substring match over name, description, tags and location.
    pub fn matches_text(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&needle)
            || self.description.to_lowercase().contains(&needle)
            || self.location.to_lowercase().contains(&needle)
            || self.tags.iter().any(|tag| tag.to_lowercase().contains(&needle))
    }

    /// Appends a rating and rederives the aggregate from the full list.
    pub fn add_rating(&mut self, rating: Rating) {
        self.ratings.push(rating);
        self.rating = summarize(&self.ratings);
    }
}

pub fn summarize(ratings: &[Rating]) -> RatingSummary {
    if ratings.is_empty() {
        return RatingSummary::default();
    }
    let total: f64 = ratings.iter().map(|r| r.value as f64).sum();
    RatingSummary {
        average: total / ratings.len() as f64,
        total_count: ratings.len() as u32,
    }
}

// Ids arrive either as a BSON ObjectId from the store or as a plain string
// from the fallback corpus and generated plans.
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Bson::deserialize(deserializer)?;
    match value {
        Bson::ObjectId(oid) => Ok(oid.to_hex()),
        Bson::String(s) => Ok(s),
        Bson::Int32(n) => Ok(n.to_string()),
        Bson::Int64(n) => Ok(n.to_string()),
        _ => Ok(String::new()),
    }
}

// Counters may be stored as doubles; round up and clamp negatives to zero.
fn deserialize_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Bson::deserialize(deserializer)?;
    match value {
        Bson::Int32(n) => Ok(n.max(0) as u32),
        Bson::Int64(n) => Ok(n.clamp(0, u32::MAX as i64) as u32),
        Bson::Double(f) if f.is_finite() => Ok(f.ceil().max(0.0) as u32),
        Bson::String(s) => Ok(s.trim().parse().unwrap_or(0)),
        _ => Ok(0),
    }
}

fn deserialize_rating_value<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = deserialize_count(deserializer)?;
    Ok(if value > 5 { 0 } else { value as u8 })
}

fn timestamp_from_bson(value: Bson) -> Option<DateTime<Utc>> {
    match value {
        Bson::DateTime(dt) => DateTime::from_timestamp_millis(dt.timestamp_millis()),
        Bson::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Bson::Int64(ms) => DateTime::from_timestamp_millis(ms),
        _ => None,
    }
}

// Dates are stored as BSON dates by the driver and as RFC 3339 strings by
// serde; anything else falls back to the epoch.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(timestamp_from_bson(Bson::deserialize(deserializer)?).unwrap_or_default())
}

fn deserialize_optional_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(timestamp_from_bson(Bson::deserialize(deserializer)?))
}

fn deserialize_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Bson::deserialize(deserializer)?;
    match value {
        Bson::Int32(n) => Ok(n as f64),
        Bson::Int64(n) => Ok(n as f64),
        Bson::Double(f) if f.is_finite() => Ok(f),
        Bson::String(s) => Ok(s.trim().parse().unwrap_or(0.0)),
        _ => Ok(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rating(value: u8) -> Rating {
        Rating {
            user_id: "u1".to_string(),
            value,
            comment: String::new(),
            date: Utc::now(),
        }
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let trip: TripListing = serde_json::from_value(json!({
            "id": "abc",
            "name": "Coastal Drive"
        }))
        .unwrap();

        assert_eq!(trip.id, "abc");
        assert_eq!(trip.duration_days, 1);
        assert_eq!(trip.difficulty, Difficulty::Medium);
        assert_eq!(trip.companion_type, CompanionType::Solo);
        assert_eq!(trip.trip_type, TripType::Adventure);
        assert!(trip.tags.is_empty());
        assert_eq!(trip.usage_count, 0);
    }

    #[test]
    fn test_labels_are_case_insensitive() {
        let trip: TripListing = serde_json::from_value(json!({
            "_id": "t1",
            "name": "Temple Trail",
            "tripType": "Spiritual",
            "difficulty": "HARD",
            "companion_type": "Family",
            "usageCount": 12.4
        }))
        .unwrap();

        assert_eq!(trip.trip_type, TripType::Spiritual);
        assert_eq!(trip.difficulty, Difficulty::Hard);
        assert_eq!(trip.companion_type, CompanionType::Family);
        assert_eq!(trip.usage_count, 13);
    }

    #[test]
    fn test_object_id_decodes_to_hex_string() {
        let oid = bson::oid::ObjectId::new();
        let document = bson::doc! { "_id": oid, "name": "Desert Loop" };
        let trip: TripListing = bson::from_document(document).unwrap();
        assert_eq!(trip.id, oid.to_hex());
    }

    #[test]
    fn test_normalized_recomputes_average_and_swaps_budget() {
        let mut trip: TripListing = serde_json::from_value(json!({
            "id": "t2",
            "name": "Lake Retreat",
            "budget": { "min": 900, "max": 300 },
            "rating": { "average": 1.0, "total_count": 1 }
        }))
        .unwrap();
        trip.ratings = vec![rating(5), rating(4)];

        let trip = trip.normalized();
        assert_eq!(trip.budget, BudgetRange::new(300.0, 900.0));
        assert_eq!(trip.rating.average, 4.5);
        assert_eq!(trip.rating.total_count, 2);
    }

    #[test]
    fn test_partial_ratings_decode_with_defaults() {
        let document = bson::doc! {
            "_id": "t5",
            "name": "Spice Route",
            "ratings": [
                { "userId": "u1", "value": 5 },
                { "userId": "u2", "value": 3, "date": bson::DateTime::from_millis(1_700_000_000_000) },
                { "userId": "u3", "value": "nine" },
            ],
            "createdAt": "2024-03-01T10:00:00Z",
        };

        let trip: TripListing = bson::from_document(document).unwrap();
        assert_eq!(trip.ratings.len(), 3);
        assert_eq!(trip.ratings[0].date, DateTime::<Utc>::default());
        assert_eq!(trip.ratings[1].date.timestamp_millis(), 1_700_000_000_000);
        assert_eq!(trip.ratings[2].value, 0);
        assert!(trip.created_at.is_some());

        let trip = trip.normalized();
        assert_eq!(trip.ratings.len(), 2);
        assert_eq!(trip.rating.average, 4.0);
        assert_eq!(trip.rating.total_count, 2);
    }

    #[test]
    fn test_add_rating_keeps_average_as_mean() {
        let mut trip: TripListing = serde_json::from_value(json!({ "id": "t3", "name": "x" })).unwrap();
        trip.add_rating(rating(5));
        trip.add_rating(rating(2));
        trip.add_rating(rating(2));
        assert_eq!(trip.rating.average, 3.0);
        assert_eq!(trip.rating.total_count, 3);
    }

    #[test]
    fn test_category_matches_type_or_tag() {
        let trip: TripListing = serde_json::from_value(json!({
            "id": "t4",
            "name": "Old Town Walk",
            "trip_type": "cultural",
            "tags": ["Heritage", "Food"]
        }))
        .unwrap();

        assert!(trip.in_category("Cultural"));
        assert!(trip.in_category("heritage"));
        assert!(!trip.in_category("Nature"));
    }
}
