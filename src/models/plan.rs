use serde::{Deserialize, Serialize};

use crate::models::trip::{CompanionType, TripListing, TripType};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DayPlan {
    #[serde(default)]
    pub day: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub activities: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct IncludedService {
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub description: String,
}

/// A machine-generated trip. Lives for one request; the booking flow that
/// consumes it owns persistence.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct GeneratedTripPlan {
    pub trip: TripListing,
    #[serde(default)]
    pub itinerary: Vec<DayPlan>,
    #[serde(default, alias = "includedServices")]
    pub included_services: Vec<IncludedService>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TripPreferences {
    pub budget: f64,
    pub duration_days: u32,
    #[serde(default)]
    pub trip_type: TripType,
    #[serde(default)]
    pub companion_type: CompanionType,
    #[serde(default)]
    pub location: String,
}
