use log::{info, warn};
use std::sync::Arc;

use crate::models::plan::{GeneratedTripPlan, TripPreferences};
use crate::services::completion_client::CompletionClient;
use crate::services::plan_recovery::{recover_plan, template_plan};

const PLAN_SCHEMA: &str = r#"{
  "trip": {
    "name": string,
    "description": string,
    "location": string,
    "image_url": string,
    "duration_days": number,
    "budget": { "min": number, "max": number },
    "difficulty": "easy" | "medium" | "hard",
    "companion_type": "solo" | "couple" | "family" | "friends" | "group",
    "trip_type": "adventure" | "relaxation" | "spiritual" | "cultural" | "nature" | "wildlife" | "beach",
    "tags": [string]
  },
  "itinerary": [
    { "day": number, "title": string, "activities": [string] }
  ],
  "included_services": [
    { "icon": string, "label": string, "description": string }
  ]
}"#;

/// Asks the completion service for a trip plan and always hands back a
/// usable one: anything unrecoverable resolves to the template plan.
pub struct TripPlanRequester {
    client: Option<Arc<dyn CompletionClient>>,
}

impl TripPlanRequester {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self {
            client: Some(client),
        }
    }

    /// A requester with no completion service serves the template plan.
    pub fn offline() -> Self {
        Self { client: None }
    }

    pub async fn generate(&self, preferences: &TripPreferences) -> GeneratedTripPlan {
        let Some(client) = &self.client else {
            info!("No completion service configured, serving template plan");
            return template_plan();
        };

        let prompt = build_prompt(preferences);
        let raw = match client.complete(&prompt).await {
            Ok(raw) => raw,
            Err(err) => {
                warn!("Trip plan request failed, serving template plan: {}", err);
                return template_plan();
            }
        };

        match recover_plan(&raw) {
            Some(plan) => {
                info!("Generated trip plan '{}'", plan.trip.name);
                plan
            }
            None => {
                warn!(
                    "Could not recover a trip plan from {} chars of output, serving template plan",
                    raw.len()
                );
                template_plan()
            }
        }
    }
}

pub fn build_prompt(preferences: &TripPreferences) -> String {
    let location = if preferences.location.trim().is_empty() {
        "anywhere in India that suits the preferences"
    } else {
        preferences.location.trim()
    };

    format!(
        "Plan a {days}-day {trip_type} trip for a {companion} traveller profile.\n\
         Destination: {location}\n\
         Total budget per person: {budget:.0}\n\
         Include one itinerary entry per day with a short title and ordered activities, \
         and list the services included in the price.\n\
         Respond with ONLY a JSON object, no markdown and no commentary, matching this schema:\n\
         {schema}",
        days = preferences.duration_days.max(1),
        trip_type = preferences.trip_type.as_str(),
        companion = preferences.companion_type.as_str(),
        location = location,
        budget = preferences.budget.max(0.0),
        schema = PLAN_SCHEMA,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::trip::{CompanionType, TripType};

    #[test]
    fn test_prompt_embeds_preferences_and_schema() {
        let preferences = TripPreferences {
            budget: 25000.0,
            duration_days: 5,
            trip_type: TripType::Cultural,
            companion_type: CompanionType::Family,
            location: "Hampi".to_string(),
        };

        let prompt = build_prompt(&preferences);
        assert!(prompt.contains("5-day cultural trip"));
        assert!(prompt.contains("family"));
        assert!(prompt.contains("Destination: Hampi"));
        assert!(prompt.contains("25000"));
        assert!(prompt.contains("\"included_services\""));
        assert!(prompt.contains("ONLY a JSON object"));
    }

    #[tokio::test]
    async fn test_offline_requester_serves_template() {
        let requester = TripPlanRequester::offline();
        let preferences = TripPreferences {
            budget: 1000.0,
            duration_days: 3,
            trip_type: TripType::Beach,
            companion_type: CompanionType::Solo,
            location: String::new(),
        };
        let plan = requester.generate(&preferences).await;
        assert_eq!(plan.trip.name, "Himalayan Adventure");
    }
}
