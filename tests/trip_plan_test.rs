mod common;

use trip_discovery::models::plan::TripPreferences;
use trip_discovery::models::trip::{CompanionType, TripType};
use trip_discovery::services::trip_plan_generator::TripPlanRequester;

use common::ScriptedCompletion;

fn preferences() -> TripPreferences {
    TripPreferences {
        budget: 40000.0,
        duration_days: 3,
        trip_type: TripType::Spiritual,
        companion_type: CompanionType::Couple,
        location: "Rishikesh".to_string(),
    }
}

#[tokio::test]
async fn test_fenced_json_is_recovered() {
    let reply = "```json\n{\"trip\":{\"name\":\"Rishikesh Retreat\",\"location\":\"Rishikesh\",\"duration_days\":3,\"trip_type\":\"spiritual\",\"budget\":{\"min\":30000,\"max\":40000}},\"itinerary\":[{\"day\":1,\"title\":\"Arrive\",\"activities\":[\"Ganga aarti\"]}],\"included_services\":[{\"icon\":\"hotel\",\"label\":\"Stay\",\"description\":\"Ashram room\"}]}\n```";
    let completion = ScriptedCompletion::replying(reply);
    let requester = TripPlanRequester::new(completion.clone());

    let plan = requester.generate(&preferences()).await;

    assert_eq!(plan.trip.name, "Rishikesh Retreat");
    assert_eq!(plan.trip.location, "Rishikesh");
    assert_eq!(plan.trip.duration_days, 3);
    assert_eq!(plan.trip.trip_type, TripType::Spiritual);
    assert_eq!(plan.trip.budget.max, 40000.0);
    assert_eq!(plan.itinerary.len(), 1);
    assert_eq!(plan.itinerary[0].activities, vec!["Ganga aarti".to_string()]);
    assert_eq!(plan.included_services[0].label, "Stay");

    let prompts = completion.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Rishikesh"));
}

#[tokio::test]
async fn test_prose_around_json_is_discarded() {
    let reply = "Sure! Here's a plan you'll love:\n{\"trip\": {\"name\": \"Golden Temple Weekend\"}}\nLet me know if you want changes.";
    let requester = TripPlanRequester::new(ScriptedCompletion::replying(reply));

    let plan = requester.generate(&preferences()).await;
    assert_eq!(plan.trip.name, "Golden Temple Weekend");
}

#[tokio::test]
async fn test_garbage_yields_template_plan() {
    let requester = TripPlanRequester::new(ScriptedCompletion::replying(
        "I'm sorry, I can't help with { that request",
    ));

    let plan = requester.generate(&preferences()).await;
    assert_eq!(plan.trip.name, "Himalayan Adventure");
    assert_eq!(plan.itinerary.len(), 7);
}

#[tokio::test]
async fn test_missing_trip_yields_template_plan() {
    let requester = TripPlanRequester::new(ScriptedCompletion::replying(
        "{\"itinerary\": [{\"day\": 1, \"title\": \"Arrive\", \"activities\": []}]}",
    ));

    let plan = requester.generate(&preferences()).await;
    assert_eq!(plan.trip.name, "Himalayan Adventure");
}

#[tokio::test]
async fn test_failed_request_yields_template_plan() {
    let completion = ScriptedCompletion::failing("503 Service Unavailable");
    let requester = TripPlanRequester::new(completion.clone());

    let plan = requester.generate(&preferences()).await;
    assert_eq!(plan.trip.name, "Himalayan Adventure");
    assert_eq!(plan.itinerary.len(), 7);
    assert_eq!(completion.prompts.lock().unwrap().len(), 1);
}
