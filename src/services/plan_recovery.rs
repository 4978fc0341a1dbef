//! Recovers a structured trip plan from free-text completion output.
//!
//! Strategies run in order: strip code fences, slice from the first `{` to
//! the last `}`, and if that slice does not parse, scan the raw text for the
//! largest balanced brace span. Callers fall back to [`template_plan`] when
//! nothing usable comes out; none of these functions fail loudly.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use uuid::Uuid;

use crate::models::plan::{DayPlan, GeneratedTripPlan, IncludedService};
use crate::models::trip::{
    BudgetRange, CompanionType, Difficulty, RatingSummary, TripListing, TripType,
};

pub const GENERATED_ID_PREFIX: &str = "generated-";

fn fence_pattern() -> Option<&'static Regex> {
    static FENCE: OnceLock<Option<Regex>> = OnceLock::new();
    FENCE
        .get_or_init(|| Regex::new(r"```[A-Za-z0-9_-]*").ok())
        .as_ref()
}

pub fn strip_code_fences(raw: &str) -> String {
    match fence_pattern() {
        Some(fence) => fence.replace_all(raw, "").trim().to_string(),
        None => raw.replace("```", "").trim().to_string(),
    }
}

/// Text between the first `{` and the last `}`, inclusive.
pub fn outer_brace_slice(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

/// Longest balanced `{...}` span in `text`, ignoring braces inside JSON strings.
pub fn largest_brace_span(text: &str) -> Option<&str> {
    let mut best: Option<(usize, usize)> = None;
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' if depth > 0 => in_string = true,
            '{' => {
                if depth == 0 {
                    start = i;
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    let end = i + c.len_utf8();
                    if best.map_or(true, |(s, e)| end - start > e - s) {
                        best = Some((start, end));
                    }
                }
            }
            _ => {}
        }
    }

    best.map(|(s, e)| &text[s..e])
}

fn parse_object(text: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(text) {
        Ok(value @ Value::Object(_)) => Some(value),
        _ => None,
    }
}

/// Finds the first JSON object the strategies can parse.
pub fn extract_json(raw: &str) -> Option<Value> {
    let cleaned = strip_code_fences(raw);
    if let Some(value) = outer_brace_slice(&cleaned).and_then(parse_object) {
        return Some(value);
    }
    largest_brace_span(raw).and_then(parse_object)
}

/// Turns a parsed object into a plan. Requires a top-level `trip` object;
/// itinerary and services may sit at the top level or inside `trip`.
pub fn plan_from_value(mut value: Value) -> Option<GeneratedTripPlan> {
    if !value.get("trip").is_some_and(Value::is_object) {
        return None;
    }

    for key in ["itinerary", "included_services", "includedServices"] {
        let nested = value
            .get_mut("trip")
            .and_then(Value::as_object_mut)
            .and_then(|trip| trip.remove(key));
        if let (Some(nested), Some(root)) = (nested, value.as_object_mut()) {
            root.entry(key).or_insert(nested);
        }
    }

    let mut plan: GeneratedTripPlan = serde_json::from_value(value).ok()?;
    if plan.trip.id.is_empty() {
        plan.trip.id = format!("{}{}", GENERATED_ID_PREFIX, Uuid::new_v4());
    }
    if plan.trip.created_by.is_empty() {
        plan.trip.created_by = "AI Planner".to_string();
    }
    for (i, day) in plan.itinerary.iter_mut().enumerate() {
        if day.day == 0 {
            day.day = i as u32 + 1;
        }
    }
    plan.trip = plan.trip.normalized();
    Some(plan)
}

pub fn recover_plan(raw: &str) -> Option<GeneratedTripPlan> {
    extract_json(raw).and_then(plan_from_value)
}

fn day(day: u32, title: &str, activities: &[&str]) -> DayPlan {
    DayPlan {
        day,
        title: title.to_string(),
        activities: activities.iter().map(|a| a.to_string()).collect(),
    }
}

fn service(icon: &str, label: &str, description: &str) -> IncludedService {
    IncludedService {
        icon: icon.to_string(),
        label: label.to_string(),
        description: description.to_string(),
    }
}

/// The canned plan served when generation yields nothing usable.
pub fn template_plan() -> GeneratedTripPlan {
    GeneratedTripPlan {
        trip: TripListing {
            id: format!("{}template-himalayan-adventure", GENERATED_ID_PREFIX),
            name: "Himalayan Adventure".to_string(),
            description: "A week in the high Himalaya: river valleys, alpine meadows, monasteries and a glacier viewpoint, paced for acclimatisation.".to_string(),
            location: "Manali, Himachal Pradesh".to_string(),
            image_url: "/images/trips/himalayan-adventure.jpg".to_string(),
            duration_days: 7,
            budget: BudgetRange::new(30000.0, 45000.0),
            difficulty: Difficulty::Medium,
            companion_type: CompanionType::Friends,
            trip_type: TripType::Adventure,
            tags: vec![
                "Mountains".to_string(),
                "Trekking".to_string(),
                "Monasteries".to_string(),
            ],
            created_by: "AI Planner".to_string(),
            usage_count: 0,
            rating: RatingSummary::default(),
            ratings: Vec::new(),
            created_at: None,
        },
        itinerary: vec![
            day(1, "Arrival in Manali", &["Airport transfer", "Check in and rest", "Evening walk on Mall Road"]),
            day(2, "Old Manali and Hadimba", &["Hadimba Temple", "Vashisht hot springs", "Cafe lunch in Old Manali"]),
            day(3, "Solang Valley", &["Cable car ride", "Paragliding (optional)", "Riverside picnic"]),
            day(4, "Rohtang Pass excursion", &["Early drive to the pass", "Snow point", "Return via Marhi"]),
            day(5, "Trek to Jogini Falls", &["Guided trek", "Waterfall viewpoint", "Village homestay dinner"]),
            day(6, "Naggar and Kullu", &["Naggar Castle", "Roerich Art Gallery", "River rafting in Kullu"]),
            day(7, "Departure", &["Breakfast", "Local market shopping", "Transfer to airport"]),
        ],
        included_services: vec![
            service("hotel", "Accommodation", "Six nights in mountain-view hotels and one village homestay"),
            service("car", "Transfers", "Private vehicle for all transfers and excursions"),
            service("guide", "Local Guide", "Certified trekking guide for Jogini Falls and Rohtang"),
            service("meal", "Meals", "Daily breakfast and dinner"),
        ],
    }
}
