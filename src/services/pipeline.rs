//! Filter, sort and paginate whichever collection a view is serving.
//!
//! Stages run in a fixed order, each narrowing the input of the next:
//! category, free text, numeric ranges, a stable sort, then the page slice.
//! The whole transform is pure, so applying the same criteria to its own
//! output returns that output unchanged.

use serde::Serialize;
use std::cmp::Ordering;

use crate::models::filter::{FilterCriteria, SortKey};
use crate::models::trip::TripListing;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult {
    pub page_items: Vec<TripListing>,
    pub has_more: bool,
    pub total_matches: usize,
}

/// Pages are 1-based: page `k` returns the first `k * page_size` matches.
pub fn apply(
    collection: &[TripListing],
    criteria: &FilterCriteria,
    page: usize,
    page_size: usize,
) -> PageResult {
    let mut matches = filter(collection, criteria);
    sort(&mut matches, criteria.sort);

    let bound = page.saturating_mul(page_size);
    let total_matches = matches.len();
    let has_more = total_matches > bound;
    matches.truncate(bound);

    PageResult {
        page_items: matches,
        has_more,
        total_matches,
    }
}

pub fn filter(collection: &[TripListing], criteria: &FilterCriteria) -> Vec<TripListing> {
    collection
        .iter()
        .filter(|trip| criteria.is_all_categories() || trip.in_category(&criteria.category))
        .filter(|trip| trip.matches_text(&criteria.search))
        .filter(|trip| {
            criteria
                .price_range
                .map_or(true, |range| trip.budget.overlaps(range.min, range.max))
        })
        .filter(|trip| {
            criteria
                .min_rating
                .map_or(true, |threshold| trip.rating.average >= threshold)
        })
        .cloned()
        .collect()
}

/// Stable: equal keys keep their incoming relative order.
pub fn sort(trips: &mut [TripListing], key: SortKey) {
    match key {
        SortKey::Popular => trips.sort_by(|a, b| b.usage_count.cmp(&a.usage_count)),
        SortKey::Newest => trips.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortKey::Rating => trips.sort_by(|a, b| descending(a.rating.average, b.rating.average)),
        SortKey::BudgetAsc => trips.sort_by(|a, b| ascending(a.budget.min, b.budget.min)),
        SortKey::BudgetDesc => trips.sort_by(|a, b| descending(a.budget.max, b.budget.max)),
        SortKey::Duration => trips.sort_by(|a, b| a.duration_days.cmp(&b.duration_days)),
    }
}

fn ascending(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

fn descending(a: f64, b: f64) -> Ordering {
    ascending(b, a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::filter::PriceRange;
    use crate::models::trip::{BudgetRange, RatingSummary, TripType};
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn trip(id: &str, trip_type: TripType, average: f64) -> TripListing {
        let mut trip: TripListing = serde_json::from_value(json!({
            "id": id,
            "name": format!("Trip {}", id),
            "description": "A week away",
        }))
        .unwrap();
        trip.trip_type = trip_type;
        trip.rating = RatingSummary {
            average,
            total_count: 10,
        };
        trip
    }

    fn ten_items() -> Vec<TripListing> {
        vec![
            trip("1", TripType::Adventure, 4.1),
            trip("2", TripType::Cultural, 4.2),
            trip("3", TripType::Nature, 3.5),
            trip("4", TripType::Cultural, 3.8),
            trip("5", TripType::Beach, 4.6),
            trip("6", TripType::Spiritual, 4.0),
            trip("7", TripType::Cultural, 4.9),
            trip("8", TripType::Relaxation, 2.9),
            trip("9", TripType::Wildlife, 4.3),
            trip("10", TripType::Adventure, 4.7),
        ]
    }

    fn ids(result: &PageResult) -> Vec<&str> {
        result.page_items.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn test_category_and_rating_threshold() {
        let criteria = FilterCriteria {
            category: "Cultural".to_string(),
            min_rating: Some(4.0),
            sort: SortKey::Rating,
            ..FilterCriteria::default()
        };

        let result = apply(&ten_items(), &criteria, 1, 10);
        assert_eq!(ids(&result), vec!["7", "2"]);
        assert!(!result.has_more);
    }

    #[test]
    fn test_all_category_is_noop() {
        let result = apply(&ten_items(), &FilterCriteria::default(), 1, 20);
        assert_eq!(result.total_matches, 10);
    }

    #[test]
    fn test_category_matches_tags_case_insensitively() {
        let mut items = ten_items();
        items[0].tags = vec!["ROAD TRIP".to_string()];
        let criteria = FilterCriteria {
            category: "road trip".to_string(),
            ..FilterCriteria::default()
        };
        assert_eq!(ids(&apply(&items, &criteria, 1, 10)), vec!["1"]);
    }

    #[test]
    fn test_text_filter_covers_location_and_tags() {
        let mut items = ten_items();
        items[2].location = "Munnar, Kerala".to_string();
        items[4].tags = vec!["kerala".to_string()];
        let criteria = FilterCriteria {
            search: "KERALA".to_string(),
            ..FilterCriteria::default()
        };
        let result = apply(&items, &criteria, 1, 10);
        assert_eq!(result.total_matches, 2);
    }

    #[test]
    fn test_price_range_keeps_overlapping_budgets() {
        let mut items = ten_items();
        items[0].budget = BudgetRange::new(100.0, 500.0);
        items[1].budget = BudgetRange::new(600.0, 900.0);
        items[2].budget = BudgetRange::new(1000.0, 2000.0);
        let criteria = FilterCriteria {
            price_range: Some(PriceRange {
                min: 450.0,
                max: 700.0,
            }),
            ..FilterCriteria::default()
        };
        let result = apply(&items[..3], &criteria, 1, 10);
        assert_eq!(ids(&result), vec!["1", "2"]);
    }

    #[test]
    fn test_rating_sort_is_stable_for_ties() {
        let items = vec![
            trip("a", TripType::Nature, 4.5),
            trip("b", TripType::Nature, 4.8),
            trip("c", TripType::Nature, 4.5),
            trip("d", TripType::Nature, 4.5),
        ];
        let criteria = FilterCriteria {
            sort: SortKey::Rating,
            ..FilterCriteria::default()
        };
        assert_eq!(ids(&apply(&items, &criteria, 1, 10)), vec!["b", "a", "c", "d"]);
    }

    #[test]
    fn test_budget_and_newest_sorts() {
        let mut items = ten_items();
        for (i, trip) in items.iter_mut().enumerate() {
            trip.budget = BudgetRange::new((10 - i) as f64 * 100.0, 2000.0);
            trip.created_at = Utc.with_ymd_and_hms(2024, 1, 1 + i as u32, 0, 0, 0).single();
        }

        let asc = FilterCriteria {
            sort: SortKey::BudgetAsc,
            ..FilterCriteria::default()
        };
        assert_eq!(apply(&items, &asc, 1, 1).page_items[0].id, "10");

        let newest = FilterCriteria {
            sort: SortKey::Newest,
            ..FilterCriteria::default()
        };
        assert_eq!(apply(&items, &newest, 1, 1).page_items[0].id, "10");
    }

    #[test]
    fn test_reapplying_is_idempotent() {
        let criteria = FilterCriteria {
            min_rating: Some(4.0),
            sort: SortKey::Rating,
            ..FilterCriteria::default()
        };
        let once = apply(&ten_items(), &criteria, 1, 4);
        let twice = apply(&once.page_items, &criteria, 1, 4);
        assert_eq!(once.page_items, twice.page_items);
    }

    #[test]
    fn test_pagination_grows_until_exhausted() {
        let items = ten_items();
        let criteria = FilterCriteria::default();
        let mut previous = 0;

        for page in 1..=5 {
            let result = apply(&items, &criteria, page, 3);
            let len = result.page_items.len();
            assert!(len >= previous);
            assert_eq!(len, (page * 3).min(10));
            assert_eq!(result.has_more, page * 3 < 10);
            previous = len;
        }
    }

    #[test]
    fn test_page_zero_is_empty() {
        let result = apply(&ten_items(), &FilterCriteria::default(), 0, 5);
        assert!(result.page_items.is_empty());
        assert!(result.has_more);
    }
}
