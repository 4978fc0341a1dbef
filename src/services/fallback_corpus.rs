use chrono::{TimeZone, Utc};
use std::cmp::Ordering;
use std::sync::Arc;

use crate::models::trip::{
    BudgetRange, CompanionType, Difficulty, RatingSummary, TripListing, TripType,
};

/// Ids in the bundled corpus carry this prefix so writes against them can be
/// recognised and skipped; the remote store has never seen them.
pub const FALLBACK_ID_PREFIX: &str = "fallback-";

pub fn is_fallback_id(id: &str) -> bool {
    id.starts_with(FALLBACK_ID_PREFIX)
}

/// Hand-curated listings served whenever the remote catalog is unusable.
/// Built once and shared; consumers only ever receive copies.
#[derive(Debug, Clone)]
pub struct FallbackCorpus {
    listings: Arc<[TripListing]>,
}

impl FallbackCorpus {
    pub fn bundled() -> Self {
        Self::from_listings(bundled_listings())
    }

    pub fn from_listings(listings: Vec<TripListing>) -> Self {
        Self {
            listings: listings.into(),
        }
    }

    pub fn listings(&self) -> &[TripListing] {
        &self.listings
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    pub fn all(&self) -> Vec<TripListing> {
        self.listings.to_vec()
    }

    /// Usage-count descending, sliced to `limit`.
    pub fn popular(&self, limit: usize) -> Vec<TripListing> {
        self.sorted_by(limit, |a, b| b.usage_count.cmp(&a.usage_count))
    }

    /// Rating descending, sliced to `limit`.
    pub fn trending(&self, limit: usize) -> Vec<TripListing> {
        self.sorted_by(limit, |a, b| {
            b.rating
                .average
                .partial_cmp(&a.rating.average)
                .unwrap_or(Ordering::Equal)
        })
    }

    /// Every listing, with those matching the category and text moved to the
    /// front. Relative order is otherwise kept.
    pub fn search(&self, query: &str, category: Option<&str>) -> Vec<TripListing> {
        let mut listings = self.listings.to_vec();
        listings.sort_by_key(|trip| {
            !(category.map_or(true, |c| trip.in_category(c)) && trip.matches_text(query))
        });
        listings
    }

    pub fn count_matches(&self, query: &str, category: Option<&str>) -> usize {
        self.listings
            .iter()
            .filter(|trip| category.map_or(true, |c| trip.in_category(c)))
            .filter(|trip| trip.matches_text(query))
            .count()
    }

    pub fn find(&self, id: &str) -> Option<&TripListing> {
        self.listings.iter().find(|trip| trip.id == id)
    }

    fn sorted_by<F>(&self, limit: usize, compare: F) -> Vec<TripListing>
    where
        F: FnMut(&TripListing, &TripListing) -> Ordering,
    {
        let mut listings = self.listings.to_vec();
        listings.sort_by(compare);
        listings.truncate(limit);
        listings
    }
}

impl Default for FallbackCorpus {
    fn default() -> Self {
        Self::bundled()
    }
}

#[allow(clippy::too_many_arguments)]
fn listing(
    slug: &str,
    name: &str,
    description: &str,
    location: &str,
    duration_days: u32,
    budget: (f64, f64),
    difficulty: Difficulty,
    companion_type: CompanionType,
    trip_type: TripType,
    tags: &[&str],
    usage_count: u32,
    rating: (f64, u32),
    created: (i32, u32, u32),
) -> TripListing {
    TripListing {
        id: format!("{}{}", FALLBACK_ID_PREFIX, slug),
        name: name.to_string(),
        description: description.to_string(),
        location: location.to_string(),
        image_url: format!("/images/trips/{}.jpg", slug),
        duration_days,
        budget: BudgetRange::new(budget.0, budget.1),
        difficulty,
        companion_type,
        trip_type,
        tags: tags.iter().map(|t| t.to_string()).collect(),
        created_by: "Travel Team".to_string(),
        usage_count,
        rating: RatingSummary {
            average: rating.0,
            total_count: rating.1,
        },
        ratings: Vec::new(),
        created_at: Utc
            .with_ymd_and_hms(created.0, created.1, created.2, 0, 0, 0)
            .single(),
    }
}

fn bundled_listings() -> Vec<TripListing> {
    vec![
        listing(
            "himalayan-trek",
            "Himalayan Base Camp Trek",
            "Guided trek through high mountain villages to a glacier-fed base camp.",
            "Manali, Himachal Pradesh",
            7,
            (25000.0, 40000.0),
            Difficulty::Hard,
            CompanionType::Friends,
            TripType::Adventure,
            &["Mountains", "Trekking", "Camping"],
            342,
            (4.8, 126),
            (2024, 1, 12),
        ),
        listing(
            "goa-beach",
            "Goa Beach Escape",
            "Slow days on quiet southern beaches with seafood shacks and sunset cruises.",
            "Palolem, Goa",
            5,
            (15000.0, 30000.0),
            Difficulty::Easy,
            CompanionType::Couple,
            TripType::Relaxation,
            &["Beach", "Nightlife", "Food"],
            518,
            (4.5, 210),
            (2024, 2, 3),
        ),
        listing(
            "varanasi-ghats",
            "Varanasi Spiritual Journey",
            "Dawn boat rides, evening aarti on the ghats and walks through the old city lanes.",
            "Varanasi, Uttar Pradesh",
            4,
            (8000.0, 15000.0),
            Difficulty::Easy,
            CompanionType::Family,
            TripType::Spiritual,
            &["Temples", "River", "Heritage"],
            276,
            (4.7, 98),
            (2024, 3, 18),
        ),
        listing(
            "rajasthan-forts",
            "Royal Rajasthan Circuit",
            "Palaces, hill forts and desert camps across Jaipur, Jodhpur and Jaisalmer.",
            "Jaipur, Rajasthan",
            8,
            (35000.0, 60000.0),
            Difficulty::Medium,
            CompanionType::Group,
            TripType::Cultural,
            &["Heritage", "Desert", "Architecture"],
            401,
            (4.6, 154),
            (2023, 11, 22),
        ),
        listing(
            "kerala-backwaters",
            "Kerala Backwaters & Hills",
            "Houseboat nights on the backwaters followed by tea estates in the Western Ghats.",
            "Alleppey, Kerala",
            6,
            (20000.0, 35000.0),
            Difficulty::Easy,
            CompanionType::Couple,
            TripType::Nature,
            &["Backwaters", "Tea Gardens", "Houseboat"],
            389,
            (4.9, 187),
            (2024, 4, 9),
        ),
        listing(
            "ranthambore-safari",
            "Ranthambore Tiger Safari",
            "Jeep safaris in tiger country with naturalist-led birding walks.",
            "Sawai Madhopur, Rajasthan",
            3,
            (12000.0, 22000.0),
            Difficulty::Medium,
            CompanionType::Solo,
            TripType::Wildlife,
            &["Safari", "Tigers", "Photography"],
            164,
            (4.4, 71),
            (2024, 5, 27),
        ),
    ]
}
