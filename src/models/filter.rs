use serde::{Deserialize, Serialize};

pub const ALL_CATEGORIES: &str = "All";

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    #[default]
    Popular,
    Newest,
    Rating,
    BudgetAsc,
    BudgetDesc,
    Duration,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

/// Transient description of what the dashboard is currently showing.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub price_range: Option<PriceRange>,
    #[serde(default)]
    pub min_rating: Option<f64>,
    #[serde(default)]
    pub sort: SortKey,
}

fn default_category() -> String {
    ALL_CATEGORIES.to_string()
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            category: default_category(),
            search: String::new(),
            price_range: None,
            min_rating: None,
            sort: SortKey::default(),
        }
    }
}

impl FilterCriteria {
    pub fn is_all_categories(&self) -> bool {
        let category = self.category.trim();
        category.is_empty() || category.eq_ignore_ascii_case(ALL_CATEGORIES)
    }
}
