use std::env;
use std::time::Duration;

const HOST: &str = "0.0.0.0";
const PORT: u16 = 8080;
const CATALOG_DATABASE: &str = "Trips";
const TRIPS_COLLECTION: &str = "Listings";
const SAVED_COLLECTION: &str = "SavedItems";
const POPULAR_LIMIT: usize = 6;
const TRENDING_LIMIT: usize = 6;
const SEARCH_DEBOUNCE_MS: u64 = 300;
const SEARCH_MIN_QUERY_LEN: usize = 2;
const DEFAULT_PAGE_SIZE: usize = 9;
const SAVED_SESSION_LIMIT: usize = 1024;
const GENERATIVE_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const GENERATIVE_MODEL: &str = "gemini-1.5-flash";

#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    pub host: String,
    pub port: u16,
    pub catalog_database: String,
    pub trips_collection: String,
    pub saved_collection: String,
    pub popular_limit: usize,
    pub trending_limit: usize,
    pub search_debounce: Duration,
    pub search_min_query_len: usize,
    pub default_page_size: usize,
    /// Per-user saved-item sessions kept in memory before idle ones are evicted.
    pub saved_session_limit: usize,
    pub generative_api_url: String,
    pub generative_api_key: Option<String>,
    pub generative_model: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            host: HOST.to_string(),
            port: PORT,
            catalog_database: CATALOG_DATABASE.to_string(),
            trips_collection: TRIPS_COLLECTION.to_string(),
            saved_collection: SAVED_COLLECTION.to_string(),
            popular_limit: POPULAR_LIMIT,
            trending_limit: TRENDING_LIMIT,
            search_debounce: Duration::from_millis(SEARCH_DEBOUNCE_MS),
            search_min_query_len: SEARCH_MIN_QUERY_LEN,
            default_page_size: DEFAULT_PAGE_SIZE,
            saved_session_limit: SAVED_SESSION_LIMIT,
            generative_api_url: GENERATIVE_API_URL.to_string(),
            generative_api_key: None,
            generative_model: GENERATIVE_MODEL.to_string(),
        }
    }
}

impl DiscoveryConfig {
    /// Create config from environment variables or use defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: parsed_var("PORT").unwrap_or(defaults.port),
            catalog_database: env::var("CATALOG_DATABASE").unwrap_or(defaults.catalog_database),
            trips_collection: env::var("TRIPS_COLLECTION").unwrap_or(defaults.trips_collection),
            saved_collection: env::var("SAVED_COLLECTION").unwrap_or(defaults.saved_collection),
            popular_limit: parsed_var("POPULAR_LIMIT").unwrap_or(defaults.popular_limit),
            trending_limit: parsed_var("TRENDING_LIMIT").unwrap_or(defaults.trending_limit),
            search_debounce: parsed_var("SEARCH_DEBOUNCE_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.search_debounce),
            search_min_query_len: parsed_var("SEARCH_MIN_QUERY_LEN")
                .unwrap_or(defaults.search_min_query_len),
            default_page_size: parsed_var("DEFAULT_PAGE_SIZE")
                .filter(|size: &usize| *size > 0)
                .unwrap_or(defaults.default_page_size),
            saved_session_limit: parsed_var("SAVED_SESSION_LIMIT")
                .filter(|limit: &usize| *limit > 0)
                .unwrap_or(defaults.saved_session_limit),
            generative_api_url: env::var("GENERATIVE_API_URL")
                .ok()
                .filter(|raw| url::Url::parse(raw).is_ok())
                .unwrap_or(defaults.generative_api_url),
            generative_api_key: env::var("GENERATIVE_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            generative_model: env::var("GENERATIVE_MODEL").unwrap_or(defaults.generative_model),
        }
    }
}

fn parsed_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|s| s.trim().parse().ok())
}
