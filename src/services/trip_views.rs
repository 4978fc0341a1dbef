//! The four read models over the trip catalog. Each one asks the gateway for
//! its slice of the catalog and, on any failure, serves the fallback corpus
//! instead while recording a degraded-mode error for the dashboard banner.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::config::DiscoveryConfig;
use crate::db::gateway::{query_as, CatalogGateway, Condition, Direction, GatewayError};
use crate::models::filter::{FilterCriteria, ALL_CATEGORIES};
use crate::models::trip::{TripListing, TripType};
use crate::services::fallback_corpus::FallbackCorpus;
use crate::services::pipeline::{self, PageResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
    All,
    Popular,
    Trending,
    Search,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ViewState {
    pub items: Vec<TripListing>,
    pub loading: bool,
    pub error: Option<String>,
    /// True while `items` comes from the fallback corpus.
    pub degraded: bool,
}

impl ViewState {
    fn live(items: Vec<TripListing>) -> Self {
        Self {
            items: items.into_iter().map(TripListing::normalized).collect(),
            loading: false,
            error: None,
            degraded: false,
        }
    }

    fn degraded(items: Vec<TripListing>, err: &GatewayError) -> Self {
        Self {
            items,
            loading: false,
            error: Some(degraded_message(err)),
            degraded: true,
        }
    }
}

// Access and transport failures degrade the same way; the message keeps the cause.
fn degraded_message(err: &GatewayError) -> String {
    if err.is_access_error() {
        format!("Showing demo trips: catalog access was denied ({})", err)
    } else {
        format!("Showing demo trips: catalog is unavailable ({})", err)
    }
}

// Loading flags live outside the state lock and are cleared on drop, so a
// cancelled fetch never leaves a view stuck in `loading`.
struct PendingLoad<'a>(&'a AtomicUsize);

impl<'a> PendingLoad<'a> {
    fn start(pending: &'a AtomicUsize) -> Self {
        pending.fetch_add(1, Ordering::SeqCst);
        Self(pending)
    }
}

impl Drop for PendingLoad<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

struct PendingSearch<'a> {
    loading_generation: &'a AtomicU64,
    generation: u64,
}

impl<'a> PendingSearch<'a> {
    fn start(loading_generation: &'a AtomicU64, generation: u64) -> Self {
        loading_generation.store(generation, Ordering::SeqCst);
        Self {
            loading_generation,
            generation,
        }
    }
}

impl Drop for PendingSearch<'_> {
    fn drop(&mut self) {
        // A newer search may already own the marker.
        let _ = self.loading_generation.compare_exchange(
            self.generation,
            0,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
    }
}

pub struct TripView {
    kind: ViewKind,
    limit: usize,
    gateway: Arc<dyn CatalogGateway>,
    corpus: FallbackCorpus,
    collection: String,
    state: RwLock<ViewState>,
    pending: AtomicUsize,
}

impl TripView {
    pub fn all(gateway: Arc<dyn CatalogGateway>, corpus: FallbackCorpus, collection: &str) -> Self {
        Self::new(ViewKind::All, usize::MAX, gateway, corpus, collection)
    }

    pub fn popular(
        gateway: Arc<dyn CatalogGateway>,
        corpus: FallbackCorpus,
        collection: &str,
        limit: usize,
    ) -> Self {
        Self::new(ViewKind::Popular, limit, gateway, corpus, collection)
    }

    pub fn trending(
        gateway: Arc<dyn CatalogGateway>,
        corpus: FallbackCorpus,
        collection: &str,
        limit: usize,
    ) -> Self {
        Self::new(ViewKind::Trending, limit, gateway, corpus, collection)
    }

    fn new(
        kind: ViewKind,
        limit: usize,
        gateway: Arc<dyn CatalogGateway>,
        corpus: FallbackCorpus,
        collection: &str,
    ) -> Self {
        Self {
            kind,
            limit,
            gateway,
            corpus,
            collection: collection.to_string(),
            state: RwLock::new(ViewState::default()),
            pending: AtomicUsize::new(0),
        }
    }

    pub fn kind(&self) -> ViewKind {
        self.kind
    }

    pub async fn state(&self) -> ViewState {
        let mut state = self.state.read().await.clone();
        state.loading = self.pending.load(Ordering::SeqCst) > 0;
        state
    }

    fn conditions(&self) -> Vec<Condition> {
        match self.kind {
            ViewKind::Popular => vec![
                Condition::order_by("usage_count", Direction::Desc),
                Condition::limit(self.limit),
            ],
            ViewKind::Trending => vec![
                Condition::order_by("rating.average", Direction::Desc),
                Condition::limit(self.limit),
            ],
            ViewKind::All | ViewKind::Search => Vec::new(),
        }
    }

    fn fallback_items(&self) -> Vec<TripListing> {
        match self.kind {
            ViewKind::Popular => self.corpus.popular(self.limit),
            ViewKind::Trending => self.corpus.trending(self.limit),
            ViewKind::All | ViewKind::Search => self.corpus.all(),
        }
    }

    /// Queries the gateway and replaces the state with the outcome.
    pub async fn refetch(&self) -> ViewState {
        let pending = PendingLoad::start(&self.pending);

        let result =
            query_as::<TripListing>(self.gateway.as_ref(), &self.collection, &self.conditions())
                .await;

        let next = match result {
            Ok(items) => {
                info!("{:?} view loaded {} trips", self.kind, items.len());
                ViewState::live(items)
            }
            Err(err) => {
                warn!("{:?} view falling back to bundled trips: {}", self.kind, err);
                ViewState::degraded(self.fallback_items(), &err)
            }
        };

        *self.state.write().await = next;
        drop(pending);
        self.state().await
    }
}

#[derive(Debug, Default)]
struct SearchSlot {
    view: ViewState,
    committed_generation: u64,
    query: String,
    category: Option<String>,
}

/// Free-text search with debounce. Every call takes a new generation number;
/// a response is committed only if its generation is still the latest, so a
/// slow older search can never overwrite a newer one.
pub struct SearchView {
    gateway: Arc<dyn CatalogGateway>,
    corpus: FallbackCorpus,
    collection: String,
    debounce: Duration,
    min_query_len: usize,
    generation: AtomicU64,
    loading_generation: AtomicU64,
    slot: RwLock<SearchSlot>,
}

impl SearchView {
    pub fn new(
        gateway: Arc<dyn CatalogGateway>,
        corpus: FallbackCorpus,
        collection: &str,
        debounce: Duration,
        min_query_len: usize,
    ) -> Self {
        Self {
            gateway,
            corpus,
            collection: collection.to_string(),
            debounce,
            min_query_len,
            generation: AtomicU64::new(0),
            loading_generation: AtomicU64::new(0),
            slot: RwLock::new(SearchSlot::default()),
        }
    }

    pub async fn state(&self) -> ViewState {
        let mut state = self.slot.read().await.view.clone();
        let loading = self.loading_generation.load(Ordering::SeqCst);
        state.loading = loading != 0 && loading == self.current_generation();
        state
    }

    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub async fn perform_search(&self, query: &str, category: Option<&str>) -> ViewState {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let query = query.trim().to_string();
        let category = category
            .map(str::trim)
            .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case(ALL_CATEGORIES))
            .map(str::to_string);

        if query.chars().count() < self.min_query_len {
            self.commit(generation, &query, &category, ViewState::default())
                .await;
            return self.state().await;
        }

        let pending = PendingSearch::start(&self.loading_generation, generation);

        tokio::time::sleep(self.debounce).await;
        if generation != self.current_generation() {
            debug!("Search generation {} superseded before query", generation);
            return self.state().await;
        }

        let next = self.run_query(&query, category.as_deref()).await;
        if !self.commit(generation, &query, &category, next).await {
            debug!("Search generation {} superseded, result dropped", generation);
        }
        drop(pending);
        self.state().await
    }

    /// Reissues the last committed query.
    pub async fn refetch(&self) -> ViewState {
        let (query, category) = {
            let slot = self.slot.read().await;
            (slot.query.clone(), slot.category.clone())
        };
        self.perform_search(&query, category.as_deref()).await
    }

    async fn run_query(&self, query: &str, category: Option<&str>) -> ViewState {
        let mut conditions = Vec::new();
        if let Some(category) = category {
            let trip_type = TripType::from_label(category);
            if trip_type != TripType::Other {
                conditions.push(Condition::eq("trip_type", trip_type.as_str()));
            }
        }

        match query_as::<TripListing>(self.gateway.as_ref(), &self.collection, &conditions).await {
            Ok(items) => {
                let items = items
                    .into_iter()
                    .filter(|trip| category.map_or(true, |c| trip.in_category(c)))
                    .filter(|trip| trip.matches_text(query))
                    .collect();
                ViewState::live(items)
            }
            Err(err) => {
                warn!(
                    "Search falling back to bundled trips ({} matching): {}",
                    self.corpus.count_matches(query, category),
                    err
                );
                ViewState::degraded(self.corpus.search(query, category), &err)
            }
        }
    }

    async fn commit(
        &self,
        generation: u64,
        query: &str,
        category: &Option<String>,
        next: ViewState,
    ) -> bool {
        let mut slot = self.slot.write().await;
        if generation != self.current_generation() || generation < slot.committed_generation {
            return false;
        }
        slot.view = next;
        slot.committed_generation = generation;
        slot.query = query.to_string();
        slot.category = category.clone();
        true
    }
}

/// The dashboard's discovery surface: the four views plus the pipeline over
/// whichever one is active.
pub struct DiscoveryHub {
    pub all: TripView,
    pub popular: TripView,
    pub trending: TripView,
    pub search: SearchView,
    corpus: FallbackCorpus,
}

impl DiscoveryHub {
    pub fn new(
        gateway: Arc<dyn CatalogGateway>,
        corpus: FallbackCorpus,
        config: &DiscoveryConfig,
    ) -> Self {
        let collection = config.trips_collection.as_str();
        Self {
            all: TripView::all(gateway.clone(), corpus.clone(), collection),
            popular: TripView::popular(
                gateway.clone(),
                corpus.clone(),
                collection,
                config.popular_limit,
            ),
            trending: TripView::trending(
                gateway.clone(),
                corpus.clone(),
                collection,
                config.trending_limit,
            ),
            search: SearchView::new(
                gateway,
                corpus.clone(),
                collection,
                config.search_debounce,
                config.search_min_query_len,
            ),
            corpus,
        }
    }

    pub fn corpus(&self) -> &FallbackCorpus {
        &self.corpus
    }

    /// Loads the three unfiltered views concurrently; each settles on its own.
    pub async fn load(&self) {
        futures::join!(
            self.all.refetch(),
            self.popular.refetch(),
            self.trending.refetch()
        );
    }

    pub async fn view_state(&self, kind: ViewKind) -> ViewState {
        match kind {
            ViewKind::All => self.all.state().await,
            ViewKind::Popular => self.popular.state().await,
            ViewKind::Trending => self.trending.state().await,
            ViewKind::Search => self.search.state().await,
        }
    }

    /// Whether any view is serving the fallback corpus.
    pub async fn is_degraded(&self) -> bool {
        let (all, popular, trending, search) = futures::join!(
            self.all.state(),
            self.popular.state(),
            self.trending.state(),
            self.search.state()
        );
        all.degraded || popular.degraded || trending.degraded || search.degraded
    }

    pub async fn browse(
        &self,
        kind: ViewKind,
        criteria: &FilterCriteria,
        page: usize,
        page_size: usize,
    ) -> PageResult {
        let state = self.view_state(kind).await;
        pipeline::apply(&state.items, criteria, page, page_size)
    }
}
