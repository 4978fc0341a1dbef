use log::debug;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::DiscoveryConfig;
use crate::db::gateway::CatalogGateway;
use crate::db::saved_store::SavedItemStore;
use crate::db::trip_writer::TripWriter;
use crate::services::fallback_corpus::FallbackCorpus;
use crate::services::saved_reconciler::SavedItemReconciler;
use crate::services::trip_actions::TripActions;
use crate::services::trip_plan_generator::TripPlanRequester;
use crate::services::trip_views::DiscoveryHub;

struct SavedSession {
    reconciler: Arc<SavedItemReconciler>,
    last_used: u64,
}

/// Per-user reconcilers, least recently used first out once over the limit.
/// A reconciler still held by a request is never evicted.
#[derive(Default)]
struct SavedSessions {
    by_user: HashMap<String, SavedSession>,
    clock: u64,
}

impl SavedSessions {
    fn get_or_insert(
        &mut self,
        user_id: &str,
        limit: usize,
        create: impl FnOnce() -> SavedItemReconciler,
    ) -> Arc<SavedItemReconciler> {
        self.clock += 1;
        let now = self.clock;

        if let Some(session) = self.by_user.get_mut(user_id) {
            session.last_used = now;
            return session.reconciler.clone();
        }

        if self.by_user.len() >= limit {
            self.evict_idle(limit.saturating_sub(1));
        }

        let reconciler = Arc::new(create());
        self.by_user.insert(
            user_id.to_string(),
            SavedSession {
                reconciler: reconciler.clone(),
                last_used: now,
            },
        );
        reconciler
    }

    fn evict_idle(&mut self, keep: usize) {
        let mut idle: Vec<(u64, String)> = self
            .by_user
            .iter()
            .filter(|(_, session)| Arc::strong_count(&session.reconciler) == 1)
            .map(|(user_id, session)| (session.last_used, user_id.clone()))
            .collect();
        idle.sort();

        let excess = self.by_user.len().saturating_sub(keep);
        for (_, user_id) in idle.into_iter().take(excess) {
            debug!("Evicting saved-item session for user {}", user_id);
            self.by_user.remove(&user_id);
        }
    }
}

/// Everything the HTTP handlers share.
pub struct AppState {
    pub config: DiscoveryConfig,
    pub hub: DiscoveryHub,
    pub actions: TripActions,
    pub requester: TripPlanRequester,
    saved_store: Arc<dyn SavedItemStore>,
    sessions: Mutex<SavedSessions>,
}

impl AppState {
    pub fn new(
        config: DiscoveryConfig,
        gateway: Arc<dyn CatalogGateway>,
        saved_store: Arc<dyn SavedItemStore>,
        writer: Arc<dyn TripWriter>,
        requester: TripPlanRequester,
    ) -> Self {
        let hub = DiscoveryHub::new(gateway, FallbackCorpus::bundled(), &config);
        Self {
            config,
            hub,
            actions: TripActions::new(writer),
            requester,
            saved_store,
            sessions: Mutex::new(SavedSessions::default()),
        }
    }

    /// The user's reconciler, reused across requests until evicted. An evicted
    /// user gets a fresh one that seeds again from the store.
    pub async fn reconciler_for(&self, user_id: &str) -> Arc<SavedItemReconciler> {
        let store = self.saved_store.clone();
        self.sessions.lock().await.get_or_insert(
            user_id,
            self.config.saved_session_limit,
            || SavedItemReconciler::new(user_id, store),
        )
    }

    pub async fn saved_session_count(&self) -> usize {
        self.sessions.lock().await.by_user.len()
    }
}
