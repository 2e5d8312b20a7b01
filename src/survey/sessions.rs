//! Session store: many conversations keyed by id.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::manager::{SurveyDeps, SurveyManager};

/// A conversation behind its own lock. Holding the lock means a turn is in
/// progress; HTTP handlers use `try_lock` to refuse concurrent input.
pub type SharedSurvey = Arc<Mutex<SurveyManager>>;

/// In-memory registry of live conversations.
pub struct SessionStore {
    deps: SurveyDeps,
    sessions: RwLock<HashMap<String, SharedSurvey>>,
}

impl SessionStore {
    pub fn new(deps: SurveyDeps) -> Self {
        Self {
            deps,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Start a new conversation under a fresh id.
    pub async fn create(&self) -> (String, SharedSurvey) {
        let id = Uuid::new_v4().to_string();
        let survey = self.insert(id.clone()).await;
        tracing::info!(session_id = %id, "Session created");
        (id, survey)
    }

    /// Get a conversation by id.
    pub async fn get(&self, id: &str) -> Option<SharedSurvey> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Get a conversation, creating it under `id` if it does not exist.
    pub async fn get_or_create(&self, id: &str) -> SharedSurvey {
        if let Some(survey) = self.get(id).await {
            return survey;
        }
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(id.to_string())
            .or_insert_with(|| {
                tracing::info!(session_id = %id, "Session created");
                Arc::new(Mutex::new(SurveyManager::new(self.deps.clone())))
            })
            .clone()
    }

    pub async fn remove(&self, id: &str) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    /// Number of live conversations.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop conversations idle for longer than `max_idle`.
    ///
    /// A conversation whose lock is held is mid-turn and is kept.
    pub async fn prune_idle(&self, max_idle: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, survey| match survey.try_lock() {
            Ok(manager) => manager.last_active().elapsed() < max_idle,
            Err(_) => true,
        });
        let pruned = before - sessions.len();
        if pruned > 0 {
            tracing::info!(pruned, remaining = sessions.len(), "Pruned idle sessions");
        }
        pruned
    }

    async fn insert(&self, id: String) -> SharedSurvey {
        let survey = Arc::new(Mutex::new(SurveyManager::new(self.deps.clone())));
        self.sessions.write().await.insert(id, Arc::clone(&survey));
        survey
    }
}

/// How often the idle sweep runs.
pub const PRUNE_INTERVAL: Duration = Duration::from_secs(60);

/// Spawn the background sweep that drops idle sessions.
pub fn spawn_pruner(store: Arc<SessionStore>, max_idle: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PRUNE_INTERVAL);
        interval.tick().await; // Skip immediate first tick
        loop {
            interval.tick().await;
            store.prune_idle(max_idle).await;
        }
    })
}
