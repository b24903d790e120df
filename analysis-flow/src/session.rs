use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::{context::Context, error::Result};

/// One request lifecycle and its shared state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    /// Stage the pipeline is currently at (or settled on).
    pub current_stage_id: String,
    /// Progress note from the most recent stage.
    pub status_message: Option<String>,
    #[serde(skip)]
    pub context: Context,
}

impl Session {
    pub fn new(id: impl Into<String>, start_stage_id: &str) -> Self {
        Self {
            id: id.into(),
            current_stage_id: start_stage_id.to_string(),
            status_message: None,
            context: Context::new(),
        }
    }

    pub fn with_random_id(start_stage_id: &str) -> Self {
        Self::new(Uuid::new_v4().to_string(), start_stage_id)
    }
}

/// Storage for sessions. The lifecycle does not care where sessions live;
/// the service decides.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    async fn save(&self, session: Session) -> Result<()>;
    async fn get(&self, id: &str) -> Result<Option<Session>>;
    async fn delete(&self, id: &str) -> Result<()>;
}

/// In-memory session storage. Sessions share their context by `Arc`, so a
/// stored session observes writes made by a pipeline running on a copy.
#[derive(Default)]
pub struct InMemorySessionStorage {
    sessions: Arc<DashMap<String, Session>>,
}

impl InMemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStorage for InMemorySessionStorage {
    async fn save(&self, session: Session) -> Result<()> {
        self.sessions.insert(session.id.clone(), session);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Session>> {
        Ok(self.sessions.get(id).map(|entry| entry.clone()))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.sessions.remove(id);
        Ok(())
    }
}
