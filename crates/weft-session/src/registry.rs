//! Session registry.
//!
//! Holds every live [`StreamSession`] (parent and sub-agent sessions alike)
//! keyed by session id. Sessions share nothing but the registry itself.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, instrument};
use uuid::Uuid;
use weft_core::ProviderKind;
use weft_settings::WeftSettings;

use crate::errors::{Result, SessionError};
use crate::session::{SessionOptions, StreamSession};

/// Registry of isolated stream sessions.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, Arc<StreamSession>>,
    options: SessionOptions,
}

impl SessionRegistry {
    /// Create an empty registry whose sessions use `options`.
    pub fn new(options: SessionOptions) -> Self {
        Self {
            sessions: DashMap::new(),
            options,
        }
    }

    /// Create an empty registry configured from settings.
    pub fn from_settings(settings: &WeftSettings) -> Self {
        Self::new(SessionOptions::from(&settings.stream))
    }

    /// Create a session with a fresh id.
    #[instrument(skip(self))]
    pub fn create(&self, provider: ProviderKind) -> Arc<StreamSession> {
        let id = Uuid::now_v7().to_string();
        self.create_with_id(id, provider)
    }

    /// Create a session under a caller-chosen id.
    ///
    /// Returns the existing session if the id is already registered.
    pub fn create_with_id(&self, id: impl Into<String>, provider: ProviderKind) -> Arc<StreamSession> {
        let id = id.into();
        self.sessions
            .entry(id.clone())
            .or_insert_with(|| {
                debug!(session_id = %id, %provider, "session created");
                Arc::new(StreamSession::new(id.clone(), provider, self.options))
            })
            .value()
            .clone()
    }

    /// Look up a session.
    pub fn get(&self, id: &str) -> Result<Arc<StreamSession>> {
        self.sessions
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| SessionError::NotFound(id.to_owned()))
    }

    /// Ids of all registered sessions, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions.iter().map(|e| e.key().clone()).collect();
        ids.sort_unstable();
        ids
    }

    /// Remove a session. In-flight turns keep their `Arc` and finish normally.
    pub fn remove(&self, id: &str) -> Result<Arc<StreamSession>> {
        let (_, session) = self
            .sessions
            .remove(id)
            .ok_or_else(|| SessionError::NotFound(id.to_owned()))?;
        debug!(session_id = %id, "session removed");
        Ok(session)
    }

    /// Number of registered sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no session is registered.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
