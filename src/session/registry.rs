//! Session Registry
//!
//! Holds the upstream services every session talks to, and the set of live sessions.
//! Closing a session tears down its query stream so no lookup outlives the form.
//! Sessions whose front end vanished without closing are expired by `reap_idle`.

use super::types::SessionId;
use crate::geocoding::client::SuggestionLookup;
use crate::geocoding::query::{QueryConfig, QueryStream};
use crate::prediction::optimizer::OptimizerRegistry;
use crate::prediction::state::PredictionState;
use crate::weather::client::WeatherProvider;
use crate::weather::state::WeatherState;

use dashmap::DashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Upstream collaborators shared by all sessions.
#[derive(Clone)]
pub struct SiteServices {
    pub lookup: Arc<dyn SuggestionLookup>,
    pub weather: Arc<dyn WeatherProvider>,
    pub optimizers: Arc<OptimizerRegistry>,
    pub query_config: QueryConfig,
}

/// The state slices of one open site form.
pub struct Session {
    pub id: SessionId,
    pub location: QueryStream,
    pub weather: WeatherState,
    pub prediction: PredictionState,
    last_seen: Mutex<Instant>,
}

impl Session {
    fn touch(&self) {
        let mut last_seen = self.last_seen.lock().unwrap_or_else(|p| p.into_inner());
        *last_seen = Instant::now();
    }

    /// Time since the session was created or last fetched from the registry.
    pub fn idle_for(&self) -> Duration {
        self.last_seen
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .elapsed()
    }
}

pub struct SessionRegistry {
    services: SiteServices,
    sessions: DashMap<SessionId, Arc<Session>>,
}

impl SessionRegistry {
    pub fn new(services: SiteServices) -> Arc<Self> {
        Arc::new(Self {
            services,
            sessions: DashMap::new(),
        })
    }

    pub fn services(&self) -> &SiteServices {
        &self.services
    }

    pub fn create(&self) -> Arc<Session> {
        let id = SessionId::new();
        let session = Arc::new(Session {
            id: id.clone(),
            location: QueryStream::new(
                self.services.lookup.clone(),
                self.services.query_config.clone(),
            ),
            weather: WeatherState::new(),
            prediction: PredictionState::new(),
            last_seen: Mutex::new(Instant::now()),
        });

        self.sessions.insert(id.clone(), session.clone());
        tracing::info!("Opened session {}", id.0);
        session
    }

    /// Looks up a live session and marks it as recently used.
    pub fn get(&self, id: &SessionId) -> Option<Arc<Session>> {
        let session = self.sessions.get(id).map(|entry| entry.value().clone())?;
        session.touch();
        Some(session)
    }

    /// Removes the session and cancels anything its query stream has outstanding.
    ///
    /// Returns `false` if no such session exists.
    pub fn close(&self, id: &SessionId) -> bool {
        match self.sessions.remove(id) {
            Some((_, session)) => {
                session.location.close();
                tracing::info!("Closed session {}", id.0);
                true
            }
            None => false,
        }
    }

    /// Closes every session unused for longer than `max_idle`.
    ///
    /// Returns how many sessions were expired.
    pub fn reap_idle(&self, max_idle: Duration) -> usize {
        // Collect first; removing while iterating would deadlock the shard.
        let stale: Vec<SessionId> = self
            .sessions
            .iter()
            .filter(|entry| entry.value().idle_for() > max_idle)
            .map(|entry| entry.key().clone())
            .collect();

        let mut reaped = 0;
        for id in stale {
            // Re-check under the shard lock in case the session was used meanwhile
            if let Some((_, session)) = self
                .sessions
                .remove_if(&id, |_, session| session.idle_for() > max_idle)
            {
                session.location.close();
                tracing::info!("Expired idle session {}", id.0);
                reaped += 1;
            }
        }
        reaped
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
