//! Debounced Cancelable Query Stream
//!
//! Converts a rapidly-changing text input into a rate-limited sequence of lookups.
//!
//! ## Lifecycle
//! 1. **Change**: `set_text` cancels whatever the stream had outstanding (timer or request)
//!    and, if the trimmed text is long enough, spawns a fresh timer task with a new token.
//! 2. **Settle**: when the timer elapses untouched, the task issues exactly one lookup.
//! 3. **Apply**: the response is written back only if the token is still live, checked under
//!    the state lock. A superseded response is dropped on the floor.
//! 4. **Teardown**: `close` (or dropping the stream) cancels the token; nothing writes afterwards.
//!
//! The state lock is never held across an `.await`.

use super::client::SuggestionLookup;
use super::types::{
    AcceptedLocation, LookupError, LookupRequest, QueryPhase, QuerySnapshot, Suggestion,
};

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_SETTLE_WINDOW: Duration = Duration::from_millis(300);
pub const MIN_QUERY_CHARS: usize = 3;
pub const LOOKUP_FAILED_NOTICE: &str = "Location search failed.";

#[derive(Debug, Clone)]
pub struct QueryConfig {
    /// Idle time after the last change before a lookup is issued.
    pub settle_window: Duration,
    /// Trimmed inputs shorter than this never trigger a lookup.
    pub min_chars: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            settle_window: DEFAULT_SETTLE_WINDOW,
            min_chars: MIN_QUERY_CHARS,
        }
    }
}

struct QueryState {
    text: String,
    phase: QueryPhase,
    suggestions: Vec<Suggestion>,
    accepted: Option<AcceptedLocation>,
    focused: bool,
    notice: Option<String>,
    revision: u64,
    /// Token guarding the current timer/request. At most one exists per stream.
    cancel: Option<CancellationToken>,
}

impl QueryState {
    fn snapshot(&self) -> QuerySnapshot {
        QuerySnapshot {
            text: self.text.clone(),
            phase: self.phase,
            suggestions: self.suggestions.clone(),
            accepted: self.accepted.clone(),
            focused: self.focused,
            notice: self.notice.clone(),
            revision: self.revision,
        }
    }

    /// Signals cancellation on the outstanding token, if any, and forgets it.
    fn cancel_outstanding(&mut self) {
        if let Some(token) = self.cancel.take() {
            token.cancel();
            tracing::trace!("Canceled outstanding lookup (was {:?})", self.phase);
        }
    }
}

struct StreamShared {
    lookup: Arc<dyn SuggestionLookup>,
    config: QueryConfig,
    state: Mutex<QueryState>,
    updates: watch::Sender<QuerySnapshot>,
}

impl StreamShared {
    fn lock(&self) -> MutexGuard<'_, QueryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish(&self, state: &mut QueryState) {
        state.revision += 1;
        self.updates.send_replace(state.snapshot());
    }
}

/// One query stream, owned by one input field. Dropping it tears the stream down.
pub struct QueryStream {
    shared: Arc<StreamShared>,
}

impl QueryStream {
    pub fn new(lookup: Arc<dyn SuggestionLookup>, config: QueryConfig) -> Self {
        let state = QueryState {
            text: String::new(),
            phase: QueryPhase::Idle,
            suggestions: Vec::new(),
            accepted: None,
            focused: false,
            notice: None,
            revision: 0,
            cancel: None,
        };
        let (updates, _) = watch::channel(state.snapshot());

        Self {
            shared: Arc::new(StreamShared {
                lookup,
                config,
                state: Mutex::new(state),
                updates,
            }),
        }
    }

    /// Feeds the current raw input text. Must be called from within a tokio runtime.
    ///
    /// Unchanged text is ignored, so echoing the value back after a selection does not
    /// restart the search.
    pub fn set_text(&self, text: impl Into<String>) {
        let text = text.into();
        let mut state = self.shared.lock();

        if state.phase == QueryPhase::Closed || state.text == text {
            return;
        }

        state.text = text;
        state.focused = true;
        state.cancel_outstanding();

        let query = state.text.trim().to_string();
        if query.chars().count() < self.shared.config.min_chars {
            state.suggestions.clear();
            state.notice = None;
            state.phase = QueryPhase::Idle;
            self.shared.publish(&mut state);
            return;
        }

        let token = CancellationToken::new();
        state.cancel = Some(token.clone());
        state.phase = QueryPhase::Pending;
        self.shared.publish(&mut state);
        drop(state);

        let shared = self.shared.clone();
        tokio::spawn(async move {
            run_lookup(shared, token, LookupRequest { text: query }).await;
        });
    }

    /// Accepts the suggestion at `index`, ending the current search.
    ///
    /// Returns `None` (and changes nothing) if the index is out of range.
    pub fn select(&self, index: usize) -> Option<AcceptedLocation> {
        let mut state = self.shared.lock();
        if state.phase == QueryPhase::Closed {
            return None;
        }

        let suggestion = state.suggestions.get(index)?.clone();
        let accepted = AcceptedLocation::from(suggestion);

        state.cancel_outstanding();
        state.text = accepted.label.clone();
        state.accepted = Some(accepted.clone());
        state.suggestions.clear();
        state.focused = false;
        state.notice = None;
        state.phase = QueryPhase::Idle;
        self.shared.publish(&mut state);

        tracing::info!(
            "Accepted location '{}' ({}, {})",
            accepted.label,
            accepted.lat,
            accepted.lon
        );
        Some(accepted)
    }

    pub fn focus(&self) {
        let mut state = self.shared.lock();
        if state.phase == QueryPhase::Closed || state.focused {
            return;
        }
        state.focused = true;
        self.shared.publish(&mut state);
    }

    /// Tears the stream down. Idempotent.
    pub fn close(&self) {
        let mut state = self.shared.lock();
        if state.phase == QueryPhase::Closed {
            return;
        }
        state.cancel_outstanding();
        state.phase = QueryPhase::Closed;
        state.focused = false;
        self.shared.publish(&mut state);
        tracing::debug!("Query stream closed");
    }

    pub fn snapshot(&self) -> QuerySnapshot {
        self.shared.lock().snapshot()
    }

    pub fn accepted(&self) -> Option<AcceptedLocation> {
        self.shared.lock().accepted.clone()
    }

    /// Receives a fresh snapshot after every mutation.
    pub fn subscribe(&self) -> watch::Receiver<QuerySnapshot> {
        self.shared.updates.subscribe()
    }
}

impl Drop for QueryStream {
    fn drop(&mut self) {
        self.close();
    }
}

/// Timer + request task for a single settle event.
async fn run_lookup(shared: Arc<StreamShared>, token: CancellationToken, request: LookupRequest) {
    tokio::select! {
        _ = token.cancelled() => return,
        _ = tokio::time::sleep(shared.config.settle_window) => {}
    }

    {
        let mut state = shared.lock();
        if token.is_cancelled() {
            return;
        }
        state.phase = QueryPhase::InFlight;
        shared.publish(&mut state);
    }

    tracing::debug!("Issuing lookup for '{}'", request.text);

    let result = tokio::select! {
        _ = token.cancelled() => Err(LookupError::Canceled),
        result = shared.lookup.search(&request) => result,
    };

    let mut state = shared.lock();

    // A live token under the lock means this is still the stream's current request.
    if token.is_cancelled() {
        tracing::debug!("Dropping superseded response for '{}'", request.text);
        return;
    }
    state.cancel = None;

    match result {
        Ok(suggestions) => {
            tracing::debug!(
                "Lookup for '{}' settled with {} suggestions",
                request.text,
                suggestions.len()
            );
            state.suggestions = suggestions;
            state.notice = None;
            state.phase = QueryPhase::Settled;
        }
        Err(LookupError::Canceled) => {
            state.phase = QueryPhase::Idle;
        }
        Err(err) => {
            tracing::warn!("Location fetch error for '{}': {}", request.text, err);
            state.suggestions.clear();
            state.notice = Some(LOOKUP_FAILED_NOTICE.to_string());
            state.phase = QueryPhase::Idle;
        }
    }

    shared.publish(&mut state);
}
