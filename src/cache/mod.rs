//! Keyed query cache with request deduplication.
//!
//! Every read goes through [`QueryCache::fetch`] with a [`QueryKey`]. Per key
//! the cache tracks `Idle → Loading → Success | Error`, plus an
//! `is_refetching` flag while a fetch runs over existing data. At most one
//! fetch per key is in flight; callers arriving meanwhile attach to it.
//!
//! Fetches run on their own task, so a caller that goes away does not
//! cancel the request: its result is still recorded for the next reader.
//!
//! Invalidation bumps the key's generation. A fetch started under an older
//! generation may still answer the callers that were waiting on it, but its
//! result is never stored, so a read after invalidation always goes back to
//! the backend.

pub mod invalidation;

pub use invalidation::Mutation;

use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use crate::error::ApiError;

/// Cache key: entity name plus optional id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Activities,
    Activity(i64),
    MyReservations,
    AllReservations,
    Reservation(i64),
    Profile,
}

impl QueryKey {
    pub fn entity(&self) -> &'static str {
        match self {
            Self::Activities => "activities",
            Self::Activity(_) => "activity",
            Self::MyReservations => "myReservations",
            Self::AllReservations => "allReservations",
            Self::Reservation(_) => "reservation",
            Self::Profile => "profile",
        }
    }

    pub fn param(&self) -> Option<i64> {
        match self {
            Self::Activity(id) | Self::Reservation(id) => Some(*id),
            _ => None,
        }
    }
}

impl std::fmt::Display for QueryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.param() {
            Some(id) => write!(f, "{}/{}", self.entity(), id),
            None => write!(f, "{}", self.entity()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QueryStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

/// Point-in-time view of one cache entry.
#[derive(Debug, Clone)]
pub struct QuerySnapshot<V> {
    pub data: Option<V>,
    pub error: Option<ApiError>,
    pub status: QueryStatus,
    pub is_refetching: bool,
    pub is_stale: bool,
    pub updated_at: Option<Instant>,
}

impl<V> QuerySnapshot<V> {
    /// First load, nothing to show yet.
    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Loading
    }

    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }
}

type InFlight<V> = Shared<BoxFuture<'static, Result<V, ApiError>>>;

struct Entry<V> {
    data: Option<V>,
    error: Option<ApiError>,
    status: QueryStatus,
    is_refetching: bool,
    stale: bool,
    generation: u64,
    in_flight: Option<InFlight<V>>,
    updated_at: Option<Instant>,
}

impl<V: Clone> Entry<V> {
    fn new() -> Self {
        Self {
            data: None,
            error: None,
            status: QueryStatus::Idle,
            is_refetching: false,
            stale: false,
            generation: 0,
            in_flight: None,
            updated_at: None,
        }
    }

    fn fresh_data(&self) -> Option<V> {
        if self.stale || self.status != QueryStatus::Success {
            return None;
        }
        self.data.clone()
    }

    fn complete(&mut self, generation: u64, result: &Result<V, ApiError>) -> bool {
        if generation != self.generation {
            // Superseded. Unless a newer fetch took over, nothing is loading now.
            if self.in_flight.is_none() {
                self.is_refetching = false;
                if self.status == QueryStatus::Loading {
                    self.status = QueryStatus::Idle;
                }
            }
            return false;
        }
        self.in_flight = None;
        self.is_refetching = false;
        match result {
            Ok(data) => {
                self.data = Some(data.clone());
                self.error = None;
                self.status = QueryStatus::Success;
                self.stale = false;
                self.updated_at = Some(Instant::now());
            }
            Err(err) => {
                // Previous data stays available next to the error.
                self.error = Some(err.clone());
                self.status = QueryStatus::Error;
            }
        }
        true
    }

    fn snapshot(&self) -> QuerySnapshot<V> {
        QuerySnapshot {
            data: self.data.clone(),
            error: self.error.clone(),
            status: self.status,
            is_refetching: self.is_refetching,
            is_stale: self.stale,
            updated_at: self.updated_at,
        }
    }
}

pub struct QueryCache<V> {
    entries: DashMap<QueryKey, Arc<Mutex<Entry<V>>>>,
}

impl<V> Default for QueryCache<V> {
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl<V> QueryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached data if fresh, otherwise the in-flight fetch, otherwise a new
    /// fetch built by `fetcher`.
    pub async fn fetch<F, Fut>(&self, key: QueryKey, fetcher: F) -> Result<V, ApiError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, ApiError>> + Send + 'static,
    {
        let entry = self.entry(key);
        let in_flight = {
            let mut state = entry.lock();
            if let Some(data) = state.fresh_data() {
                tracing::trace!(key = %key, "Cache hit");
                return Ok(data);
            }
            match state.in_flight.clone() {
                Some(in_flight) => {
                    tracing::debug!(key = %key, "Attaching to in-flight fetch");
                    in_flight
                }
                None => Self::start(key, &entry, &mut state, fetcher()),
            }
        };
        in_flight.await
    }

    /// Fetch regardless of freshness. Joins a fetch already in flight for
    /// the current generation instead of issuing a second one.
    pub async fn refetch<F, Fut>(&self, key: QueryKey, fetcher: F) -> Result<V, ApiError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, ApiError>> + Send + 'static,
    {
        let entry = self.entry(key);
        let in_flight = {
            let mut state = entry.lock();
            match state.in_flight.clone() {
                Some(in_flight) => in_flight,
                None => Self::start(key, &entry, &mut state, fetcher()),
            }
        };
        in_flight.await
    }

    fn start<Fut>(
        key: QueryKey,
        entry: &Arc<Mutex<Entry<V>>>,
        state: &mut Entry<V>,
        fetch: Fut,
    ) -> InFlight<V>
    where
        Fut: Future<Output = Result<V, ApiError>> + Send + 'static,
    {
        let generation = state.generation;
        if state.data.is_some() || state.error.is_some() {
            state.is_refetching = true;
        } else {
            state.status = QueryStatus::Loading;
        }
        tracing::debug!(key = %key, generation, "Fetching");

        let owner = Arc::clone(entry);
        let task = tokio::spawn(async move {
            let result = fetch.await;
            if !owner.lock().complete(generation, &result) {
                tracing::debug!(key = %key, generation, "Discarding result of invalidated fetch");
            }
            result
        });

        let in_flight = async move {
            task.await.unwrap_or_else(|e| {
                Err(ApiError::transport(format!("Fetch task aborted: {}", e)))
            })
        }
        .boxed()
        .shared();

        state.in_flight = Some(in_flight.clone());
        in_flight
    }

    /// Mark the entry stale; the next read goes to the backend.
    ///
    /// An id-keyed entry that was already stale and idle (nobody read it
    /// since its last invalidation) is dropped instead.
    pub fn invalidate(&self, key: QueryKey) {
        let evict = match self.entries.get(&key) {
            Some(entry) => {
                let mut state = entry.lock();
                let unread = Self::mark_stale(&mut state);
                tracing::debug!(key = %key, generation = state.generation, "Invalidated");
                unread && key.param().is_some()
            }
            None => false,
        };
        if evict {
            self.evict(key);
        }
    }

    /// Invalidate every key of one entity, e.g. all `activity/{id}` entries.
    pub fn invalidate_entity(&self, entity: &str) {
        let mut unread = Vec::new();
        for item in self.entries.iter() {
            let key = *item.key();
            if key.entity() == entity
                && Self::mark_stale(&mut item.value().lock())
                && key.param().is_some()
            {
                unread.push(key);
            }
        }
        for key in unread {
            self.evict(key);
        }
        tracing::debug!(entity, "Invalidated entity");
    }

    /// Invalidate the keys and entities a completed mutation affects.
    pub fn apply(&self, mutation: &Mutation) {
        for key in mutation.affected_keys() {
            self.invalidate(key);
        }
        for entity in mutation.affected_entities() {
            self.invalidate_entity(entity);
        }
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.clear();
        tracing::debug!("Cache cleared");
    }

    pub fn snapshot(&self, key: QueryKey) -> QuerySnapshot<V> {
        match self.entries.get(&key) {
            Some(entry) => entry.lock().snapshot(),
            None => Entry::new().snapshot(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, key: QueryKey) -> Arc<Mutex<Entry<V>>> {
        self.entries
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(Entry::new())))
            .value()
            .clone()
    }

    /// Returns true if the entry was already stale with no fetch running.
    fn mark_stale(state: &mut Entry<V>) -> bool {
        let unread = state.stale && state.in_flight.is_none();
        state.stale = true;
        state.generation += 1;
        // A superseded fetch keeps its Loading/refetching flags until it
        // settles or a newer fetch starts.
        state.in_flight = None;
        unread
    }

    fn evict(&self, key: QueryKey) {
        if self
            .entries
            .remove_if(&key, |_, entry| entry.lock().in_flight.is_none())
            .is_some()
        {
            tracing::debug!(key = %key, "Evicted unread entry");
        }
    }
}
