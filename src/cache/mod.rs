//! Tag-based cache invalidation for API reads.
//!
//! Active reads are indexed by the tags their endpoint provides. A successful
//! write invalidates its tags, which marks stale exactly the reads sharing at
//! least one of them; those are the reads to refetch on next access.

mod endpoints;
mod query;

pub use endpoints::{
    API_SURFACES, AUTH_API, ApiSurface, BANK_API, BANK_DETAILS, Endpoint, EndpointKind,
    FLIGHT_BOOKING_HISTORY, FLIGHT_BOOKING_HISTORY_API, HttpMethod, USER, USER_PROFILE,
};
pub use query::{ALL_FILTER, QueryParam, build_query};

use std::collections::{BTreeSet, HashMap};

/// Identifies one active read (an endpoint plus its arguments).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReadHandle(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadState {
    Fresh,
    /// Invalidated; must be refetched before its data is used again
    Stale,
}

#[derive(Debug)]
pub enum CacheError {
    /// Mutations cannot be subscribed to
    NotAQuery(&'static str),
    /// Queries do not invalidate anything
    NotAMutation(&'static str),
}

impl std::fmt::Display for CacheError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheError::NotAQuery(name) => write!(f, "Endpoint {} is not a query", name),
            CacheError::NotAMutation(name) => write!(f, "Endpoint {} is not a mutation", name),
        }
    }
}

impl std::error::Error for CacheError {}

#[derive(Debug)]
struct ActiveRead {
    key: (&'static str, String),
    tags: &'static [&'static str],
    state: ReadState,
    subscribers: usize,
}

/// Index of active reads by tag.
#[derive(Debug, Default)]
pub struct TagCache {
    next_id: u64,
    reads: HashMap<ReadHandle, ActiveRead>,
    by_key: HashMap<(&'static str, String), ReadHandle>,
    by_tag: HashMap<&'static str, BTreeSet<ReadHandle>>,
}

impl TagCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to a read. Identical endpoint/argument pairs share one
    /// handle; each subscription must be released with [`unsubscribe`].
    ///
    /// [`unsubscribe`]: TagCache::unsubscribe
    pub fn subscribe(&mut self, endpoint: &Endpoint, args: &str) -> Result<ReadHandle, CacheError> {
        if !endpoint.is_query() {
            return Err(CacheError::NotAQuery(endpoint.name));
        }

        let key = (endpoint.name, args.to_string());
        if let Some(handle) = self.by_key.get(&key).copied() {
            if let Some(read) = self.reads.get_mut(&handle) {
                read.subscribers += 1;
            }
            return Ok(handle);
        }

        let handle = ReadHandle(self.next_id);
        self.next_id += 1;

        let tags = endpoint.provides();
        for tag in tags {
            self.by_tag.entry(*tag).or_default().insert(handle);
        }
        self.by_key.insert(key.clone(), handle);
        self.reads.insert(
            handle,
            ActiveRead {
                key,
                tags,
                state: ReadState::Fresh,
                subscribers: 1,
            },
        );
        Ok(handle)
    }

    /// Release one subscription. The read is dropped from every tag once
    /// nobody subscribes to it. Returns false for unknown handles.
    pub fn unsubscribe(&mut self, handle: ReadHandle) -> bool {
        let Some(read) = self.reads.get_mut(&handle) else {
            return false;
        };
        read.subscribers -= 1;
        if read.subscribers > 0 {
            return true;
        }

        if let Some(read) = self.reads.remove(&handle) {
            self.by_key.remove(&read.key);
            for tag in read.tags {
                if let Some(handles) = self.by_tag.get_mut(*tag) {
                    handles.remove(&handle);
                    if handles.is_empty() {
                        self.by_tag.remove(*tag);
                    }
                }
            }
        }
        true
    }

    pub fn state(&self, handle: ReadHandle) -> Option<ReadState> {
        self.reads.get(&handle).map(|read| read.state)
    }

    /// Mark stale every read providing any of `tags`. Returns the affected
    /// handles in ascending order.
    pub fn invalidate(&mut self, tags: &[&str]) -> Vec<ReadHandle> {
        let affected: BTreeSet<ReadHandle> = tags
            .iter()
            .filter_map(|tag| self.by_tag.get(*tag))
            .flatten()
            .copied()
            .collect();

        for handle in &affected {
            if let Some(read) = self.reads.get_mut(handle) {
                read.state = ReadState::Stale;
            }
        }

        if !affected.is_empty() {
            tracing::debug!(?tags, count = affected.len(), "Invalidated cached reads");
        }
        affected.into_iter().collect()
    }

    /// Record a successful write: invalidates the endpoint's tags.
    pub fn complete_mutation(&mut self, endpoint: &Endpoint) -> Result<Vec<ReadHandle>, CacheError> {
        if endpoint.is_query() {
            return Err(CacheError::NotAMutation(endpoint.name));
        }
        Ok(self.invalidate(endpoint.invalidates()))
    }

    /// Record a completed refetch. Returns false for unknown handles.
    pub fn mark_fresh(&mut self, handle: ReadHandle) -> bool {
        match self.reads.get_mut(&handle) {
            Some(read) => {
                read.state = ReadState::Fresh;
                true
            }
            None => false,
        }
    }

    /// Reads awaiting a refetch, in ascending order.
    pub fn stale(&self) -> Vec<ReadHandle> {
        let mut stale: Vec<ReadHandle> = self
            .reads
            .iter()
            .filter(|(_, read)| read.state == ReadState::Stale)
            .map(|(handle, _)| *handle)
            .collect();
        stale.sort();
        stale
    }

    pub fn len(&self) -> usize {
        self.reads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reads.is_empty()
    }
}
