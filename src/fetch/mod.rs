//! Cache-backed fetching.
//!
//! Every page the harvester reads goes through [`CachedFetcher`], which puts a
//! durable [`CacheStore`] in front of a [`Transport`]:
//!
//! 1. Lock the request's [`Fingerprint`] (concurrent duplicates wait here)
//! 2. Return a cached success entry without touching the network
//! 3. Otherwise send the request, store the outcome, and return it
//!
//! Because success entries are written before `fetch` returns and are never
//! replaced, an interrupted run can be restarted over the same cache and it
//! will only hit the network for pages it has not finished.

pub mod cache;
pub mod locks;
pub mod request;
pub mod transport;

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument, warn};

use crate::error::FetchError;
use cache::{CacheEntry, CacheStore};
use locks::KeyLocks;
pub use request::{Fingerprint, Request};
use transport::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOrigin {
    Cache,
    Network,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    pub body: String,
    pub origin: FetchOrigin,
}

/// What the crawl loop needs from a fetcher.
pub trait Fetch {
    async fn fetch(&self, request: &Request) -> Result<Fetched, FetchError>;
}

/// Fetcher that consults a cache store before the network.
///
/// The store handle is shared (`Arc`) so the binary can also use it for
/// manual invalidation. Failure entries are recorded for auditing but never
/// short-circuit a later fetch.
pub struct CachedFetcher<T, S> {
    transport: T,
    store: Arc<S>,
    locks: KeyLocks,
}

impl<T, S> CachedFetcher<T, S>
where
    T: Transport,
    S: CacheStore,
{
    pub fn new(transport: T, store: Arc<S>) -> Self {
        Self {
            transport,
            store,
            locks: KeyLocks::new(),
        }
    }

    #[cfg(test)]
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    #[cfg(test)]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Drop the cached entry for a request so the next fetch goes to the
    /// network.
    #[instrument(level = "info", skip_all, fields(url = %request.url))]
    pub async fn invalidate(&self, request: &Request) -> Result<bool, FetchError> {
        let fingerprint = request.fingerprint();
        let _guard = self.locks.lock(&fingerprint).await;
        Ok(self.store.remove(&fingerprint).await?)
    }
}

impl<T, S> Fetch for CachedFetcher<T, S>
where
    T: Transport,
    S: CacheStore,
{
    #[instrument(level = "debug", skip_all, fields(method = %request.method, url = %request.url))]
    async fn fetch(&self, request: &Request) -> Result<Fetched, FetchError> {
        let fingerprint = request.fingerprint();
        let _guard = self.locks.lock(&fingerprint).await;

        match self.store.get(&fingerprint).await {
            Ok(Some(entry)) if entry.is_success() => {
                debug!(%fingerprint, "Cache hit");
                return Ok(Fetched {
                    body: entry.body,
                    origin: FetchOrigin::Cache,
                });
            }
            Ok(_) => {}
            Err(e) => {
                warn!(%fingerprint, error = %e, "Unreadable cache entry; refetching");
            }
        }

        let t0 = Instant::now();
        match self.transport.send(request).await {
            Ok(body) => {
                self.store
                    .put(&fingerprint, CacheEntry::success(&request.url, body.as_str()))
                    .await?;
                debug!(
                    %fingerprint,
                    bytes = body.len(),
                    elapsed_ms = t0.elapsed().as_millis(),
                    "Fetched and cached"
                );
                Ok(Fetched {
                    body,
                    origin: FetchOrigin::Network,
                })
            }
            Err(e) => {
                if let Err(store_err) = self
                    .store
                    .put(&fingerprint, CacheEntry::failure(&request.url, e.to_string()))
                    .await
                {
                    warn!(%fingerprint, error = %store_err, "Could not record failure entry");
                }
                Err(e)
            }
        }
    }
}
