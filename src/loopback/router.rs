use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use lru::LruCache;
use router_info::{Identity, ObjectProxy, RoutingError};
use tracing::debug;

use crate::loopback::config::SimulatedRouterConfig;

/// Number of calls a simulated router has served, per operation.
#[derive(Debug, Default)]
pub struct CallCounters {
    get_client_proxy: AtomicUsize,
    get_server_proxy: AtomicUsize,
    add_proxies: AtomicUsize,
}

impl CallCounters {
    pub fn get_client_proxy(&self) -> usize {
        self.get_client_proxy.load(Ordering::SeqCst)
    }

    pub fn get_server_proxy(&self) -> usize {
        self.get_server_proxy.load(Ordering::SeqCst)
    }

    pub fn add_proxies(&self) -> usize {
        self.add_proxies.load(Ordering::SeqCst)
    }
}

/// An in-process router service with a bounded routing table.
///
/// Publishing an identity that is already present refreshes it. Publishing a
/// new identity into a full table evicts the least recently published one,
/// which is reported back to the caller.
pub struct SimulatedRouter {
    proxy: ObjectProxy,
    config: SimulatedRouterConfig,
    routing_table: Mutex<LruCache<Identity, ObjectProxy>>,
    failures: Mutex<VecDeque<RoutingError>>,
    calls: CallCounters,
}

impl SimulatedRouter {
    pub fn new(proxy: ObjectProxy, config: SimulatedRouterConfig) -> Self {
        Self {
            proxy: proxy.without_router(),
            routing_table: Mutex::new(LruCache::new(config.routing_table_size)),
            config,
            failures: Mutex::new(VecDeque::new()),
            calls: CallCounters::default(),
        }
    }

    /// The router's own proxy.
    pub fn proxy(&self) -> &ObjectProxy {
        &self.proxy
    }

    pub fn config(&self) -> &SimulatedRouterConfig {
        &self.config
    }

    pub fn is_collocated(&self) -> bool {
        self.config.collocated
    }

    pub fn calls(&self) -> &CallCounters {
        &self.calls
    }

    /// Make the next served call fail with `err`.
    pub fn inject_failure(&self, err: RoutingError) {
        lock(&self.failures).push_back(err);
    }

    fn take_failure(&self) -> Result<(), RoutingError> {
        match lock(&self.failures).pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub fn get_client_proxy(&self) -> Result<Option<ObjectProxy>, RoutingError> {
        self.calls.get_client_proxy.fetch_add(1, Ordering::SeqCst);
        self.take_failure()?;
        Ok(self
            .config
            .client_endpoints
            .as_ref()
            .map(|endpoints| ObjectProxy::new(self.proxy.identity().clone(), endpoints.clone())))
    }

    pub fn get_server_proxy(&self) -> Result<Option<ObjectProxy>, RoutingError> {
        self.calls.get_server_proxy.fetch_add(1, Ordering::SeqCst);
        self.take_failure()?;
        Ok(self
            .config
            .server_endpoints
            .as_ref()
            .map(|endpoints| ObjectProxy::new(self.proxy.identity().clone(), endpoints.clone())))
    }

    /// Publish `proxies`, returning the proxies evicted to make room.
    pub fn add_proxies(&self, proxies: &[ObjectProxy]) -> Result<Vec<ObjectProxy>, RoutingError> {
        self.calls.add_proxies.fetch_add(1, Ordering::SeqCst);
        self.take_failure()?;

        let mut table = lock(&self.routing_table);
        let mut evicted = Vec::new();
        for proxy in proxies {
            let identity = proxy.identity().clone();
            // `push` also hands back the previous entry for a refreshed key.
            if let Some((previous, previous_proxy)) = table.push(identity.clone(), proxy.without_router()) {
                if previous != identity {
                    evicted.push(previous_proxy);
                }
            }
        }

        if !evicted.is_empty() {
            debug!(
                router = %self.proxy.identity(),
                evicted = evicted.len(),
                published = table.len(),
                "Routing table full, evicted proxies"
            );
        }
        Ok(evicted)
    }

    pub fn is_published(&self, identity: &Identity) -> bool {
        lock(&self.routing_table).contains(identity)
    }

    /// Identities currently published, most recently published first.
    pub fn published(&self) -> Vec<Identity> {
        lock(&self.routing_table)
            .iter()
            .map(|(identity, _)| identity.clone())
            .collect()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
