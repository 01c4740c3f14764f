//! Per-router state: endpoint caches, the owned adapter, and the mirror of
//! identities published through the router.
//!
//! No lock is held across a remote call. Calls are issued with the session
//! unlocked and their results are applied in a second short critical section,
//! so results of concurrent publish calls may be applied in any order.

mod callback;
mod endpoints;
mod identities;

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::error::RoutingError;
use crate::handle::RouterHandle;
use crate::invoker::ObjectAdapter;
use crate::proxy::{Endpoint, Identity, ObjectProxy};

pub use callback::AddProxy;
use identities::IdentityMirror;

#[derive(Debug, Default)]
struct SessionState {
    client_endpoints: Vec<Endpoint>,
    server_endpoints: Vec<Endpoint>,
    adapter: Option<Arc<dyn ObjectAdapter>>,
    identities: IdentityMirror,
}

/// The routing state kept for one router.
pub struct RouterSession {
    router: RouterHandle,
    state: Mutex<SessionState>,
}

impl RouterSession {
    /// Create a session for `router`, which must already be canonical.
    pub fn new(router: RouterHandle) -> Self {
        debug_assert!(router.is_canonical());
        Self {
            router,
            state: Mutex::new(SessionState::default()),
        }
    }

    /// The router this session tracks. Immutable, read without locking.
    pub fn router(&self) -> &RouterHandle {
        &self.router
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        // Every critical section leaves the state consistent, so a panic
        // elsewhere never leaves it half-written.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publish `proxy` through the router unless it is already registered.
    ///
    /// Blocks for the duration of the remote publish call.
    pub fn add_proxy(&self, proxy: &ObjectProxy) -> Result<(), RoutingError> {
        if self.is_registered(proxy.identity()) {
            return Ok(());
        }

        let evicted = self
            .router
            .invoker()
            .add_proxies(self.router.proxy(), std::slice::from_ref(proxy))?;
        self.add_and_evict_proxies(Some(proxy), &evicted);
        Ok(())
    }

    /// Apply the result of a publish call: `proxy` was published (if any) and
    /// the router evicted `evicted` as a side effect.
    pub fn add_and_evict_proxies(&self, proxy: Option<&ObjectProxy>, evicted: &[ObjectProxy]) {
        let outcome = self.state().identities.reconcile(
            proxy.map(ObjectProxy::identity),
            evicted.iter().map(ObjectProxy::identity),
        );

        debug!(
            router = %self.router,
            identity = ?proxy.map(|proxy| proxy.identity().to_string()),
            registered = outcome.registered,
            evicted_before_added = outcome.consumed,
            removed = outcome.removed,
            buffered = outcome.buffered,
            "Reconciled publish result"
        );
    }

    /// Forget that `identity` is published through this router.
    pub fn clear_cache(&self, identity: &Identity) {
        if self.state().identities.remove(identity) {
            debug!(router = %self.router, identity = %identity, "Cleared cached identity");
        }
    }

    pub fn is_registered(&self, identity: &Identity) -> bool {
        self.state().identities.contains(identity)
    }

    /// Snapshot of the identities currently believed published.
    pub fn registered_identities(&self) -> Vec<Identity> {
        self.state().identities.registered().cloned().collect()
    }

    /// Number of buffered eviction notices for `identity` not yet matched by
    /// the publish result that registered it.
    pub fn pending_evictions(&self, identity: &Identity) -> usize {
        self.state().identities.pending(identity)
    }

    pub fn set_adapter(&self, adapter: Option<Arc<dyn ObjectAdapter>>) {
        self.state().adapter = adapter;
    }

    pub fn adapter(&self) -> Option<Arc<dyn ObjectAdapter>> {
        self.state().adapter.clone()
    }

    /// Reset all local state. Makes no remote call.
    pub fn teardown(&self) {
        let mut state = self.state();
        state.client_endpoints.clear();
        state.server_endpoints.clear();
        state.adapter = None;
        state.identities.clear();
    }

    /// Whether the session holds no cached endpoints, adapter or identities.
    pub fn is_empty(&self) -> bool {
        let state = self.state();
        state.client_endpoints.is_empty()
            && state.server_endpoints.is_empty()
            && state.adapter.is_none()
            && state.identities.is_empty()
    }
}

impl PartialEq for RouterSession {
    fn eq(&self, other: &Self) -> bool {
        self.router == other.router
    }
}

impl Eq for RouterSession {}

impl PartialOrd for RouterSession {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RouterSession {
    fn cmp(&self, other: &Self) -> Ordering {
        self.router.cmp(&other.router)
    }
}

impl Hash for RouterSession {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.router.hash(state);
    }
}

impl fmt::Debug for RouterSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterSession")
            .field("router", &self.router)
            .finish()
    }
}
