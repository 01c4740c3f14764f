//! An in-process stand-in for the RPC runtime's router calls.
//!
//! A [`LoopbackInvoker`] dispatches router calls to [`SimulatedRouter`]s by
//! identity. Blocking calls run on the caller's thread; asynchronous calls
//! run on a tokio blocking thread and complete there.

mod config;
mod router;

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use router_info::{Completion, Identity, ObjectProxy, RouterInvoker, RoutingError};
use tokio::runtime::Handle;
use tracing::debug;

pub use config::{DEFAULT_ROUTING_TABLE_SIZE, SimulatedRouterConfig};
pub use router::{CallCounters, SimulatedRouter};

/// Routes router calls to simulated routers registered in this process.
pub struct LoopbackInvoker {
    routers: DashMap<Identity, Arc<SimulatedRouter>, ahash::RandomState>,
    runtime: Handle,
}

impl LoopbackInvoker {
    /// Create an invoker completing asynchronous calls on `runtime`.
    pub fn new(runtime: Handle) -> Self {
        Self {
            routers: DashMap::default(),
            runtime,
        }
    }

    /// Make `router` reachable, replacing any router with the same identity.
    pub fn register(&self, router: Arc<SimulatedRouter>) {
        let identity = router.proxy().identity().clone();
        debug!(router = %identity, collocated = router.is_collocated(), "Registered simulated router");
        self.routers.insert(identity, router);
    }

    pub fn unregister(&self, identity: &Identity) -> Option<Arc<SimulatedRouter>> {
        self.routers.remove(identity).map(|(_, router)| router)
    }

    pub fn router(&self, identity: &Identity) -> Option<Arc<SimulatedRouter>> {
        self.routers.get(identity).map(|entry| Arc::clone(entry.value()))
    }

    /// Get the number of registered routers.
    pub fn len(&self) -> usize {
        self.routers.len()
    }

    /// Check if no routers are registered.
    pub fn is_empty(&self) -> bool {
        self.routers.is_empty()
    }

    fn resolve(&self, proxy: &ObjectProxy) -> Result<Arc<SimulatedRouter>, RoutingError> {
        self.router(proxy.identity())
            .ok_or_else(|| RoutingError::ObjectNotExist {
                identity: proxy.identity().to_string(),
            })
    }

    /// Run `call` on a blocking thread and hand its result to `completion`.
    fn complete<T, F>(&self, completion: Completion<T>, call: F)
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, RoutingError> + Send + 'static,
    {
        self.runtime.spawn_blocking(move || completion(call()));
    }
}

impl RouterInvoker for LoopbackInvoker {
    fn get_client_proxy(&self, router: &ObjectProxy) -> Result<Option<ObjectProxy>, RoutingError> {
        self.resolve(router)?.get_client_proxy()
    }

    fn get_client_proxy_async(
        &self,
        router: &ObjectProxy,
        completion: Completion<Option<ObjectProxy>>,
    ) {
        let target = self.resolve(router);
        self.complete(completion, move || {
            let target = target?;
            if target.is_collocated() {
                return Err(RoutingError::CollocationOptimization);
            }
            target.get_client_proxy()
        });
    }

    fn get_server_proxy(&self, router: &ObjectProxy) -> Result<Option<ObjectProxy>, RoutingError> {
        self.resolve(router)?.get_server_proxy()
    }

    fn add_proxies(
        &self,
        router: &ObjectProxy,
        proxies: &[ObjectProxy],
    ) -> Result<Vec<ObjectProxy>, RoutingError> {
        self.resolve(router)?.add_proxies(proxies)
    }

    fn add_proxies_async(
        &self,
        router: &ObjectProxy,
        proxies: Vec<ObjectProxy>,
        completion: Completion<Vec<ObjectProxy>>,
    ) {
        let target = self.resolve(router);
        self.complete(completion, move || {
            let target = target?;
            if target.is_collocated() {
                return Err(RoutingError::CollocationOptimization);
            }
            target.add_proxies(&proxies)
        });
    }

    fn connection_timeout(&self, router: &ObjectProxy) -> Result<Option<Duration>, RoutingError> {
        let target = self.resolve(router)?;
        if target.is_collocated() {
            return Err(RoutingError::CollocationOptimization);
        }
        Ok(target.config().connection_timeout)
    }
}
