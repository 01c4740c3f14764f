use std::fmt;
use std::time::Duration;

use crate::error::RoutingError;
use crate::proxy::ObjectProxy;

/// A single-shot completion handler for an asynchronous router call.
///
/// Exactly one of success or failure is delivered, exactly once, from whatever
/// thread the invoker completes the call on.
pub type Completion<T> = Box<dyn FnOnce(Result<T, RoutingError>) + Send + 'static>;

/// The remote operations a router exposes, as issued through the RPC runtime.
///
/// Every method addresses the router object described by `router`. Blocking
/// methods block the calling thread for the duration of the call; the `_async`
/// variants return immediately and hand their outcome to `completion`.
pub trait RouterInvoker: Send + Sync {
    /// Fetch the proxy clients should connect to. `None` means the router
    /// accepts client connections on its own endpoints.
    fn get_client_proxy(&self, router: &ObjectProxy) -> Result<Option<ObjectProxy>, RoutingError>;

    fn get_client_proxy_async(
        &self,
        router: &ObjectProxy,
        completion: Completion<Option<ObjectProxy>>,
    );

    /// Fetch the proxy servers should connect to for routed callbacks.
    fn get_server_proxy(&self, router: &ObjectProxy) -> Result<Option<ObjectProxy>, RoutingError>;

    /// Publish `proxies` through the router, returning the proxies it evicted
    /// to make room.
    fn add_proxies(
        &self,
        router: &ObjectProxy,
        proxies: &[ObjectProxy],
    ) -> Result<Vec<ObjectProxy>, RoutingError>;

    fn add_proxies_async(
        &self,
        router: &ObjectProxy,
        proxies: Vec<ObjectProxy>,
        completion: Completion<Vec<ObjectProxy>>,
    );

    /// Acquire the connection to the router and return its timeout.
    ///
    /// Fails with [`RoutingError::CollocationOptimization`] when the router is
    /// reached in-process and no connection exists.
    fn connection_timeout(&self, router: &ObjectProxy) -> Result<Option<Duration>, RoutingError>;
}

/// A locally owned object adapter that receives requests routed back through
/// a router.
pub trait ObjectAdapter: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;
}
