use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::{debug, warn};

use super::RouterSession;
use crate::error::RoutingError;
use crate::proxy::{Endpoint, ObjectProxy};

/// Outcome of starting a non-blocking [`RouterSession::add_proxy_async`].
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddProxy {
    /// The identity was already registered. No call was issued and the
    /// callback was dropped without being invoked.
    AlreadyRegistered,
    /// A publish call is in flight; the callback will be invoked exactly once.
    Pending,
}

impl RouterSession {
    /// Non-blocking [`RouterSession::client_endpoints`].
    ///
    /// `callback` runs inline when the cache is already filled, otherwise on
    /// whatever thread the invoker completes the call on. A call that ran as an
    /// in-process substitute is retried through the blocking path on that
    /// thread.
    pub fn client_endpoints_async<F>(self: &Arc<Self>, callback: F)
    where
        F: FnOnce(Result<Vec<Endpoint>, RoutingError>) + Send + 'static,
    {
        if let Some(cached) = self.cached_client_endpoints() {
            callback(Ok(cached));
            return;
        }

        let session = Arc::clone(self);
        self.router.invoker().get_client_proxy_async(
            self.router.proxy(),
            Box::new(move |result| {
                let outcome = match result {
                    Ok(client_proxy) => session.set_client_endpoints(client_proxy.as_ref()),
                    Err(RoutingError::CollocationOptimization) => {
                        debug!(
                            router = %session.router,
                            "getClientProxy ran in-process, retrying synchronously"
                        );
                        session.client_endpoints()
                    }
                    Err(err) => Err(err),
                };

                if let Err(err) = &outcome {
                    warn!(router = %session.router, error = %err, "Failed to fetch client endpoints");
                }
                callback(outcome);
            }),
        );
    }

    /// Non-blocking [`RouterSession::add_proxy`].
    pub fn add_proxy_async<F>(self: &Arc<Self>, proxy: ObjectProxy, callback: F) -> AddProxy
    where
        F: FnOnce(Result<(), RoutingError>) + Send + 'static,
    {
        if self.is_registered(proxy.identity()) {
            return AddProxy::AlreadyRegistered;
        }

        let session = Arc::clone(self);
        let published = proxy.clone();
        self.router.invoker().add_proxies_async(
            self.router.proxy(),
            vec![proxy],
            Box::new(move |result| {
                let outcome = match result {
                    Ok(evicted) => {
                        session.add_and_evict_proxies(Some(&published), &evicted);
                        Ok(())
                    }
                    Err(RoutingError::CollocationOptimization) => {
                        debug!(
                            router = %session.router,
                            identity = %published.identity(),
                            "addProxies ran in-process, retrying synchronously"
                        );
                        session.add_proxy(&published)
                    }
                    Err(err) => Err(err),
                };

                if let Err(err) = &outcome {
                    warn!(
                        router = %session.router,
                        identity = %published.identity(),
                        error = %err,
                        "Failed to publish proxy"
                    );
                }
                callback(outcome);
            }),
        );
        AddProxy::Pending
    }

    /// Await [`RouterSession::client_endpoints_async`].
    pub async fn fetch_client_endpoints(self: &Arc<Self>) -> Result<Vec<Endpoint>, RoutingError> {
        let (tx, rx) = oneshot::channel();
        self.client_endpoints_async(move |result| {
            let _ = tx.send(result);
        });
        rx.await.map_err(|_| RoutingError::CompletionDropped)?
    }

    /// Await [`RouterSession::add_proxy_async`].
    pub async fn register_proxy(self: &Arc<Self>, proxy: ObjectProxy) -> Result<(), RoutingError> {
        let (tx, rx) = oneshot::channel();
        match self.add_proxy_async(proxy, move |result| {
            let _ = tx.send(result);
        }) {
            AddProxy::AlreadyRegistered => Ok(()),
            AddProxy::Pending => rx.await.map_err(|_| RoutingError::CompletionDropped)?,
        }
    }
}
