use tracing::debug;

use super::RouterSession;
use crate::error::RoutingError;
use crate::proxy::{Endpoint, ObjectProxy};

impl RouterSession {
    /// The endpoints clients use to reach servers through this router.
    ///
    /// Computed from the router's client proxy on first use and cached for the
    /// lifetime of the session.
    pub fn client_endpoints(&self) -> Result<Vec<Endpoint>, RoutingError> {
        if let Some(cached) = self.cached_client_endpoints() {
            return Ok(cached);
        }

        let client_proxy = self
            .router
            .invoker()
            .get_client_proxy(self.router.proxy())?;
        self.set_client_endpoints(client_proxy.as_ref())
    }

    /// The endpoints servers use to accept routed connections.
    pub fn server_endpoints(&self) -> Result<Vec<Endpoint>, RoutingError> {
        if let Some(cached) = self.cached_server_endpoints() {
            return Ok(cached);
        }

        let server_proxy = self
            .router
            .invoker()
            .get_server_proxy(self.router.proxy())?
            .ok_or_else(|| RoutingError::NoEndpoint {
                router: self.router.to_string(),
            })?;
        Ok(self.set_server_endpoints(&server_proxy))
    }

    pub(crate) fn cached_client_endpoints(&self) -> Option<Vec<Endpoint>> {
        let state = self.state();
        (!state.client_endpoints.is_empty()).then(|| state.client_endpoints.clone())
    }

    fn cached_server_endpoints(&self) -> Option<Vec<Endpoint>> {
        let state = self.state();
        (!state.server_endpoints.is_empty()).then(|| state.server_endpoints.clone())
    }

    /// Fill the client cache from the router's answer, unless a concurrent
    /// caller already filled it, and return the cached value.
    pub(crate) fn set_client_endpoints(
        &self,
        client_proxy: Option<&ObjectProxy>,
    ) -> Result<Vec<Endpoint>, RoutingError> {
        let endpoints = match client_proxy {
            // The router accepts client connections directly.
            None => self.router.proxy().endpoints().to_vec(),
            Some(client_proxy) => {
                let client_proxy = client_proxy.without_router();
                // Reuse the timeout of the existing connection to the router so
                // that the client proxy does not open a second connection.
                let client_proxy = match self
                    .router
                    .invoker()
                    .connection_timeout(self.router.proxy())
                {
                    Ok(timeout) => client_proxy.with_timeout(timeout),
                    Err(RoutingError::CollocationOptimization) => client_proxy,
                    Err(err) => return Err(err),
                };
                client_proxy.endpoints().to_vec()
            }
        };

        let mut state = self.state();
        if state.client_endpoints.is_empty() {
            debug!(
                router = %self.router,
                endpoints = endpoints.len(),
                direct = client_proxy.is_none(),
                "Cached client endpoints"
            );
            state.client_endpoints = endpoints;
        }
        Ok(state.client_endpoints.clone())
    }

    fn set_server_endpoints(&self, server_proxy: &ObjectProxy) -> Vec<Endpoint> {
        let endpoints = server_proxy.without_router().endpoints().to_vec();

        let mut state = self.state();
        if state.server_endpoints.is_empty() {
            debug!(
                router = %self.router,
                endpoints = endpoints.len(),
                "Cached server endpoints"
            );
            state.server_endpoints = endpoints;
        }
        state.server_endpoints.clone()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use crate::error::RoutingError;
    use crate::handle::RouterHandle;
    use crate::proxy::{Endpoint, ObjectProxy};
    use crate::session::RouterSession;
    use crate::test_support::ScriptedInvoker;

    const ROUTER: &str = "Glacier2/router:tcp -h gw -p 4063";

    fn session_with(invoker: Arc<ScriptedInvoker>) -> RouterSession {
        RouterSession::new(RouterHandle::new(ObjectProxy::parse(ROUTER).unwrap(), invoker))
    }

    #[test]
    fn test_null_client_proxy_uses_router_endpoints() {
        let session = session_with(Arc::new(ScriptedInvoker::new()));
        let endpoints = session.client_endpoints().unwrap();
        assert_eq!(endpoints, vec![Endpoint::tcp("gw", 4063)]);
    }

    #[test]
    fn test_client_proxy_inherits_connection_timeout() {
        let invoker = Arc::new(
            ScriptedInvoker::new()
                .with_client_proxy("Glacier2/client:tcp -h gw -p 4064 -t 100")
                .with_connection_timeout(Duration::from_secs(7)),
        );
        let session = session_with(invoker);

        let endpoints = session.client_endpoints().unwrap();
        assert_eq!(
            endpoints,
            vec![Endpoint::tcp("gw", 4064).with_timeout(Some(Duration::from_secs(7)))]
        );
    }

    #[test]
    fn test_collocated_router_keeps_client_proxy_timeout() {
        let invoker = Arc::new(
            ScriptedInvoker::new()
                .with_client_proxy("Glacier2/client:tcp -h gw -p 4064 -t 100")
                .collocated(),
        );
        let session = session_with(invoker);

        let endpoints = session.client_endpoints().unwrap();
        assert_eq!(endpoints[0].timeout, Some(Duration::from_millis(100)));
    }

    #[test]
    fn test_client_endpoints_cached() {
        let invoker = Arc::new(
            ScriptedInvoker::new().with_client_proxy("Glacier2/client:tcp -h gw -p 4064"),
        );
        let session = session_with(invoker.clone());

        let first = session.client_endpoints().unwrap();
        let second = session.client_endpoints().unwrap();
        assert_eq!(first, second);
        assert_eq!(invoker.get_client_proxy_count(), 1);
    }

    #[test]
    fn test_routed_client_proxy_is_stripped() {
        let session = session_with(Arc::new(ScriptedInvoker::new()));
        let client = ObjectProxy::parse("Glacier2/client:tcp -h gw -p 4064")
            .unwrap()
            .with_router(Some(ObjectProxy::parse(ROUTER).unwrap()));

        let endpoints = session.set_client_endpoints(Some(&client)).unwrap();
        assert_eq!(endpoints, vec![Endpoint::tcp("gw", 4064)]);
    }

    #[test]
    fn test_first_fill_wins() {
        let session = session_with(Arc::new(ScriptedInvoker::new()));
        let first = ObjectProxy::parse("Glacier2/client:tcp -h a -p 1").unwrap();
        let second = ObjectProxy::parse("Glacier2/client:tcp -h b -p 2").unwrap();

        let filled = session.set_client_endpoints(Some(&first)).unwrap();
        let raced = session.set_client_endpoints(Some(&second)).unwrap();
        assert_eq!(filled, raced);
        assert_eq!(raced, vec![Endpoint::tcp("a", 1)]);
    }

    #[test]
    fn test_concurrent_fill_observes_one_value() {
        let invoker = Arc::new(
            ScriptedInvoker::new().with_client_proxy("Glacier2/client:tcp -h gw -p 4064"),
        );
        let session = session_with(invoker);

        let observed: Vec<Vec<Endpoint>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| session.client_endpoints().unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(observed.windows(2).all(|pair| pair[0] == pair[1]));
        assert_eq!(session.client_endpoints().unwrap(), observed[0]);
    }

    #[test]
    fn test_failed_fill_is_retried() {
        let invoker = Arc::new(
            ScriptedInvoker::new().with_client_proxy("Glacier2/client:tcp -h gw -p 4064"),
        );
        let session = session_with(invoker.clone());

        invoker.fail_next(RoutingError::remote("getClientProxy", "connection refused"));
        assert!(session.client_endpoints().is_err());
        assert!(session.is_empty());

        assert_eq!(
            session.client_endpoints().unwrap(),
            vec![Endpoint::tcp("gw", 4064)]
        );
        assert_eq!(invoker.get_client_proxy_count(), 2);
    }

    #[test]
    fn test_server_endpoints() {
        let invoker = Arc::new(
            ScriptedInvoker::new().with_server_proxy("Glacier2/server:tcp -h gw -p 4065"),
        );
        let session = session_with(invoker.clone());

        assert_eq!(
            session.server_endpoints().unwrap(),
            vec![Endpoint::tcp("gw", 4065)]
        );
        session.server_endpoints().unwrap();
        assert_eq!(
            invoker
                .get_server_proxy_calls
                .load(std::sync::atomic::Ordering::SeqCst),
            1
        );
    }

    #[test]
    fn test_missing_server_proxy_is_no_endpoint() {
        let session = session_with(Arc::new(ScriptedInvoker::new()));
        let err = session.server_endpoints().unwrap_err();
        assert_eq!(
            err,
            RoutingError::NoEndpoint {
                router: ROUTER.to_string()
            }
        );
        assert!(session.is_empty());
    }
}
