use std::num::NonZeroUsize;
use std::time::Duration;

use router_info::Endpoint;

/// Default number of proxies a simulated router keeps published.
pub const DEFAULT_ROUTING_TABLE_SIZE: NonZeroUsize = match NonZeroUsize::new(1000) {
    Some(size) => size,
    None => unreachable!(),
};

/// Configuration for a simulated router.
#[derive(Debug, Clone)]
pub struct SimulatedRouterConfig {
    /// Endpoints of the client-facing proxy.
    /// `None` means clients connect to the router's own endpoints.
    pub client_endpoints: Option<Vec<Endpoint>>,

    /// Endpoints of the server-facing proxy.
    /// `None` means the router does not accept server connections.
    pub server_endpoints: Option<Vec<Endpoint>>,

    /// Maximum number of published proxies before the least recently
    /// published one is evicted.
    pub routing_table_size: NonZeroUsize,

    /// Timeout of the connection callers hold to the router.
    pub connection_timeout: Option<Duration>,

    /// The router lives in this process: asynchronous calls and connection
    /// acquisition report in-process substitution.
    pub collocated: bool,
}

impl Default for SimulatedRouterConfig {
    fn default() -> Self {
        Self {
            client_endpoints: None,
            server_endpoints: None,
            routing_table_size: DEFAULT_ROUTING_TABLE_SIZE,
            connection_timeout: None,
            collocated: false,
        }
    }
}

impl SimulatedRouterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the client-facing proxy endpoints.
    pub fn with_client_endpoints(mut self, endpoints: Vec<Endpoint>) -> Self {
        self.client_endpoints = Some(endpoints);
        self
    }

    /// Set the server-facing proxy endpoints.
    pub fn with_server_endpoints(mut self, endpoints: Vec<Endpoint>) -> Self {
        self.server_endpoints = Some(endpoints);
        self
    }

    /// Set the routing table size.
    pub fn with_routing_table_size(mut self, size: NonZeroUsize) -> Self {
        self.routing_table_size = size;
        self
    }

    /// Set the connection timeout.
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = Some(timeout);
        self
    }

    /// Mark the router as collocated.
    pub fn collocated(mut self) -> Self {
        self.collocated = true;
        self
    }
}
