use thiserror::Error;

/// Errors that can occur while resolving or publishing through a router.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum RoutingError {
    /// The router does not publish a server proxy, so no endpoint exists for
    /// accepting server-side connections through it.
    #[error("no server endpoints available through router '{router}'")]
    NoEndpoint { router: String },

    /// The call ran as a direct in-process substitute and cannot cross a
    /// network boundary.
    #[error("call executed in-process and cannot cross a connection")]
    CollocationOptimization,

    /// The invoker does not know the addressed router object.
    #[error("router object '{identity}' does not exist")]
    ObjectNotExist { identity: String },

    /// Any other failure reported by the remote call.
    #[error("remote call '{operation}' failed: {reason}")]
    Remote {
        operation: &'static str,
        reason: String,
    },

    /// The invoker dropped a completion without invoking it.
    #[error("completion dropped before a result was delivered")]
    CompletionDropped,
}

impl RoutingError {
    pub fn remote(operation: &'static str, reason: impl Into<String>) -> Self {
        RoutingError::Remote {
            operation,
            reason: reason.into(),
        }
    }

    /// Whether this is the recoverable in-process substitution condition.
    pub fn is_collocation(&self) -> bool {
        matches!(self, RoutingError::CollocationOptimization)
    }
}

/// Errors that can occur while parsing stringified identities, endpoints or proxies.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ProxyParseError {
    #[error("invalid identity: '{0}'")]
    Identity(String),

    #[error("invalid endpoint: {0}")]
    Endpoint(String),

    #[error("invalid proxy: {0}")]
    Proxy(String),
}
