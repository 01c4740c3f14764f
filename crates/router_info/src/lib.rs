//! Routing metadata for RPC clients and servers reached through a router.
//!
//! The [`RouterRegistry`] keeps one [`RouterSession`] per router. A session
//! caches the endpoints clients and servers use to reach each other through
//! the router, owns the adapter associated with it, and mirrors which object
//! identities are currently published through it.
//!
//! Remote calls go through a [`RouterInvoker`] supplied by the RPC runtime.
//!
//! # Example
//!
//! ```ignore
//! use router_info::{ObjectProxy, RouterHandle, RouterRegistry};
//!
//! let registry = RouterRegistry::default();
//! let router = RouterHandle::new(ObjectProxy::parse("Glacier2/router:tcp -h gw -p 4063")?, invoker);
//!
//! let session = registry.session(&router);
//! let endpoints = session.client_endpoints()?;
//! session.add_proxy(&callback_proxy)?;
//! ```

pub mod error;
pub mod handle;
pub mod invoker;
pub mod proxy;
pub mod registry;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{ProxyParseError, RoutingError};
pub use handle::RouterHandle;
pub use invoker::{Completion, ObjectAdapter, RouterInvoker};
pub use proxy::{Endpoint, Identity, ObjectProxy};
pub use registry::{RouterRegistry, RouterRegistryConfig};
pub use session::{AddProxy, RouterSession};
