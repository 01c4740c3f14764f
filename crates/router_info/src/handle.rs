use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::invoker::RouterInvoker;
use crate::proxy::ObjectProxy;

/// A reference to a remote router service together with the invoker used to
/// call it.
///
/// Equality, ordering and hashing consider the router proxy only.
#[derive(Clone)]
pub struct RouterHandle {
    proxy: ObjectProxy,
    invoker: Arc<dyn RouterInvoker>,
}

impl RouterHandle {
    pub fn new(proxy: ObjectProxy, invoker: Arc<dyn RouterInvoker>) -> Self {
        Self { proxy, invoker }
    }

    pub fn proxy(&self) -> &ObjectProxy {
        &self.proxy
    }

    pub fn invoker(&self) -> &Arc<dyn RouterInvoker> {
        &self.invoker
    }

    /// The same router with any router-of-a-router indirection stripped.
    /// A router can never itself be routed.
    pub fn canonical(&self) -> Self {
        if !self.proxy.is_routed() {
            return self.clone();
        }
        Self {
            proxy: self.proxy.without_router(),
            invoker: Arc::clone(&self.invoker),
        }
    }

    pub fn is_canonical(&self) -> bool {
        !self.proxy.is_routed()
    }
}

impl PartialEq for RouterHandle {
    fn eq(&self, other: &Self) -> bool {
        self.proxy == other.proxy
    }
}

impl Eq for RouterHandle {}

impl PartialOrd for RouterHandle {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RouterHandle {
    fn cmp(&self, other: &Self) -> Ordering {
        self.proxy.cmp(&other.proxy)
    }
}

impl Hash for RouterHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.proxy.hash(state);
    }
}

impl fmt::Debug for RouterHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterHandle")
            .field("proxy", &self.proxy)
            .finish()
    }
}

impl fmt::Display for RouterHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.proxy)
    }
}
