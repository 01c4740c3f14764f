pub mod loopback;

use std::sync::Arc;

use anyhow::Result;
use router_info::{ObjectProxy, RouterHandle};
use tokio::runtime::Handle;

use crate::loopback::{LoopbackInvoker, SimulatedRouter, SimulatedRouterConfig};

pub const DEFAULT_ROUTER_PROXY: &str = "Glacier2/router:tcp -h localhost -p 4063";

/// Stand up a simulated router reachable through a fresh loopback invoker.
/// Returns the handle callers resolve sessions with and the router itself.
pub fn loopback_router(
    runtime: Handle,
    router_proxy: &str,
    config: SimulatedRouterConfig,
) -> Result<(RouterHandle, Arc<SimulatedRouter>)> {
    let proxy = ObjectProxy::parse(router_proxy)?;
    let router = Arc::new(SimulatedRouter::new(proxy.clone(), config));

    let invoker = Arc::new(LoopbackInvoker::new(runtime));
    invoker.register(Arc::clone(&router));

    Ok((RouterHandle::new(proxy, invoker), router))
}
