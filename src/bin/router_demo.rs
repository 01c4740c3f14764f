use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use futures::future::join_all;
use routed_rpc::loopback::{DEFAULT_ROUTING_TABLE_SIZE, SimulatedRouterConfig};
use routed_rpc::{DEFAULT_ROUTER_PROXY, loopback_router};
use router_info::{Endpoint, Identity, ObjectProxy, RouterRegistry};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// Number of callback proxies published concurrently.
const CALLBACK_COUNT: usize = 16;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let router_proxy =
        std::env::var("ROUTER_PROXY").unwrap_or_else(|_| DEFAULT_ROUTER_PROXY.to_string());
    let table_size = match std::env::var("ROUTING_TABLE_SIZE") {
        Ok(size) => NonZeroUsize::new(size.parse().context("ROUTING_TABLE_SIZE must be a number")?)
            .context("ROUTING_TABLE_SIZE must be non-zero")?,
        Err(_) => DEFAULT_ROUTING_TABLE_SIZE,
    };

    let config = SimulatedRouterConfig::new()
        .with_client_endpoints(vec![Endpoint::tcp("localhost", 4064)])
        .with_server_endpoints(vec![Endpoint::tcp("localhost", 4065)])
        .with_routing_table_size(table_size)
        .with_connection_timeout(Duration::from_secs(30));
    let (handle, router) = loopback_router(tokio::runtime::Handle::current(), &router_proxy, config)?;

    let registry = RouterRegistry::default();
    let session = registry.session(&handle);

    info!(router = %handle, "Resolving endpoints");
    let client_endpoints = session.fetch_client_endpoints().await?;
    let server_endpoints = session.server_endpoints()?;
    for endpoint in &client_endpoints {
        info!(endpoint = %endpoint, "Client endpoint");
    }
    for endpoint in &server_endpoints {
        info!(endpoint = %endpoint, "Server endpoint");
    }

    let callbacks: Vec<ObjectProxy> = (0..CALLBACK_COUNT)
        .map(|_| {
            ObjectProxy::new(
                Identity::new(Uuid::new_v4().to_string()).with_category("callback"),
                server_endpoints.clone(),
            )
        })
        .collect();

    let results = join_all(
        callbacks
            .iter()
            .cloned()
            .map(|proxy| {
                let session = Arc::clone(&session);
                async move { session.register_proxy(proxy).await }
            }),
    )
    .await;
    results.into_iter().collect::<Result<Vec<_>, _>>()?;

    info!(
        published = router.published().len(),
        registered = session.registered_identities().len(),
        publish_calls = router.calls().add_proxies(),
        "Published callback proxies"
    );

    registry.teardown();
    info!("Router registry shut down");
    Ok(())
}
