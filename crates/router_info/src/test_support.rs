//! A scripted router invoker for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::error::RoutingError;
use crate::invoker::{Completion, ObjectAdapter, RouterInvoker};
use crate::proxy::{Identity, ObjectProxy};

#[derive(Default)]
pub(crate) struct ScriptedInvoker {
    client_proxy: Option<ObjectProxy>,
    server_proxy: Option<ObjectProxy>,
    connection_timeout: Option<Duration>,
    collocated: bool,
    evictions: Mutex<VecDeque<Vec<ObjectProxy>>>,
    failures: Mutex<VecDeque<RoutingError>>,
    pub get_client_proxy_calls: AtomicUsize,
    pub get_server_proxy_calls: AtomicUsize,
    pub add_proxies_calls: AtomicUsize,
}

impl ScriptedInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client_proxy(mut self, proxy: &str) -> Self {
        self.client_proxy = Some(ObjectProxy::parse(proxy).unwrap());
        self
    }

    pub fn with_server_proxy(mut self, proxy: &str) -> Self {
        self.server_proxy = Some(ObjectProxy::parse(proxy).unwrap());
        self
    }

    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = Some(timeout);
        self
    }

    /// Asynchronous calls and connection acquisition report in-process substitution.
    pub fn collocated(mut self) -> Self {
        self.collocated = true;
        self
    }

    /// Script the evicted set returned by the next unscripted `add_proxies` call.
    pub fn push_evictions(&self, evicted: Vec<ObjectProxy>) {
        self.evictions.lock().unwrap().push_back(evicted);
    }

    /// Make the next call of any kind fail with `err`.
    pub fn fail_next(&self, err: RoutingError) {
        self.failures.lock().unwrap().push_back(err);
    }

    pub fn add_proxies_count(&self) -> usize {
        self.add_proxies_calls.load(Ordering::SeqCst)
    }

    pub fn get_client_proxy_count(&self) -> usize {
        self.get_client_proxy_calls.load(Ordering::SeqCst)
    }

    fn take_failure(&self) -> Result<(), RoutingError> {
        match self.failures.lock().unwrap().pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl RouterInvoker for ScriptedInvoker {
    fn get_client_proxy(&self, _router: &ObjectProxy) -> Result<Option<ObjectProxy>, RoutingError> {
        self.get_client_proxy_calls.fetch_add(1, Ordering::SeqCst);
        self.take_failure()?;
        Ok(self.client_proxy.clone())
    }

    fn get_client_proxy_async(
        &self,
        router: &ObjectProxy,
        completion: Completion<Option<ObjectProxy>>,
    ) {
        let result = if self.collocated {
            Err(RoutingError::CollocationOptimization)
        } else {
            self.get_client_proxy(router)
        };
        std::thread::spawn(move || completion(result));
    }

    fn get_server_proxy(&self, _router: &ObjectProxy) -> Result<Option<ObjectProxy>, RoutingError> {
        self.get_server_proxy_calls.fetch_add(1, Ordering::SeqCst);
        self.take_failure()?;
        Ok(self.server_proxy.clone())
    }

    fn add_proxies(
        &self,
        _router: &ObjectProxy,
        _proxies: &[ObjectProxy],
    ) -> Result<Vec<ObjectProxy>, RoutingError> {
        self.add_proxies_calls.fetch_add(1, Ordering::SeqCst);
        self.take_failure()?;
        Ok(self.evictions.lock().unwrap().pop_front().unwrap_or_default())
    }

    fn add_proxies_async(
        &self,
        router: &ObjectProxy,
        proxies: Vec<ObjectProxy>,
        completion: Completion<Vec<ObjectProxy>>,
    ) {
        let result = if self.collocated {
            Err(RoutingError::CollocationOptimization)
        } else {
            self.add_proxies(router, &proxies)
        };
        std::thread::spawn(move || completion(result));
    }

    fn connection_timeout(&self, _router: &ObjectProxy) -> Result<Option<Duration>, RoutingError> {
        if self.collocated {
            return Err(RoutingError::CollocationOptimization);
        }
        Ok(self.connection_timeout)
    }
}

#[derive(Debug)]
pub(crate) struct NamedAdapter(pub &'static str);

impl ObjectAdapter for NamedAdapter {
    fn name(&self) -> &str {
        self.0
    }
}

pub(crate) fn proxy(identity: &str) -> ObjectProxy {
    ObjectProxy::new(Identity::parse(identity).unwrap(), Vec::new())
}

pub(crate) fn identity(identity: &str) -> Identity {
    Identity::parse(identity).unwrap()
}
