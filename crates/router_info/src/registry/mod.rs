//! The process-wide table of router sessions.

mod config;

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info};

use crate::handle::RouterHandle;
use crate::session::RouterSession;

pub use config::RouterRegistryConfig;

#[derive(Default)]
struct RegistryTable {
    sessions: HashMap<RouterHandle, Arc<RouterSession>, ahash::RandomState>,
    /// The most recently resolved entry.
    hint: Option<Arc<RouterSession>>,
}

/// Tracks one [`RouterSession`] per canonical router.
///
/// Sessions are created on first lookup. Lookups, removal and teardown are
/// purely local bookkeeping and never call the router.
pub struct RouterRegistry {
    table: Mutex<RegistryTable>,
    config: RouterRegistryConfig,
}

impl RouterRegistry {
    pub fn new(config: RouterRegistryConfig) -> Self {
        Self {
            table: Mutex::new(RegistryTable::default()),
            config,
        }
    }

    fn table(&self) -> MutexGuard<'_, RegistryTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get the session for `router`, creating it if absent. A missing router
    /// yields no session.
    pub fn get(&self, router: Option<&RouterHandle>) -> Option<Arc<RouterSession>> {
        router.map(|router| self.session(router))
    }

    /// Get the session for `router`, creating it if absent.
    ///
    /// Any routing on `router` is stripped first; a router is never routed.
    pub fn session(&self, router: &RouterHandle) -> Arc<RouterSession> {
        let router = router.canonical();
        let mut table = self.table();

        if let Some(hint) = table
            .hint
            .as_ref()
            .filter(|hint| self.config.access_hint && hint.router() == &router)
        {
            return Arc::clone(hint);
        }

        let session = match table.sessions.entry(router) {
            Entry::Occupied(entry) => Arc::clone(entry.get()),
            Entry::Vacant(slot) => {
                debug!(router = %slot.key(), "Created router session");
                let session = Arc::new(RouterSession::new(slot.key().clone()));
                slot.insert(Arc::clone(&session));
                session
            }
        };

        if self.config.access_hint {
            table.hint = Some(Arc::clone(&session));
        }
        session
    }

    /// Remove and return the session for `router`, if present.
    ///
    /// The removed session keeps working for holders of its handle; only
    /// future lookups are affected.
    pub fn erase(&self, router: Option<&RouterHandle>) -> Option<Arc<RouterSession>> {
        let router = router?.canonical();
        let mut table = self.table();

        if table
            .hint
            .as_ref()
            .is_some_and(|hint| hint.router() == &router)
        {
            table.hint = None;
        }

        let removed = table.sessions.remove(&router);
        if removed.is_some() {
            debug!(router = %router, "Removed router session");
        }
        removed
    }

    /// Tear down every session and empty the table. No router is contacted.
    pub fn teardown(&self) {
        let mut table = self.table();

        for session in table.sessions.values() {
            session.teardown();
        }

        let retired = table.sessions.len();
        table.sessions.clear();
        table.hint = None;

        info!(sessions = retired, "Router registry torn down");
    }

    /// Check if a session exists for `router`.
    pub fn contains(&self, router: &RouterHandle) -> bool {
        self.table().sessions.contains_key(&router.canonical())
    }

    /// Get the number of router sessions.
    pub fn len(&self) -> usize {
        self.table().sessions.len()
    }

    /// Check if there are no router sessions.
    pub fn is_empty(&self) -> bool {
        self.table().sessions.is_empty()
    }
}

impl Default for RouterRegistry {
    fn default() -> Self {
        Self::new(RouterRegistryConfig::default())
    }
}
