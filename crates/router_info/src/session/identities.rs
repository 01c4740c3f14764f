use std::collections::{HashMap, HashSet};

use crate::proxy::Identity;

/// Local mirror of the identities published through one router.
///
/// `pending_evictions` is a multiset of identities the router reported evicted
/// before the publish result that registered them was applied here. A later
/// publish result for such an identity consumes one occurrence instead of
/// registering it.
#[derive(Debug, Default)]
pub(crate) struct IdentityMirror {
    registered: HashSet<Identity, ahash::RandomState>,
    pending_evictions: HashMap<Identity, usize, ahash::RandomState>,
}

/// What a single reconciliation step did, for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Reconciled {
    pub registered: bool,
    pub consumed: bool,
    pub removed: usize,
    pub buffered: usize,
}

impl IdentityMirror {
    pub fn contains(&self, identity: &Identity) -> bool {
        self.registered.contains(identity)
    }

    pub fn remove(&mut self, identity: &Identity) -> bool {
        self.registered.remove(identity)
    }

    pub fn clear(&mut self) {
        self.registered.clear();
        self.pending_evictions.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.registered.is_empty() && self.pending_evictions.is_empty()
    }

    pub fn registered(&self) -> impl Iterator<Item = &Identity> {
        self.registered.iter()
    }

    pub fn pending(&self, identity: &Identity) -> usize {
        self.pending_evictions.get(identity).copied().unwrap_or(0)
    }

    /// Apply the result of one publish call: `added` was published and the
    /// router evicted `evicted` as a side effect.
    pub fn reconcile<'a>(
        &mut self,
        added: Option<&Identity>,
        evicted: impl IntoIterator<Item = &'a Identity>,
    ) -> Reconciled {
        let mut outcome = Reconciled::default();

        if let Some(identity) = added {
            if self.consume_pending(identity) {
                outcome.consumed = true;
            } else {
                self.registered.insert(identity.clone());
                outcome.registered = true;
            }
        }

        for identity in evicted {
            if self.registered.remove(identity) {
                outcome.removed += 1;
            } else {
                // The publish that registers it has not been applied yet.
                *self.pending_evictions.entry(identity.clone()).or_insert(0) += 1;
                outcome.buffered += 1;
            }
        }

        outcome
    }

    fn consume_pending(&mut self, identity: &Identity) -> bool {
        match self.pending_evictions.get_mut(identity) {
            Some(count) => {
                *count -= 1;
                if *count == 0 {
                    self.pending_evictions.remove(identity);
                }
                true
            }
            None => false,
        }
    }
}
