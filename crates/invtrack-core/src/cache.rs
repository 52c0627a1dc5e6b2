use dashmap::{DashMap, DashSet};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use invtrack_models::invite::InviteSnapshot;

/// In-memory index: invite code -> last observed snapshot.
/// Filled by the loader and kept in sync by invite create/delete dispatches.
/// Codes are globally unique, so guilds share one map.
pub struct InviteCache {
    invites: DashMap<String, InviteSnapshot>,
    /// Codes deleted while a load was fetching. A fetch that started before
    /// the delete may still list them, so loads skip these codes.
    tombstones: DashSet<String>,
    loads_in_flight: AtomicUsize,
}

impl InviteCache {
    pub fn empty() -> Self {
        InviteCache {
            invites: DashMap::new(),
            tombstones: DashSet::new(),
            loads_in_flight: AtomicUsize::new(0),
        }
    }

    /// Insert or overwrite by code; returns the entry that was replaced.
    /// An explicit insert re-admits a code deleted during a running load.
    pub fn upsert(&self, snapshot: InviteSnapshot) -> Option<InviteSnapshot> {
        self.tombstones.remove(&snapshot.code);
        self.invites.insert(snapshot.code.clone(), snapshot)
    }

    pub fn remove(&self, code: &str) -> Option<InviteSnapshot> {
        if self.loads_in_flight.load(Ordering::SeqCst) > 0 {
            self.tombstones.insert(code.to_string());
        }
        self.invites.remove(code).map(|(_, snapshot)| snapshot)
    }

    /// Store a snapshot returned by a bulk fetch. Returns `false` when the
    /// code was deleted after the fetch began.
    pub fn restore(&self, snapshot: InviteSnapshot) -> bool {
        if self.tombstones.contains(&snapshot.code) {
            return false;
        }
        self.invites.insert(snapshot.code.clone(), snapshot);
        true
    }

    /// Mark a load as running until the returned guard drops. Deletes seen
    /// meanwhile are remembered so the load cannot bring them back.
    pub fn begin_load(&self) -> LoadGuard<'_> {
        self.loads_in_flight.fetch_add(1, Ordering::SeqCst);
        LoadGuard { cache: self }
    }

    /// Cached use counter for `code`, if the code is known.
    pub fn uses(&self, code: &str) -> Option<u32> {
        self.invites.get(code).map(|entry| entry.uses)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.invites.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.invites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.invites.is_empty()
    }

    pub fn guild_invites(&self, guild_id: i64) -> Vec<InviteSnapshot> {
        self.invites
            .iter()
            .filter(|entry| entry.guild_id == guild_id)
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Point-in-time copy of the whole cache.
    pub fn snapshot(&self) -> HashMap<String, InviteSnapshot> {
        self.invites
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }
}

impl Default for InviteCache {
    fn default() -> Self {
        Self::empty()
    }
}

pub struct LoadGuard<'a> {
    cache: &'a InviteCache,
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        if self.cache.loads_in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.cache.tombstones.clear();
        }
    }
}
