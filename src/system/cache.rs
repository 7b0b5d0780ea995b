use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use super::capability::ProcessIdentity;
use crate::error::Result;

/// Holds one value that stays valid for `ttl` after it was loaded.
///
/// Failed loads are not cached; the next call tries again.
#[derive(Debug)]
pub struct TtlCache<T> {
    ttl: Duration,
    entry: Mutex<Option<(Instant, T)>>,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entry: Mutex::new(None),
        }
    }

    pub fn get_or_refresh(&self, load: impl FnOnce() -> Result<T>) -> Result<T> {
        self.get_or_refresh_at(Instant::now(), load)
    }

    pub fn get_or_refresh_at(&self, now: Instant, load: impl FnOnce() -> Result<T>) -> Result<T> {
        let mut entry = self.entry.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((loaded_at, value)) = entry.as_ref()
            && now.saturating_duration_since(*loaded_at) < self.ttl
        {
            return Ok(value.clone());
        }
        let value = load()?;
        *entry = Some((now, value.clone()));
        Ok(value)
    }
}

/// Name/path per pid. Identity never changes for a live process, so an
/// entry stays until its pid disappears from enumeration or the pid is
/// reused by a process with a different start time.
#[derive(Debug, Default)]
pub struct IdentityCache {
    entries: HashMap<u32, CachedIdentity>,
}

#[derive(Debug)]
struct CachedIdentity {
    started: Option<u64>,
    identity: ProcessIdentity,
}

impl IdentityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached identity of `pid`, loading it when absent or when `started`
    /// differs from the start time it was cached under.
    pub fn get_or_try_insert(
        &mut self,
        pid: u32,
        started: Option<u64>,
        load: impl FnOnce() -> Result<ProcessIdentity>,
    ) -> Result<&ProcessIdentity> {
        use std::collections::hash_map::Entry;
        match self.entries.entry(pid) {
            Entry::Occupied(e) if e.get().started == started => Ok(&e.into_mut().identity),
            Entry::Occupied(mut e) => {
                // recycled pid: drop the old identity even if the reload fails
                let identity = match load() {
                    Ok(identity) => identity,
                    Err(err) => {
                        e.remove();
                        return Err(err);
                    }
                };
                *e.get_mut() = CachedIdentity { started, identity };
                Ok(&e.into_mut().identity)
            }
            Entry::Vacant(e) => Ok(&e
                .insert(CachedIdentity {
                    started,
                    identity: load()?,
                })
                .identity),
        }
    }

    pub fn get(&self, pid: u32) -> Option<&ProcessIdentity> {
        self.entries.get(&pid).map(|cached| &cached.identity)
    }

    /// Drop entries for pids missing from the latest enumeration.
    pub fn retain_alive(&mut self, alive: &HashSet<u32>) {
        self.entries.retain(|pid, _| alive.contains(pid));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
