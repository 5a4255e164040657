//! The per-rank key/value tables (§3, §4.8): `resolved` and `remoteness`
//! want insert-if-absent, lookup, erase semantics with no cross-rank
//! consistency requirement. The pending/counter side of the same interface
//! (§6) is served by [`crate::pending::PendingRegistry`] instead of a
//! generic cache instance, since each entry there also carries its
//! originator and partial results, not just a single value.

use std::collections::HashMap;
use std::hash::Hash;

/// Monotonic map semantics: once a key is written it is never overwritten,
/// matching the fact that `resolved`/`remoteness` entries are write-once
/// per position.
pub trait KeyValueCache<K, V> {
    /// Inserts `value` under `key` only if absent. Returns `true` if the
    /// insert happened, `false` if an entry already existed.
    fn insert_if_absent(&mut self, key: K, value: V) -> bool;

    fn get(&self, key: &K) -> Option<&V>;

    fn contains(&self, key: &K) -> bool;

    fn erase(&mut self, key: &K) -> Option<V>;

    fn len(&self) -> usize;
}

/// The default in-memory cache. Good enough whenever a rank's share of the
/// search space fits in RAM, which every teacher and example fleet here
/// assumes throughout.
pub struct InMemoryCache<K, V> {
    map: HashMap<K, V>,
}

impl<K, V> InMemoryCache<K, V> {
    pub fn new() -> Self {
        InMemoryCache { map: HashMap::new() }
    }
}

impl<K, V> Default for InMemoryCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash, V> KeyValueCache<K, V> for InMemoryCache<K, V> {
    fn insert_if_absent(&mut self, key: K, value: V) -> bool {
        if self.map.contains_key(&key) {
            false
        } else {
            self.map.insert(key, value);
            true
        }
    }

    fn get(&self, key: &K) -> Option<&V> {
        self.map.get(key)
    }

    fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    fn erase(&mut self, key: &K) -> Option<V> {
        self.map.remove(key)
    }

    fn len(&self) -> usize {
        self.map.len()
    }
}

/// Wraps an [`InMemoryCache`] and appends every newly inserted entry to a
/// per-rank log file, behind the `persistent-cache` feature. The log is
/// write-only -- it is never read back during a run, it exists purely as an
/// offline recovery aid after a fleet crash.
#[cfg(feature = "persistent-cache")]
pub struct PersistentCache<K, V> {
    inner: InMemoryCache<K, V>,
    log: std::fs::File,
}

#[cfg(feature = "persistent-cache")]
impl<K, V> PersistentCache<K, V> {
    pub fn open(path: &std::path::Path) -> std::io::Result<Self> {
        let log = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        Ok(PersistentCache {
            inner: InMemoryCache::new(),
            log,
        })
    }
}

#[cfg(feature = "persistent-cache")]
impl<K, V> KeyValueCache<K, V> for PersistentCache<K, V>
where
    K: Eq + Hash + Clone + serde::Serialize,
    V: Clone + serde::Serialize,
{
    fn insert_if_absent(&mut self, key: K, value: V) -> bool {
        let inserted = self.inner.insert_if_absent(key.clone(), value.clone());
        if inserted {
            use std::io::Write;
            if let Ok(line) = serde_json::to_string(&(&key, &value)) {
                if let Err(error) = writeln!(self.log, "{line}") {
                    tracing::warn!(%error, "persistent-cache spill write failed");
                }
            }
        }
        inserted
    }

    fn get(&self, key: &K) -> Option<&V> {
        self.inner.get(key)
    }

    fn contains(&self, key: &K) -> bool {
        self.inner.contains(key)
    }

    fn erase(&mut self, key: &K) -> Option<V> {
        self.inner.erase(key)
    }

    fn len(&self) -> usize {
        self.inner.len()
    }
}

/// Which concrete cache backs one of `Worker`'s `resolved`/`remoteness`
/// tables (§4.12). `Worker` holds this instead of `InMemoryCache` directly
/// so that enabling the `persistent-cache` feature actually changes what
/// runs, not just what compiles.
pub enum PositionCache<V> {
    InMemory(InMemoryCache<u64, V>),
    #[cfg(feature = "persistent-cache")]
    Persistent(PersistentCache<u64, V>),
}

impl<V> PositionCache<V> {
    pub fn in_memory() -> Self {
        PositionCache::InMemory(InMemoryCache::new())
    }
}

#[cfg(feature = "persistent-cache")]
impl<V> PositionCache<V> {
    pub fn persistent(path: &std::path::Path) -> std::io::Result<Self> {
        Ok(PositionCache::Persistent(PersistentCache::open(path)?))
    }
}

impl<V> KeyValueCache<u64, V> for PositionCache<V>
where
    V: Clone + serde::Serialize,
{
    fn insert_if_absent(&mut self, key: u64, value: V) -> bool {
        match self {
            PositionCache::InMemory(c) => c.insert_if_absent(key, value),
            #[cfg(feature = "persistent-cache")]
            PositionCache::Persistent(c) => c.insert_if_absent(key, value),
        }
    }

    fn get(&self, key: &u64) -> Option<&V> {
        match self {
            PositionCache::InMemory(c) => c.get(key),
            #[cfg(feature = "persistent-cache")]
            PositionCache::Persistent(c) => c.get(key),
        }
    }

    fn contains(&self, key: &u64) -> bool {
        match self {
            PositionCache::InMemory(c) => c.contains(key),
            #[cfg(feature = "persistent-cache")]
            PositionCache::Persistent(c) => c.contains(key),
        }
    }

    fn erase(&mut self, key: &u64) -> Option<V> {
        match self {
            PositionCache::InMemory(c) => c.erase(key),
            #[cfg(feature = "persistent-cache")]
            PositionCache::Persistent(c) => c.erase(key),
        }
    }

    fn len(&self) -> usize {
        match self {
            PositionCache::InMemory(c) => c.len(),
            #[cfg(feature = "persistent-cache")]
            PositionCache::Persistent(c) => c.len(),
        }
    }
}
