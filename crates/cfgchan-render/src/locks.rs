//! ---
//! cc_section: "04-channel-rendering"
//! cc_subsection: "module"
//! cc_type: "source"
//! cc_scope: "code"
//! cc_description: "Channel rendering engine and state manifest writer."
//! cc_version: "v0.0.0-prealpha"
//! cc_owner: "tbd"
//! ---
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::{ArcMutexGuard, Mutex, RawMutex};
use path_absolutize::Absolutize;

type Table = Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>;

static PROCESS_LOCKS: Lazy<NamespaceLocks> = Lazy::new(NamespaceLocks::new);

/// Registry of per-namespace mutexes, keyed by absolute namespace path.
///
/// Entries exist only while a namespace is held or awaited, so the table is
/// bounded by the number of concurrent renders rather than by every namespace
/// ever touched.
#[derive(Debug, Clone, Default)]
pub struct NamespaceLocks {
    inner: Arc<Table>,
}

impl NamespaceLocks {
    /// A private registry, independent of [`NamespaceLocks::process`].
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry shared by every renderer in this process.
    pub fn process() -> Self {
        PROCESS_LOCKS.clone()
    }

    /// Block until `namespace` is free; it stays held until the guard drops.
    pub fn lock(&self, namespace: &Path) -> NamespaceGuard {
        let (key, mutex) = self.entry(namespace);
        let guard = mutex.lock_arc();
        drop(mutex);
        NamespaceGuard {
            table: Arc::clone(&self.inner),
            key,
            guard: Some(guard),
        }
    }

    /// Take `namespace` only if nobody holds it.
    pub fn try_lock(&self, namespace: &Path) -> Option<NamespaceGuard> {
        let (key, mutex) = self.entry(namespace);
        let guard = mutex.try_lock_arc();
        drop(mutex);
        match guard {
            Some(guard) => Some(NamespaceGuard {
                table: Arc::clone(&self.inner),
                key,
                guard: Some(guard),
            }),
            None => {
                evict_idle(&self.inner, &key);
                None
            }
        }
    }

    /// Number of namespaces currently held or awaited.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    fn entry(&self, namespace: &Path) -> (PathBuf, Arc<Mutex<()>>) {
        // Without a working directory, key on the path as given.
        let key = namespace
            .absolutize()
            .map(|absolute| absolute.into_owned())
            .unwrap_or_else(|_| namespace.to_path_buf());
        let mutex = Arc::clone(self.inner.lock().entry(key.clone()).or_default());
        (key, mutex)
    }
}

/// Exclusive hold on one namespace.
pub struct NamespaceGuard {
    table: Arc<Table>,
    key: PathBuf,
    guard: Option<ArcMutexGuard<RawMutex, ()>>,
}

impl NamespaceGuard {
    /// Absolute namespace path this guard holds.
    pub fn namespace(&self) -> &Path {
        &self.key
    }
}

impl Drop for NamespaceGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        evict_idle(&self.table, &self.key);
    }
}

impl fmt::Debug for NamespaceGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamespaceGuard")
            .field("namespace", &self.key)
            .finish()
    }
}

// Handles are only cloned under the table lock, so a count of one here means
// nobody holds or waits for the namespace.
fn evict_idle(table: &Table, key: &Path) {
    let mut table = table.lock();
    if table
        .get(key)
        .is_some_and(|mutex| Arc::strong_count(mutex) == 1)
    {
        table.remove(key);
    }
}
