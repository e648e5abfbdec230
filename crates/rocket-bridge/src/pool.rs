//! Resource pools
//!
//! A pool owns every native object one domain module has created, so the
//! whole set can be torn down when the session ends. Entries are kept in
//! creation order. Teardown always goes through the entry's cell, which makes
//! every release path idempotent.

use crate::cell::{Finalizer, NativeRef};

/// Ordered collection of owning native cells.
pub struct ResourcePool<T: 'static> {
    name: String,
    entries: Vec<NativeRef<T>>,
    teardown: Finalizer<T>,
}

impl<T: 'static> ResourcePool<T> {
    /// Create an empty pool whose entries are destroyed with `teardown`.
    pub fn new(name: impl Into<String>, teardown: Finalizer<T>) -> Self {
        ResourcePool {
            name: name.into(),
            entries: Vec::new(),
            teardown,
        }
    }

    /// Pool name used in diagnostics
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wrap `value` with the pool's teardown and track it.
    pub fn track(&mut self, value: T) -> NativeRef<T> {
        let native = NativeRef::with_finalizer(value, self.teardown.clone());
        self.entries.push(native.clone());
        tracing::debug!(pool = %self.name, tracked = self.entries.len(), "tracked native object");
        native
    }

    /// Track an existing cell. Returns `false` if it was already tracked.
    pub fn adopt(&mut self, native: NativeRef<T>) -> bool {
        if self.contains(&native) {
            return false;
        }
        self.entries.push(native);
        true
    }

    /// Tear down `native` and stop tracking it.
    ///
    /// Returns `true` only when this call destroyed the object. Untracked or
    /// already released cells are left alone.
    pub fn release(&mut self, native: &NativeRef<T>) -> bool {
        let Some(index) = self.entries.iter().position(|entry| entry.ptr_eq(native)) else {
            tracing::trace!(pool = %self.name, "release of untracked object ignored");
            return false;
        };
        let entry = self.entries.remove(index);
        let destroyed = entry.destroy();
        tracing::debug!(pool = %self.name, destroyed, "released native object");
        destroyed
    }

    /// Tear down every tracked object and empty the pool.
    ///
    /// Returns how many objects were actually destroyed.
    pub fn release_all(&mut self) -> usize {
        let destroyed = self
            .entries
            .drain(..)
            .filter(|entry| entry.destroy())
            .count();
        if destroyed > 0 {
            tracing::debug!(pool = %self.name, destroyed, "released all native objects");
        }
        destroyed
    }

    /// Check whether `native` is tracked
    pub fn contains(&self, native: &NativeRef<T>) -> bool {
        self.entries.iter().any(|entry| entry.ptr_eq(native))
    }

    /// Number of tracked objects
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing is tracked
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: 'static> Drop for ResourcePool<T> {
    fn drop(&mut self) {
        self.release_all();
    }
}

impl<T: 'static> std::fmt::Debug for ResourcePool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourcePool")
            .field("name", &self.name)
            .field("len", &self.entries.len())
            .finish()
    }
}
