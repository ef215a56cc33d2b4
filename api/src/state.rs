//! The normalized per-kind store.

use crate::Resource;
use crate::action::Operation;
use crate::error::ApiError;
use crate::name::ResourceName;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Instances of one kind keyed by name, in display order.
pub type ResourceCollection<T> = IndexMap<ResourceName, T>;

/// In-flight flag per operation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct LoadingFlags {
    /// LIST in flight
    pub list: bool,
    /// GET in flight
    pub get: bool,
    /// CREATE in flight
    pub create: bool,
    /// UPDATE in flight
    pub update: bool,
    /// DESTROY in flight
    pub destroy: bool,
}

impl LoadingFlags {
    /// The flag of `operation`.
    #[must_use]
    pub const fn get(&self, operation: Operation) -> bool {
        match operation {
            Operation::List => self.list,
            Operation::Get => self.get,
            Operation::Create => self.create,
            Operation::Update => self.update,
            Operation::Destroy => self.destroy,
        }
    }

    /// Set the flag of `operation`.
    pub const fn set(&mut self, operation: Operation, loading: bool) {
        match operation {
            Operation::List => self.list = loading,
            Operation::Get => self.get = loading,
            Operation::Create => self.create = loading,
            Operation::Update => self.update = loading,
            Operation::Destroy => self.destroy = loading,
        }
    }

    /// Whether any operation is in flight.
    #[must_use]
    pub const fn any(&self) -> bool {
        self.list || self.get || self.create || self.update || self.destroy
    }
}

/// State of one resource slice.
///
/// `by_name` sits behind an [`Arc`]: a transition that does not change the
/// collection keeps the same allocation, so consumers can detect "nothing
/// changed" with [`Arc::ptr_eq`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceState<T> {
    /// Instances keyed by name
    pub by_name: Arc<ResourceCollection<T>>,
    /// Operations in flight
    pub loading: LoadingFlags,
    /// Error of the most recent failed operation
    pub last_error: Option<ApiError>,
}

impl<T> Default for ResourceState<T> {
    fn default() -> Self {
        Self {
            by_name: Arc::new(IndexMap::new()),
            loading: LoadingFlags::default(),
            last_error: None,
        }
    }
}

impl<T: Resource> ResourceState<T> {
    /// A state holding `items` in order, as after a successful LIST.
    #[must_use]
    pub fn from_items(items: impl IntoIterator<Item = T>) -> Self {
        let mut state = Self::default();
        state.replace_all(items);
        state
    }

    /// Replace the whole collection. Returns whether anything changed.
    ///
    /// Instances without a name are skipped. When the same name appears twice
    /// the later instance wins and keeps the earlier position.
    pub(crate) fn replace_all(&mut self, items: impl IntoIterator<Item = T>) -> bool {
        let mut collection = IndexMap::new();
        for item in items {
            if item.name().is_unset() {
                tracing::warn!(kind = %T::KIND, "Dropping listed instance without a name");
                continue;
            }
            collection.insert(item.name().clone(), item);
        }

        // IndexMap equality ignores order, compare entries pairwise instead.
        if self.by_name.len() == collection.len() && self.by_name.iter().eq(collection.iter()) {
            return false;
        }
        self.by_name = Arc::new(collection);
        true
    }

    /// Insert or replace by name. Returns whether anything changed.
    pub(crate) fn upsert(&mut self, item: T) -> bool {
        if item.name().is_unset() {
            tracing::warn!(kind = %T::KIND, "Ignoring instance without a name");
            return false;
        }
        if self.by_name.get(item.name()) == Some(&item) {
            return false;
        }
        Arc::make_mut(&mut self.by_name).insert(item.name().clone(), item);
        true
    }

    /// Replace the instance stored under `previous` with `item`.
    ///
    /// If the name changed, the old key is removed and the new key takes its
    /// position. Falls back to [`upsert`](Self::upsert) when `previous` is
    /// not stored.
    pub(crate) fn rename(&mut self, previous: &ResourceName, item: T) -> bool {
        if previous == item.name() || !self.by_name.contains_key(previous) {
            return self.upsert(item);
        }
        if item.name().is_unset() {
            return false;
        }

        let collection = Arc::make_mut(&mut self.by_name);
        collection.shift_remove(item.name());
        let Some(index) = collection.get_index_of(previous) else {
            return false;
        };
        collection.shift_remove(previous);
        collection.shift_insert(index, item.name().clone(), item);
        true
    }

    /// Remove by name. Returns whether anything changed.
    pub(crate) fn remove(&mut self, name: &ResourceName) -> bool {
        if !self.by_name.contains_key(name) {
            return false;
        }
        Arc::make_mut(&mut self.by_name).shift_remove(name);
        true
    }
}
