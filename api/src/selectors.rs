//! Pure derived-state queries over a [`ResourceState`].
//!
//! Every selector receives the state explicitly and is safe on a default,
//! never-touched state.

use crate::Resource;
use crate::action::Operation;
use crate::error::ApiError;
use crate::state::{ResourceCollection, ResourceState};
use std::marker::PhantomData;
use std::sync::Arc;

/// The whole collection in display order.
///
/// Returns the stored [`Arc`]: two calls between which the collection did not
/// change return pointer-equal values.
#[must_use]
pub fn get_all<T>(state: &ResourceState<T>) -> Arc<ResourceCollection<T>> {
    Arc::clone(&state.by_name)
}

/// Number of stored instances.
#[must_use]
pub fn count_all<T>(state: &ResourceState<T>) -> usize {
    state.by_name.len()
}

/// The instance stored under `name`.
#[must_use]
pub fn get_by_name<'a, T>(state: &'a ResourceState<T>, name: &str) -> Option<&'a T> {
    state.by_name.get(name)
}

/// The instance addressed by the leading segments of `url`.
///
/// `None` when the URL does not address this kind or the instance is not
/// loaded.
#[must_use]
pub fn get_for_url<'a, T: Resource>(state: &'a ResourceState<T>, url: &str) -> Option<&'a T> {
    let name = T::KIND.name_pattern().match_prefix(url)?;
    state.by_name.get(&name)
}

/// Instances whose parent is `parent`, in display order.
#[must_use]
pub fn get_for_parent<'a, T: Resource>(state: &'a ResourceState<T>, parent: &str) -> Vec<&'a T> {
    state
        .by_name
        .values()
        .filter(|item| item.parent().is_some_and(|name| name.as_str() == parent))
        .collect()
}

/// Whether `operation` is in flight.
#[must_use]
pub const fn is_loading<T>(state: &ResourceState<T>, operation: Operation) -> bool {
    state.loading.get(operation)
}

/// Error of the most recent failed operation.
#[must_use]
pub const fn last_error<T>(state: &ResourceState<T>) -> Option<&ApiError> {
    state.last_error.as_ref()
}

/// The selectors of one resource type, bundled for [`ResourceModule`](crate::module::ResourceModule).
pub struct Selectors<T> {
    _resource: PhantomData<fn() -> T>,
}

impl<T> Clone for Selectors<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Selectors<T> {}

impl<T> std::fmt::Debug for Selectors<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Selectors")
    }
}

impl<T: Resource> Default for Selectors<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(missing_docs, clippy::unused_self)]
impl<T: Resource> Selectors<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _resource: PhantomData,
        }
    }

    #[must_use]
    pub fn get_all(&self, state: &ResourceState<T>) -> Arc<ResourceCollection<T>> {
        get_all(state)
    }

    #[must_use]
    pub fn count_all(&self, state: &ResourceState<T>) -> usize {
        count_all(state)
    }

    #[must_use]
    pub fn get_by_name<'a>(&self, state: &'a ResourceState<T>, name: &str) -> Option<&'a T> {
        get_by_name(state, name)
    }

    #[must_use]
    pub fn get_for_url<'a>(&self, state: &'a ResourceState<T>, url: &str) -> Option<&'a T> {
        get_for_url(state, url)
    }

    #[must_use]
    pub fn get_for_parent<'a>(&self, state: &'a ResourceState<T>, parent: &str) -> Vec<&'a T> {
        get_for_parent(state, parent)
    }

    #[must_use]
    pub const fn is_loading(&self, state: &ResourceState<T>, operation: Operation) -> bool {
        is_loading(state, operation)
    }

    #[must_use]
    pub const fn last_error<'a>(&self, state: &'a ResourceState<T>) -> Option<&'a ApiError> {
        last_error(state)
    }
}
