//! Per-type bundle of the resource machinery.

use crate::Resource;
use crate::action::{ActionTypes, create_action_types};
use crate::reducer::ResourceReducer;
use crate::selectors::Selectors;

/// Everything a concrete resource type gets from the engine.
///
/// # Example
///
/// ```
/// use dashboard_state_api::{Resource, ResourceKind, ResourceModule, ResourceName};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Resource)]
/// #[resource(kind = "organization")]
/// struct Organization {
///     name: ResourceName,
///     display_name: String,
/// }
///
/// let module = ResourceModule::<Organization>::new();
/// assert_eq!(module.action_types.list_requested.to_string(), "@@api/organization/LIST_REQUESTED");
/// assert_eq!(Organization::KIND, ResourceKind::Organization);
/// ```
pub struct ResourceModule<T> {
    /// The fifteen action types of `T::KIND`
    pub action_types: ActionTypes,
    /// The slice reducer
    pub reducer: ResourceReducer<T>,
    /// The slice selectors
    pub selectors: Selectors<T>,
}

impl<T: Resource> ResourceModule<T> {
    /// Build the module of `T`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            action_types: create_action_types(T::KIND),
            reducer: ResourceReducer::new(),
            selectors: Selectors::new(),
        }
    }
}

impl<T: Resource> std::fmt::Debug for ResourceModule<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceModule").field("kind", &T::KIND).finish_non_exhaustive()
    }
}

impl<T: Resource> Default for ResourceModule<T> {
    fn default() -> Self {
        Self::new()
    }
}
