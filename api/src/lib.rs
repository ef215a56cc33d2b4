//! # Dashboard State API
//!
//! The generic resource-state engine. Every resource kind (organization,
//! project, site) gets the same machinery, parameterized by its payload type:
//!
//! - [`name`]: structured resource names and their patterns
//! - [`action`]: the fifteen action types of a kind and the typed
//!   [`ResourceAction`]
//! - [`state`] / [`reducer`]: the normalized collection keyed by name and the
//!   reducer updating it
//! - [`orchestrator`]: turns intents into transport calls, deduplicating
//!   identical in-flight reads
//! - [`selectors`]: pure queries over the state
//!
//! A payload type opts in by implementing [`Resource`], usually through the
//! derive macro:
//!
//! ```
//! use dashboard_state_api::{Resource, ResourceName};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Resource)]
//! #[resource(kind = "site")]
//! struct Site {
//!     name: ResourceName,
//!     #[resource(parent)]
//!     project: ResourceName,
//! }
//!
//! let site = Site {
//!     name: "project/foo/site/bar".into(),
//!     project: "project/foo".into(),
//! };
//! assert!(!site.is_new());
//! assert_eq!(site.parent().map(ResourceName::as_str), Some("project/foo"));
//! ```

// Lets `#[derive(Resource)]` refer to `::dashboard_state_api` from inside this crate.
extern crate self as dashboard_state_api;

pub mod action;
pub mod error;
pub mod forms;
pub mod kind;
pub mod module;
pub mod name;
pub mod notification;
pub mod orchestrator;
pub mod reducer;
pub mod routing;
pub mod selectors;
pub mod state;
pub mod transport;

pub use action::{
    ActionType, ActionTypes, Delegate, ListRequest, Operation, Phase, ResourceAction, create_action_types,
};
pub use error::{ApiError, StatusCode, TransportError};
pub use forms::{FormName, FormOutcome, FormRegistry};
pub use kind::ResourceKind;
pub use module::ResourceModule;
pub use name::{NameError, NameParams, NamePattern, ResourceName, build_name, parse_name};
pub use notification::{Intent, Toast};
pub use orchestrator::{OrchestratorConfig, RequestKey, RequestOrchestrator};
pub use reducer::ResourceReducer;
pub use routing::{Router, RoutingError};
pub use state::{LoadingFlags, ResourceState};
pub use transport::{Transport, TransportCall};

/// Derive [`Resource`] for a payload struct.
///
/// The struct carries `#[resource(kind = "...")]`. The name field is the
/// field called `name` unless another field is marked `#[resource(name)]`;
/// a field marked `#[resource(parent)]` (a `ResourceName` or
/// `Option<ResourceName>`) provides [`Resource::parent`].
pub use dashboard_state_macros::Resource;

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Debug;

/// A payload managed by the engine.
pub trait Resource: Clone + PartialEq + Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// The kind of every instance of this type.
    const KIND: ResourceKind;

    /// The instance's name; unset for instances not persisted yet.
    fn name(&self) -> &ResourceName;

    /// Name of the owning instance, if any.
    fn parent(&self) -> Option<&ResourceName> {
        None
    }

    /// Whether this instance has not been persisted yet.
    fn is_new(&self) -> bool {
        self.name().is_unset()
    }
}
