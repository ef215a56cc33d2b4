//! The action taxonomy.
//!
//! Every resource kind has the same fifteen action types: five operations
//! times three phases. [`create_action_types`] derives their identifiers from
//! the kind, so two kinds never share one. [`ResourceAction`] is the typed
//! action the store actually carries.

use crate::Resource;
use crate::error::ApiError;
use crate::forms::{FormName, FormOutcome};
use crate::kind::ResourceKind;
use crate::name::ResourceName;
use crate::notification::Toast;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A CRUD operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Fetch the collection
    List,
    /// Fetch one instance
    Get,
    /// Persist a new instance
    Create,
    /// Modify an instance
    Update,
    /// Delete an instance
    Destroy,
}

impl Operation {
    /// Every operation.
    pub const ALL: [Self; 5] = [Self::List, Self::Get, Self::Create, Self::Update, Self::Destroy];

    /// Uppercase identifier (`LIST`, `DESTROY`, ...).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::List => "LIST",
            Self::Get => "GET",
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Destroy => "DESTROY",
        }
    }

    /// Lowercase label used in logs and metrics.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Get => "get",
            Self::Create => "create",
            Self::Update => "update",
            Self::Destroy => "destroy",
        }
    }
}

/// The phase of an operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Intent dispatched, transport not yet resolved
    Requested,
    /// Transport resolved
    Succeeded,
    /// Transport rejected
    Failed,
}

impl Phase {
    /// Every phase.
    pub const ALL: [Self; 3] = [Self::Requested, Self::Succeeded, Self::Failed];

    /// Uppercase identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Requested => "REQUESTED",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
        }
    }
}

/// A single action type identifier, e.g. `@@api/project/LIST_REQUESTED`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActionType {
    /// Resource kind
    pub kind: ResourceKind,
    /// Operation
    pub operation: Operation,
    /// Phase
    pub phase: Phase,
}

impl ActionType {
    /// The identifier as an owned string.
    #[must_use]
    pub fn id(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "@@api/{}/{}_{}",
            self.kind,
            self.operation.as_str(),
            self.phase.as_str()
        )
    }
}

/// The fifteen action types of one resource kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct ActionTypes {
    pub list_requested: ActionType,
    pub list_succeeded: ActionType,
    pub list_failed: ActionType,
    pub get_requested: ActionType,
    pub get_succeeded: ActionType,
    pub get_failed: ActionType,
    pub create_requested: ActionType,
    pub create_succeeded: ActionType,
    pub create_failed: ActionType,
    pub update_requested: ActionType,
    pub update_succeeded: ActionType,
    pub update_failed: ActionType,
    pub destroy_requested: ActionType,
    pub destroy_succeeded: ActionType,
    pub destroy_failed: ActionType,
}

impl ActionTypes {
    /// All fifteen types, operation-major.
    #[must_use]
    pub const fn all(&self) -> [ActionType; 15] {
        [
            self.list_requested,
            self.list_succeeded,
            self.list_failed,
            self.get_requested,
            self.get_succeeded,
            self.get_failed,
            self.create_requested,
            self.create_succeeded,
            self.create_failed,
            self.update_requested,
            self.update_succeeded,
            self.update_failed,
            self.destroy_requested,
            self.destroy_succeeded,
            self.destroy_failed,
        ]
    }

    /// Whether `action_type` belongs to this set.
    #[must_use]
    pub fn contains(&self, action_type: ActionType) -> bool {
        self.all().contains(&action_type)
    }
}

/// Derive the fifteen action types of `kind`.
#[must_use]
pub const fn create_action_types(kind: ResourceKind) -> ActionTypes {
    const fn t(kind: ResourceKind, operation: Operation, phase: Phase) -> ActionType {
        ActionType {
            kind,
            operation,
            phase,
        }
    }

    ActionTypes {
        list_requested: t(kind, Operation::List, Phase::Requested),
        list_succeeded: t(kind, Operation::List, Phase::Succeeded),
        list_failed: t(kind, Operation::List, Phase::Failed),
        get_requested: t(kind, Operation::Get, Phase::Requested),
        get_succeeded: t(kind, Operation::Get, Phase::Succeeded),
        get_failed: t(kind, Operation::Get, Phase::Failed),
        create_requested: t(kind, Operation::Create, Phase::Requested),
        create_succeeded: t(kind, Operation::Create, Phase::Succeeded),
        create_failed: t(kind, Operation::Create, Phase::Failed),
        update_requested: t(kind, Operation::Update, Phase::Requested),
        update_succeeded: t(kind, Operation::Update, Phase::Succeeded),
        update_failed: t(kind, Operation::Update, Phase::Failed),
        destroy_requested: t(kind, Operation::Destroy, Phase::Requested),
        destroy_succeeded: t(kind, Operation::Destroy, Phase::Succeeded),
        destroy_failed: t(kind, Operation::Destroy, Phase::Failed),
    }
}

/// Parameters of a LIST request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListRequest {
    /// Restrict the listing to children of this resource
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ResourceName>,
    /// Additional server-side filters
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub filter: BTreeMap<String, String>,
}

impl ListRequest {
    /// List children of `parent`.
    #[must_use]
    pub fn for_parent(parent: impl Into<ResourceName>) -> Self {
        Self {
            parent: Some(parent.into()),
            filter: BTreeMap::new(),
        }
    }

    /// Add a filter.
    #[must_use]
    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filter.insert(key.into(), value.into());
        self
    }
}

/// Signals a resource slice raises for other slices.
///
/// Resource reducers never touch routing, toast or form state themselves;
/// they emit delegates which the application root routes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Delegate {
    /// Navigate to a path
    Navigate {
        /// Target path
        path: String,
    },
    /// Show a notification
    ShowToast(Toast),
    /// Report the outcome of a form submission
    FormSubmitted {
        /// Submitted form
        form: FormName,
        /// Outcome
        outcome: FormOutcome,
    },
}

/// Every action a resource slice handles.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ResourceAction<T> {
    /// LIST intent
    ListRequested {
        /// Listing parameters
        request: ListRequest,
    },
    /// LIST resolved
    ListSucceeded {
        /// Instances in server order
        items: Vec<T>,
    },
    /// LIST rejected
    ListFailed {
        /// Normalized error
        error: ApiError,
    },

    /// GET intent
    GetRequested {
        /// Name to fetch
        name: ResourceName,
    },
    /// GET resolved
    GetSucceeded {
        /// The fetched instance
        item: T,
    },
    /// GET rejected
    GetFailed {
        /// Name that was requested
        name: ResourceName,
        /// Normalized error
        error: ApiError,
    },

    /// CREATE intent
    CreateRequested {
        /// Instance to persist
        payload: T,
        /// Form that submitted it, if any
        form: Option<FormName>,
    },
    /// CREATE resolved
    CreateSucceeded {
        /// Persisted instance as returned by the server
        item: T,
        /// Form that submitted it, if any
        form: Option<FormName>,
    },
    /// CREATE rejected
    CreateFailed {
        /// Normalized error
        error: ApiError,
        /// Form that submitted it, if any
        form: Option<FormName>,
    },

    /// UPDATE intent
    UpdateRequested {
        /// Name of the instance being updated
        name: ResourceName,
        /// New contents (may carry a new name)
        payload: T,
        /// Form that submitted it, if any
        form: Option<FormName>,
    },
    /// UPDATE resolved
    UpdateSucceeded {
        /// Name the instance had before the update
        previous: ResourceName,
        /// Updated instance as returned by the server
        item: T,
        /// Form that submitted it, if any
        form: Option<FormName>,
    },
    /// UPDATE rejected
    UpdateFailed {
        /// Name of the instance being updated
        name: ResourceName,
        /// Normalized error
        error: ApiError,
        /// Form that submitted it, if any
        form: Option<FormName>,
    },

    /// DESTROY intent
    DestroyRequested {
        /// Instance to delete
        payload: T,
    },
    /// DESTROY resolved
    DestroySucceeded {
        /// The deleted instance
        item: T,
    },
    /// DESTROY rejected
    DestroyFailed {
        /// The instance that was not deleted
        item: T,
        /// Normalized error
        error: ApiError,
    },

    /// A form bound to this kind was submitted
    SubmitForm {
        /// Submitted form
        form: FormName,
        /// Form values decoded into an instance
        values: T,
    },

    /// Discard the whole slice (a parent scope was destroyed)
    Reset,

    /// Signal for another slice
    Delegate(Delegate),
}

impl<T: Resource> ResourceAction<T> {
    /// LIST everything.
    #[must_use]
    pub fn list() -> Self {
        Self::ListRequested {
            request: ListRequest::default(),
        }
    }

    /// LIST with explicit parameters.
    #[must_use]
    pub const fn list_with(request: ListRequest) -> Self {
        Self::ListRequested { request }
    }

    /// GET one instance.
    #[must_use]
    pub fn get(name: impl Into<ResourceName>) -> Self {
        Self::GetRequested { name: name.into() }
    }

    /// CREATE an instance.
    #[must_use]
    pub const fn create(payload: T) -> Self {
        Self::CreateRequested { payload, form: None }
    }

    /// UPDATE the instance currently stored under its own name.
    #[must_use]
    pub fn update(payload: T) -> Self {
        Self::UpdateRequested {
            name: payload.name().clone(),
            payload,
            form: None,
        }
    }

    /// UPDATE the instance stored under `name`, possibly renaming it.
    #[must_use]
    pub fn rename(name: impl Into<ResourceName>, payload: T) -> Self {
        Self::UpdateRequested {
            name: name.into(),
            payload,
            form: None,
        }
    }

    /// DESTROY an instance.
    #[must_use]
    pub const fn destroy(payload: T) -> Self {
        Self::DestroyRequested { payload }
    }

    /// Submit a form's values.
    #[must_use]
    pub fn submit(form: impl Into<FormName>, values: T) -> Self {
        Self::SubmitForm {
            form: form.into(),
            values,
        }
    }

    /// The taxonomy identifier of this action.
    ///
    /// `None` for actions outside the fifteen CRUD types (form submission,
    /// reset, delegates).
    #[must_use]
    pub const fn action_type(&self) -> Option<ActionType> {
        let (operation, phase) = match self {
            Self::ListRequested { .. } => (Operation::List, Phase::Requested),
            Self::ListSucceeded { .. } => (Operation::List, Phase::Succeeded),
            Self::ListFailed { .. } => (Operation::List, Phase::Failed),
            Self::GetRequested { .. } => (Operation::Get, Phase::Requested),
            Self::GetSucceeded { .. } => (Operation::Get, Phase::Succeeded),
            Self::GetFailed { .. } => (Operation::Get, Phase::Failed),
            Self::CreateRequested { .. } => (Operation::Create, Phase::Requested),
            Self::CreateSucceeded { .. } => (Operation::Create, Phase::Succeeded),
            Self::CreateFailed { .. } => (Operation::Create, Phase::Failed),
            Self::UpdateRequested { .. } => (Operation::Update, Phase::Requested),
            Self::UpdateSucceeded { .. } => (Operation::Update, Phase::Succeeded),
            Self::UpdateFailed { .. } => (Operation::Update, Phase::Failed),
            Self::DestroyRequested { .. } => (Operation::Destroy, Phase::Requested),
            Self::DestroySucceeded { .. } => (Operation::Destroy, Phase::Succeeded),
            Self::DestroyFailed { .. } => (Operation::Destroy, Phase::Failed),
            Self::SubmitForm { .. } | Self::Reset | Self::Delegate(_) => return None,
        };

        Some(ActionType {
            kind: T::KIND,
            operation,
            phase,
        })
    }

    /// Whether this is a SUCCEEDED or FAILED outcome.
    #[must_use]
    pub const fn is_outcome(&self) -> bool {
        matches!(
            self.action_type(),
            Some(ActionType {
                phase: Phase::Succeeded | Phase::Failed,
                ..
            })
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn fifteen_distinct_types() {
        let types = create_action_types(ResourceKind::Project);
        let ids: HashSet<String> = types.all().iter().map(ActionType::id).collect();
        assert_eq!(ids.len(), 15);
        assert!(ids.contains("@@api/project/LIST_REQUESTED"));
        assert!(ids.contains("@@api/project/DESTROY_FAILED"));
    }

    #[test]
    fn kinds_never_collide() {
        for a in ResourceKind::ALL {
            for b in ResourceKind::ALL {
                if a == b {
                    continue;
                }
                let left: HashSet<String> =
                    create_action_types(a).all().iter().map(ActionType::id).collect();
                let right: HashSet<String> =
                    create_action_types(b).all().iter().map(ActionType::id).collect();
                assert!(left.is_disjoint(&right), "{a} and {b} collide");
            }
        }
    }

    #[test]
    fn create_action_types_is_deterministic() {
        assert_eq!(
            create_action_types(ResourceKind::Site),
            create_action_types(ResourceKind::Site)
        );
    }

    #[test]
    fn list_request_serializes_compactly() {
        assert_eq!(serde_json::to_string(&ListRequest::default()).ok().as_deref(), Some("{}"));
        let request = ListRequest::for_parent("organization/acme").with_filter("label", "prod");
        assert_eq!(
            serde_json::to_value(&request).ok(),
            Some(serde_json::json!({"parent": "organization/acme", "filter": {"label": "prod"}}))
        );
    }
}
