//! Form submission routing.
//!
//! A form is bound to one resource kind. When the view layer submits a form,
//! its raw JSON values are decoded into the kind's payload and turned into a
//! [`ResourceAction::SubmitForm`], which the resource reducer routes to CREATE
//! or UPDATE. The outcome comes back as [`FormOutcome`] through a delegate.

use crate::Resource;
use crate::action::ResourceAction;
use crate::error::ApiError;
use crate::kind::ResourceKind;
use crate::name::ResourceName;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Identifier of a form, e.g. `project-settings`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormName(String);

impl FormName {
    /// Wrap a form identifier.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FormName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FormName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for FormName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Result of a form submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormOutcome {
    /// The resource was persisted under `name`
    Succeeded {
        /// Name of the created or updated resource
        name: ResourceName,
    },
    /// The submission was rejected
    Failed {
        /// Validation errors stay distinguishable from transport errors
        error: ApiError,
    },
}

type SubmitHandler<A> = Box<dyn Fn(Value) -> Result<A, ApiError> + Send + Sync>;

struct Binding<A> {
    kind: ResourceKind,
    handler: SubmitHandler<A>,
}

/// Maps form names to the resource kind handling their submissions.
///
/// `A` is the application's root action type.
pub struct FormRegistry<A> {
    bindings: HashMap<FormName, Binding<A>>,
}

impl<A> Default for FormRegistry<A> {
    fn default() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }
}

impl<A> fmt::Debug for FormRegistry<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut forms: Vec<_> = self
            .bindings
            .iter()
            .map(|(name, binding)| (name.as_str(), binding.kind))
            .collect();
        forms.sort_unstable();
        f.debug_struct("FormRegistry").field("forms", &forms).finish()
    }
}

impl<A: 'static> FormRegistry<A> {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Route every submission of `form` to the slice of `T`.
    ///
    /// `embed` lifts the slice action into the root action type. A later
    /// registration for the same form replaces the earlier one.
    pub fn take_every_submission<T: Resource>(
        &mut self,
        form: impl Into<FormName>,
        embed: fn(ResourceAction<T>) -> A,
    ) -> &mut Self {
        let form = form.into();
        let bound = form.clone();
        let handler: SubmitHandler<A> = Box::new(move |values| {
            let values: T = serde_json::from_value(values).map_err(|err| ApiError::Validation {
                message: format!("invalid {} form values: {err}", T::KIND.display_name()),
                field_errors: BTreeMap::new(),
            })?;
            Ok(embed(ResourceAction::SubmitForm {
                form: bound.clone(),
                values,
            }))
        });

        tracing::debug!(form = %form, kind = %T::KIND, "Registered form submission handler");
        self.bindings.insert(
            form,
            Binding {
                kind: T::KIND,
                handler,
            },
        );
        self
    }

    /// The resource kind bound to `form`.
    #[must_use]
    pub fn kind_of(&self, form: &FormName) -> Option<ResourceKind> {
        self.bindings.get(form).map(|binding| binding.kind)
    }

    /// Turn raw form values into the action submitting them.
    ///
    /// Returns `None` for an unregistered form and a validation error when the
    /// values do not decode into the bound payload type.
    #[must_use]
    pub fn dispatch(&self, form: &FormName, values: Value) -> Option<Result<A, ApiError>> {
        self.bindings.get(form).map(|binding| (binding.handler)(values))
    }

    /// Number of registered forms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether no form is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
