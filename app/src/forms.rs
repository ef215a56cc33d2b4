//! The forms slice: submission status of every named form.
//!
//! Submitting a form puts it in [`FormStatus::Submitting`]; the root reducer
//! routes the values to the bound resource slice through the
//! [`FormRegistry`](dashboard_state_api::FormRegistry), and the resource
//! reducer reports back with a [`FormOutcome`].

use dashboard_state_api::{ApiError, FormName, FormOutcome, ResourceName};
use dashboard_state_core::SmallVec;
use dashboard_state_core::effect::Effect;
use dashboard_state_core::reducer::Reducer;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Names of the forms the dashboard registers.
pub mod names {
    /// Create or edit an organization
    pub const ORGANIZATION: &str = "organization";
    /// Create or edit a project
    pub const PROJECT: &str = "project";
    /// Create or edit a site
    pub const SITE: &str = "site";
}

/// Where a form's last submission stands.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FormStatus {
    /// Waiting for the server
    Submitting,
    /// Persisted
    Succeeded {
        /// Name of the created or updated resource
        name: ResourceName,
    },
    /// Rejected
    Failed {
        /// Summary shown above the form
        message: String,
        /// Messages shown next to individual fields
        field_errors: BTreeMap<String, String>,
    },
}

impl FormStatus {
    fn from_outcome(outcome: FormOutcome) -> Self {
        match outcome {
            FormOutcome::Succeeded { name } => Self::Succeeded { name },
            FormOutcome::Failed { error } => Self::failed(&error),
        }
    }

    /// Status of a submission rejected with `error`.
    #[must_use]
    pub fn failed(error: &ApiError) -> Self {
        Self::Failed {
            message: error.message().to_string(),
            field_errors: error.field_errors().cloned().unwrap_or_default(),
        }
    }
}

/// Forms slice.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormsState {
    /// Status per form; forms never submitted are absent
    pub by_name: BTreeMap<FormName, FormStatus>,
}

impl FormsState {
    /// Status of `form`.
    #[must_use]
    pub fn status(&self, form: &str) -> Option<&FormStatus> {
        self.by_name.get(&FormName::from(form))
    }
}

/// Forms actions.
#[derive(Clone, Debug, PartialEq)]
pub enum FormsAction {
    /// The view layer submitted `values`
    Submit {
        /// Submitted form
        form: FormName,
        /// Raw field values
        values: Value,
    },
    /// The submission finished
    Submitted {
        /// Submitted form
        form: FormName,
        /// How it ended
        outcome: FormOutcome,
    },
    /// Forget the status of a form
    Clear {
        /// Form to reset
        form: FormName,
    },
}

impl FormsAction {
    /// Submit `values` through `form`.
    #[must_use]
    pub fn submit(form: impl Into<FormName>, values: Value) -> Self {
        Self::Submit {
            form: form.into(),
            values,
        }
    }
}

/// Reducer of the forms slice.
#[derive(Clone, Copy, Debug, Default)]
pub struct FormsReducer;

impl Reducer for FormsReducer {
    type State = FormsState;
    type Action = FormsAction;
    type Environment = ();

    fn reduce(&self, state: &mut FormsState, action: FormsAction, _env: &()) -> SmallVec<[Effect<FormsAction>; 4]> {
        match action {
            FormsAction::Submit { form, .. } => {
                state.by_name.insert(form, FormStatus::Submitting);
            },
            FormsAction::Submitted { form, outcome } => {
                let status = FormStatus::from_outcome(outcome);
                tracing::debug!(form = %form, status = ?status, "Form submitted");
                state.by_name.insert(form, status);
            },
            FormsAction::Clear { form } => {
                state.by_name.remove(&form);
            },
        }
        SmallVec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashboard_state_api::{StatusCode, TransportError};
    use dashboard_state_testing::{ReducerTest, assertions};
    use serde_json::json;

    #[test]
    fn submission_lifecycle() {
        ReducerTest::new(FormsReducer)
            .with_env(())
            .given_state(FormsState::default())
            .when_action(FormsAction::submit(names::PROJECT, json!({"display_name": "Foo"})))
            .then_state(|state| assert_eq!(state.status(names::PROJECT), Some(&FormStatus::Submitting)))
            .then_effects(assertions::assert_no_effects)
            .run();

        ReducerTest::new(FormsReducer)
            .with_env(())
            .given_state(FormsState::default())
            .when_actions([
                FormsAction::submit(names::PROJECT, json!({})),
                FormsAction::Submitted {
                    form: names::PROJECT.into(),
                    outcome: FormOutcome::Succeeded {
                        name: "project/foo".into(),
                    },
                },
            ])
            .then_state(|state| {
                assert_eq!(
                    state.status(names::PROJECT),
                    Some(&FormStatus::Succeeded {
                        name: "project/foo".into()
                    })
                );
            })
            .run();
    }

    #[test]
    fn validation_failures_keep_field_errors() {
        let error = ApiError::from(
            TransportError::new(StatusCode::InvalidArgument, "invalid site")
                .with_violation("display_name", "must not be empty"),
        );

        ReducerTest::new(FormsReducer)
            .with_env(())
            .given_state(FormsState::default())
            .when_action(FormsAction::Submitted {
                form: names::SITE.into(),
                outcome: FormOutcome::Failed { error },
            })
            .then_state(|state| {
                let Some(FormStatus::Failed { message, field_errors }) = state.status(names::SITE) else {
                    unreachable!("site form should have failed");
                };
                assert_eq!(message, "invalid site");
                assert_eq!(field_errors.get("display_name").map(String::as_str), Some("must not be empty"));
            })
            .run();
    }

    #[test]
    fn transport_failures_have_no_field_errors() {
        let status = FormStatus::failed(&ApiError::transport(StatusCode::Unavailable, "backend down"));
        assert_eq!(
            status,
            FormStatus::Failed {
                message: "backend down".to_string(),
                field_errors: BTreeMap::new(),
            }
        );
    }

    #[test]
    fn clear_forgets_the_form() {
        ReducerTest::new(FormsReducer)
            .with_env(())
            .given_state(FormsState::default())
            .when_actions([
                FormsAction::submit(names::ORGANIZATION, json!({})),
                FormsAction::Clear {
                    form: names::ORGANIZATION.into(),
                },
            ])
            .then_state(|state| assert!(state.by_name.is_empty()))
            .run();
    }
}
