//! The root reducer.
//!
//! Slice reducers are scoped into [`AppState`] and combined. After the slices
//! have run, the root applies the cross-slice rules:
//!
//! - delegates emitted by a resource slice (navigate, toast, form outcome)
//!   are applied to the routing, UI and forms slices in the same reduction
//! - destroying a resource resets the slices of every descendant kind
//! - form submissions are routed to the slice bound in the
//!   [`FormRegistry`](dashboard_state_api::FormRegistry)

use crate::environment::AppEnvironment;
use crate::forms::{FormsAction, FormsReducer};
use crate::resources::{Organization, Project, Site};
use crate::routing::{RoutingAction, RoutingReducer};
use crate::state::{AppAction, AppState};
use crate::ui::{UiAction, UiReducer};
use dashboard_state_api::{
    ApiError, Delegate, FormName, FormOutcome, RequestOrchestrator, Resource, ResourceAction, ResourceKind,
    ResourceReducer, ResourceState,
};
use dashboard_state_core::composition::{CombinedReducer, combine_reducers, scope_reducer};
use dashboard_state_core::effect::Effect;
use dashboard_state_core::reducer::Reducer;
use dashboard_state_core::{SmallVec, smallvec};
use serde_json::Value;
use std::collections::BTreeMap;

type Effects = SmallVec<[Effect<AppAction>; 4]>;

/// Reducer of the whole dashboard.
pub struct AppReducer {
    slices: CombinedReducer<AppState, AppAction, AppEnvironment>,
}

impl std::fmt::Debug for AppReducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppReducer").field("slices", &self.slices.len()).finish()
    }
}

impl Default for AppReducer {
    fn default() -> Self {
        Self::new()
    }
}

impl AppReducer {
    /// Compose the slice reducers.
    #[must_use]
    pub fn new() -> Self {
        let slices = combine_reducers(vec![
            Box::new(scope_reducer(
                ResourceReducer::<Organization>::new(),
                |state: &mut AppState| &mut state.organizations,
                |action| match action {
                    AppAction::Organizations(action) => Some(action),
                    _ => None,
                },
                AppAction::Organizations,
                |env: &AppEnvironment| &env.api,
            )),
            Box::new(scope_reducer(
                ResourceReducer::<Project>::new(),
                |state: &mut AppState| &mut state.projects,
                |action| match action {
                    AppAction::Projects(action) => Some(action),
                    _ => None,
                },
                AppAction::Projects,
                |env: &AppEnvironment| &env.api,
            )),
            Box::new(scope_reducer(
                ResourceReducer::<Site>::new(),
                |state: &mut AppState| &mut state.sites,
                |action| match action {
                    AppAction::Sites(action) => Some(action),
                    _ => None,
                },
                AppAction::Sites,
                |env: &AppEnvironment| &env.api,
            )),
            Box::new(scope_reducer(
                RoutingReducer,
                |state: &mut AppState| &mut state.routing,
                |action| match action {
                    AppAction::Routing(action) => Some(action),
                    _ => None,
                },
                AppAction::Routing,
                |env: &AppEnvironment| &env.routes,
            )),
            Box::new(scope_reducer(
                UiReducer,
                |state: &mut AppState| &mut state.ui,
                |action| match action {
                    AppAction::Ui(action) => Some(action),
                    _ => None,
                },
                AppAction::Ui,
                |env: &AppEnvironment| &env.ui,
            )),
            Box::new(scope_reducer(
                FormsReducer,
                |state: &mut AppState| &mut state.forms,
                |action| match action {
                    AppAction::Forms(action) => Some(action),
                    _ => None,
                },
                AppAction::Forms,
                |_: &AppEnvironment| &(),
            )),
        ]);

        Self { slices }
    }
}

impl Reducer for AppReducer {
    type State = AppState;
    type Action = AppAction;
    type Environment = AppEnvironment;

    fn reduce(&self, state: &mut AppState, action: AppAction, env: &AppEnvironment) -> Effects {
        let mut effects = self.slices.reduce(state, action.clone(), env);

        effects.extend(match action {
            AppAction::Organizations(action) => follow_up(state, action, env),
            AppAction::Projects(action) => follow_up(state, action, env),
            AppAction::Sites(action) => follow_up(state, action, env),
            AppAction::Forms(FormsAction::Submit { form, values }) => submit(state, form, values, env),
            AppAction::Routing(_) | AppAction::Ui(_) | AppAction::Forms(_) => SmallVec::new(),
        });

        effects
    }
}

fn follow_up<T: Resource>(state: &mut AppState, action: ResourceAction<T>, env: &AppEnvironment) -> Effects {
    match action {
        ResourceAction::Delegate(delegate) => apply_delegate(state, delegate, env),
        ResourceAction::DestroySucceeded { item } => {
            for kind in T::KIND.descendants() {
                tracing::debug!(destroyed = %item.name(), slice = %kind, "Resetting descendant slice");
                reset_slice(state, kind, &env.api);
            }
            SmallVec::new()
        },
        _ => SmallVec::new(),
    }
}

fn apply_delegate(state: &mut AppState, delegate: Delegate, env: &AppEnvironment) -> Effects {
    match delegate {
        Delegate::Navigate { path } => lift(
            RoutingReducer.reduce(&mut state.routing, RoutingAction::Push { path }, &env.routes),
            AppAction::Routing,
        ),
        Delegate::ShowToast(toast) => lift(
            UiReducer.reduce(&mut state.ui, UiAction::ShowToast(toast), &env.ui),
            AppAction::Ui,
        ),
        Delegate::FormSubmitted { form, outcome } => report_form(state, form, outcome),
    }
}

fn submit(state: &mut AppState, form: FormName, values: Value, env: &AppEnvironment) -> Effects {
    match env.forms.dispatch(&form, values) {
        Some(Ok(action)) => smallvec![Effect::send(action)],
        Some(Err(error)) => report_form(state, form, FormOutcome::Failed { error }),
        None => {
            tracing::warn!(form = %form, "Submission of an unregistered form");
            let error = ApiError::Validation {
                message: format!("unknown form `{form}`"),
                field_errors: BTreeMap::new(),
            };
            report_form(state, form, FormOutcome::Failed { error })
        },
    }
}

fn report_form(state: &mut AppState, form: FormName, outcome: FormOutcome) -> Effects {
    lift(
        FormsReducer.reduce(&mut state.forms, FormsAction::Submitted { form, outcome }, &()),
        AppAction::Forms,
    )
}

fn reset_slice(state: &mut AppState, kind: ResourceKind, api: &RequestOrchestrator) {
    match kind {
        ResourceKind::Organization => reset(&mut state.organizations, api),
        ResourceKind::Project => reset(&mut state.projects, api),
        ResourceKind::Site => reset(&mut state.sites, api),
    }
}

fn reset<T: Resource>(slice: &mut ResourceState<T>, api: &RequestOrchestrator) {
    let effects = ResourceReducer::<T>::new().reduce(slice, ResourceAction::Reset, api);
    debug_assert!(effects.iter().all(Effect::is_none));
}

fn lift<A: Send + 'static>(effects: SmallVec<[Effect<A>; 4]>, embed: fn(A) -> AppAction) -> Effects {
    effects.into_iter().map(|effect| effect.map(embed)).collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::forms::{FormStatus, names};
    use crate::routing::current_route;
    use dashboard_state_api::{Intent, OrchestratorConfig, Toast};
    use dashboard_state_runtime::retry::RetryPolicy;
    use dashboard_state_testing::{MockTransport, collect_actions, test_clock};
    use serde_json::json;
    use std::sync::Arc;

    fn env() -> AppEnvironment {
        AppEnvironment::new(
            Arc::new(MockTransport::new()),
            OrchestratorConfig::default().with_retry(RetryPolicy::none()),
            Arc::new(test_clock()),
        )
    }

    fn seeded() -> AppState {
        let mut project = Project::draft("organization/acme", "Foo");
        project.name = "project/foo".into();
        let mut site = Site::draft("project/foo", "Blog");
        site.name = "project/foo/site/blog".into();

        AppState {
            organizations: ResourceState::from_items([Organization {
                name: "organization/acme".into(),
                display_name: "Acme".to_string(),
            }]),
            projects: ResourceState::from_items([project]),
            sites: ResourceState::from_items([site]),
            ..AppState::default()
        }
    }

    #[test]
    fn navigate_delegates_move_the_route() {
        let mut state = AppState::default();
        let effects = AppReducer::new().reduce(
            &mut state,
            AppAction::Projects(ResourceAction::Delegate(Delegate::Navigate {
                path: "/organization/acme".to_string(),
            })),
            &env(),
        );

        assert!(effects.iter().all(Effect::is_none));
        assert_eq!(current_route(&state.routing).name.as_deref(), Some("organization"));
        assert_eq!(state.routing.history, vec!["/".to_string()]);
    }

    #[tokio::test]
    async fn toast_delegates_show_a_toast_that_expires() {
        let mut state = AppState::default();
        let effects = AppReducer::new().reduce(
            &mut state,
            AppAction::Sites(ResourceAction::Delegate(Delegate::ShowToast(Toast::danger(
                "Site delete failed",
            )))),
            &env(),
        );

        assert_eq!(state.ui.toasts.len(), 1);
        assert_eq!(state.ui.toasts[0].toast.intent, Intent::Danger);
        assert_eq!(
            collect_actions(effects.into_vec()).await,
            vec![AppAction::Ui(UiAction::DismissToast { id: 0 })]
        );
    }

    #[test]
    fn destroying_an_organization_resets_projects_and_sites() {
        let mut state = seeded();
        let organization = state.organizations.by_name["organization/acme"].clone();

        let _ = AppReducer::new().reduce(
            &mut state,
            AppAction::Organizations(ResourceAction::DestroySucceeded { item: organization }),
            &env(),
        );

        assert!(state.organizations.by_name.is_empty());
        assert!(state.projects.by_name.is_empty());
        assert!(state.sites.by_name.is_empty());
    }

    #[test]
    fn destroying_a_project_keeps_organizations() {
        let mut state = seeded();
        let project = state.projects.by_name["project/foo"].clone();

        let _ = AppReducer::new().reduce(
            &mut state,
            AppAction::Projects(ResourceAction::DestroySucceeded { item: project }),
            &env(),
        );

        assert_eq!(state.organizations.by_name.len(), 1);
        assert!(state.projects.by_name.is_empty());
        assert!(state.sites.by_name.is_empty());
    }

    #[test]
    fn destroying_a_site_touches_nothing_else() {
        let mut state = seeded();
        let site = state.sites.by_name["project/foo/site/blog"].clone();
        let projects = Arc::clone(&state.projects.by_name);

        let _ = AppReducer::new().reduce(
            &mut state,
            AppAction::Sites(ResourceAction::DestroySucceeded { item: site }),
            &env(),
        );

        assert!(Arc::ptr_eq(&projects, &state.projects.by_name));
        assert!(state.sites.by_name.is_empty());
    }

    #[tokio::test]
    async fn form_submissions_reach_the_bound_slice() {
        let mut state = AppState::default();
        let effects = AppReducer::new().reduce(
            &mut state,
            AppAction::Forms(FormsAction::submit(
                names::PROJECT,
                json!({"display_name": "Foo", "organization": "organization/acme"}),
            )),
            &env(),
        );

        assert_eq!(state.forms.status(names::PROJECT), Some(&FormStatus::Submitting));
        assert_eq!(
            collect_actions(effects.into_vec()).await,
            vec![AppAction::Projects(ResourceAction::SubmitForm {
                form: names::PROJECT.into(),
                values: Project::draft("organization/acme", "Foo"),
            })]
        );
    }

    #[test]
    fn undecodable_values_fail_the_form() {
        let mut state = AppState::default();
        let effects = AppReducer::new().reduce(
            &mut state,
            AppAction::Forms(FormsAction::submit(names::SITE, json!({"display_name": 42}))),
            &env(),
        );

        assert!(effects.iter().all(Effect::is_none));
        assert!(matches!(state.forms.status(names::SITE), Some(FormStatus::Failed { .. })));
    }

    #[test]
    fn unknown_forms_fail() {
        let mut state = AppState::default();
        let _ = AppReducer::new().reduce(
            &mut state,
            AppAction::Forms(FormsAction::submit("billing", json!({}))),
            &env(),
        );

        let Some(FormStatus::Failed { message, .. }) = state.forms.status("billing") else {
            unreachable!("billing form should have failed");
        };
        assert_eq!(message, "unknown form `billing`");
    }

    #[test]
    fn form_outcome_delegates_update_the_form() {
        let mut state = AppState::default();
        let _ = AppReducer::new().reduce(
            &mut state,
            AppAction::Organizations(ResourceAction::Delegate(Delegate::FormSubmitted {
                form: names::ORGANIZATION.into(),
                outcome: FormOutcome::Succeeded {
                    name: "organization/acme".into(),
                },
            })),
            &env(),
        );

        assert_eq!(
            state.forms.status(names::ORGANIZATION),
            Some(&FormStatus::Succeeded {
                name: "organization/acme".into()
            })
        );
    }
}
