//! The generic resource reducer.

use crate::Resource;
use crate::action::{Delegate, Operation, ResourceAction};
use crate::error::ApiError;
use crate::forms::{FormName, FormOutcome};
use crate::orchestrator::RequestOrchestrator;
use crate::state::ResourceState;
use dashboard_state_core::effect::Effect;
use dashboard_state_core::reducer::Reducer;
use dashboard_state_core::{SmallVec, smallvec};
use std::fmt;
use std::marker::PhantomData;

/// Reducer of one resource slice.
///
/// Intents set the operation's loading flag and ask the
/// [`RequestOrchestrator`] for the effect performing the call. Outcomes update
/// the normalized collection, clear the flag and, on failure, record
/// `last_error`. Side effects on other slices (navigation, toasts, form
/// status) are emitted as [`Delegate`] actions.
pub struct ResourceReducer<T> {
    _resource: PhantomData<fn() -> T>,
}

impl<T> ResourceReducer<T> {
    /// Create the reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _resource: PhantomData,
        }
    }
}

impl<T> Default for ResourceReducer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for ResourceReducer<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T: Resource> fmt::Debug for ResourceReducer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceReducer").field("kind", &T::KIND).finish()
    }
}

fn fail<T>(state: &mut ResourceState<T>, operation: Operation, error: ApiError) {
    state.loading.set(operation, false);
    state.last_error = Some(error);
}

fn report<T: Resource>(form: Option<FormName>, outcome: FormOutcome) -> SmallVec<[Effect<ResourceAction<T>>; 4]> {
    match form {
        Some(form) => smallvec![Effect::send(ResourceAction::Delegate(Delegate::FormSubmitted {
            form,
            outcome,
        }))],
        None => SmallVec::new(),
    }
}

impl<T: Resource> Reducer for ResourceReducer<T> {
    type State = ResourceState<T>;
    type Action = ResourceAction<T>;
    type Environment = RequestOrchestrator;

    #[allow(clippy::too_many_lines)]
    fn reduce(
        &self,
        state: &mut ResourceState<T>,
        action: ResourceAction<T>,
        env: &RequestOrchestrator,
    ) -> SmallVec<[Effect<ResourceAction<T>>; 4]> {
        match action {
            ResourceAction::ListRequested { request } => {
                state.loading.list = true;
                smallvec![env.list::<T>(request)]
            },
            ResourceAction::ListSucceeded { items } => {
                state.replace_all(items);
                state.loading.list = false;
                SmallVec::new()
            },
            ResourceAction::ListFailed { error } => {
                fail(state, Operation::List, error);
                SmallVec::new()
            },

            ResourceAction::GetRequested { name } => {
                state.loading.get = true;
                smallvec![env.get::<T>(name)]
            },
            ResourceAction::GetSucceeded { item } => {
                state.upsert(item);
                state.loading.get = false;
                SmallVec::new()
            },
            ResourceAction::GetFailed { name, error } => {
                tracing::debug!(kind = %T::KIND, name = %name, error = %error, "Get failed");
                fail(state, Operation::Get, error);
                SmallVec::new()
            },

            ResourceAction::CreateRequested { payload, form } => {
                state.loading.create = true;
                smallvec![env.create(payload, form)]
            },
            ResourceAction::CreateSucceeded { item, form } => {
                let name = item.name().clone();
                state.upsert(item);
                state.loading.create = false;
                report(form, FormOutcome::Succeeded { name })
            },
            ResourceAction::CreateFailed { error, form } => {
                fail(state, Operation::Create, error.clone());
                report(form, FormOutcome::Failed { error })
            },

            ResourceAction::UpdateRequested { name, payload, form } => {
                state.loading.update = true;
                smallvec![env.update(name, payload, form)]
            },
            ResourceAction::UpdateSucceeded { previous, item, form } => {
                let name = item.name().clone();
                state.rename(&previous, item);
                state.loading.update = false;
                report(form, FormOutcome::Succeeded { name })
            },
            ResourceAction::UpdateFailed { name, error, form } => {
                tracing::debug!(kind = %T::KIND, name = %name, error = %error, "Update failed");
                fail(state, Operation::Update, error.clone());
                report(form, FormOutcome::Failed { error })
            },

            ResourceAction::DestroyRequested { payload } => {
                state.loading.destroy = true;
                smallvec![env.destroy(payload)]
            },
            ResourceAction::DestroySucceeded { item } => {
                state.remove(item.name());
                state.loading.destroy = false;
                smallvec![env.after_destroy(&item)]
            },
            ResourceAction::DestroyFailed { item, error } => {
                let effect = env.after_destroy_failed(&item, &error);
                fail(state, Operation::Destroy, error);
                smallvec![effect]
            },

            ResourceAction::SubmitForm { form, values } => {
                let intent = if values.is_new() {
                    ResourceAction::CreateRequested {
                        payload: values,
                        form: Some(form),
                    }
                } else {
                    ResourceAction::UpdateRequested {
                        name: values.name().clone(),
                        payload: values,
                        form: Some(form),
                    }
                };
                smallvec![Effect::send(intent)]
            },

            ResourceAction::Reset => {
                tracing::debug!(kind = %T::KIND, "Resetting resource state");
                *state = ResourceState::default();
                SmallVec::new()
            },

            ResourceAction::Delegate(_) => SmallVec::new(),
        }
    }
}
