//! Dependencies injected into the root reducer.

use crate::forms::names;
use crate::routing::Routes;
use crate::state::AppAction;
use crate::ui::UiEnvironment;
use dashboard_state_api::{FormRegistry, OrchestratorConfig, RequestOrchestrator, Transport};
use dashboard_state_core::environment::Clock;
use std::sync::Arc;

/// Environment of the dashboard store.
#[derive(Debug)]
pub struct AppEnvironment {
    /// Performs the calls of every resource slice
    pub api: RequestOrchestrator,
    /// The route table
    pub routes: Routes,
    /// Dependencies of the UI slice
    pub ui: UiEnvironment,
    /// Form to slice bindings
    pub forms: FormRegistry<AppAction>,
}

impl AppEnvironment {
    /// Wire the standard routes and forms around `transport`.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, config: OrchestratorConfig, clock: Arc<dyn Clock>) -> Self {
        let routes = Routes::standard();
        let api = RequestOrchestrator::with_config(transport, Arc::new(routes.clone()), config);

        let mut forms = FormRegistry::new();
        forms
            .take_every_submission(names::ORGANIZATION, AppAction::Organizations)
            .take_every_submission(names::PROJECT, AppAction::Projects)
            .take_every_submission(names::SITE, AppAction::Sites);

        Self {
            api,
            routes,
            ui: UiEnvironment::new(clock),
            forms,
        }
    }

    /// Replace the UI dependencies.
    #[must_use]
    pub fn with_ui(mut self, ui: UiEnvironment) -> Self {
        self.ui = ui;
        self
    }
}
