//! Root state and root action of the dashboard.

use crate::forms::{FormsAction, FormsState};
use crate::resources::{Organization, OrganizationsState, Project, ProjectsState, Site, SitesState};
use crate::routing::{RoutingAction, RoutingState};
use crate::ui::{UiAction, UiState};
use dashboard_state_api::ResourceAction;
use serde::{Deserialize, Serialize};

/// The whole application state, one field per slice.
///
/// Serializes as a plain JSON tree, which is what store snapshots capture.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    /// Organizations by name
    pub organizations: OrganizationsState,
    /// Projects by name
    pub projects: ProjectsState,
    /// Sites by name
    pub sites: SitesState,
    /// Current location
    pub routing: RoutingState,
    /// Toasts
    pub ui: UiState,
    /// Form submission status
    pub forms: FormsState,
}

/// Every action the dashboard store accepts.
#[derive(Clone, Debug, PartialEq)]
pub enum AppAction {
    /// Organization slice
    Organizations(ResourceAction<Organization>),
    /// Project slice
    Projects(ResourceAction<Project>),
    /// Site slice
    Sites(ResourceAction<Site>),
    /// Routing slice
    Routing(RoutingAction),
    /// UI slice
    Ui(UiAction),
    /// Forms slice
    Forms(FormsAction),
}

impl From<ResourceAction<Organization>> for AppAction {
    fn from(action: ResourceAction<Organization>) -> Self {
        Self::Organizations(action)
    }
}

impl From<ResourceAction<Project>> for AppAction {
    fn from(action: ResourceAction<Project>) -> Self {
        Self::Projects(action)
    }
}

impl From<ResourceAction<Site>> for AppAction {
    fn from(action: ResourceAction<Site>) -> Self {
        Self::Sites(action)
    }
}

impl From<RoutingAction> for AppAction {
    fn from(action: RoutingAction) -> Self {
        Self::Routing(action)
    }
}

impl From<UiAction> for AppAction {
    fn from(action: UiAction) -> Self {
        Self::Ui(action)
    }
}

impl From<FormsAction> for AppAction {
    fn from(action: FormsAction) -> Self {
        Self::Forms(action)
    }
}
