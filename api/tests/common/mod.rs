//! Payload types and store wiring shared by the integration tests.

#![allow(dead_code)]

use dashboard_state_api::{
    OrchestratorConfig, RequestOrchestrator, Resource, ResourceName, ResourceReducer, ResourceState,
};
use dashboard_state_runtime::Store;
use dashboard_state_runtime::retry::RetryPolicy;
use dashboard_state_testing::{MockTransport, RecordingRouter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Resource)]
#[resource(kind = "project")]
pub struct Project {
    #[serde(default)]
    pub name: ResourceName,
    pub display_name: String,
    #[resource(parent)]
    #[serde(default)]
    pub organization: ResourceName,
}

impl Project {
    pub fn new(name: &str, display_name: &str) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.to_string(),
            organization: ResourceName::unset(),
        }
    }

    pub fn in_organization(mut self, organization: &str) -> Self {
        self.organization = organization.into();
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Resource)]
#[resource(kind = "site")]
pub struct Site {
    pub name: ResourceName,
    #[resource(parent)]
    pub project: ResourceName,
}

pub type ProjectStore =
    Store<ResourceState<Project>, dashboard_state_api::ResourceAction<Project>, RequestOrchestrator, ResourceReducer<Project>>;

pub fn orchestrator(transport: Arc<MockTransport>) -> RequestOrchestrator {
    RequestOrchestrator::with_config(
        transport,
        Arc::new(RecordingRouter::new()),
        OrchestratorConfig::default().with_retry(RetryPolicy::none()),
    )
}

pub fn project_store(transport: Arc<MockTransport>, items: Vec<Project>) -> ProjectStore {
    Store::new(ResourceState::from_items(items), ResourceReducer::new(), orchestrator(transport))
}
