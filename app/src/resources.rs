//! The concrete resource types of the dashboard.
//!
//! Every type follows the same wire convention: an unset `name` marks an
//! instance that has not been persisted yet, and the field pointing at the
//! owning instance is named after the parent kind (`organization`,
//! `project`).

use dashboard_state_api::{Resource, ResourceModule, ResourceName, ResourceState};
use serde::{Deserialize, Serialize};

/// A tenant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Resource)]
#[resource(kind = "organization")]
pub struct Organization {
    /// `organization/:slug`
    #[serde(default)]
    pub name: ResourceName,
    /// Human readable name
    #[serde(default)]
    pub display_name: String,
}

impl Organization {
    /// A new, unsaved organization.
    #[must_use]
    pub fn draft(display_name: impl Into<String>) -> Self {
        Self {
            name: ResourceName::unset(),
            display_name: display_name.into(),
        }
    }
}

/// A project owned by an organization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Resource)]
#[resource(kind = "project")]
pub struct Project {
    /// `project/:slug`
    #[serde(default)]
    pub name: ResourceName,
    /// Human readable name
    #[serde(default)]
    pub display_name: String,
    /// Owning organization
    #[resource(parent)]
    #[serde(default)]
    pub organization: ResourceName,
}

impl Project {
    /// A new, unsaved project of `organization`.
    #[must_use]
    pub fn draft(organization: impl Into<ResourceName>, display_name: impl Into<String>) -> Self {
        Self {
            name: ResourceName::unset(),
            display_name: display_name.into(),
            organization: organization.into(),
        }
    }
}

/// A site inside a project.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Resource)]
#[resource(kind = "site")]
pub struct Site {
    /// `project/:project/site/:slug`
    #[serde(default)]
    pub name: ResourceName,
    /// Human readable name
    #[serde(default)]
    pub display_name: String,
    /// Owning project
    #[resource(parent)]
    #[serde(default)]
    pub project: ResourceName,
    /// Primary domain, once assigned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_domain: Option<String>,
}

impl Site {
    /// A new, unsaved site of `project`.
    #[must_use]
    pub fn draft(project: impl Into<ResourceName>, display_name: impl Into<String>) -> Self {
        Self {
            name: ResourceName::unset(),
            display_name: display_name.into(),
            project: project.into(),
            primary_domain: None,
        }
    }
}

/// Organization slice.
pub type OrganizationsState = ResourceState<Organization>;
/// Project slice.
pub type ProjectsState = ResourceState<Project>;
/// Site slice.
pub type SitesState = ResourceState<Site>;

/// Action types, reducer and selectors of organizations.
pub const ORGANIZATIONS: ResourceModule<Organization> = ResourceModule::new();
/// Action types, reducer and selectors of projects.
pub const PROJECTS: ResourceModule<Project> = ResourceModule::new();
/// Action types, reducer and selectors of sites.
pub const SITES: ResourceModule<Site> = ResourceModule::new();
