//! Tests for #[derive(Resource)] macro

use dashboard_state_api::{Resource, ResourceKind, ResourceName};
use serde::{Deserialize, Serialize};

#[derive(Resource, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[resource(kind = "organization")]
struct Organization {
    name: ResourceName,
    display_name: String,
}

#[derive(Resource, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[resource(kind = "project")]
struct Project {
    #[resource(name)]
    id: ResourceName,
    #[resource(parent)]
    organization: ResourceName,
}

#[derive(Resource, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[resource(kind = "site")]
struct Site {
    name: ResourceName,
    #[resource(parent)]
    project: Option<ResourceName>,
}

#[test]
fn test_kind_constant() {
    assert_eq!(Organization::KIND, ResourceKind::Organization);
    assert_eq!(Project::KIND, ResourceKind::Project);
    assert_eq!(Site::KIND, ResourceKind::Site);
}

#[test]
fn test_default_name_field() {
    let org = Organization {
        name: "organization/acme".into(),
        display_name: "Acme".to_string(),
    };
    assert_eq!(org.name().as_str(), "organization/acme");
    assert_eq!(org.parent(), None);
    assert!(!org.is_new());
}

#[test]
fn test_marked_name_field() {
    let project = Project {
        id: ResourceName::unset(),
        organization: "organization/acme".into(),
    };
    assert!(project.is_new());
    assert_eq!(project.parent().map(ResourceName::as_str), Some("organization/acme"));
}

#[test]
fn test_unset_parent_is_none() {
    let project = Project {
        id: "project/foo".into(),
        organization: ResourceName::unset(),
    };
    assert_eq!(project.parent(), None);
}

#[test]
fn test_optional_parent() {
    let site = Site {
        name: "project/foo/site/bar".into(),
        project: Some("project/foo".into()),
    };
    assert_eq!(site.parent().map(ResourceName::as_str), Some("project/foo"));

    let orphan = Site {
        name: "project/foo/site/bar".into(),
        project: None,
    };
    assert_eq!(orphan.parent(), None);
}
