//! Selectors over the whole [`AppState`].

use crate::resources::{Organization, Project, Site};
use crate::routing::{RoutingState, current_route};
use crate::state::AppState;
use dashboard_state_api::selectors::{get_for_parent, get_for_url};
use dashboard_state_api::{Resource, ResourceState};

/// The instance of `T` the current URL points at.
#[must_use]
pub fn get_for_current_url<'a, T: Resource>(slice: &'a ResourceState<T>, routing: &RoutingState) -> Option<&'a T> {
    get_for_url(slice, &current_route(routing).url)
}

/// Projects owned by `organization`, in store order.
#[must_use]
pub fn get_for_organization<'a>(state: &'a AppState, organization: &str) -> Vec<&'a Project> {
    get_for_parent(&state.projects, organization)
}

/// Sites of `project`, in store order.
#[must_use]
pub fn get_for_project<'a>(state: &'a AppState, project: &str) -> Vec<&'a Site> {
    get_for_parent(&state.sites, project)
}

/// The organization the user is looking at.
///
/// Resolved from the URL, or through the project of a project or site URL.
#[must_use]
pub fn current_organization(state: &AppState) -> Option<&Organization> {
    get_for_current_url(&state.organizations, &state.routing).or_else(|| {
        let project = current_project(state)?;
        state.organizations.by_name.get(project.organization.as_str())
    })
}

/// The project the current URL points at.
#[must_use]
pub fn current_project(state: &AppState) -> Option<&Project> {
    get_for_current_url(&state.projects, &state.routing)
}

/// The site the current URL points at.
#[must_use]
pub fn current_site(state: &AppState) -> Option<&Site> {
    get_for_current_url(&state.sites, &state.routing)
}

/// Projects of the current organization; empty when there is none.
#[must_use]
pub fn get_for_current_organization(state: &AppState) -> Vec<&Project> {
    current_organization(state).map_or_else(Vec::new, |organization| {
        get_for_organization(state, organization.name.as_str())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{Routes, RoutingAction, RoutingReducer};
    use dashboard_state_core::reducer::Reducer;

    fn project(name: &str, organization: &str) -> Project {
        let mut project = Project::draft(organization, name);
        project.name = format!("project/{name}").into();
        project
    }

    fn state_at(url: &str) -> AppState {
        let mut site = Site::draft("project/foo", "Blog");
        site.name = "project/foo/site/blog".into();

        let mut state = AppState {
            organizations: ResourceState::from_items([
                Organization {
                    name: "organization/acme".into(),
                    display_name: "Acme".to_string(),
                },
                Organization {
                    name: "organization/globex".into(),
                    display_name: "Globex".to_string(),
                },
            ]),
            projects: ResourceState::from_items([
                project("foo", "organization/acme"),
                project("bar", "organization/globex"),
                project("baz", "organization/acme"),
            ]),
            sites: ResourceState::from_items([site]),
            ..AppState::default()
        };
        let _ = RoutingReducer.reduce(&mut state.routing, RoutingAction::push(url), &Routes::standard());
        state
    }

    fn names<T: Resource>(items: &[&T]) -> Vec<String> {
        items.iter().map(|item| item.name().to_string()).collect()
    }

    #[test]
    fn projects_of_an_organization() {
        let state = state_at("/");
        assert_eq!(
            names(&get_for_organization(&state, "organization/acme")),
            vec!["project/foo", "project/baz"]
        );
        assert!(get_for_organization(&state, "organization/initech").is_empty());
        assert_eq!(names(&get_for_project(&state, "project/foo")), vec!["project/foo/site/blog"]);
    }

    #[test]
    fn current_resources_follow_the_url() {
        let state = state_at("/project/foo/site/blog/edit");
        assert_eq!(current_site(&state).map(|s| s.display_name.as_str()), Some("Blog"));
        assert_eq!(current_project(&state).map(|p| p.name.as_str()), Some("project/foo"));
        assert_eq!(
            current_organization(&state).map(|o| o.name.as_str()),
            Some("organization/acme")
        );
        assert_eq!(
            names(&get_for_current_organization(&state)),
            vec!["project/foo", "project/baz"]
        );
    }

    #[test]
    fn organization_urls_resolve_directly() {
        let state = state_at("/organization/globex");
        assert_eq!(
            current_organization(&state).map(|o| o.display_name.as_str()),
            Some("Globex")
        );
        assert_eq!(current_project(&state), None);
        assert_eq!(names(&get_for_current_organization(&state)), vec!["project/bar"]);
    }

    #[test]
    fn dashboard_has_no_current_resource() {
        let state = state_at("/");
        assert_eq!(current_site(&state), None);
        assert_eq!(current_organization(&state), None);
        assert!(get_for_current_organization(&state).is_empty());
    }
}
