//! The routing slice and the dashboard's route table.
//!
//! Routes are named. `dashboard` is the landing page (`/`); every resource
//! kind has a detail route named after it whose path is the resource name
//! (`/project/foo`, `/project/foo/site/bar`). Navigation happens by pushing a
//! path; the slice resolves it against the table into the current [`Route`].

use dashboard_state_api::routing::DASHBOARD_ROUTE;
use dashboard_state_api::{NameError, NameParams, NamePattern, Resource, ResourceKind, Router, RoutingError};
use dashboard_state_core::SmallVec;
use dashboard_state_core::effect::Effect;
use dashboard_state_core::reducer::Reducer;
use serde::{Deserialize, Serialize};

/// What a resource route shows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RouteAction {
    /// The detail page
    #[default]
    View,
    /// The edit form
    Edit,
}

impl RouteAction {
    const fn suffix(self) -> &'static str {
        match self {
            Self::View => "",
            Self::Edit => "/edit",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
struct RouteEntry {
    name: String,
    /// `None` for the root path
    pattern: Option<NamePattern>,
}

/// The named routes of the application.
#[derive(Clone, Debug, PartialEq)]
pub struct Routes {
    entries: Vec<RouteEntry>,
}

impl Default for Routes {
    fn default() -> Self {
        Self::standard()
    }
}

impl Routes {
    /// The dashboard route plus one detail route per resource kind.
    #[must_use]
    pub fn standard() -> Self {
        let mut entries = vec![RouteEntry {
            name: DASHBOARD_ROUTE.to_string(),
            pattern: None,
        }];
        entries.extend(ResourceKind::ALL.into_iter().map(|kind| RouteEntry {
            name: kind.as_str().to_string(),
            pattern: Some(kind.name_pattern().clone()),
        }));
        Self { entries }
    }

    /// Declare an additional route such as `settings` → `settings/:section`.
    ///
    /// A route with the same name is replaced.
    ///
    /// # Errors
    ///
    /// Returns [`NameError::InvalidPattern`] if `pattern` does not parse.
    pub fn with_route(mut self, name: impl Into<String>, pattern: &str) -> Result<Self, NameError> {
        let entry = RouteEntry {
            name: name.into(),
            pattern: Some(NamePattern::parse(pattern)?),
        };
        self.entries.retain(|existing| existing.name != entry.name);
        self.entries.push(entry);
        Ok(self)
    }

    /// Path of the detail (or edit) page of `resource`.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::Name`] if the resource's name does not fit its
    /// kind's pattern.
    pub fn route_for_resource<T: Resource>(&self, resource: &T, action: RouteAction) -> Result<String, RoutingError> {
        let params = T::KIND.name_pattern().parse_name(resource.name().as_str())?;
        let path = self.route_for(T::KIND.as_str(), &params)?;
        Ok(format!("{path}{}", action.suffix()))
    }

    /// Resolve `url` to the most specific matching route.
    ///
    /// Unmatched URLs resolve to a route without a name and without
    /// parameters.
    #[must_use]
    pub fn resolve(&self, url: &str) -> Route {
        let path = url.split(['?', '#']).next().unwrap_or_default();
        if path.is_empty() || path == "/" {
            return Route {
                url: url.to_string(),
                name: Some(DASHBOARD_ROUTE.to_string()),
                params: NameParams::new(),
            };
        }

        let matched = self
            .entries
            .iter()
            .filter_map(|entry| {
                let pattern = entry.pattern.as_ref()?;
                let prefix = pattern.match_prefix(path)?;
                let params = pattern.parse_name(prefix.as_str()).ok()?;
                Some((pattern.segments().len(), entry, params))
            })
            .max_by_key(|(specificity, _, _)| *specificity);

        match matched {
            Some((_, entry, params)) => Route {
                url: url.to_string(),
                name: Some(entry.name.clone()),
                params,
            },
            None => Route {
                url: url.to_string(),
                name: None,
                params: NameParams::new(),
            },
        }
    }
}

impl Router for Routes {
    fn route_for(&self, route: &str, params: &NameParams) -> Result<String, RoutingError> {
        let entry = self
            .entries
            .iter()
            .find(|entry| entry.name == route)
            .ok_or_else(|| RoutingError::UnknownRoute(route.to_string()))?;

        match &entry.pattern {
            None => Ok("/".to_string()),
            Some(pattern) => Ok(format!("/{}", pattern.build_name(params)?)),
        }
    }
}

/// A resolved location.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// The URL as pushed
    pub url: String,
    /// Name of the matched route
    pub name: Option<String>,
    /// Parameters captured by the matched route
    pub params: NameParams,
}

impl Default for Route {
    fn default() -> Self {
        Self {
            url: "/".to_string(),
            name: Some(DASHBOARD_ROUTE.to_string()),
            params: NameParams::new(),
        }
    }
}

/// Routing slice.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingState {
    /// Where the application currently is
    pub current: Route,
    /// Previously visited URLs, most recent last
    pub history: Vec<String>,
}

/// Routing actions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RoutingAction {
    /// Navigate to `path`
    Push {
        /// Target URL path
        path: String,
    },
    /// Return to the previous location
    Back,
}

impl RoutingAction {
    /// Navigate to `path`.
    #[must_use]
    pub fn push(path: impl Into<String>) -> Self {
        Self::Push { path: path.into() }
    }
}

/// The current route of the routing slice.
#[must_use]
pub const fn current_route(state: &RoutingState) -> &Route {
    &state.current
}

/// Reducer of the routing slice.
#[derive(Clone, Copy, Debug, Default)]
pub struct RoutingReducer;

impl Reducer for RoutingReducer {
    type State = RoutingState;
    type Action = RoutingAction;
    type Environment = Routes;

    fn reduce(
        &self,
        state: &mut RoutingState,
        action: RoutingAction,
        routes: &Routes,
    ) -> SmallVec<[Effect<RoutingAction>; 4]> {
        match action {
            RoutingAction::Push { path } => {
                if path != state.current.url {
                    let route = routes.resolve(&path);
                    tracing::debug!(url = %route.url, route = ?route.name, "Navigating");
                    let previous = std::mem::replace(&mut state.current, route);
                    state.history.push(previous.url);
                }
            },
            RoutingAction::Back => {
                if let Some(url) = state.history.pop() {
                    tracing::debug!(url = %url, "Navigating back");
                    state.current = routes.resolve(&url);
                }
            },
        }
        SmallVec::new()
    }
}
