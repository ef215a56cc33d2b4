//! The routing seam.

use crate::name::{NameError, NameParams};
use thiserror::Error;

/// Route of the dashboard landing page.
pub const DASHBOARD_ROUTE: &str = "dashboard";

/// Errors raised while resolving a route.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoutingError {
    /// No route with this name is declared
    #[error("unknown route `{0}`")]
    UnknownRoute(String),

    /// The route's path could not be built from the parameters
    #[error(transparent)]
    Name(#[from] NameError),
}

/// Resolves named routes to URL paths.
///
/// Besides [`DASHBOARD_ROUTE`], every resource kind has a detail route named
/// after the kind (`organization`, `project`, `site`) taking the parameters
/// of the kind's name pattern.
pub trait Router: Send + Sync {
    /// Path of `route` with `params` substituted, e.g. `/project/foo`.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::UnknownRoute`] for an undeclared route and
    /// [`RoutingError::Name`] when a parameter is missing or invalid.
    fn route_for(&self, route: &str, params: &NameParams) -> Result<String, RoutingError>;
}
