//! # Dashboard App
//!
//! The dashboard's application state built on the resource-state engine:
//!
//! - [`resources`]: the organization, project and site payloads
//! - [`state`]: the root [`AppState`] / [`AppAction`]
//! - [`reducer`]: the root reducer composing every slice
//! - [`routing`], [`ui`], [`forms`]: the supporting slices
//! - [`selectors`]: queries spanning several slices
//! - [`transport`]: an in-memory backend and an HTTP transport
//! - [`config`]: environment configuration of the binary
//!
//! # Example
//!
//! ```
//! use dashboard_app::resources::Organization;
//! use dashboard_app::transport::InMemoryBackend;
//! use dashboard_app::{AppAction, AppConfig, AppEnvironment, build_store};
//! use dashboard_state_api::ResourceAction;
//! use dashboard_state_core::environment::SystemClock;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = Arc::new(InMemoryBackend::new());
//! backend.seed([Organization {
//!     name: "organization/acme".into(),
//!     display_name: "Acme".to_string(),
//! }])?;
//!
//! let env = AppEnvironment::new(backend, AppConfig::default().orchestrator(), Arc::new(SystemClock));
//! let store = build_store(env);
//!
//! let mut handle = store
//!     .send(AppAction::Organizations(ResourceAction::list()))
//!     .await?;
//! handle.wait_with_timeout(Duration::from_secs(1)).await?;
//!
//! assert_eq!(store.state(|s| s.organizations.by_name.len()).await, 1);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod environment;
pub mod forms;
pub mod reducer;
pub mod resources;
pub mod routing;
pub mod selectors;
pub mod state;
pub mod transport;
pub mod ui;

pub use config::{AppConfig, ConfigError};
pub use environment::AppEnvironment;
pub use reducer::AppReducer;
pub use state::{AppAction, AppState};

use dashboard_state_runtime::Store;

/// The dashboard store.
pub type AppStore = Store<AppState, AppAction, AppEnvironment, AppReducer>;

/// A store with an empty state around `env`.
#[must_use]
pub fn build_store(env: AppEnvironment) -> AppStore {
    Store::new(AppState::default(), AppReducer::new(), env)
}
