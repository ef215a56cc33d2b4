//! Dashboard demo binary.
//!
//! Drives the dashboard store through a typical session: load the
//! organizations and their projects, open a project, create one through its
//! form, delete it again, then print the resulting state.
//!
//! # Running
//!
//! ```bash
//! # against the bundled in-memory backend
//! cargo run -p dashboard-app
//!
//! # against a real backend, exporting metrics
//! DASHBOARD_API_URL=http://localhost:8080 \
//! DASHBOARD_METRICS_ADDR=0.0.0.0:9090 \
//! cargo run -p dashboard-app
//! ```
//!
//! See [`dashboard_app::config`] for every variable.

#![allow(missing_docs)]

use anyhow::Context;
use dashboard_app::forms::{FormStatus, FormsAction, names};
use dashboard_app::resources::{Organization, Project, Site};
use dashboard_app::routing::{RoutingAction, current_route};
use dashboard_app::transport::{HttpTransport, InMemoryBackend};
use dashboard_app::{AppAction, AppConfig, AppEnvironment, AppStore, build_store, selectors};
use dashboard_state_api::selectors::count_all;
use dashboard_state_api::{Delegate, ListRequest, ResourceAction, Transport};
use dashboard_state_core::environment::SystemClock;
use dashboard_state_runtime::metrics::MetricsServer;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const STEP_TIMEOUT: Duration = Duration::from_secs(15);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_new(&config.log_filter).context("invalid DASHBOARD_LOG")?)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting dashboard");

    let _metrics = match config.metrics_addr {
        Some(addr) => {
            let mut server = MetricsServer::new(addr);
            server.start()?;
            tracing::info!(%addr, "Prometheus metrics available at /metrics");
            Some(server)
        },
        None => None,
    };

    let transport: Arc<dyn Transport> = match &config.api_url {
        Some(url) => {
            tracing::info!(%url, "Using HTTP backend");
            Arc::new(HttpTransport::new(url.as_str(), config.request_timeout)?)
        },
        None => {
            tracing::info!("DASHBOARD_API_URL unset, using the in-memory backend");
            Arc::new(demo_backend()?)
        },
    };

    let env = AppEnvironment::new(transport, config.orchestrator(), Arc::new(SystemClock));
    let store = build_store(env);

    run_session(&store).await?;

    let snapshot = store.snapshot().await?;
    tracing::debug!(snapshot = %snapshot, "Final state");

    store.shutdown(Duration::from_secs(10)).await?;
    tracing::info!("Clean shutdown complete");

    Ok(())
}

fn demo_backend() -> anyhow::Result<InMemoryBackend> {
    let backend = InMemoryBackend::new().with_latency(Duration::from_millis(20));

    backend.seed([Organization {
        name: "organization/acme".into(),
        display_name: "Acme".to_string(),
    }])?;

    let mut website = Project::draft("organization/acme", "Website");
    website.name = "project/website".into();
    backend.seed([website])?;

    let mut blog = Site::draft("project/website", "Blog");
    blog.name = "project/website/site/blog".into();
    blog.primary_domain = Some("blog.acme.test".to_string());
    backend.seed([blog])?;

    Ok(backend)
}

async fn step(store: &AppStore, action: impl Into<AppAction>) -> anyhow::Result<()> {
    let mut handle = store.send(action.into()).await?;
    handle.wait_with_timeout(STEP_TIMEOUT).await?;
    Ok(())
}

async fn run_session(store: &AppStore) -> anyhow::Result<()> {
    step(store, ResourceAction::<Organization>::list()).await?;
    step(
        store,
        ResourceAction::<Project>::list_with(ListRequest::for_parent("organization/acme")),
    )
    .await?;
    tracing::info!(
        organizations = store.state(|s| count_all(&s.organizations)).await,
        projects = store.state(|s| count_all(&s.projects)).await,
        "Loaded"
    );

    step(store, AppAction::Routing(RoutingAction::push("/project/website"))).await?;
    step(
        store,
        ResourceAction::<Site>::list_with(ListRequest::for_parent("project/website")),
    )
    .await?;
    let (project, sites) = store
        .state(|s| {
            (
                selectors::current_project(s).map(|p| p.display_name.clone()),
                selectors::get_for_project(s, "project/website").len(),
            )
        })
        .await;
    tracing::info!(?project, sites, "Opened project");

    let draft = serde_json::to_value(Project::draft("organization/acme", "Docs"))?;
    step(store, AppAction::Forms(FormsAction::submit(names::PROJECT, draft))).await?;

    let created = match store.state(|s| s.forms.status(names::PROJECT).cloned()).await {
        Some(FormStatus::Succeeded { name }) => name,
        other => anyhow::bail!("project form did not succeed: {other:?}"),
    };
    tracing::info!(name = %created, "Created project");

    let docs = store
        .state(|s| s.projects.by_name.get(created.as_str()).cloned())
        .await
        .with_context(|| format!("{created} missing after create"))?;
    // The success toast is the last delegate of a destroy; its auto-dismiss
    // timer keeps running in the background.
    store
        .send_and_wait_for(
            ResourceAction::destroy(docs).into(),
            |action| {
                matches!(
                    action,
                    AppAction::Projects(ResourceAction::Delegate(Delegate::ShowToast(_)))
                )
            },
            STEP_TIMEOUT,
        )
        .await?;

    let (route, toasts) = store
        .state(|s| {
            (
                current_route(&s.routing).url.clone(),
                s.ui.toasts.iter().map(|t| t.toast.message.clone()).collect::<Vec<_>>(),
            )
        })
        .await;
    tracing::info!(%route, ?toasts, "Deleted project");

    Ok(())
}
