//! End-to-end sessions of the dashboard store against the in-memory backend.

#![allow(clippy::unwrap_used, clippy::panic)]

use dashboard_app::forms::{FormStatus, FormsAction, names};
use dashboard_app::resources::{Organization, Project, Site};
use dashboard_app::routing::{RoutingAction, current_route};
use dashboard_app::transport::InMemoryBackend;
use dashboard_app::ui::UiEnvironment;
use dashboard_app::{AppAction, AppEnvironment, AppStore, build_store, selectors};
use dashboard_state_api::selectors::{count_all, get_by_name, last_error};
use dashboard_state_api::{
    Intent, ListRequest, OrchestratorConfig, ResourceAction, ResourceKind, Transport, TransportError,
};
use dashboard_state_runtime::retry::RetryPolicy;
use dashboard_state_testing::helpers::init_tracing;
use dashboard_state_testing::{MockTransport, test_clock};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(2);

fn store_with(transport: Arc<dyn Transport>, retry: RetryPolicy) -> AppStore {
    init_tracing();
    let clock = Arc::new(test_clock());
    let env = AppEnvironment::new(transport, OrchestratorConfig::default().with_retry(retry), clock.clone())
        .with_ui(UiEnvironment::new(clock).with_toast_timeout(None));
    build_store(env)
}

fn backend() -> Arc<InMemoryBackend> {
    let backend = InMemoryBackend::new();
    backend
        .seed([Organization {
            name: "organization/acme".into(),
            display_name: "Acme".to_string(),
        }])
        .unwrap();

    let mut website = Project::draft("organization/acme", "Website");
    website.name = "project/website".into();
    backend.seed([website]).unwrap();

    let mut blog = Site::draft("project/website", "Blog");
    blog.name = "project/website/site/blog".into();
    backend.seed([blog]).unwrap();

    Arc::new(backend)
}

async fn run(store: &AppStore, action: impl Into<AppAction>) {
    let mut handle = store.send(action.into()).await.unwrap();
    handle.wait_with_timeout(TIMEOUT).await.unwrap();
}

async fn load(store: &AppStore) {
    run(store, ResourceAction::<Organization>::list()).await;
    run(store, ResourceAction::<Project>::list()).await;
    run(store, ResourceAction::<Site>::list_with(ListRequest::for_parent("project/website"))).await;
}

#[tokio::test]
async fn test_form_submission_creates_project() {
    let backend = backend();
    let store = store_with(backend.clone(), RetryPolicy::none());
    load(&store).await;

    let values = serde_json::to_value(Project::draft("organization/acme", "Docs")).unwrap();
    run(&store, FormsAction::submit(names::PROJECT, values)).await;

    let (status, docs, count) = store
        .state(|s| {
            (
                s.forms.status(names::PROJECT).cloned(),
                get_by_name(&s.projects, "project/docs").cloned(),
                count_all(&s.projects),
            )
        })
        .await;

    assert_eq!(
        status,
        Some(FormStatus::Succeeded {
            name: "project/docs".into()
        })
    );
    assert_eq!(docs.unwrap().display_name, "Docs");
    assert_eq!(count, 2);
    assert_eq!(backend.count(ResourceKind::Project), 2);
}

#[tokio::test]
async fn test_form_submission_updates_existing_project() {
    let backend = backend();
    let store = store_with(backend.clone(), RetryPolicy::none());
    load(&store).await;

    let mut website = store
        .state(|s| get_by_name(&s.projects, "project/website").cloned())
        .await
        .unwrap();
    website.display_name = "Marketing site".to_string();
    run(&store, FormsAction::submit(names::PROJECT, serde_json::to_value(&website).unwrap())).await;

    let stored = store
        .state(|s| get_by_name(&s.projects, "project/website").cloned())
        .await
        .unwrap();
    assert_eq!(stored.display_name, "Marketing site");
    assert_eq!(
        backend.get(ResourceKind::Project, "project/website").unwrap()["display_name"],
        "Marketing site"
    );
}

#[tokio::test]
async fn test_rejected_form_keeps_field_errors() {
    let backend = backend();
    let store = store_with(backend.clone(), RetryPolicy::none());
    load(&store).await;

    let values = serde_json::to_value(Project::draft("organization/missing", " ")).unwrap();
    run(&store, FormsAction::submit(names::PROJECT, values)).await;

    let (status, error, creating) = store
        .state(|s| {
            (
                s.forms.status(names::PROJECT).cloned(),
                last_error(&s.projects).cloned(),
                s.projects.loading.create,
            )
        })
        .await;

    let Some(FormStatus::Failed { message, field_errors }) = status else {
        panic!("expected a failed submission, got {status:?}");
    };
    assert_eq!(message, "invalid project");
    assert_eq!(field_errors["display_name"], "must not be empty");
    assert_eq!(field_errors["organization"], "organization/missing does not exist");
    assert!(error.is_some());
    assert!(!creating);
    assert_eq!(backend.count(ResourceKind::Project), 1);
}

#[tokio::test]
async fn test_destroying_project_redirects_and_clears_sites() {
    let backend = backend();
    let store = store_with(backend.clone(), RetryPolicy::none());
    load(&store).await;
    run(&store, RoutingAction::push("/project/website")).await;

    assert_eq!(
        store
            .state(|s| selectors::current_project(s).map(|p| p.display_name.clone()))
            .await
            .as_deref(),
        Some("Website")
    );
    assert_eq!(store.state(|s| count_all(&s.sites)).await, 1);

    let website = store
        .state(|s| get_by_name(&s.projects, "project/website").cloned())
        .await
        .unwrap();
    run(&store, ResourceAction::destroy(website)).await;

    store
        .state(|s| {
            let route = current_route(&s.routing);
            assert_eq!(route.url, "/organization/acme");
            assert_eq!(route.name.as_deref(), Some("organization"));

            assert_eq!(count_all(&s.projects), 0);
            assert_eq!(count_all(&s.sites), 0);
            assert_eq!(count_all(&s.organizations), 1);

            assert_eq!(s.ui.toasts.len(), 1);
            assert_eq!(s.ui.toasts[0].toast.message, "Project deleted");
            assert_eq!(s.ui.toasts[0].toast.intent, Intent::Success);
        })
        .await;
    assert_eq!(backend.count(ResourceKind::Project), 0);
}

#[tokio::test]
async fn test_failed_destroy_shows_danger_toast() {
    let store = store_with(backend(), RetryPolicy::none());
    load(&store).await;

    let mut ghost = Project::draft("organization/acme", "Ghost");
    ghost.name = "project/ghost".into();
    run(&store, ResourceAction::destroy(ghost)).await;

    store
        .state(|s| {
            assert_eq!(s.ui.toasts.len(), 1);
            assert_eq!(s.ui.toasts[0].toast.message, "Project delete failed");
            assert_eq!(s.ui.toasts[0].toast.intent, Intent::Danger);
            assert!(last_error(&s.projects).is_some());
            assert_eq!(current_route(&s.routing).url, "/");
        })
        .await;
}

#[tokio::test]
async fn test_snapshot_restores_session() {
    let store = store_with(backend(), RetryPolicy::none());
    load(&store).await;
    run(&store, RoutingAction::push("/project/website/site/blog")).await;

    let before = store.state(Clone::clone).await;
    let snapshot = store.snapshot().await.unwrap();

    let website = store
        .state(|s| get_by_name(&s.projects, "project/website").cloned())
        .await
        .unwrap();
    run(&store, ResourceAction::destroy(website)).await;
    assert_ne!(store.state(Clone::clone).await, before);

    store.restore(snapshot).await.unwrap();
    let after = store.state(Clone::clone).await;

    assert_eq!(after, before);
    assert_eq!(
        selectors::current_site(&after).map(|s| s.display_name.as_str()),
        Some("Blog")
    );
}

#[tokio::test]
async fn test_identical_lists_share_one_call() {
    let transport = Arc::new(MockTransport::new());
    transport.respond(
        "ListOrganizations",
        Ok(json!({ "organizations": [{ "name": "organization/acme", "display_name": "Acme" }] })),
    );
    let store = store_with(transport.clone(), RetryPolicy::none());

    transport.hold();
    let mut first = store.send(ResourceAction::<Organization>::list().into()).await.unwrap();
    let mut second = store.send(ResourceAction::<Organization>::list().into()).await.unwrap();
    assert_eq!(second.pending(), 0);
    assert_eq!(store.environment().api.in_flight(), 1);

    transport.release();
    first.wait_with_timeout(TIMEOUT).await.unwrap();
    second.wait_with_timeout(TIMEOUT).await.unwrap();

    assert_eq!(transport.call_count("ListOrganizations"), 1);
    assert_eq!(store.environment().api.in_flight(), 0);
    store
        .state(|s| {
            assert_eq!(count_all(&s.organizations), 1);
            assert!(!s.organizations.loading.list);
        })
        .await;
}

#[tokio::test]
async fn test_transient_list_failure_is_retried() {
    let transport = Arc::new(MockTransport::new());
    transport
        .respond_once("ListProjects", Err(TransportError::unavailable("backend restarting")))
        .respond("ListProjects", Ok(json!({ "projects": [] })));
    let retry = RetryPolicy::builder()
        .max_retries(2)
        .initial_delay(Duration::from_millis(1))
        .build();
    let store = store_with(transport.clone(), retry);

    run(&store, ResourceAction::<Project>::list()).await;

    assert_eq!(transport.call_count("ListProjects"), 2);
    store
        .state(|s| {
            assert!(last_error(&s.projects).is_none());
            assert!(!s.projects.loading.list);
        })
        .await;
}

#[tokio::test]
async fn test_store_drains_on_shutdown() {
    let store = store_with(backend(), RetryPolicy::none());
    let _ = store.send(ResourceAction::<Organization>::list().into()).await.unwrap();

    store.shutdown(TIMEOUT).await.unwrap();

    assert_eq!(store.state(|s| count_all(&s.organizations)).await, 1);
    assert!(store.send(ResourceAction::<Organization>::list().into()).await.is_err());
}
