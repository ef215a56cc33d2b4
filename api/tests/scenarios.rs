//! End-to-end flows through a store: intent, transport call, outcome,
//! delegates.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod common;

use common::{Project, project_store};
use dashboard_state_api::selectors::{count_all, get_by_name, get_for_url};
use dashboard_state_api::{
    ApiError, Delegate, Intent, ListRequest, ResourceAction, StatusCode, TransportError,
};
use dashboard_state_testing::MockTransport;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

const TIMEOUT: Duration = Duration::from_secs(2);

/// Collect fed-back actions until a toast arrives.
async fn until_toast(rx: &mut broadcast::Receiver<ResourceAction<Project>>) -> Vec<ResourceAction<Project>> {
    let mut seen = Vec::new();
    tokio::time::timeout(TIMEOUT, async {
        loop {
            let action = rx.recv().await.unwrap();
            let done = matches!(action, ResourceAction::Delegate(Delegate::ShowToast(_)));
            seen.push(action);
            if done {
                break;
            }
        }
    })
    .await
    .unwrap();
    seen
}

#[tokio::test]
async fn list_success_fills_the_store_in_server_order() {
    let transport = Arc::new(MockTransport::new());
    transport.respond(
        "ListProjects",
        Ok(json!({"projects": [
            {"name": "project/foo", "display_name": "Foo"},
            {"name": "project/bar", "display_name": "Bar"},
        ]})),
    );
    let store = project_store(Arc::clone(&transport), vec![]);

    let mut handle = store.send(ResourceAction::list()).await.unwrap();
    assert!(store.state(|s| s.loading.list).await);
    handle.wait_with_timeout(TIMEOUT).await.unwrap();

    store
        .state(|s| {
            assert!(!s.loading.list);
            assert_eq!(count_all(s), 2);
            let names: Vec<&str> = s.by_name.keys().map(|k| k.as_str()).collect();
            assert_eq!(names, vec!["project/foo", "project/bar"]);
            assert_eq!(get_by_name(s, "project/bar").unwrap().display_name, "Bar");
            assert_eq!(get_for_url(s, "/project/foo/settings").unwrap().display_name, "Foo");
            assert_eq!(get_for_url(s, "/organization/acme"), None);
        })
        .await;
}

#[tokio::test]
async fn identical_overlapping_lists_invoke_the_transport_once() {
    let transport = Arc::new(MockTransport::new());
    transport.respond(
        "ListProjects",
        Ok(json!({"projects": [{"name": "project/foo", "display_name": "Foo"}]})),
    );
    transport.hold();
    let store = project_store(Arc::clone(&transport), vec![]);
    let mut outcomes = store.subscribe_actions();

    let mut first = store.send(ResourceAction::list()).await.unwrap();
    let mut second = store.send(ResourceAction::list()).await.unwrap();
    assert_eq!(second.pending(), 0);
    second.wait_with_timeout(TIMEOUT).await.unwrap();
    assert_eq!(store.environment().in_flight(), 1);

    transport.release();
    first.wait_with_timeout(TIMEOUT).await.unwrap();

    assert_eq!(transport.call_count("ListProjects"), 1);
    assert_eq!(store.environment().in_flight(), 0);
    assert!(matches!(outcomes.try_recv(), Ok(ResourceAction::ListSucceeded { .. })));
    assert!(outcomes.try_recv().is_err());
    store.state(|s| assert_eq!(count_all(s), 1)).await;
}

#[tokio::test]
async fn different_list_parameters_are_not_deduplicated() {
    let transport = Arc::new(MockTransport::new());
    transport.respond("ListProjects", Ok(json!({"projects": []})));
    transport.hold();
    let store = project_store(Arc::clone(&transport), vec![]);

    let mut first = store.send(ResourceAction::list()).await.unwrap();
    let mut second = store
        .send(ResourceAction::list_with(ListRequest::for_parent("organization/acme")))
        .await
        .unwrap();

    transport.release();
    first.wait_with_timeout(TIMEOUT).await.unwrap();
    second.wait_with_timeout(TIMEOUT).await.unwrap();
    assert_eq!(transport.call_count("ListProjects"), 2);
}

#[tokio::test]
async fn list_after_completion_invokes_again() {
    let transport = Arc::new(MockTransport::new());
    transport.respond("ListProjects", Ok(json!({"projects": []})));
    let store = project_store(Arc::clone(&transport), vec![]);

    for _ in 0..2 {
        let mut handle = store.send(ResourceAction::list()).await.unwrap();
        handle.wait_with_timeout(TIMEOUT).await.unwrap();
    }
    assert_eq!(transport.call_count("ListProjects"), 2);
}

#[tokio::test]
async fn destroy_failure_keeps_the_item_and_shows_a_danger_toast() {
    let transport = Arc::new(MockTransport::new());
    transport.respond("DeleteProject", Err(TransportError::unavailable("backend down")));
    let foo = Project::new("project/foo", "Foo");
    let store = project_store(Arc::clone(&transport), vec![foo.clone()]);
    let mut rx = store.subscribe_actions();

    store.send(ResourceAction::destroy(foo)).await.unwrap();
    let seen = until_toast(&mut rx).await;

    let Some(ResourceAction::Delegate(Delegate::ShowToast(toast))) = seen.last() else {
        panic!("expected a toast, got {seen:?}");
    };
    assert_eq!(toast.intent, Intent::Danger);
    assert_eq!(toast.message, "Project delete failed");
    assert!(!seen
        .iter()
        .any(|a| matches!(a, ResourceAction::Delegate(Delegate::Navigate { .. }))));

    store
        .state(|s| {
            assert!(get_by_name(s, "project/foo").is_some());
            assert!(!s.loading.destroy);
            assert!(matches!(
                s.last_error,
                Some(ApiError::Transport {
                    code: StatusCode::Unavailable,
                    ..
                })
            ));
        })
        .await;
}

#[tokio::test]
async fn destroy_success_removes_the_item_and_navigates_to_the_parent() {
    let transport = Arc::new(MockTransport::new());
    transport.respond("DeleteProject", Ok(json!({})));
    let foo = Project::new("project/foo", "Foo").in_organization("organization/acme");
    let bar = Project::new("project/bar", "Bar");
    let store = project_store(Arc::clone(&transport), vec![foo.clone(), bar]);
    let mut rx = store.subscribe_actions();

    store.send(ResourceAction::destroy(foo)).await.unwrap();
    let seen = until_toast(&mut rx).await;

    let navigate = seen
        .iter()
        .position(|a| matches!(a, ResourceAction::Delegate(Delegate::Navigate { path }) if path == "/organization/acme"))
        .expect("navigation to the parent");
    let toast = seen.len() - 1;
    assert!(navigate < toast);
    let Some(ResourceAction::Delegate(Delegate::ShowToast(toast))) = seen.last() else {
        panic!("expected a toast, got {seen:?}");
    };
    assert_eq!(toast.intent, Intent::Success);
    assert_eq!(toast.icon.as_deref(), Some("tick-circle"));

    let calls = transport.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].service, "dashboard.projects.v1.ProjectsService");
    assert_eq!(calls[0].data, json!({"name": "project/foo"}));

    store
        .state(|s| {
            assert_eq!(get_by_name(s, "project/foo"), None);
            assert_eq!(count_all(s), 1);
            assert!(!s.loading.destroy);
        })
        .await;
}

#[tokio::test]
async fn top_level_destroy_navigates_to_the_dashboard() {
    let transport = Arc::new(MockTransport::new());
    transport.respond("DeleteProject", Ok(json!({})));
    let foo = Project::new("project/foo", "Foo");
    let store = project_store(Arc::clone(&transport), vec![foo.clone()]);
    let mut rx = store.subscribe_actions();

    store.send(ResourceAction::destroy(foo)).await.unwrap();
    let seen = until_toast(&mut rx).await;

    assert!(seen
        .iter()
        .any(|a| matches!(a, ResourceAction::Delegate(Delegate::Navigate { path }) if path == "/")));
}

#[tokio::test]
async fn validation_errors_reach_the_form() {
    let transport = Arc::new(MockTransport::new());
    transport.respond(
        "CreateProject",
        Err(TransportError::new(StatusCode::InvalidArgument, "invalid project")
            .with_violation("display_name", "must not be empty")),
    );
    let store = project_store(Arc::clone(&transport), vec![]);

    let reported = store
        .send_and_wait_for(
            ResourceAction::submit("new-project", Project::new("", "")),
            |a| matches!(a, ResourceAction::Delegate(Delegate::FormSubmitted { .. })),
            TIMEOUT,
        )
        .await
        .unwrap();

    let ResourceAction::Delegate(Delegate::FormSubmitted { form, outcome }) = reported else {
        unreachable!();
    };
    assert_eq!(form.as_str(), "new-project");
    let dashboard_state_api::FormOutcome::Failed { error } = outcome else {
        panic!("expected a failed submission");
    };
    assert_eq!(
        error.field_errors().and_then(|f| f.get("display_name")).map(String::as_str),
        Some("must not be empty")
    );
    assert_eq!(transport.call_count("CreateProject"), 1);
    store.state(|s| assert_eq!(count_all(s), 0)).await;
}

#[tokio::test]
async fn rename_through_update_keeps_position() {
    let transport = Arc::new(MockTransport::new());
    transport.respond(
        "UpdateProject",
        Ok(json!({"name": "project/renamed", "display_name": "Renamed"})),
    );
    let store = project_store(
        Arc::clone(&transport),
        vec![
            Project::new("project/a", "A"),
            Project::new("project/b", "B"),
            Project::new("project/c", "C"),
        ],
    );

    let mut handle = store
        .send(ResourceAction::rename("project/b", Project::new("project/renamed", "Renamed")))
        .await
        .unwrap();
    handle.wait_with_timeout(TIMEOUT).await.unwrap();

    store
        .state(|s| {
            let names: Vec<&str> = s.by_name.keys().map(|k| k.as_str()).collect();
            assert_eq!(names, vec!["project/a", "project/renamed", "project/c"]);
        })
        .await;
}
