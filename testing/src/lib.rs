//! # Dashboard State Testing
//!
//! Testing utilities and helpers for the dashboard state engine.
//!
//! This crate provides:
//! - Mock implementations of the environment seams (clock, transport, router)
//! - [`ReducerTest`], a Given-When-Then harness for reducers
//! - Helpers executing effects without a store
//! - proptest strategies for resource names
//!
//! ## Example
//!
//! ```ignore
//! use dashboard_state_testing::{MockTransport, RecordingRouter};
//!
//! #[tokio::test]
//! async fn lists_projects() {
//!     let transport = Arc::new(MockTransport::new());
//!     transport.respond("ListProjects", Ok(json!({"projects": [{"name": "project/foo"}]})));
//!
//!     let orchestrator = RequestOrchestrator::new(transport.clone(), Arc::new(RecordingRouter::new()));
//!     let store = Store::new(ResourceState::<Project>::default(), ResourceReducer::new(), orchestrator);
//!
//!     let mut handle = store.send(ResourceAction::list()).await?;
//!     handle.wait().await;
//!     assert_eq!(store.state(|s| s.by_name.len()).await, 1);
//! }
//! ```

use chrono::{DateTime, Utc};
use dashboard_state_core::environment::Clock;


pub use reducer_test::{ReducerTest, assertions};

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use dashboard_state_api::error::StatusCode;
    use dashboard_state_api::name::NameParams;
    use dashboard_state_api::routing::{Router, RoutingError};
    use dashboard_state_api::transport::TransportFuture;
    use dashboard_state_api::{ResourceKind, Transport, TransportCall, TransportError};
    use serde_json::Value;
    use std::collections::{HashMap, VecDeque};
    use std::sync::{Mutex, MutexGuard, PoisonError};
    use tokio::sync::watch;

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use dashboard_state_testing::mocks::FixedClock;
    /// use dashboard_state_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }

    type Reply = Result<Value, TransportError>;

    #[derive(Default)]
    struct Script {
        once: HashMap<String, VecDeque<Reply>>,
        sticky: HashMap<String, Reply>,
        calls: Vec<TransportCall>,
    }

    fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
        mutex.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Scripted transport
    ///
    /// Replies are keyed by RPC method (`ListProjects`, `DeleteSite`, ...).
    /// One-shot replies are consumed first, then the sticky reply is used.
    /// Calls to an unscripted method fail with `Unknown`.
    ///
    /// While [`hold`](Self::hold) is in effect, invocations are recorded but
    /// do not resolve until [`release`](Self::release).
    pub struct MockTransport {
        script: Mutex<Script>,
        gate: watch::Sender<bool>,
    }

    impl Default for MockTransport {
        fn default() -> Self {
            Self::new()
        }
    }

    impl std::fmt::Debug for MockTransport {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("MockTransport")
                .field("calls", &self.total_calls())
                .field("held", &!*self.gate.borrow())
                .finish()
        }
    }

    impl MockTransport {
        /// A transport with no scripted replies and an open gate
        #[must_use]
        pub fn new() -> Self {
            let (gate, _) = watch::channel(true);
            Self {
                script: Mutex::new(Script::default()),
                gate,
            }
        }

        /// Reply to every call of `method` with `reply`
        pub fn respond(&self, method: &str, reply: Result<Value, TransportError>) -> &Self {
            lock(&self.script).sticky.insert(method.to_string(), reply);
            self
        }

        /// Reply to the next call of `method` with `reply`
        pub fn respond_once(&self, method: &str, reply: Result<Value, TransportError>) -> &Self {
            lock(&self.script)
                .once
                .entry(method.to_string())
                .or_default()
                .push_back(reply);
            self
        }

        /// Hold every invocation until [`release`](Self::release)
        pub fn hold(&self) {
            self.gate.send_replace(false);
        }

        /// Let held and future invocations resolve
        pub fn release(&self) {
            self.gate.send_replace(true);
        }

        /// Every call received so far, in order
        #[must_use]
        pub fn calls(&self) -> Vec<TransportCall> {
            lock(&self.script).calls.clone()
        }

        /// Number of calls of `method`
        #[must_use]
        pub fn call_count(&self, method: &str) -> usize {
            lock(&self.script)
                .calls
                .iter()
                .filter(|call| call.method == method)
                .count()
        }

        /// Number of calls of any method
        #[must_use]
        pub fn total_calls(&self) -> usize {
            lock(&self.script).calls.len()
        }

        fn next_reply(&self, call: TransportCall) -> Reply {
            let mut script = lock(&self.script);
            let method = call.method.clone();
            script.calls.push(call);

            if let Some(reply) = script.once.get_mut(&method).and_then(VecDeque::pop_front) {
                return reply;
            }
            script.sticky.get(&method).cloned().unwrap_or_else(|| {
                Err(TransportError::new(
                    StatusCode::Unknown,
                    format!("no reply scripted for {method}"),
                ))
            })
        }
    }

    impl Transport for MockTransport {
        fn invoke(&self, call: TransportCall) -> TransportFuture<'_> {
            let reply = self.next_reply(call);
            let mut gate = self.gate.subscribe();
            Box::pin(async move {
                let _ = gate.wait_for(|open| *open).await;
                reply
            })
        }
    }

    /// Router resolving the standard route table and recording every lookup
    ///
    /// `dashboard` resolves to `/`; each resource kind has a route named after
    /// it whose path is the kind's name pattern.
    #[derive(Debug, Default)]
    pub struct RecordingRouter {
        lookups: Mutex<Vec<(String, NameParams)>>,
    }

    impl RecordingRouter {
        /// A router with no recorded lookups
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Every `(route, params)` looked up so far
        #[must_use]
        pub fn lookups(&self) -> Vec<(String, NameParams)> {
            lock(&self.lookups).clone()
        }
    }

    impl Router for RecordingRouter {
        fn route_for(&self, route: &str, params: &NameParams) -> Result<String, RoutingError> {
            lock(&self.lookups).push((route.to_string(), params.clone()));

            if route == dashboard_state_api::routing::DASHBOARD_ROUTE {
                return Ok("/".to_string());
            }
            let kind = ResourceKind::ALL
                .into_iter()
                .find(|kind| kind.as_str() == route)
                .ok_or_else(|| RoutingError::UnknownRoute(route.to_string()))?;
            Ok(format!("/{}", kind.name_pattern().build_name(params)?))
        }
    }
}

/// Test helpers and utilities
pub mod helpers {
    use dashboard_state_core::effect::Effect;
    use std::future::Future;
    use std::pin::Pin;

    /// Install a `tracing` subscriber writing to the test output
    ///
    /// Honors `RUST_LOG`. Safe to call from every test; only the first call
    /// installs the subscriber.
    pub fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn run_effect<A: Send + 'static>(effect: Effect<A>) -> Pin<Box<dyn Future<Output = Vec<A>> + Send>> {
        Box::pin(async move {
            match effect {
                Effect::None => Vec::new(),
                Effect::Delay { action, .. } => vec![*action],
                Effect::Future(fut) => fut.await.into_iter().collect(),
                Effect::Parallel(effects) | Effect::Sequential(effects) => {
                    let mut actions = Vec::new();
                    for effect in effects {
                        actions.extend(run_effect(effect).await);
                    }
                    actions
                },
            }
        })
    }

    /// Execute effects without a store and collect the actions they produce
    ///
    /// Effects run one after another in order; delays complete immediately.
    /// Produced actions are not reduced.
    pub async fn collect_actions<A: Send + 'static>(effects: impl IntoIterator<Item = Effect<A>>) -> Vec<A> {
        let mut actions = Vec::new();
        for effect in effects {
            actions.extend(run_effect(effect).await);
        }
        actions
    }
}

/// Property-based testing utilities using proptest.
pub mod properties {
    use dashboard_state_api::{NameParams, NamePattern, ResourceKind, ResourceName};
    use proptest::prelude::*;

    /// A valid URL-safe slug
    pub fn slug() -> impl Strategy<Value = String> {
        "[A-Za-z0-9._~-]{1,16}"
    }

    /// Values for every parameter of `pattern`
    pub fn name_params(pattern: &NamePattern) -> impl Strategy<Value = NameParams> {
        let params: Vec<String> = pattern.params().map(str::to_string).collect();
        proptest::collection::vec(slug(), params.len())
            .prop_map(move |values| params.iter().cloned().zip(values).collect())
    }

    /// A well-formed name of `kind`
    pub fn resource_name(kind: ResourceKind) -> impl Strategy<Value = ResourceName> {
        name_params(kind.name_pattern())
            .prop_filter_map("name must build", move |params| kind.name_pattern().build_name(&params).ok())
    }

    /// Any resource kind
    pub fn resource_kind() -> impl Strategy<Value = ResourceKind> {
        prop::sample::select(ResourceKind::ALL.to_vec())
    }
}

// Re-export commonly used items
pub use helpers::collect_actions;
pub use mocks::{FixedClock, MockTransport, RecordingRouter, test_clock};
