//! The request orchestrator.
//!
//! Turns intent actions into effects that invoke the [`Transport`] and feed
//! exactly one SUCCEEDED or FAILED action back into the store. Identical
//! LIST/GET requests that overlap share a single transport invocation: the
//! first intent registers its [`RequestKey`] while the reducer runs, later
//! identical intents produce no effect and observe the shared outcome through
//! the store. The key is released when the invocation completes (or its
//! effect is dropped).
//!
//! Transient failures of LIST/GET are retried according to
//! [`OrchestratorConfig::retry`]. Mutations are never retried.

use crate::Resource;
use crate::action::{Delegate, ListRequest, Operation, ResourceAction};
use crate::error::{ApiError, StatusCode, TransportError};
use crate::forms::FormName;
use crate::kind::ResourceKind;
use crate::name::{NameParams, ResourceName};
use crate::notification::Toast;
use crate::routing::{DASHBOARD_ROUTE, Router, RoutingError};
use crate::transport::{Transport, TransportCall};
use dashboard_state_core::async_effect;
use dashboard_state_core::effect::Effect;
use dashboard_state_runtime::metrics::TransportMetrics;
use dashboard_state_runtime::retry::{RetryPolicy, retry_with_predicate};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

/// Orchestrator configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct OrchestratorConfig {
    /// Retry policy for transient LIST/GET failures
    pub retry: RetryPolicy,
    /// Share one invocation between identical overlapping LIST/GET requests
    pub dedup: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            dedup: true,
        }
    }
}

impl OrchestratorConfig {
    /// Set the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Enable or disable deduplication.
    #[must_use]
    pub const fn with_dedup(mut self, dedup: bool) -> Self {
        self.dedup = dedup;
        self
    }
}

/// Identity of a request for deduplication.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RequestKey {
    /// Resource kind
    pub kind: ResourceKind,
    /// Operation
    pub operation: Operation,
    /// Canonical JSON of the request parameters
    pub params: String,
}

impl RequestKey {
    /// Key of a request carrying `data`.
    ///
    /// `serde_json` objects keep their keys sorted, so equal parameters
    /// always render to the same string.
    #[must_use]
    pub fn new(kind: ResourceKind, operation: Operation, data: &Value) -> Self {
        Self {
            kind,
            operation,
            params: data.to_string(),
        }
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} {}", self.kind, self.operation.as_str(), self.params)
    }
}

struct InFlight {
    started: Instant,
}

type InFlightMap = Arc<Mutex<HashMap<RequestKey, InFlight>>>;

fn lock(map: &Mutex<HashMap<RequestKey, InFlight>>) -> MutexGuard<'_, HashMap<RequestKey, InFlight>> {
    map.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Releases a [`RequestKey`] when the invocation holding it ends.
struct InFlightGuard {
    map: InFlightMap,
    key: RequestKey,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        lock(&self.map).remove(&self.key);
    }
}

enum Admission {
    Start(Option<InFlightGuard>),
    Joined,
}

/// Bridges intent actions to the transport for every resource kind.
///
/// Cloning is cheap and clones share the in-flight registry.
#[derive(Clone)]
pub struct RequestOrchestrator {
    transport: Arc<dyn Transport>,
    router: Arc<dyn Router>,
    config: OrchestratorConfig,
    in_flight: InFlightMap,
}

impl fmt::Debug for RequestOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestOrchestrator")
            .field("config", &self.config)
            .field("in_flight", &self.in_flight())
            .finish_non_exhaustive()
    }
}

impl RequestOrchestrator {
    /// Create an orchestrator with the default configuration.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, router: Arc<dyn Router>) -> Self {
        Self::with_config(transport, router, OrchestratorConfig::default())
    }

    /// Create an orchestrator with a custom configuration.
    #[must_use]
    pub fn with_config(
        transport: Arc<dyn Transport>,
        router: Arc<dyn Router>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            transport,
            router,
            config,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Number of transport invocations currently registered.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        lock(&self.in_flight).len()
    }

    fn admit(&self, key: RequestKey) -> Admission {
        if !self.config.dedup {
            return Admission::Start(None);
        }

        let mut in_flight = lock(&self.in_flight);
        if let Some(existing) = in_flight.get(&key) {
            tracing::debug!(
                request = %key,
                age_ms = existing.started.elapsed().as_millis(),
                "Joining in-flight request"
            );
            TransportMetrics::record_dedup_hit(key.kind.as_str(), key.operation.label());
            return Admission::Joined;
        }

        in_flight.insert(
            key.clone(),
            InFlight {
                started: Instant::now(),
            },
        );
        Admission::Start(Some(InFlightGuard {
            map: Arc::clone(&self.in_flight),
            key,
        }))
    }

    /// Effect fetching the collection of `T`.
    ///
    /// Yields no effect when an identical LIST is already in flight.
    #[must_use]
    pub fn list<T: Resource>(&self, request: ListRequest) -> Effect<ResourceAction<T>> {
        let data = match encode(&request) {
            Ok(data) => data,
            Err(error) => return Effect::send(ResourceAction::ListFailed { error }),
        };
        let Admission::Start(guard) = self.admit(RequestKey::new(T::KIND, Operation::List, &data)) else {
            return Effect::None;
        };

        let call = TransportCall::new(T::KIND, Operation::List, data);
        let transport = Arc::clone(&self.transport);
        let retry = self.config.retry.clone();

        async_effect! {
            let _guard = guard;
            let outcome = invoke(transport.as_ref(), call, T::KIND, Operation::List, Some(&retry))
                .await
                .and_then(decode_list::<T>);
            Some(match outcome {
                Ok(items) => ResourceAction::ListSucceeded { items },
                Err(error) => ResourceAction::ListFailed { error },
            })
        }
    }

    /// Effect fetching one instance of `T`.
    ///
    /// Yields no effect when a GET for the same name is already in flight.
    #[must_use]
    pub fn get<T: Resource>(&self, name: ResourceName) -> Effect<ResourceAction<T>> {
        let data = serde_json::json!({ "name": name });
        let Admission::Start(guard) = self.admit(RequestKey::new(T::KIND, Operation::Get, &data)) else {
            return Effect::None;
        };

        let call = TransportCall::new(T::KIND, Operation::Get, data);
        let transport = Arc::clone(&self.transport);
        let retry = self.config.retry.clone();

        async_effect! {
            let _guard = guard;
            let outcome = invoke(transport.as_ref(), call, T::KIND, Operation::Get, Some(&retry))
                .await
                .and_then(decode_item::<T>);
            Some(match outcome {
                Ok(item) => ResourceAction::GetSucceeded { item },
                Err(error) => ResourceAction::GetFailed { name, error },
            })
        }
    }

    /// Effect persisting a new instance of `T`.
    #[must_use]
    pub fn create<T: Resource>(&self, payload: T, form: Option<FormName>) -> Effect<ResourceAction<T>> {
        let data = match wrap::<T>(None, &payload) {
            Ok(data) => data,
            Err(error) => return Effect::send(ResourceAction::CreateFailed { error, form }),
        };

        let call = TransportCall::new(T::KIND, Operation::Create, data);
        let transport = Arc::clone(&self.transport);

        async_effect! {
            let outcome = invoke(transport.as_ref(), call, T::KIND, Operation::Create, None)
                .await
                .and_then(decode_item::<T>);
            Some(match outcome {
                Ok(item) => ResourceAction::CreateSucceeded { item, form },
                Err(error) => ResourceAction::CreateFailed { error, form },
            })
        }
    }

    /// Effect replacing the instance stored under `name`.
    #[must_use]
    pub fn update<T: Resource>(
        &self,
        name: ResourceName,
        payload: T,
        form: Option<FormName>,
    ) -> Effect<ResourceAction<T>> {
        let data = match wrap::<T>(Some(&name), &payload) {
            Ok(data) => data,
            Err(error) => return Effect::send(ResourceAction::UpdateFailed { name, error, form }),
        };

        let call = TransportCall::new(T::KIND, Operation::Update, data);
        let transport = Arc::clone(&self.transport);

        async_effect! {
            let outcome = invoke(transport.as_ref(), call, T::KIND, Operation::Update, None)
                .await
                .and_then(decode_item::<T>);
            Some(match outcome {
                Ok(item) => ResourceAction::UpdateSucceeded { previous: name, item, form },
                Err(error) => ResourceAction::UpdateFailed { name, error, form },
            })
        }
    }

    /// Effect deleting `payload`.
    ///
    /// The server's response body is ignored; the outcome carries the
    /// instance that was asked to be deleted.
    #[must_use]
    pub fn destroy<T: Resource>(&self, payload: T) -> Effect<ResourceAction<T>> {
        let data = serde_json::json!({ "name": payload.name() });
        let call = TransportCall::new(T::KIND, Operation::Destroy, data);
        let transport = Arc::clone(&self.transport);

        async_effect! {
            let outcome = invoke(transport.as_ref(), call, T::KIND, Operation::Destroy, None).await;
            Some(match outcome {
                Ok(_) => ResourceAction::DestroySucceeded { item: payload },
                Err(error) => ResourceAction::DestroyFailed { item: payload, error },
            })
        }
    }

    /// Delegates following a successful DESTROY: navigate to the parent's
    /// page (the dashboard for top-level instances), then a success toast.
    ///
    /// If the redirect cannot be resolved only the toast is emitted.
    #[must_use]
    pub fn after_destroy<T: Resource>(&self, item: &T) -> Effect<ResourceAction<T>> {
        let mut effects = Vec::with_capacity(2);

        match self.redirect_for(item) {
            Ok(path) => {
                tracing::debug!(kind = %T::KIND, name = %item.name(), path = %path, "Redirecting after destroy");
                effects.push(Effect::send(ResourceAction::Delegate(Delegate::Navigate { path })));
            },
            Err(error) => {
                tracing::warn!(kind = %T::KIND, name = %item.name(), error = %error, "No redirect after destroy");
            },
        }

        let toast = Toast::success(format!("{} deleted", T::KIND.display_name()));
        effects.push(Effect::send(ResourceAction::Delegate(Delegate::ShowToast(toast))));
        Effect::Sequential(effects)
    }

    /// Delegate following a failed DESTROY: a danger toast.
    #[must_use]
    pub fn after_destroy_failed<T: Resource>(&self, item: &T, error: &ApiError) -> Effect<ResourceAction<T>> {
        tracing::warn!(kind = %T::KIND, name = %item.name(), error = %error, "Destroy failed");
        let toast = Toast::danger(format!("{} delete failed", T::KIND.display_name()));
        Effect::send(ResourceAction::Delegate(Delegate::ShowToast(toast)))
    }

    fn redirect_for<T: Resource>(&self, item: &T) -> Result<String, RoutingError> {
        let parent = T::KIND.parent().zip(item.parent()).and_then(|(kind, name)| {
            kind.name_pattern()
                .parse_name(name.as_str())
                .ok()
                .map(|params| (kind, params))
        });

        match parent {
            Some((kind, params)) => self.router.route_for(kind.as_str(), &params),
            None => self.router.route_for(DASHBOARD_ROUTE, &NameParams::new()),
        }
    }
}

async fn invoke(
    transport: &dyn Transport,
    call: TransportCall,
    kind: ResourceKind,
    operation: Operation,
    retry: Option<&RetryPolicy>,
) -> Result<Value, ApiError> {
    let method = call.method.clone();
    let started = Instant::now();
    tracing::debug!(service = %call.service, method = %method, "Invoking transport");

    let result = match retry {
        Some(policy) => {
            retry_with_predicate(
                policy,
                || transport.invoke(call.clone()),
                |err: &TransportError| err.code.is_retryable(),
            )
            .await
        },
        None => transport.invoke(call).await,
    };

    let elapsed = started.elapsed();
    TransportMetrics::record_invocation(kind.as_str(), operation.label(), elapsed, result.is_ok());

    match result {
        Ok(response) => {
            tracing::debug!(method = %method, elapsed_ms = elapsed.as_millis(), "Transport call succeeded");
            Ok(response)
        },
        Err(err) => {
            tracing::warn!(method = %method, code = ?err.code, error = %err.message, "Transport call failed");
            Err(err.into())
        },
    }
}

fn encode(value: &impl Serialize) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|err| {
        ApiError::transport(StatusCode::Internal, format!("failed to encode request: {err}"))
    })
}

fn wrap<T: Resource>(name: Option<&ResourceName>, payload: &T) -> Result<Value, ApiError> {
    let mut fields = Map::new();
    if let Some(name) = name {
        fields.insert("name".to_string(), Value::String(name.to_string()));
    }
    fields.insert(T::KIND.singular_field().to_string(), encode(payload)?);
    Ok(Value::Object(fields))
}

fn decode_list<T: Resource>(response: Value) -> Result<Vec<T>, ApiError> {
    let items = match response {
        // Empty repeated fields are omitted from JSON responses.
        Value::Object(mut fields) => fields
            .remove(T::KIND.collection_field())
            .unwrap_or_else(|| Value::Array(Vec::new())),
        Value::Null => Value::Array(Vec::new()),
        other => other,
    };
    serde_json::from_value(items).map_err(|err| ApiError::decode(&err))
}

fn decode_item<T: Resource>(response: Value) -> Result<T, ApiError> {
    let item = match response {
        Value::Object(mut fields) if fields.len() == 1 && fields.contains_key(T::KIND.singular_field()) => {
            fields.remove(T::KIND.singular_field()).unwrap_or(Value::Null)
        },
        other => other,
    };
    serde_json::from_value(item).map_err(|err| ApiError::decode(&err))
}
