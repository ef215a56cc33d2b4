//! The RPC transport seam.

use crate::action::Operation;
use crate::error::TransportError;
use crate::kind::ResourceKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;

/// Future returned by [`Transport::invoke`].
pub type TransportFuture<'a> = Pin<Box<dyn Future<Output = Result<Value, TransportError>> + Send + 'a>>;

/// A single RPC invocation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportCall {
    /// Fully qualified service, e.g. `dashboard.projects.v1.ProjectsService`
    pub service: String,
    /// Method, e.g. `ListProjects`
    pub method: String,
    /// Request message as JSON
    pub data: Value,
}

impl TransportCall {
    /// The call implementing `operation` for `kind`.
    #[must_use]
    pub fn new(kind: ResourceKind, operation: Operation, data: Value) -> Self {
        Self {
            service: kind.service().to_string(),
            method: kind.method(operation),
            data,
        }
    }
}

/// Executes RPC calls against the backend.
///
/// Implementations report failures as [`TransportError`] values and apply
/// their own deadlines; a timed out call resolves to
/// [`StatusCode::DeadlineExceeded`](crate::error::StatusCode::DeadlineExceeded).
pub trait Transport: Send + Sync {
    /// Invoke `call` and resolve to the response message.
    fn invoke(&self, call: TransportCall) -> TransportFuture<'_>;
}
