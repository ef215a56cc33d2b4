//! A backend living in process memory.
//!
//! Serves the CRUD methods of every resource kind over plain JSON, with the
//! request and response shapes the orchestrator uses. Used by the demo binary
//! when no API URL is configured, and by integration tests.

use dashboard_state_api::error::StatusCode;
use dashboard_state_api::name::NameParams;
use dashboard_state_api::transport::TransportFuture;
use dashboard_state_api::{Operation, Resource, ResourceKind, Transport, TransportCall, TransportError};
use indexmap::IndexMap;
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

type Table = IndexMap<String, Value>;

#[derive(Default)]
struct Tables {
    by_kind: HashMap<ResourceKind, Table>,
}

impl Tables {
    fn table(&self, kind: ResourceKind) -> Option<&Table> {
        self.by_kind.get(&kind)
    }

    fn table_mut(&mut self, kind: ResourceKind) -> &mut Table {
        self.by_kind.entry(kind).or_default()
    }

    fn contains(&self, kind: ResourceKind, name: &str) -> bool {
        self.table(kind).is_some_and(|table| table.contains_key(name))
    }
}

/// In-memory implementation of [`Transport`].
#[derive(Default)]
pub struct InMemoryBackend {
    tables: Mutex<Tables>,
    latency: Duration,
}

impl std::fmt::Debug for InMemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tables = self.lock();
        let mut sizes: Vec<_> = tables
            .by_kind
            .iter()
            .map(|(kind, table)| (kind.as_str(), table.len()))
            .collect();
        sizes.sort_unstable();
        f.debug_struct("InMemoryBackend")
            .field("tables", &sizes)
            .field("latency", &self.latency)
            .finish()
    }
}

impl InMemoryBackend {
    /// An empty backend answering immediately.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every response by `latency`.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Store `items` as they are, replacing instances with the same name.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidArgument` error if an item cannot be serialized or
    /// has no name; items before it stay stored.
    pub fn seed<T: Resource>(&self, items: impl IntoIterator<Item = T>) -> Result<usize, TransportError> {
        let mut tables = self.lock();
        let mut count = 0;
        for item in items {
            if item.is_new() {
                return Err(TransportError::new(
                    StatusCode::InvalidArgument,
                    format!("cannot seed an unnamed {}", T::KIND),
                ));
            }
            let value = serde_json::to_value(&item)
                .map_err(|err| TransportError::new(StatusCode::InvalidArgument, err.to_string()))?;
            tables.table_mut(T::KIND).insert(item.name().to_string(), value);
            count += 1;
        }
        Ok(count)
    }

    /// Number of stored instances of `kind`.
    #[must_use]
    pub fn count(&self, kind: ResourceKind) -> usize {
        self.lock().table(kind).map_or(0, IndexMap::len)
    }

    /// The stored instance `name` of `kind`.
    #[must_use]
    pub fn get(&self, kind: ResourceKind, name: &str) -> Option<Value> {
        self.lock().table(kind).and_then(|table| table.get(name).cloned())
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn handle(&self, call: &TransportCall) -> Result<Value, TransportError> {
        let (kind, operation) = route(call)?;
        let mut tables = self.lock();
        match operation {
            Operation::List => list(&tables, kind, &call.data),
            Operation::Get => {
                let name = required_name(&call.data)?;
                tables
                    .table(kind)
                    .and_then(|table| table.get(name).cloned())
                    .ok_or_else(|| TransportError::not_found(name))
            },
            Operation::Create => create(&mut tables, kind, &call.data),
            Operation::Update => update(&mut tables, kind, &call.data),
            Operation::Destroy => {
                let name = required_name(&call.data)?;
                tables
                    .table_mut(kind)
                    .shift_remove(name)
                    .map(|_| json!({}))
                    .ok_or_else(|| TransportError::not_found(name))
            },
        }
    }
}

impl Transport for InMemoryBackend {
    fn invoke(&self, call: TransportCall) -> TransportFuture<'_> {
        Box::pin(async move {
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
            let result = self.handle(&call);
            if let Err(error) = &result {
                tracing::debug!(method = %call.method, code = ?error.code, error = %error.message, "Backend rejected call");
            }
            result
        })
    }
}

fn route(call: &TransportCall) -> Result<(ResourceKind, Operation), TransportError> {
    let kind = ResourceKind::ALL
        .into_iter()
        .find(|kind| kind.service() == call.service)
        .ok_or_else(|| TransportError::new(StatusCode::NotFound, format!("unknown service `{}`", call.service)))?;
    let operation = Operation::ALL
        .into_iter()
        .find(|operation| kind.method(*operation) == call.method)
        .ok_or_else(|| TransportError::new(StatusCode::NotFound, format!("unknown method `{}`", call.method)))?;
    Ok((kind, operation))
}

fn required_name(data: &Value) -> Result<&str, TransportError> {
    data.get("name")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| {
            TransportError::new(StatusCode::InvalidArgument, "name is required").with_violation("name", "is required")
        })
}

fn list(tables: &Tables, kind: ResourceKind, data: &Value) -> Result<Value, TransportError> {
    let parent = data.get("parent").and_then(Value::as_str);
    let parent_field = match (parent, kind.parent()) {
        (Some(_), None) => {
            return Err(TransportError::new(
                StatusCode::InvalidArgument,
                format!("{kind} has no parent"),
            ));
        },
        (Some(_), Some(parent_kind)) => Some(parent_kind.singular_field()),
        (None, _) => None,
    };
    let filter = data.get("filter").and_then(Value::as_object);

    let items: Vec<Value> = tables
        .table(kind)
        .into_iter()
        .flat_map(IndexMap::values)
        .filter(|item| {
            parent_field.zip(parent).is_none_or(|(field, parent)| item.get(field).and_then(Value::as_str) == Some(parent))
        })
        .filter(|item| {
            filter.is_none_or(|filter| {
                filter
                    .iter()
                    .all(|(field, expected)| item.get(field) == Some(expected))
            })
        })
        .cloned()
        .collect();

    let mut response = Map::new();
    response.insert(kind.collection_field().to_string(), Value::Array(items));
    Ok(Value::Object(response))
}

fn payload(kind: ResourceKind, data: &Value) -> Result<Map<String, Value>, TransportError> {
    data.get(kind.singular_field())
        .and_then(Value::as_object)
        .cloned()
        .ok_or_else(|| {
            TransportError::new(StatusCode::InvalidArgument, format!("{} is required", kind.singular_field()))
        })
}

fn validate(tables: &Tables, kind: ResourceKind, payload: &Map<String, Value>) -> Result<(), TransportError> {
    let mut error = TransportError::new(StatusCode::InvalidArgument, format!("invalid {kind}"));

    let display_name = payload.get("display_name").and_then(Value::as_str).unwrap_or_default();
    if display_name.trim().is_empty() {
        error = error.with_violation("display_name", "must not be empty");
    }

    if let Some(parent_kind) = kind.parent() {
        let field = parent_kind.singular_field();
        match payload.get(field).and_then(Value::as_str).filter(|name| !name.is_empty()) {
            None => error = error.with_violation(field, "is required"),
            Some(parent) if !tables.contains(parent_kind, parent) => {
                error = error.with_violation(field, format!("{parent} does not exist"));
            },
            Some(_) => {},
        }
    }

    if error.field_violations.is_empty() { Ok(()) } else { Err(error) }
}

fn slugify(display_name: &str) -> String {
    let mut slug = String::with_capacity(display_name.len());
    for c in display_name.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

/// Name for a new instance: the kind's pattern filled with a slug of the
/// display name, parameters named after a parent kind taking the parent's
/// slug.
fn assign_name(kind: ResourceKind, payload: &Map<String, Value>) -> Result<String, TransportError> {
    let display_name = payload.get("display_name").and_then(Value::as_str).unwrap_or_default();
    let mut params = NameParams::new();
    params.insert("slug".to_string(), slugify(display_name));

    if let Some(parent_kind) = kind.parent() {
        let parent = payload
            .get(parent_kind.singular_field())
            .and_then(Value::as_str)
            .unwrap_or_default();
        if let Ok(parent_params) = parent_kind.name_pattern().parse_name(parent) {
            if let Some(slug) = parent_params.get("slug") {
                params.insert(parent_kind.as_str().to_string(), slug.clone());
            }
        }
    }

    kind.name_pattern()
        .build_name(&params)
        .map(|name| name.to_string())
        .map_err(|err| {
            TransportError::new(StatusCode::InvalidArgument, err.to_string())
                .with_violation("display_name", "cannot be turned into a name")
        })
}

/// Rejects a client-chosen name that does not fit the kind's pattern.
fn checked_name(kind: ResourceKind, name: &str) -> Result<String, TransportError> {
    kind.name_pattern().parse_name(name).map_err(|err| {
        TransportError::new(StatusCode::InvalidArgument, format!("invalid {kind}"))
            .with_violation("name", err.to_string())
    })?;
    Ok(name.to_string())
}

fn create(tables: &mut Tables, kind: ResourceKind, data: &Value) -> Result<Value, TransportError> {
    let mut item = payload(kind, data)?;
    validate(tables, kind, &item)?;

    let name = match item.get("name").and_then(Value::as_str).filter(|name| !name.is_empty()) {
        Some(name) => checked_name(kind, name)?,
        None => assign_name(kind, &item)?,
    };
    if tables.contains(kind, &name) {
        return Err(TransportError::new(StatusCode::AlreadyExists, format!("{name} already exists")));
    }

    item.insert("name".to_string(), Value::String(name.clone()));
    let item = Value::Object(item);
    tables.table_mut(kind).insert(name, item.clone());
    Ok(item)
}

fn update(tables: &mut Tables, kind: ResourceKind, data: &Value) -> Result<Value, TransportError> {
    let name = required_name(data)?.to_string();
    let mut item = payload(kind, data)?;
    if !tables.contains(kind, &name) {
        return Err(TransportError::not_found(&name));
    }
    validate(tables, kind, &item)?;

    let renamed = item
        .get("name")
        .and_then(Value::as_str)
        .filter(|new_name| !new_name.is_empty() && *new_name != name)
        .map(|new_name| checked_name(kind, new_name))
        .transpose()?;
    if let Some(new_name) = &renamed {
        if tables.contains(kind, new_name) {
            return Err(TransportError::new(StatusCode::AlreadyExists, format!("{new_name} already exists")));
        }
    }

    let stored_name = renamed.unwrap_or_else(|| name.clone());
    item.insert("name".to_string(), Value::String(stored_name.clone()));
    let item = Value::Object(item);

    let table = tables.table_mut(kind);
    match table.get_index_of(&name) {
        Some(index) if stored_name != name => {
            table.shift_remove_index(index);
            table.shift_insert(index, stored_name, item.clone());
        },
        _ => {
            table.insert(stored_name, item.clone());
        },
    }
    Ok(item)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::resources::{Organization, Project};

    fn call(kind: ResourceKind, operation: Operation, data: Value) -> TransportCall {
        TransportCall::new(kind, operation, data)
    }

    fn backend() -> InMemoryBackend {
        let backend = InMemoryBackend::new();
        backend
            .seed([Organization {
                name: "organization/acme".into(),
                display_name: "Acme".to_string(),
            }])
            .unwrap();
        backend
    }

    #[tokio::test]
    async fn create_assigns_a_name_from_the_display_name() {
        let backend = backend();
        let created = backend
            .invoke(call(
                ResourceKind::Project,
                Operation::Create,
                json!({"project": {"display_name": "My Blog!", "organization": "organization/acme"}}),
            ))
            .await
            .unwrap();
        assert_eq!(created["name"], "project/my-blog");

        let site = backend
            .invoke(call(
                ResourceKind::Site,
                Operation::Create,
                json!({"site": {"display_name": "Shop", "project": "project/my-blog"}}),
            ))
            .await
            .unwrap();
        assert_eq!(site["name"], "project/my-blog/site/shop");
        assert_eq!(backend.count(ResourceKind::Site), 1);
    }

    #[tokio::test]
    async fn create_validates_fields() {
        let error = backend()
            .invoke(call(
                ResourceKind::Project,
                Operation::Create,
                json!({"project": {"display_name": " ", "organization": "organization/initech"}}),
            ))
            .await
            .unwrap_err();

        assert_eq!(error.code, StatusCode::InvalidArgument);
        let fields: Vec<&str> = error.field_violations.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, vec!["display_name", "organization"]);
    }

    #[tokio::test]
    async fn malformed_client_names_are_rejected() {
        let backend = backend();
        let error = backend
            .invoke(call(
                ResourceKind::Project,
                Operation::Create,
                json!({"project": {"name": "site/foo", "display_name": "Foo", "organization": "organization/acme"}}),
            ))
            .await
            .unwrap_err();

        assert_eq!(error.code, StatusCode::InvalidArgument);
        assert_eq!(error.field_violations.len(), 1);
        assert_eq!(error.field_violations[0].field, "name");
        assert_eq!(backend.count(ResourceKind::Project), 0);

        let error = backend
            .invoke(call(
                ResourceKind::Organization,
                Operation::Update,
                json!({"name": "organization/acme", "organization": {"name": "acme", "display_name": "Acme"}}),
            ))
            .await
            .unwrap_err();
        assert_eq!(error.field_violations[0].field, "name");
        assert!(backend.get(ResourceKind::Organization, "organization/acme").is_some());
    }

    #[tokio::test]
    async fn duplicate_names_are_rejected() {
        let error = backend()
            .invoke(call(
                ResourceKind::Organization,
                Operation::Create,
                json!({"organization": {"display_name": "Acme"}}),
            ))
            .await
            .unwrap_err();
        assert_eq!(error.code, StatusCode::AlreadyExists);
    }

    #[tokio::test]
    async fn list_filters_by_parent() {
        let backend = backend();
        let mut foo = Project::draft("organization/acme", "Foo");
        foo.name = "project/foo".into();
        let mut bar = Project::draft("organization/globex", "Bar");
        bar.name = "project/bar".into();
        backend.seed([foo, bar]).unwrap();

        let all = backend
            .invoke(call(ResourceKind::Project, Operation::List, json!({})))
            .await
            .unwrap();
        assert_eq!(all["projects"].as_array().unwrap().len(), 2);

        let scoped = backend
            .invoke(call(
                ResourceKind::Project,
                Operation::List,
                json!({"parent": "organization/acme"}),
            ))
            .await
            .unwrap();
        assert_eq!(scoped["projects"][0]["name"], "project/foo");
        assert_eq!(scoped["projects"].as_array().unwrap().len(), 1);

        let filtered = backend
            .invoke(call(
                ResourceKind::Project,
                Operation::List,
                json!({"filter": {"display_name": "Bar"}}),
            ))
            .await
            .unwrap();
        assert_eq!(filtered["projects"][0]["name"], "project/bar");
    }

    #[tokio::test]
    async fn rename_keeps_position() {
        let backend = InMemoryBackend::new();
        backend
            .seed(["a", "b", "c"].map(|slug| Organization {
                name: format!("organization/{slug}").into(),
                display_name: slug.to_uppercase(),
            }))
            .unwrap();

        backend
            .invoke(call(
                ResourceKind::Organization,
                Operation::Update,
                json!({"name": "organization/b", "organization": {"name": "organization/z", "display_name": "Z"}}),
            ))
            .await
            .unwrap();

        let listed = backend
            .invoke(call(ResourceKind::Organization, Operation::List, json!({})))
            .await
            .unwrap();
        let names: Vec<&str> = listed["organizations"]
            .as_array()
            .unwrap()
            .iter()
            .map(|o| o["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["organization/a", "organization/z", "organization/c"]);
    }

    #[tokio::test]
    async fn destroy_and_get_missing() {
        let backend = backend();
        let deleted = backend
            .invoke(call(
                ResourceKind::Organization,
                Operation::Destroy,
                json!({"name": "organization/acme"}),
            ))
            .await
            .unwrap();
        assert_eq!(deleted, json!({}));

        let error = backend
            .invoke(call(
                ResourceKind::Organization,
                Operation::Get,
                json!({"name": "organization/acme"}),
            ))
            .await
            .unwrap_err();
        assert_eq!(error.code, StatusCode::NotFound);
    }

    #[tokio::test]
    async fn unknown_methods_are_rejected() {
        let error = backend()
            .invoke(TransportCall {
                service: ResourceKind::Project.service().to_string(),
                method: "ArchiveProject".to_string(),
                data: json!({}),
            })
            .await
            .unwrap_err();
        assert_eq!(error.code, StatusCode::NotFound);
    }

    #[test]
    fn slugs() {
        assert_eq!(slugify("My Blog!"), "my-blog");
        assert_eq!(slugify("  --Hello   World-- "), "hello-world");
        assert_eq!(slugify("!!!"), "");
    }
}
