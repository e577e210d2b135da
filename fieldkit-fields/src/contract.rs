//! Shared shapes for the function contracts attached to fields.
//!
//! Hooks, validators and access predicates may answer immediately or hand back
//! a future. [`Deferred`] carries either form so the caller decides how to
//! drive it; conditions are the exception and are always synchronous.
//!
//! The request, its user record and the per-operation context map are opaque
//! to this crate. They are threaded through to user functions untouched.

use std::any::Any;
use std::fmt;
use std::future::{Future, IntoFuture};
use std::sync::Arc;

use dashmap::DashMap;
use futures::future::{self, BoxFuture, Either, FutureExt};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Stored document data, or the data of one tree level within it.
pub type Document = Map<String, Value>;

/// A result that is either available now or must be awaited.
pub enum Deferred<T> {
    Ready(T),
    Pending(BoxFuture<'static, T>),
}

impl<T> Deferred<T> {
    pub fn ready(value: T) -> Self {
        Self::Ready(value)
    }

    pub fn pending<F>(fut: F) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        Self::Pending(fut.boxed())
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// Drive the result to completion.
    pub async fn resolve(self) -> T {
        match self {
            Self::Ready(value) => value,
            Self::Pending(fut) => fut.await,
        }
    }
}

impl<T> From<T> for Deferred<T> {
    fn from(value: T) -> Self {
        Self::Ready(value)
    }
}

impl<T> IntoFuture for Deferred<T> {
    type Output = T;
    type IntoFuture = Either<future::Ready<T>, BoxFuture<'static, T>>;

    fn into_future(self) -> Self::IntoFuture {
        match self {
            Self::Ready(value) => Either::Left(future::ready(value)),
            Self::Pending(fut) => Either::Right(fut),
        }
    }
}

impl<T> fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(_) => f.write_str("Deferred::Ready(..)"),
            Self::Pending(_) => f.write_str("Deferred::Pending(..)"),
        }
    }
}

/// The document operation a function is running within.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier of a stored document. Backends key by string or by integer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocumentId {
    Number(i64),
    Text(String),
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentId::Number(n) => write!(f, "{n}"),
            DocumentId::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for DocumentId {
    fn from(s: &str) -> Self {
        DocumentId::Text(s.to_string())
    }
}

impl From<i64> for DocumentId {
    fn from(n: i64) -> Self {
        DocumentId::Number(n)
    }
}

/// The acting user, as an uninterpreted record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserRecord(pub Value);

/// The request a document operation runs on behalf of.
///
/// Carries the acting user, the requested locale key and one arbitrary
/// extension value owned by the transport layer.
#[derive(Clone, Default)]
pub struct Request {
    user: Option<UserRecord>,
    locale: Option<String>,
    extension: Option<Arc<dyn Any + Send + Sync>>,
}

impl Request {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, user: UserRecord) -> Self {
        self.user = Some(user);
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn with_extension<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.extension = Some(Arc::new(value));
        self
    }

    pub fn user(&self) -> Option<&UserRecord> {
        self.user.as_ref()
    }

    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    /// Borrow the extension value if it has type `T`.
    pub fn extension<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.extension.as_ref()?.downcast_ref::<T>()
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("user", &self.user)
            .field("locale", &self.locale)
            .field("extension", &self.extension.is_some())
            .finish()
    }
}

/// Scratch space shared by every function invoked during one operation.
///
/// Clones share the same map, so a value stored by one hook is visible to
/// hooks on other fields of the same operation.
#[derive(Clone, Default)]
pub struct RequestContext(Arc<DashMap<String, Value>>);

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.0.get(key).map(|v| v.value().clone())
    }

    pub fn insert(&self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("entries", &self.0.len())
            .finish()
    }
}

type ConditionFn = dyn Fn(&Document, &Document, Option<&UserRecord>) -> bool + Send + Sync;

/// Visibility gate evaluated while rendering.
///
/// Receives the whole document, the sibling data at the field's level and
/// the acting user. It cannot suspend.
#[derive(Clone)]
pub struct Condition(Arc<ConditionFn>);

impl Condition {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Document, &Document, Option<&UserRecord>) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn evaluate(
        &self,
        data: &Document,
        sibling_data: &Document,
        user: Option<&UserRecord>,
    ) -> bool {
        (self.0)(data, sibling_data, user)
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Condition").finish_non_exhaustive()
    }
}

impl PartialEq for Condition {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Arguments handed to a dynamic relationship filter.
#[derive(Debug, Clone)]
pub struct FilterOptionsArgs {
    pub id: Option<DocumentId>,
    pub user: Option<UserRecord>,
    pub data: Document,
    pub sibling_data: Document,
    pub relation_to: String,
}

type FilterFn = dyn Fn(&FilterOptionsArgs) -> Value + Send + Sync;

/// Restricts which documents a relationship or upload may point at.
///
/// Either a fixed `where` query or a function producing one. The query is
/// opaque JSON handed to the persistence layer.
#[derive(Clone)]
pub enum FilterOptions {
    Where(Value),
    Resolver(Arc<FilterFn>),
}

impl FilterOptions {
    pub fn resolver<F>(f: F) -> Self
    where
        F: Fn(&FilterOptionsArgs) -> Value + Send + Sync + 'static,
    {
        Self::Resolver(Arc::new(f))
    }

    pub fn resolve(&self, args: &FilterOptionsArgs) -> Value {
        match self {
            Self::Where(query) => query.clone(),
            Self::Resolver(f) => f(args),
        }
    }
}

impl fmt::Debug for FilterOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Where(query) => f.debug_tuple("Where").field(query).finish(),
            Self::Resolver(_) => f.write_str("Resolver(..)"),
        }
    }
}

impl PartialEq for FilterOptions {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Where(a), Self::Where(b)) => a == b,
            (Self::Resolver(a), Self::Resolver(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

// Resolvers have no wire form and serialize as null.
impl Serialize for FilterOptions {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Where(query) => query.serialize(serializer),
            Self::Resolver(_) => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for FilterOptions {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::Where)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn deferred_ready_and_pending_resolve() {
        let ready: Deferred<i32> = Deferred::ready(1);
        assert!(ready.is_ready());
        assert_eq!(ready.await, 1);

        let pending = Deferred::pending(async { 2 });
        assert!(!pending.is_ready());
        assert_eq!(pending.resolve().await, 2);
    }

    #[test]
    fn deferred_blocks_on_in_sync_code() {
        let value = tokio_test::block_on(Deferred::pending(async { "later" }).resolve());
        assert_eq!(value, "later");
    }

    #[test]
    fn operation_wire_names() {
        assert_eq!(serde_json::to_value(Operation::Create).unwrap(), json!("create"));
        let op: Operation = serde_json::from_value(json!("delete")).unwrap();
        assert_eq!(op, Operation::Delete);
        assert_eq!(Operation::Update.to_string(), "update");
    }

    #[test]
    fn document_id_accepts_number_or_string() {
        let n: DocumentId = serde_json::from_value(json!(42)).unwrap();
        let s: DocumentId = serde_json::from_value(json!("abc")).unwrap();
        assert_eq!(n, DocumentId::Number(42));
        assert_eq!(s, DocumentId::Text("abc".into()));
        assert_eq!(n.to_string(), "42");
    }

    #[test]
    fn request_extension_downcasts_by_type() {
        struct Tenant(&'static str);
        let req = Request::new()
            .with_user(UserRecord(json!({"id": 7})))
            .with_locale("de")
            .with_extension(Tenant("acme"));
        assert_eq!(req.extension::<Tenant>().map(|t| t.0), Some("acme"));
        assert!(req.extension::<String>().is_none());
        assert_eq!(req.locale(), Some("de"));
        assert_eq!(req.user(), Some(&UserRecord(json!({"id": 7}))));
    }

    #[test]
    fn request_context_clones_share_entries() {
        let ctx = RequestContext::new();
        let other = ctx.clone();
        other.insert("seen", json!(true));
        assert_eq!(ctx.get("seen"), Some(json!(true)));
        assert_eq!(ctx.len(), 1);
    }

    #[test]
    fn condition_reads_sibling_data() {
        let cond = Condition::new(|_, siblings, _| siblings.get("enabled") == Some(&json!(true)));
        let data = Document::new();
        let mut siblings = Document::new();
        assert!(!cond.evaluate(&data, &siblings, None));
        siblings.insert("enabled".into(), json!(true));
        assert!(cond.evaluate(&data, &siblings, None));
        assert_eq!(cond, cond.clone());
    }

    #[test]
    fn filter_options_where_round_trips_and_resolver_serializes_null() {
        let static_filter: FilterOptions =
            serde_json::from_value(json!({"status": {"equals": "published"}})).unwrap();
        let args = FilterOptionsArgs {
            id: None,
            user: None,
            data: Document::new(),
            sibling_data: Document::new(),
            relation_to: "posts".into(),
        };
        assert_eq!(static_filter.resolve(&args), json!({"status": {"equals": "published"}}));

        let dynamic = FilterOptions::resolver(|a| json!({"collection": a.relation_to}));
        assert_eq!(dynamic.resolve(&args), json!({"collection": "posts"}));
        assert_eq!(serde_json::to_value(&dynamic).unwrap(), Value::Null);
    }
}
