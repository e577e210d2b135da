//! Field-level access predicates.
//!
//! A field may gate `create`, `read` and `update` independently. A missing
//! predicate means "no field-level opinion": [`FieldAccessControl::evaluate`]
//! answers `None` and leaves the decision to whatever collection policy the
//! caller combines it with.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use serde_json::Value;
use tracing::trace;

use crate::contract::{Deferred, Document, DocumentId, Operation, Request};

/// Everything an access predicate sees.
#[derive(Debug, Clone, Default)]
pub struct AccessArgs {
    pub req: Request,
    pub id: Option<DocumentId>,
    pub data: Option<Document>,
    pub sibling_data: Option<Document>,
    /// The stored document, on reads and updates.
    pub doc: Option<Document>,
}

impl AccessArgs {
    pub fn new(req: Request) -> Self {
        Self {
            req,
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<DocumentId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_data(mut self, data: Document) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_sibling_data(mut self, sibling_data: Document) -> Self {
        self.sibling_data = Some(sibling_data);
        self
    }

    pub fn with_doc(mut self, doc: Document) -> Self {
        self.doc = Some(doc);
        self
    }

    /// The acting user's record, if the request carries one.
    pub fn user(&self) -> Option<&Value> {
        self.req.user().map(|u| &u.0)
    }
}

type AccessFn = dyn Fn(AccessArgs) -> Deferred<anyhow::Result<bool>> + Send + Sync;

/// One access predicate.
#[derive(Clone)]
pub struct FieldAccess(Arc<AccessFn>);

impl FieldAccess {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(AccessArgs) -> Deferred<anyhow::Result<bool>> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(AccessArgs) -> bool + Send + Sync + 'static,
    {
        Self::new(move |args| Deferred::ready(Ok(f(args))))
    }

    pub fn deferred<F, Fut>(f: F) -> Self
    where
        F: Fn(AccessArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<bool>> + Send + 'static,
    {
        Self::new(move |args| Deferred::pending(f(args)))
    }

    pub fn call(&self, args: AccessArgs) -> Deferred<anyhow::Result<bool>> {
        (self.0)(args)
    }
}

impl fmt::Debug for FieldAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldAccess").finish_non_exhaustive()
    }
}

impl PartialEq for FieldAccess {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldAccessControl {
    pub create: Option<FieldAccess>,
    pub read: Option<FieldAccess>,
    pub update: Option<FieldAccess>,
}

impl FieldAccessControl {
    /// The predicate for an operation. Deletes are never gated per field.
    pub fn for_operation(&self, operation: Operation) -> Option<&FieldAccess> {
        match operation {
            Operation::Create => self.create.as_ref(),
            Operation::Read => self.read.as_ref(),
            Operation::Update => self.update.as_ref(),
            Operation::Delete => None,
        }
    }

    pub fn with(mut self, operation: Operation, access: FieldAccess) -> Self {
        match operation {
            Operation::Create => self.create = Some(access),
            Operation::Read => self.read = Some(access),
            Operation::Update => self.update = Some(access),
            Operation::Delete => {}
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.create.is_none() && self.read.is_none() && self.update.is_none()
    }

    /// Run the predicate for `operation`. `None` when there is none.
    pub async fn evaluate(
        &self,
        operation: Operation,
        args: AccessArgs,
    ) -> anyhow::Result<Option<bool>> {
        let Some(access) = self.for_operation(operation) else {
            return Ok(None);
        };
        let allowed = access.call(args).await?;
        trace!(%operation, allowed, "field access evaluated");
        Ok(Some(allowed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::UserRecord;
    use crate::types::{Field, Tab};
    use serde_json::json;

    fn admins_only() -> FieldAccess {
        FieldAccess::sync(|args| {
            args.user()
                .and_then(|u| u.get("role"))
                .is_some_and(|r| r == "admin")
        })
    }

    #[tokio::test]
    async fn absent_predicate_has_no_opinion() {
        let control = FieldAccessControl::default();
        assert!(control.is_empty());
        let result = control
            .evaluate(Operation::Read, AccessArgs::default())
            .await
            .unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn predicates_are_per_operation() {
        let control = FieldAccessControl::default().with(Operation::Update, admins_only());
        let editor = Request::new().with_user(UserRecord(json!({"role": "editor"})));
        let admin = Request::new().with_user(UserRecord(json!({"role": "admin"})));

        let denied = control
            .evaluate(Operation::Update, AccessArgs::new(editor.clone()))
            .await
            .unwrap();
        assert_eq!(denied, Some(false));
        let allowed = control
            .evaluate(Operation::Update, AccessArgs::new(admin))
            .await
            .unwrap();
        assert_eq!(allowed, Some(true));
        let unrelated = control
            .evaluate(Operation::Create, AccessArgs::new(editor))
            .await
            .unwrap();
        assert_eq!(unrelated, None);
        assert!(control.for_operation(Operation::Delete).is_none());
    }

    #[tokio::test]
    async fn deferred_predicates_see_document_data() {
        let owner_only = FieldAccess::deferred(|args: AccessArgs| async move {
            tokio::task::yield_now().await;
            let owner = args.doc.as_ref().and_then(|d| d.get("owner")).cloned();
            let user = args.user().and_then(|u| u.get("id")).cloned();
            Ok::<_, anyhow::Error>(owner.is_some() && owner == user)
        });
        let control = FieldAccessControl::default().with(Operation::Read, owner_only);
        let doc = json!({"owner": 7}).as_object().cloned().unwrap();
        let args = AccessArgs::new(Request::new().with_user(UserRecord(json!({"id": 7}))))
            .with_id(1_i64)
            .with_doc(doc);
        assert_eq!(
            control.evaluate(Operation::Read, args).await.unwrap(),
            Some(true)
        );
    }

    #[tokio::test]
    async fn predicate_errors_propagate() {
        let broken = FieldAccess::new(|_| Deferred::ready(Err(anyhow::anyhow!("lookup failed"))));
        let control = FieldAccessControl::default().with(Operation::Create, broken);
        let err = control
            .evaluate(Operation::Create, AccessArgs::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "lookup failed");
    }

    #[test]
    fn fields_and_named_tabs_expose_access() {
        let field = Field::text("salary").with_base(|b| {
            b.access = FieldAccessControl::default().with(Operation::Read, admins_only());
        });
        assert!(field.access().is_some_and(|a| a.read.is_some()));
        assert!(Field::row(vec![]).access().is_none());
        assert!(Field::Tab(Tab::named("meta", vec![])).access().is_some());
        assert!(Field::Tab(Tab::unnamed("Meta", vec![])).access().is_none());
    }
}
