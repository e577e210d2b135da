//! Field hooks and the stage pipeline.
//!
//! A field carries four ordered hook lists, one per [`HookStage`]. Hooks
//! for one field in one stage run in declared order, each seeing the value
//! the previous one returned. [`run_stage`] drives one stage over a whole
//! document, following the same transparent/opaque rules as
//! [`crate::path`], and resolves every deferred result before starting the
//! next hook.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

use crate::contract::{Deferred, Document, Operation, Request, RequestContext};
use crate::path::{Boundary, FieldPath, NodeRef};
use crate::types::{Field, Tab};

/// The stages of a document operation, in execution order.
///
/// `beforeValidate`, `beforeChange` and `afterChange` make up the write
/// path. `afterRead` runs on its own, on the read path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HookStage {
    BeforeValidate,
    BeforeChange,
    AfterChange,
    AfterRead,
}

impl HookStage {
    pub const WRITE: [HookStage; 3] = [
        HookStage::BeforeValidate,
        HookStage::BeforeChange,
        HookStage::AfterChange,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HookStage::BeforeValidate => "beforeValidate",
            HookStage::BeforeChange => "beforeChange",
            HookStage::AfterChange => "afterChange",
            HookStage::AfterRead => "afterRead",
        }
    }

    /// The stage that follows on the write path.
    pub fn next(&self) -> Option<HookStage> {
        match self {
            HookStage::BeforeValidate => Some(HookStage::BeforeChange),
            HookStage::BeforeChange => Some(HookStage::AfterChange),
            HookStage::AfterChange | HookStage::AfterRead => None,
        }
    }
}

impl fmt::Display for HookStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a hook sees for one call.
#[derive(Debug, Clone, Default)]
pub struct HookArgs {
    pub operation: Option<Operation>,
    /// The field's current value; `None` when the key is absent.
    pub value: Option<Value>,
    pub previous_value: Option<Value>,
    /// Data at the field's own level.
    pub sibling_data: Document,
    /// The whole document as it stood when the stage began.
    pub data: Document,
    pub original_doc: Option<Document>,
    pub previous_doc: Option<Document>,
    pub previous_sibling_doc: Option<Document>,
    /// Set on `afterRead` when the read returns many documents.
    pub find_many: bool,
    pub path: FieldPath,
    pub req: Request,
    pub context: RequestContext,
}

type HookFn = dyn Fn(HookArgs) -> Deferred<anyhow::Result<Option<Value>>> + Send + Sync;

/// One field hook. Returns the replacement value, or `None` to keep the
/// current one.
#[derive(Clone)]
pub struct FieldHook(Arc<HookFn>);

impl FieldHook {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(HookArgs) -> Deferred<anyhow::Result<Option<Value>>> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(HookArgs) -> anyhow::Result<Option<Value>> + Send + Sync + 'static,
    {
        Self::new(move |args| Deferred::ready(f(args)))
    }

    pub fn deferred<F, Fut>(f: F) -> Self
    where
        F: Fn(HookArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Option<Value>>> + Send + 'static,
    {
        Self::new(move |args| Deferred::pending(f(args)))
    }

    pub fn call(&self, args: HookArgs) -> Deferred<anyhow::Result<Option<Value>>> {
        (self.0)(args)
    }
}

impl fmt::Debug for FieldHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldHook").finish_non_exhaustive()
    }
}

impl PartialEq for FieldHook {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// The four hook lists of one field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldHooks {
    pub before_validate: Vec<FieldHook>,
    pub before_change: Vec<FieldHook>,
    pub after_change: Vec<FieldHook>,
    pub after_read: Vec<FieldHook>,
}

impl FieldHooks {
    pub fn stage(&self, stage: HookStage) -> &[FieldHook] {
        match stage {
            HookStage::BeforeValidate => &self.before_validate,
            HookStage::BeforeChange => &self.before_change,
            HookStage::AfterChange => &self.after_change,
            HookStage::AfterRead => &self.after_read,
        }
    }

    pub fn stage_mut(&mut self, stage: HookStage) -> &mut Vec<FieldHook> {
        match stage {
            HookStage::BeforeValidate => &mut self.before_validate,
            HookStage::BeforeChange => &mut self.before_change,
            HookStage::AfterChange => &mut self.after_change,
            HookStage::AfterRead => &mut self.after_read,
        }
    }

    /// Append a hook to a stage.
    pub fn with(mut self, stage: HookStage, hook: FieldHook) -> Self {
        self.stage_mut(stage).push(hook);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.before_validate.is_empty()
            && self.before_change.is_empty()
            && self.after_change.is_empty()
            && self.after_read.is_empty()
    }
}

/// Run one field's hooks for one stage, threading the value through.
pub async fn run_field_hooks(
    hooks: &[FieldHook],
    mut args: HookArgs,
) -> anyhow::Result<Option<Value>> {
    for hook in hooks {
        if let Some(next) = hook.call(args.clone()).await? {
            args.value = Some(next);
        }
    }
    Ok(args.value)
}

/// Per-operation inputs shared by every hook call of a stage run.
#[derive(Debug, Clone, Default)]
pub struct HookScope {
    pub operation: Option<Operation>,
    pub original_doc: Option<Document>,
    pub previous_doc: Option<Document>,
    pub find_many: bool,
    pub req: Request,
    pub context: RequestContext,
}

impl HookScope {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation: Some(operation),
            ..Default::default()
        }
    }

    pub fn with_original_doc(mut self, doc: Document) -> Self {
        self.original_doc = Some(doc);
        self
    }

    pub fn with_previous_doc(mut self, doc: Document) -> Self {
        self.previous_doc = Some(doc);
        self
    }

    pub fn with_request(mut self, req: Request) -> Self {
        self.req = req;
        self
    }

    pub fn with_context(mut self, context: RequestContext) -> Self {
        self.context = context;
        self
    }

    pub fn find_many(mut self, find_many: bool) -> Self {
        self.find_many = find_many;
        self
    }
}

/// Run one stage over every field of `doc`, in declaration order.
///
/// Returned values are written back in place. Containers are descended
/// after their own hooks ran, so children see the container's output.
/// Missing groups and rows are not created. The first hook error aborts
/// the run and is returned as is.
pub async fn run_stage(
    stage: HookStage,
    fields: &[Field],
    doc: &mut Document,
    scope: &HookScope,
) -> anyhow::Result<()> {
    let data = doc.clone();
    let walker = StageWalker {
        stage,
        scope,
        data: &data,
    };
    let previous = scope.previous_doc.as_ref();
    walker.fields(fields, &FieldPath::root(), doc, previous).await?;
    debug!(%stage, fields = fields.len(), "hook stage complete");
    Ok(())
}

/// Run several stages one after another. Each stage finishes before the
/// next begins.
pub async fn run_stages(
    stages: &[HookStage],
    fields: &[Field],
    doc: &mut Document,
    scope: &HookScope,
) -> anyhow::Result<()> {
    for stage in stages {
        run_stage(*stage, fields, doc, scope).await?;
    }
    Ok(())
}

fn node_hooks<'a>(node: NodeRef<'a>) -> Option<&'a FieldHooks> {
    match node {
        NodeRef::Tab(Tab::Named(tab)) | NodeRef::Field(Field::Tab(Tab::Named(tab))) => {
            Some(&tab.hooks)
        }
        NodeRef::Tab(Tab::Unnamed(_)) => None,
        NodeRef::Field(field) => field.base().map(|b| &b.hooks),
    }
}

struct StageWalker<'s> {
    stage: HookStage,
    scope: &'s HookScope,
    data: &'s Document,
}

impl StageWalker<'_> {
    fn fields<'a>(
        &'a self,
        fields: &'a [Field],
        path: &'a FieldPath,
        siblings: &'a mut Document,
        previous: Option<&'a Document>,
    ) -> BoxFuture<'a, anyhow::Result<()>> {
        async move {
            for field in fields {
                self.node(NodeRef::Field(field), path, &mut *siblings, previous)
                    .await?;
            }
            Ok(())
        }
        .boxed()
    }

    fn node<'a>(
        &'a self,
        node: NodeRef<'a>,
        path: &'a FieldPath,
        siblings: &'a mut Document,
        previous: Option<&'a Document>,
    ) -> BoxFuture<'a, anyhow::Result<()>> {
        async move {
            let boundary = node.boundary();
            if boundary == Boundary::Transparent {
                for child in node.children() {
                    self.node(child, path, &mut *siblings, previous).await?;
                }
                return Ok(());
            }
            if !node.affects_data() {
                return Ok(());
            }
            let Some(name) = node.name() else {
                return Ok(());
            };
            let own_path = path.child(name);

            if let Some(hooks) = node_hooks(node).map(|h| h.stage(self.stage)) {
                if !hooks.is_empty() {
                    trace!(
                        stage = %self.stage,
                        path = %own_path,
                        hooks = hooks.len(),
                        "running field hooks"
                    );
                    let args = HookArgs {
                        operation: self.scope.operation,
                        value: siblings.get(name).cloned(),
                        previous_value: previous.and_then(|p| p.get(name)).cloned(),
                        sibling_data: siblings.clone(),
                        data: self.data.clone(),
                        original_doc: self.scope.original_doc.clone(),
                        previous_doc: self.scope.previous_doc.clone(),
                        previous_sibling_doc: previous.cloned(),
                        find_many: self.scope.find_many,
                        path: own_path.clone(),
                        req: self.scope.req.clone(),
                        context: self.scope.context.clone(),
                    };
                    if let Some(value) = run_field_hooks(hooks, args).await? {
                        siblings.insert(name.to_string(), value);
                    }
                }
            }

            let previous_child = previous.and_then(|p| p.get(name));
            let Some(current) = siblings.get_mut(name) else {
                return Ok(());
            };
            match node {
                NodeRef::Field(Field::Array(array)) => {
                    for (i, row) in object_rows(current) {
                        let previous_row = previous_row(previous_child, i);
                        self.fields(&array.fields, &own_path.entry(i), row, previous_row)
                            .await?;
                    }
                }
                NodeRef::Field(Field::Blocks(blocks)) => {
                    for (i, row) in object_rows(current) {
                        let Some(block) = blocks.block_for_row(row) else {
                            continue;
                        };
                        let previous_row = previous_row(previous_child, i);
                        self.fields(&block.fields, &own_path.entry(i), row, previous_row)
                            .await?;
                    }
                }
                _ if boundary == (Boundary::Opaque { repeatable: false }) => {
                    if let Value::Object(nested) = current {
                        let previous_nested = previous_child.and_then(Value::as_object);
                        for child in node.children() {
                            self.node(child, &own_path, &mut *nested, previous_nested)
                                .await?;
                        }
                    }
                }
                _ => {}
            }
            Ok(())
        }
        .boxed()
    }
}

fn object_rows(value: &mut Value) -> impl Iterator<Item = (usize, &mut Document)> {
    value
        .as_array_mut()
        .into_iter()
        .flatten()
        .enumerate()
        .filter_map(|(i, row)| row.as_object_mut().map(|obj| (i, obj)))
}

fn previous_row(previous: Option<&Value>, index: usize) -> Option<&Document> {
    previous
        .and_then(Value::as_array)
        .and_then(|rows| rows.get(index))
        .and_then(Value::as_object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Block;
    use serde_json::json;
    use std::sync::Mutex;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    fn append(suffix: &'static str) -> FieldHook {
        FieldHook::sync(move |args| {
            let current = args.value.and_then(|v| v.as_str().map(String::from));
            Ok(Some(json!(format!("{}{suffix}", current.unwrap_or_default()))))
        })
    }

    #[tokio::test]
    async fn hooks_see_the_previous_hooks_output() {
        let hooks = vec![append("-h1"), append("-h2")];
        let args = HookArgs {
            value: Some(json!("in")),
            ..Default::default()
        };
        let out = run_field_hooks(&hooks, args).await.unwrap();
        assert_eq!(out, Some(json!("in-h1-h2")));
    }

    #[tokio::test]
    async fn none_keeps_the_current_value() {
        let keep = FieldHook::sync(|_| Ok(None));
        let hooks = vec![append("-a"), keep, append("-b")];
        let args = HookArgs {
            value: Some(json!("x")),
            ..Default::default()
        };
        assert_eq!(
            run_field_hooks(&hooks, args).await.unwrap(),
            Some(json!("x-a-b"))
        );
    }

    #[tokio::test]
    async fn deferred_hooks_resolve_before_the_next_runs() {
        let slow = FieldHook::deferred(|args: HookArgs| async move {
            tokio::task::yield_now().await;
            let n = args.value.and_then(|v| v.as_i64()).unwrap_or(0);
            Ok::<_, anyhow::Error>(Some(json!(n * 10)))
        });
        let add_one = FieldHook::sync(|args| {
            let n = args.value.and_then(|v| v.as_i64()).unwrap_or(0);
            Ok(Some(json!(n + 1)))
        });
        let args = HookArgs {
            value: Some(json!(2)),
            ..Default::default()
        };
        assert_eq!(
            run_field_hooks(&[slow, add_one], args).await.unwrap(),
            Some(json!(21))
        );
    }

    #[tokio::test]
    async fn errors_propagate_untouched() {
        let fail = FieldHook::sync(|_| Err(anyhow::anyhow!("boom")));
        let never = FieldHook::sync(|_| panic!("must not run after a failure"));
        let err = run_field_hooks(&[fail, never], HookArgs::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn stage_names_and_order() {
        assert_eq!(
            serde_json::to_value(HookStage::BeforeValidate).unwrap(),
            json!("beforeValidate")
        );
        assert_eq!(HookStage::BeforeValidate.next(), Some(HookStage::BeforeChange));
        assert_eq!(HookStage::AfterChange.next(), None);
        assert_eq!(HookStage::AfterRead.next(), None);
        assert_eq!(HookStage::AfterRead.to_string(), "afterRead");
    }

    #[tokio::test]
    async fn run_stage_walks_nested_containers() {
        let upper = FieldHook::sync(|args| {
            Ok(args
                .value
                .and_then(|v| v.as_str().map(|s| json!(s.to_uppercase()))))
        });
        let with_upper = |f: Field| {
            let hook = upper.clone();
            f.with_base(move |b| b.hooks = FieldHooks::default().with(HookStage::BeforeChange, hook))
        };
        let fields = vec![
            Field::row(vec![with_upper(Field::text("title"))]),
            Field::group("meta", vec![with_upper(Field::text("slug"))]),
            Field::array("items", vec![with_upper(Field::text("name"))]),
            Field::blocks(
                "layout",
                vec![Block::new("hero", vec![with_upper(Field::text("heading"))])],
            ),
        ];
        let mut data = doc(json!({
            "title": "hello",
            "meta": {"slug": "a-b"},
            "items": [{"name": "x"}, {"name": "y"}],
            "layout": [{"blockType": "hero", "heading": "welcome"}, {"blockType": "gone"}]
        }));
        run_stage(
            HookStage::BeforeChange,
            &fields,
            &mut data,
            &HookScope::new(Operation::Create),
        )
        .await
        .unwrap();
        assert_eq!(
            Value::Object(data),
            json!({
                "title": "HELLO",
                "meta": {"slug": "A-B"},
                "items": [{"name": "X"}, {"name": "Y"}],
                "layout": [{"blockType": "hero", "heading": "WELCOME"}, {"blockType": "gone"}]
            })
        );
    }

    #[tokio::test]
    async fn run_stage_only_runs_the_requested_stage() {
        let fields = vec![Field::text("title").with_base(|b| {
            b.hooks = FieldHooks::default()
                .with(HookStage::BeforeValidate, append("-validate"))
                .with(HookStage::AfterRead, append("-read"));
        })];
        let mut data = doc(json!({"title": "t"}));
        let scope = HookScope::new(Operation::Read).find_many(true);
        run_stage(HookStage::AfterRead, &fields, &mut data, &scope)
            .await
            .unwrap();
        assert_eq!(data["title"], json!("t-read"));
    }

    #[tokio::test]
    async fn stages_run_strictly_in_sequence() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let record = |label: &'static str| {
            let log = log.clone();
            FieldHook::deferred(move |_args: HookArgs| {
                let log = log.clone();
                async move {
                    tokio::task::yield_now().await;
                    log.lock().unwrap().push(label);
                    Ok::<_, anyhow::Error>(None)
                }
            })
        };
        let fields = vec![
            Field::text("a").with_base(|b| {
                b.hooks = FieldHooks::default()
                    .with(HookStage::BeforeValidate, record("a:validate"))
                    .with(HookStage::BeforeChange, record("a:change"));
            }),
            Field::text("b").with_base(|b| {
                b.hooks = FieldHooks::default()
                    .with(HookStage::BeforeValidate, record("b:validate"))
                    .with(HookStage::AfterChange, record("b:after"));
            }),
        ];
        let mut data = doc(json!({"a": 1, "b": 2}));
        run_stages(
            &HookStage::WRITE,
            &fields,
            &mut data,
            &HookScope::new(Operation::Update),
        )
        .await
        .unwrap();
        assert_eq!(
            *log.lock().unwrap(),
            vec!["a:validate", "b:validate", "a:change", "b:after"]
        );
    }

    #[tokio::test]
    async fn hooks_receive_previous_and_sibling_data() {
        let seen = Arc::new(Mutex::new(None));
        let capture = {
            let seen = seen.clone();
            FieldHook::sync(move |args| {
                *seen.lock().unwrap() = Some(args);
                Ok(None)
            })
        };
        let fields = vec![Field::group(
            "meta",
            vec![Field::text("slug").with_base(|b| {
                b.hooks = FieldHooks::default().with(HookStage::BeforeChange, capture);
            })],
        )];
        let mut data = doc(json!({"meta": {"slug": "new", "other": 1}}));
        let previous = doc(json!({"meta": {"slug": "old"}}));
        let context = RequestContext::new();
        context.insert("trace", json!("abc"));
        let scope = HookScope::new(Operation::Update)
            .with_previous_doc(previous.clone())
            .with_original_doc(previous)
            .with_context(context);
        run_stage(HookStage::BeforeChange, &fields, &mut data, &scope)
            .await
            .unwrap();

        let args = seen.lock().unwrap().take().unwrap();
        assert_eq!(args.operation, Some(Operation::Update));
        assert_eq!(args.value, Some(json!("new")));
        assert_eq!(args.previous_value, Some(json!("old")));
        assert_eq!(args.sibling_data["other"], json!(1));
        assert_eq!(args.previous_sibling_doc.unwrap()["slug"], json!("old"));
        assert_eq!(args.path.to_string(), "meta.slug");
        assert_eq!(args.context.get("trace"), Some(json!("abc")));
        assert!(args.data.contains_key("meta"));
    }

    #[tokio::test]
    async fn named_tab_hooks_run_and_nest() {
        let mut tab = Tab::named("seo", vec![Field::text("title").with_base(|b| {
            b.hooks = FieldHooks::default().with(HookStage::BeforeChange, append("!"));
        })]);
        if let Tab::Named(named) = &mut tab {
            named.hooks = FieldHooks::default().with(
                HookStage::BeforeChange,
                FieldHook::sync(|args| {
                    Ok(args.value.or_else(|| Some(json!({"title": "default"}))))
                }),
            );
        }
        let fields = vec![Field::tabs(vec![
            Tab::unnamed("Main", vec![Field::text("body")]),
            tab,
        ])];
        let mut data = doc(json!({"body": "text"}));
        run_stage(
            HookStage::BeforeChange,
            &fields,
            &mut data,
            &HookScope::new(Operation::Create),
        )
        .await
        .unwrap();
        assert_eq!(data["seo"], json!({"title": "default!"}));
        assert_eq!(data["body"], json!("text"));
    }
}
