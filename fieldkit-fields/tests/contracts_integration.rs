//! Integration tests for the function contracts a document engine drives:
//! hooks, validation, field access and conditions, plus the YAML shapes the
//! taxonomy refuses.

use std::sync::{Arc, Mutex};

use fieldkit_fields::{
    run_stage, run_stages, AccessArgs, Condition, Document, Field, FieldAccess,
    FieldAccessControl, FieldHook, FieldHooks, FieldKind, HookScope, HookStage, Operation,
    Request, Tab, UserRecord, Validate, ValidationEngine, ValidationResult, ValidationScope,
};
use serde_json::{json, Value};

fn doc(value: Value) -> Document {
    value.as_object().cloned().unwrap()
}

fn field(yaml: &str) -> Field {
    serde_yaml::from_str(yaml).unwrap()
}

fn hooked(name: &str, stage: HookStage, hooks: Vec<FieldHook>) -> Field {
    Field::text(name).with_base(|b| {
        b.hooks = hooks
            .into_iter()
            .fold(FieldHooks::default(), |acc, hook| acc.with(stage, hook));
    })
}

#[tokio::test]
async fn test_hooks_run_in_declaration_order() {
    let h1 = FieldHook::sync(|args| {
        let v = args.value.and_then(|v| v.as_str().map(str::to_string));
        Ok(Some(json!(format!("{}-h1", v.unwrap_or_default()))))
    });
    let h2 = FieldHook::deferred(|args| async move {
        let v = args.value.and_then(|v| v.as_str().map(str::to_string));
        Ok::<_, anyhow::Error>(Some(json!(format!("{}-h2", v.unwrap_or_default()))))
    });
    let fields = vec![hooked("title", HookStage::BeforeChange, vec![h1, h2])];

    let mut data = doc(json!({ "title": "x" }));
    run_stage(
        HookStage::BeforeChange,
        &fields,
        &mut data,
        &HookScope::new(Operation::Create),
    )
    .await
    .unwrap();
    assert_eq!(data["title"], json!("x-h1-h2"));
}

#[tokio::test]
async fn test_stages_finish_before_the_next_begins() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let record = |label: &'static str, seen: Arc<Mutex<Vec<&'static str>>>| {
        FieldHook::deferred(move |_| {
            let seen = seen.clone();
            async move {
                tokio::task::yield_now().await;
                seen.lock().unwrap().push(label);
                Ok::<_, anyhow::Error>(None)
            }
        })
    };
    let field = Field::text("a").with_base(|b| {
        b.hooks = FieldHooks::default()
            .with(HookStage::BeforeValidate, record("a:validate", seen.clone()))
            .with(HookStage::BeforeChange, record("a:change", seen.clone()));
    });
    let other = Field::text("b").with_base(|b| {
        b.hooks =
            FieldHooks::default().with(HookStage::BeforeValidate, record("b:validate", seen.clone()));
    });

    let mut data = doc(json!({ "a": 1, "b": 2 }));
    run_stages(
        &HookStage::WRITE,
        &[field, other],
        &mut data,
        &HookScope::new(Operation::Update),
    )
    .await
    .unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec!["a:validate", "b:validate", "a:change"]
    );
    assert_eq!(data, doc(json!({ "a": 1, "b": 2 })));
}

#[tokio::test]
async fn test_hook_inside_named_tab_sees_tab_data() {
    let upper = FieldHook::sync(|args| {
        assert!(args.sibling_data.contains_key("title"));
        Ok(args
            .value
            .and_then(|v| v.as_str().map(|s| json!(s.to_uppercase()))))
    });
    let fields = vec![Field::tabs(vec![Tab::named(
        "meta",
        vec![hooked("title", HookStage::BeforeChange, vec![upper])],
    )])];

    let mut data = doc(json!({ "meta": { "title": "hello" } }));
    run_stage(
        HookStage::BeforeChange,
        &fields,
        &mut data,
        &HookScope::new(Operation::Create),
    )
    .await
    .unwrap();
    assert_eq!(data["meta"]["title"], json!("HELLO"));
}

#[tokio::test]
async fn test_hook_error_aborts_the_stage() {
    let fail = FieldHook::sync(|_| Err(anyhow::anyhow!("slug taken")));
    let fields = vec![hooked("slug", HookStage::BeforeChange, vec![fail])];
    let mut data = doc(json!({ "slug": "home" }));
    let err = run_stage(
        HookStage::BeforeChange,
        &fields,
        &mut data,
        &HookScope::new(Operation::Create),
    )
    .await
    .unwrap_err();
    assert_eq!(err.to_string(), "slug taken");
}

#[tokio::test]
async fn test_many_valued_number_reports_row_violation() {
    let scores = field(
        r#"
type: number
name: scores
hasMany: true
minRows: 1
maxRows: 3
"#,
    );
    let engine = ValidationEngine::new();

    let errors = engine
        .validate_document(
            &[scores.clone()],
            &doc(json!({ "scores": [1, 2, 3, 4] })),
            &ValidationScope::default(),
        )
        .await;
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].path, "scores");
    assert_eq!(errors[0].message, "This field allows no more than 3 row(s).");

    let ok = engine
        .validate_document(
            &[scores],
            &doc(json!({ "scores": [1, 3] })),
            &ValidationScope::default(),
        )
        .await;
    assert!(ok.is_empty());
}

#[tokio::test]
async fn test_required_field_inside_array_rows() {
    let fields = vec![Field::array(
        "links",
        vec![Field::text("url").with_base(|b| b.required = true)],
    )];
    let errors = ValidationEngine::new()
        .validate_document(
            &fields,
            &doc(json!({ "links": [{ "url": "https://a" }, {}] })),
            &ValidationScope::default(),
        )
        .await;
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].path, "links.1.url");
    assert_eq!(errors[0].message, "This field is required.");
}

#[tokio::test]
async fn test_custom_validate_replaces_default() {
    let even = Validate::deferred(|value, options| async move {
        assert_eq!(options.path.to_string(), "count");
        match value.and_then(|v| v.as_i64()) {
            Some(n) if n % 2 == 0 => ValidationResult::Valid,
            _ => ValidationResult::invalid("must be even"),
        }
    });
    let fields = vec![Field::number("count").with_base(|b| b.validate = Some(even))];
    let engine = ValidationEngine::new();

    let errors = engine
        .validate_document(&fields, &doc(json!({ "count": 3 })), &ValidationScope::default())
        .await;
    assert_eq!(errors[0].message, "must be even");

    let errors = engine
        .validate_document(&fields, &doc(json!({ "count": 4 })), &ValidationScope::default())
        .await;
    assert!(errors.is_empty());
}

#[tokio::test]
async fn test_field_access_by_operation() {
    let control = FieldAccessControl::default().with(
        Operation::Update,
        FieldAccess::sync(|args| {
            args.user()
                .and_then(|u| u.get("role"))
                .is_some_and(|r| r == "editor")
        }),
    );

    let editor = Request::new().with_user(UserRecord(json!({ "role": "editor" })));
    let guest = Request::new();

    assert_eq!(
        control
            .evaluate(Operation::Update, AccessArgs::new(editor).with_id("doc-1"))
            .await
            .unwrap(),
        Some(true)
    );
    assert_eq!(
        control
            .evaluate(Operation::Update, AccessArgs::new(guest.clone()))
            .await
            .unwrap(),
        Some(false)
    );
    assert_eq!(
        control
            .evaluate(Operation::Read, AccessArgs::new(guest))
            .await
            .unwrap(),
        None
    );
}

#[test]
fn test_condition_controls_visibility() {
    let field = Field::text("reason").with_condition(Condition::new(|_, siblings, _| {
        siblings.get("status") == Some(&json!("rejected"))
    }));
    let empty = Document::new();
    assert!(field.is_visible(&empty, &doc(json!({ "status": "rejected" })), None));
    assert!(!field.is_visible(&empty, &doc(json!({ "status": "draft" })), None));
    assert!(Field::text("title").is_visible(&empty, &empty, None));

    let tab = Field::Tab(Tab::named("meta", vec![]))
        .with_condition(Condition::new(|data, _, _| data.contains_key("seo")));
    assert!(!tab.is_visible(&empty, &empty, None));
    assert!(tab.is_visible(&doc(json!({ "seo": true })), &empty, None));
}

#[test]
fn test_classification_is_consistent_across_kinds() {
    let yaml = r#"
- { type: text, name: a }
- { type: number, name: b }
- { type: email, name: c }
- { type: textarea, name: d }
- { type: checkbox, name: e }
- { type: date, name: f }
- { type: blocks, name: g, blocks: [] }
- { type: group, name: h, fields: [] }
- { type: radio, name: i, options: [] }
- { type: relationship, name: j, relationTo: posts }
- { type: array, name: k, fields: [] }
- { type: richText, name: l }
- { type: select, name: m, options: [] }
- { type: upload, name: n, relationTo: media }
- { type: code, name: o }
- { type: json, name: p }
- { type: point, name: q }
- { type: row, fields: [] }
- { type: collapsible, label: More, fields: [] }
- { type: tabs, tabs: [] }
- { type: ui, name: r }
"#;
    let fields: Vec<Field> = serde_yaml::from_str(yaml).unwrap();
    let kinds: Vec<FieldKind> = fields.iter().map(Field::kind).collect();
    assert_eq!(kinds.as_slice(), &FieldKind::ALL[..21]);

    for field in &fields {
        if field.has_sub_fields() {
            assert!(field.as_with_sub_fields().is_some(), "{}", field.kind());
        }
        if field.supports_many() {
            assert!(field.as_with_many().is_some(), "{}", field.kind());
        }
        if field.supports_max_depth() {
            assert!(field.as_with_max_depth().is_some(), "{}", field.kind());
        }
        assert!(!(field.is_layout_only() && field.affects_data()));
        assert_eq!(
            field.affects_data(),
            !field.is_presentational_only() && field.name().is_some()
        );
        assert_eq!(
            field.has_sub_fields(),
            matches!(
                field.kind(),
                FieldKind::Group | FieldKind::Array | FieldKind::Row | FieldKind::Collapsible
            )
        );
        assert_eq!(field.is_presentational_only(), field.kind() == FieldKind::Ui);
    }
}

#[test]
fn test_invalid_shapes_do_not_parse() {
    let cases = [
        "{ type: text, name: a, label: true }",
        "{ type: number, name: a, minRows: 1 }",
        "{ type: select, name: a, options: [], maxRows: 2 }",
        "{ type: relationship, name: a, relationTo: posts, hasMany: true, min: 1 }",
        "{ type: array, name: a, fields: [], minRows: 3, maxRows: 1 }",
        "{ type: tabs, tabs: [{ label: Meta, interfaceName: Meta, fields: [] }] }",
        "{ type: unknown, name: a }",
    ];
    for yaml in cases {
        assert!(
            serde_yaml::from_str::<Field>(yaml).is_err(),
            "should reject: {yaml}"
        );
    }

    let suppressed: Field = serde_yaml::from_str("{ type: text, name: a, label: false }").unwrap();
    assert_eq!(suppressed.kind(), FieldKind::Text);
}
