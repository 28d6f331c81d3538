//! Integration tests for the policy cascade and dispatcher
//!
//! These drive the public API end to end: policies loaded from YAML, a
//! store-backed dispatcher, and the style cascades.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde_json::{json, Map, Value};
use stagecraft_rs::kit::effects::{EffectEvent, HttpRequest, SideEffects};
use stagecraft_rs::kit::error::StageError;
use stagecraft_rs::stagecraft::capability::{Capabilities, InspectorMode};
use stagecraft_rs::stagecraft::condition::{node_scope, visible_props};
use stagecraft_rs::stagecraft::expr::{self, BindingScope};
use stagecraft_rs::stagecraft::flow::Dispatcher;
use stagecraft_rs::stagecraft::model::{Node, Project};
use stagecraft_rs::stagecraft::policy::{PolicyLoader, PolicyRegistry};
use stagecraft_rs::stagecraft::store::{Snapshot, SnapshotProvider, Store, StoreEffects};
use stagecraft_rs::stagecraft::style::{SheetQuery, Viewports, ANY_SCREEN};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

// ============================================================================
// Fixtures
// ============================================================================

static POLICY: Lazy<PolicyRegistry> = Lazy::new(|| {
    PolicyLoader::parse_yaml(
        r#"
styles:
  allow: [width, height, opacity]
  deny: [behavior]
  perTag:
    card:
      allow: [boxShadow]
  meta:
    opacity: {type: number, min: 0, max: 1}
tags:
  card:
    sections: [layout, style]
    styleGroups:
      spacing: [margin, padding]
      border: [border, borderRadius]
    styles:
      deny: [width]
    events: [click]
  label:
    styleGroups:
      typography: [color, fontSize]
components:
  Card:
    tags: [card]
    defaultTag: card
    canHaveChildren: true
    props:
      - key: title
      - key: subtitle
        whenExpr: "node.props.title"
      - key: link
        when: {clickable: true}
componentPolicies:
  Card:
    inspector:
      border.borderRadius: {visible: false}
      spacing: {visible: true}
    styles:
      deny: [padding]
templates:
  promo:
    name: Promo card
    inspector:
      styles:
        allow: [margin, border, height, boxShadow]
      actions:
        deny: [http]
"#,
    )
    .unwrap()
});

static SHOP: Lazy<Project> = Lazy::new(|| {
    serde_json::from_value(json!({
        "id": "shop",
        "pages": [{"id": "home"}, {"id": "thanks"}, {"id": "error"}],
        "fragments": [{"id": "spinner"}],
        "nodes": {
            "buy": {
                "id": "buy",
                "component": "Button",
                "actions": {
                    "click": {
                        "steps": [
                            {"kind": "openFragment", "fragmentId": "spinner"},
                            {"kind": "http", "method": "POST", "url": "ftp://orders.test/new"},
                            {"kind": "setData", "path": "order.placed", "value": true},
                            {"kind": "closeFragment"}
                        ]
                    }
                }
            }
        },
        "flows": [
            {"id": "ok", "from": {"nodeId": "buy", "event": "click"},
             "when": {"expr": "data.order.placed == true"},
             "to": {"kind": "navigate", "toPageId": "thanks"}},
            {"id": "ko", "from": {"nodeId": "buy", "event": "click"},
             "when": {"expr": "!data.order.placed"},
             "to": {"kind": "navigate", "toPageId": "error"}}
        ]
    }))
    .unwrap()
});

/// Records calls; every effect fails for ids/urls containing "fail"
#[derive(Default)]
struct RecordingEffects {
    calls: Mutex<Vec<String>>,
}

impl RecordingEffects {
    fn push(&self, call: String) -> Result<(), StageError> {
        let failing = call.contains("fail");
        self.calls.lock().unwrap().push(call);
        if failing {
            Err(StageError::effect("mock", "failure requested"))
        } else {
            Ok(())
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SideEffects for RecordingEffects {
    async fn alert(&self, message: &str) -> Result<(), StageError> {
        self.push(format!("alert {}", message))
    }

    async fn set_data(&self, path: &str, value: Value) -> Result<(), StageError> {
        self.push(format!("setData {} {}", path, value))
    }

    async fn set_props(&self, node_id: &str, _patch: Map<String, Value>) -> Result<(), StageError> {
        self.push(format!("setProps {}", node_id))
    }

    async fn http(&self, request: &HttpRequest) -> Result<Value, StageError> {
        self.push(format!("http {}", request.url))?;
        Ok(json!({"ok": true}))
    }

    async fn emit(&self, topic: &str, _payload: Option<Value>) -> Result<(), StageError> {
        self.push(format!("emit {}", topic))
    }

    async fn navigate(&self, page_id: &str) -> Result<(), StageError> {
        self.push(format!("navigate {}", page_id))
    }

    async fn open_fragment(&self, fragment_id: &str) -> Result<(), StageError> {
        self.push(format!("open {}", fragment_id))
    }

    async fn close_fragment(&self, fragment_id: Option<&str>) -> Result<(), StageError> {
        self.push(format!("close {}", fragment_id.unwrap_or("-")))
    }
}

// ============================================================================
// Expressions
// ============================================================================

#[test]
fn test_expression_examples() {
    let scope = BindingScope::from_json(&json!({
        "data": {"user": "admin"},
        "node": {"props": {"enabled": true}},
        "project": null
    }));
    assert!(expr::evaluate(
        "data.user == 'admin' && node.props.enabled == true",
        &scope
    ));
    assert!(!expr::evaluate("3 > 'a'", &BindingScope::default()));
    assert!(!expr::evaluate(
        "data.missing.path == 1",
        &BindingScope::with_data(json!({}))
    ));
}

#[test]
fn test_expression_against_typed_project() {
    let node = SHOP.node("buy").unwrap();
    let scope = BindingScope::new(json!({}), Some(node), Some(&*SHOP));
    assert!(expr::evaluate(
        "project.id == 'shop' && node.component == 'Button'",
        &scope
    ));
    assert!(!expr::evaluate("window.location", &scope));
}

// ============================================================================
// Capabilities
// ============================================================================

#[test]
fn test_tag_deny_beats_global_allow() {
    let node = Node::new("c1", "Card");
    for mode in [
        InspectorMode::Standard,
        InspectorMode::Template,
        InspectorMode::Expert,
    ] {
        let caps = Capabilities::for_node(&POLICY, &node, mode);
        assert!(!caps.is_allowed("width"), "{:?}", mode);
        assert!(!caps.is_allowed("behavior"), "{:?}", mode);
        assert!(caps.is_allowed("height"), "{:?}", mode);
        assert!(caps.is_allowed("boxShadow"), "{:?}", mode);
        // height survives so the alias stays
        assert!(caps.is_allowed("size"), "{:?}", mode);
    }
}

#[test]
fn test_layers_by_mode() {
    let mut node = Node::new("c1", "Card");
    node.template = Some("promo".to_string());

    let standard = Capabilities::for_node(&POLICY, &node, InspectorMode::Standard);
    assert!(!standard.is_allowed("padding"));
    assert!(!standard.is_allowed("opacity"));
    assert!(standard.is_allowed("margin"));
    assert!(!standard.is_visible("border", "borderRadius"));
    assert!(standard.is_visible("border", "border"));
    assert!(standard.is_visible("spacing", "margin"));
    assert!(!standard.allows_action_kind("http"));

    let template = Capabilities::for_node(&POLICY, &node, InspectorMode::Template);
    assert!(!template.is_allowed("padding"));
    assert!(template.is_visible("border", "borderRadius"));
    assert!(!template.allows_action_kind("http"));
    // promo keeps height but does not list the size alias
    assert!(template.is_allowed("height"));
    assert!(!template.is_allowed("size"));

    let expert = Capabilities::for_node(&POLICY, &node, InspectorMode::Expert);
    assert!(expert.is_allowed("padding"));
    assert!(expert.is_allowed("opacity"));
    assert!(expert.allows_action_kind("http"));
    assert!(expert.is_allowed("size"));
}

#[test]
fn test_sections_events_and_patch_checks() {
    let node = Node::new("c1", "Card");
    let caps = Capabilities::for_node(&POLICY, &node, InspectorMode::Expert);
    assert!(caps.is_section_allowed("layout"));
    assert!(!caps.is_section_allowed("actions"));
    assert!(caps.allows_event("click"));
    assert!(!caps.allows_event("hover"));
    // No attribute list on the tag: anything goes
    assert!(caps.allows_attribute("data-id"));

    let patch = json!({"opacity": 0.5, "width": "10px", "margin": "4px"});
    let violations = caps.check_style_patch(patch.as_object().unwrap());
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].key, "width");

    let patch = json!({"opacity": "1.5"});
    let violations = caps.check_style_patch(patch.as_object().unwrap());
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].key, "opacity");
}

#[test]
fn test_visible_props_gates() {
    let mut node = Node::new("c1", "Card");
    let keys = |node: &Node, data: Value| -> Vec<String> {
        let scope = node_scope(data, node, None);
        visible_props(&POLICY, node, &scope)
            .iter()
            .map(|p| p.key.clone())
            .collect()
    };

    assert_eq!(keys(&node, json!({})), vec!["title"]);

    node.props.insert("title".to_string(), json!("Sale"));
    node.props.insert("clickable".to_string(), json!(true));
    assert_eq!(keys(&node, json!({})), vec!["title", "subtitle", "link"]);

    node.prop_visibility
        .insert("link".to_string(), "data.editor.advanced".to_string());
    assert_eq!(keys(&node, json!({})), vec!["title", "subtitle"]);
    assert_eq!(
        keys(&node, json!({"editor": {"advanced": true}})),
        vec!["title", "subtitle", "link"]
    );
}

// ============================================================================
// Style cascade
// ============================================================================

#[test]
fn test_viewport_cascade() {
    let mut node = Node::new("n1", "Text");
    node.styles.insert("base".to_string(), json!({"color": "red"}));
    node.styles.insert("mobile".to_string(), json!({"color": "blue"}));

    let independent: Viewports = serde_json::from_value(json!({
        "entries": [{"name": "mobile", "mode": "independent"}]
    }))
    .unwrap();
    let unified: Viewports = serde_json::from_value(json!({
        "entries": [{"name": "mobile", "mode": "unified"}]
    }))
    .unwrap();

    assert_eq!(
        Value::Object(node.effective_style(&independent, "mobile")),
        json!({"color": "blue"})
    );
    assert_eq!(
        Value::Object(node.effective_style(&independent, "base")),
        json!({"color": "red"})
    );
    assert_eq!(
        Value::Object(node.effective_style(&unified, "mobile")),
        json!({"color": "red"})
    );
}

#[test]
fn test_rule_sheet_cascade_through_store_commands() {
    let mut project = Project::default();
    let mut node = Node::new("n1", "Text");
    node.classes.push("muted".to_string());
    project.add_node(node);
    project.style_sheet = serde_json::from_value(json!({"rules": [
        {"id": "c", "selector": {"kind": "class", "name": "muted"},
         "declaration": {"color": "grey", "margin": "0"}},
        {"id": "d", "selector": {"kind": "class", "name": "muted"},
         "when": {"theme": "dark"}, "declaration": {"color": "white"}}
    ]}))
    .unwrap();

    let mut snapshot = Snapshot::new(project);
    for (viewport, patch) in [
        (None, json!({"color": "black"})),
        (Some("mobile"), json!({"margin": "8px"})),
        (None, json!({"fontSize": "14px"})),
    ] {
        snapshot = stagecraft_rs::stagecraft::store::Command::UpsertStyleRule {
            node_id: "n1".to_string(),
            viewport: viewport.map(str::to_string),
            patch: patch.as_object().unwrap().clone(),
        }
        .apply(&snapshot)
        .unwrap();
    }

    let sheet = &snapshot.project.style_sheet;
    let node = snapshot.node("n1").unwrap();
    assert_eq!(sheet.rules.len(), 4);

    assert_eq!(
        Value::Object(sheet.resolve(node, SheetQuery::viewport("base"))),
        json!({"color": "black", "margin": "0", "fontSize": "14px"})
    );
    assert_eq!(
        Value::Object(sheet.resolve(node, SheetQuery::viewport("mobile"))),
        json!({"color": "black", "margin": "8px", "fontSize": "14px"})
    );
    let dark = SheetQuery {
        theme: Some("dark"),
        ..SheetQuery::viewport("base")
    };
    assert_eq!(
        sheet.resolve(node, dark).get("color"),
        Some(&json!("black"))
    );

    let breakdown = sheet.breakdown(node, None, None);
    assert_eq!(
        Value::Object(breakdown["mobile"].clone()),
        json!({"margin": "8px"})
    );
    assert_eq!(
        Value::Object(breakdown[ANY_SCREEN].clone()),
        json!({"color": "black", "margin": "0", "fontSize": "14px"})
    );
}

// ============================================================================
// Dispatcher
// ============================================================================

#[tokio::test]
async fn test_store_backed_dispatch_isolates_failures_and_drives_edges() {
    let store = Store::new(Snapshot::new(SHOP.clone()));
    let (tx, mut rx) = mpsc::channel(32);
    let effects = StoreEffects::new(store.clone(), Duration::from_secs(1))
        .unwrap()
        .with_events(tx);
    let dispatcher = Dispatcher::new(Arc::new(store.clone()), Arc::new(effects));

    let report = dispatcher.dispatch("buy", "click").await;
    drop(dispatcher);

    assert_eq!(report.steps_run, 4);
    assert_eq!(report.steps_failed, 1);
    assert_eq!(report.edges_fired, 1);
    assert_eq!(report.edges_skipped, 1);

    let state = store.snapshot().await;
    assert_eq!(state.data, json!({"order": {"placed": true}}));
    assert_eq!(state.ui.active_page.as_deref(), Some("thanks"));
    assert!(state.ui.open_fragments.is_empty());

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    assert_eq!(
        events,
        vec![
            EffectEvent::FragmentOpened {
                fragment_id: "spinner".to_string()
            },
            EffectEvent::Error {
                kind: "http".to_string(),
                message: "Effect 'http' failed: unsupported scheme 'ftp'".to_string()
            },
            EffectEvent::DataChanged {
                path: "order.placed".to_string()
            },
            EffectEvent::FragmentClosed { fragment_id: None },
            EffectEvent::Navigated {
                page_id: "thanks".to_string()
            },
        ]
    );
}

#[tokio::test]
async fn test_failures_in_mock_effects_are_isolated() {
    let project: Project = serde_json::from_value(json!({
        "nodes": {"form": {"id": "form", "component": "Container", "actions": {"submit": {"steps": [
            {"kind": "alert", "message": "sending"},
            {"kind": "http", "url": "https://api.test/fail", "saveTo": "result"},
            {"kind": "setProps", "nodeId": "form-fail", "patch": {}},
            {"kind": "setData", "path": "sent", "value": true}
        ]}}}},
        "flows": [
            {"from": {"nodeId": "form", "event": "submit"},
             "to": {"kind": "openFragment", "fragmentId": "fail-toast"}},
            {"from": {"nodeId": "form", "event": "submit"},
             "to": {"kind": "closeFragment", "fragmentId": "form"}}
        ]
    }))
    .unwrap();

    let recorder = Arc::new(RecordingEffects::default());
    let dispatcher = Dispatcher::new(Arc::new(Snapshot::new(project)), recorder.clone());
    let report = dispatcher.dispatch("form", "submit").await;

    assert_eq!(
        recorder.calls(),
        vec![
            "alert sending",
            "http https://api.test/fail",
            "setProps form-fail",
            "setData sent true",
            "open fail-toast",
            "close form",
        ]
    );
    assert_eq!(report.steps_run, 4);
    assert_eq!(report.steps_failed, 2);
    assert_eq!(report.edges_fired, 1);
}

#[test]
fn test_policy_round_trips_as_json() {
    let text = serde_json::to_string(&*POLICY).unwrap();
    let parsed = PolicyLoader::parse_json(&text).unwrap();
    assert_eq!(parsed, *POLICY);
}
