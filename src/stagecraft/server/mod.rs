// SPDX-License-Identifier: MIT

//! HTTP surface over the engine
//!
//! Stateless apart from the policy registry: every request carries the
//! project, node or scope it is about.

use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use futures::stream::{self, Stream};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::kit::config::Settings;
use crate::kit::error::StageError;
use crate::stagecraft::capability::{Capabilities, InspectorMode};
use crate::stagecraft::condition::{node_scope, visible_props};
use crate::stagecraft::expr::{self, BindingScope};
use crate::stagecraft::flow::Dispatcher;
use crate::stagecraft::model::{Node, Project};
use crate::stagecraft::policy::PolicyRegistry;
use crate::stagecraft::store::{Snapshot, Store, StoreEffects};
use crate::stagecraft::style::SheetQuery;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<PolicyRegistry>,
    pub http_timeout: Duration,
}

impl AppState {
    pub fn new(registry: Arc<PolicyRegistry>, settings: &Settings) -> Self {
        Self {
            registry,
            http_timeout: settings.http_timeout,
        }
    }
}

type ApiResult = Result<Json<Value>, (StatusCode, Json<Value>)>;

fn bad_request(message: impl std::fmt::Display) -> (StatusCode, Json<Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": message.to_string() })),
    )
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/evaluate", post(evaluate))
        .route("/api/capabilities", post(capabilities))
        .route("/api/styles/resolve", post(resolve_styles))
        .route("/api/dispatch/stream", post(stream_dispatch))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

pub async fn serve(port: u16, state: AppState) -> Result<(), StageError> {
    let app = router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    log::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[derive(Deserialize)]
struct EvaluateRequest {
    expr: String,
    #[serde(default)]
    scope: Value,
}

/// Always answers; a parse error is reported next to `result: false`
async fn evaluate(Json(payload): Json<EvaluateRequest>) -> Json<Value> {
    let scope = BindingScope::from_json(&payload.scope);
    match expr::parse(&payload.expr) {
        Ok(parsed) => {
            let value = expr::evaluate_expr(&parsed, &scope);
            Json(json!({
                "result": expr::is_truthy(value.as_ref()),
                "value": value,
            }))
        }
        Err(e) => Json(json!({ "result": false, "error": e.to_string() })),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CapabilitiesRequest {
    node: Node,
    #[serde(default)]
    mode: InspectorMode,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    project: Option<Project>,
}

async fn capabilities(
    State(state): State<AppState>,
    Json(payload): Json<CapabilitiesRequest>,
) -> Json<Value> {
    let caps = Capabilities::for_node(&state.registry, &payload.node, payload.mode);
    let scope = node_scope(
        payload.data.unwrap_or_else(|| Value::Object(Map::new())),
        &payload.node,
        payload.project.as_ref(),
    );
    let props: Vec<&str> = visible_props(&state.registry, &payload.node, &scope)
        .into_iter()
        .filter(|p| caps.allows_prop(&p.key))
        .map(|p| p.key.as_str())
        .collect();

    Json(json!({
        "capabilities": caps.report(),
        "visibleProps": props,
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResolveStylesRequest {
    project: Project,
    node_id: String,
    #[serde(default)]
    viewport: Option<String>,
    #[serde(default)]
    theme: Option<String>,
    #[serde(default)]
    state: Option<String>,
}

async fn resolve_styles(Json(payload): Json<ResolveStylesRequest>) -> ApiResult {
    let project = &payload.project;
    let node = project
        .node(&payload.node_id)
        .ok_or_else(|| bad_request(format!("Node not found: {}", payload.node_id)))?;
    let viewport = payload
        .viewport
        .as_deref()
        .unwrap_or(project.viewports.base.as_str());

    let query = SheetQuery {
        viewport,
        theme: payload.theme.as_deref(),
        state: payload.state.as_deref(),
    };

    Ok(Json(json!({
        "viewport": viewport,
        "effective": node.effective_style(&project.viewports, viewport),
        "sheet": project.style_sheet.resolve(node, query),
        "breakdown": project.style_sheet.breakdown(node, query.theme, query.state),
    })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DispatchRequest {
    project: Project,
    #[serde(default)]
    data: Option<Value>,
    node_id: String,
    event: String,
}

async fn stream_dispatch(
    State(state): State<AppState>,
    Json(payload): Json<DispatchRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, (StatusCode, Json<Value>)> {
    let (tx, rx) = mpsc::channel(100);

    let mut snapshot = Snapshot::new(payload.project);
    if let Some(data) = payload.data {
        snapshot = snapshot.with_data(data);
    }
    let store = Store::new(snapshot);
    let effects = StoreEffects::new(store.clone(), state.http_timeout)
        .map_err(bad_request)?
        .with_events(tx);

    let node_id = payload.node_id;
    let event = payload.event;
    let handle = tokio::spawn(async move {
        log::info!("Starting streamed dispatch for {}:{}", node_id, event);
        let dispatcher = Dispatcher::new(Arc::new(store), Arc::new(effects));
        dispatcher.dispatch(&node_id, &event).await
    });

    let effects = ReceiverStream::new(rx).map(|event| Ok::<_, Infallible>(to_sse(event, "effect")));
    let report = stream::once(async move {
        let event = match handle.await {
            Ok(report) => to_sse(report, "report"),
            Err(e) => to_sse(json!({ "error": e.to_string() }), "error"),
        };
        Ok::<_, Infallible>(event)
    });

    Ok(Sse::new(effects.chain(report)).keep_alive(KeepAlive::new().interval(Duration::from_secs(1))))
}

fn to_sse<T: serde::Serialize>(payload: T, name: &str) -> Event {
    Event::default()
        .event(name)
        .json_data(payload)
        .unwrap_or_else(|e| Event::default().event("error").data(e.to_string()))
}
