//! Integration tests against an in-process observer stand-in.
//!
//! Each test binds an Axum server on an ephemeral localhost port that
//! serves canned observer bodies, then drives the real HTTP client, the
//! real WebSocket transport, or the whole telemetry pipeline against it.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use axum::extract::Query;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, http::StatusCode};
use emergence_telemetry::api::{AgentFilter, ApiClient, EventFilter, Queries};
use emergence_telemetry::codec::decode_frame;
use emergence_telemetry::config::TelemetryConfig;
use emergence_telemetry::connection::ConnectionPhase;
use emergence_telemetry::error::ApiError;
use emergence_telemetry::milestones::MilestoneCategory;
use emergence_telemetry::transport::{Transport, WsTransport};
use emergence_telemetry::TelemetryClient;
use emergence_types::{AgentId, AgentStatus, EconomicModel, WorldResponse};
use futures::StreamExt;
use serde_json::{Value, json};

const EVENT_ID: &str = "01945c2a-3b4f-7def-8a12-bc34567890ab";

fn frame_json(tick: u64) -> String {
    json!({
        "tick": tick,
        "season": "Summer",
        "weather": "Rain",
        "agents_alive": 8,
        "deaths_this_tick": 0,
        "actions_resolved": 8,
    })
    .to_string()
}

// ---------------------------------------------------------------------------
// Stand-in observer
// ---------------------------------------------------------------------------

async fn world() -> Json<Value> {
    Json(json!({
        "tick": 0, "era": "Primitive", "season": "Spring", "weather": "Clear",
        "agents_count": 8, "locations_count": 4,
    }))
}

async fn agents(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let count = u32::from(params.get("status").map(String::as_str) == Some("alive"));
    Json(json!({"count": count, "agents": []}))
}

async fn events(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let limit = params.get("limit").and_then(|l| l.parse::<u32>().ok()).unwrap_or(0);
    Json(json!({
        "count": limit,
        "events": [{
            "id": EVENT_ID, "tick": 3, "event_type": "AgentBorn",
            "agent_id": null, "location_id": null, "details": {},
        }],
    }))
}

async fn beliefs() -> Json<Value> {
    Json(json!({
        "belief_systems": [{
            "id": "belief-0", "name": "Sun Path", "themes": ["sun"],
            "adherent_count": 3, "founded_at_tick": 45,
        }],
        "belief_events": [{
            "tick": 45, "event_type": "founded", "belief_system_id": "belief-0",
            "belief_system_name": "Sun Path", "description": "", "agent_id": null,
        }],
    }))
}

async fn governance() -> Json<Value> {
    Json(json!({
        "governance_type": "Anarchy", "leaders": [], "rules": [],
        "stability_score": "0", "recent_events": [],
    }))
}

async fn families() -> Json<Value> {
    Json(json!({
        "unit_count": 0, "avg_size": "0", "marriage_count": 0, "divorce_count": 0,
        "orphan_count": 0, "longest_lineage": 1, "families": [], "lineage": [],
    }))
}

async fn economy() -> Json<Value> {
    Json(json!({
        "model_type": "Barter", "currency_resource": null, "currency_adoption_pct": "0",
        "trade_volume": 4, "trade_volume_history": [4], "market_locations": [],
    }))
}

async fn crime() -> Json<Value> {
    Json(json!({
        "crime_rate": "0", "crime_rate_history": [], "detection_rate": 0.0,
        "punishment_rate": 0.0, "justice_type": "None", "common_crimes": [],
        "serial_offenders": [], "hotspots": [],
    }))
}

async fn set_speed(Json(body): Json<Value>) -> Json<Value> {
    Json(json!({
        "ok": true, "message": "speed changed", "previous_interval_ms": 1000,
        "new_interval_ms": body.get("tick_interval_ms").cloned().unwrap_or(Value::Null),
    }))
}

async fn ticks(ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(hold_ticks)
}

/// Send three frames, then stay open until the client leaves.
async fn hold_ticks(mut socket: WebSocket) {
    for tick in 1..=3 {
        if socket.send(Message::Text(frame_json(tick).into())).await.is_err() {
            return;
        }
    }
    while let Some(Ok(_)) = socket.recv().await {}
}

async fn burst(ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(|mut socket: WebSocket| async move {
        socket.send(Message::Text(frame_json(1).into())).await.ok();
        socket.send(Message::Ping(Vec::new().into())).await.ok();
        socket.send(Message::Binary(frame_json(2).into_bytes().into())).await.ok();
        socket.send(Message::Close(None)).await.ok();
    })
}

async fn garbled(ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(|mut socket: WebSocket| async move {
        socket.send(Message::Binary(vec![b'{', 0xff, 0xfe, b'}'].into())).await.ok();
        socket.send(Message::Close(None)).await.ok();
    })
}

fn observer() -> Router {
    Router::new()
        .route("/api/world", get(world))
        .route("/api/agents", get(agents))
        .route("/api/locations", get(|| async { Json(json!({"count": 0, "locations": []})) }))
        .route("/api/routes", get(|| async { Json(json!({"count": 0, "routes": []})) }))
        .route("/api/events", get(events))
        .route("/api/decisions", get(|| async { Json(json!({"count": 0, "decisions": []})) }))
        .route("/api/social/beliefs", get(beliefs))
        .route("/api/social/governance", get(governance))
        .route("/api/social/families", get(families))
        .route("/api/social/economy", get(economy))
        .route("/api/social/crime", get(crime))
        .route("/api/operator/pause", post(|| async { Json(json!({"ok": true, "message": "paused"})) }))
        .route("/api/operator/speed", post(set_speed))
        .route(
            "/api/operator/stop",
            post(|| async { (StatusCode::CONFLICT, "already stopping") }),
        )
        .route("/ws/ticks", get(ticks))
        .route("/ws/burst", get(burst))
        .route("/ws/garbled", get(garbled))
}

/// A variant whose economy endpoint returns an out-of-enum model.
fn broken_observer() -> Router {
    Router::new().route(
        "/api/social/economy",
        get(|| async {
            Json(json!({
                "model_type": "Feudal", "currency_resource": null,
                "currency_adoption_pct": "0", "trade_volume": 0,
            }))
        }),
    )
}

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn client(addr: SocketAddr) -> ApiClient {
    ApiClient::new(&format!("http://{addr}/"), Duration::from_secs(5)).unwrap()
}

// ---------------------------------------------------------------------------
// Query client
// ---------------------------------------------------------------------------

#[tokio::test]
async fn minimal_world_falls_back() {
    let addr = serve(observer()).await;
    let world = client(addr).world().await.unwrap();
    assert!(matches!(world, WorldResponse::Minimal(_)));
    assert_eq!(world.tick(), 0);
}

#[tokio::test]
async fn filters_become_query_parameters() {
    let addr = serve(observer()).await;
    let api = client(addr);

    let alive = AgentFilter {
        status: Some(AgentStatus::Alive),
        ..AgentFilter::default()
    };
    assert_eq!(api.agents(&alive).await.unwrap().count, 1);
    assert_eq!(api.agents(&AgentFilter::default()).await.unwrap().count, 0);

    let recent = EventFilter {
        limit: Some(7),
        ..EventFilter::default()
    };
    let events = api.events(&recent).await.unwrap();
    assert_eq!(events.count, 7);
    assert_eq!(events.events.len(), 1);
}

#[tokio::test]
async fn social_snapshots_decode() {
    let addr = serve(observer()).await;
    let api = client(addr);
    assert_eq!(api.economy().await.unwrap().model_type, EconomicModel::Barter);
    assert_eq!(api.beliefs().await.unwrap().belief_systems.len(), 1);
    assert!(api.governance().await.unwrap().leaders.is_empty());
    assert_eq!(api.families().await.unwrap().longest_lineage, 1);
    assert!(api.crime().await.unwrap().hotspots.is_empty());
}

#[tokio::test]
async fn schema_violation_is_a_decode_error() {
    let addr = serve(broken_observer()).await;
    let err = client(addr).economy().await.unwrap_err();
    assert!(
        matches!(&err, ApiError::Decode { endpoint, .. } if endpoint == "/api/social/economy"),
        "unexpected error: {err}"
    );
}

#[tokio::test]
async fn missing_route_is_a_status_error() {
    let addr = serve(observer()).await;
    let err = client(addr).agent(AgentId::new()).await.unwrap_err();
    assert!(matches!(err, ApiError::Status { status: 404, .. }), "unexpected error: {err}");
}

#[tokio::test]
async fn refused_connection_is_a_request_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let err = client(addr).routes().await.unwrap_err();
    assert!(matches!(err, ApiError::Request { .. }), "unexpected error: {err}");
}

#[tokio::test]
async fn operator_calls_round_trip() {
    let addr = serve(observer()).await;
    let api = client(addr);

    assert!(api.pause().await.unwrap().ok);
    let change = api.set_speed(250).await.unwrap();
    assert_eq!(change.new_interval_ms, 250);

    let err = api.stop().await.unwrap_err();
    assert!(
        matches!(&err, ApiError::Status { status: 409, body, .. } if body == "already stopping"),
        "unexpected error: {err}"
    );
}

// ---------------------------------------------------------------------------
// WebSocket transport
// ---------------------------------------------------------------------------

#[tokio::test]
async fn ws_transport_yields_text_and_binary_frames() {
    let addr = serve(observer()).await;
    let stream = WsTransport.connect(&format!("ws://{addr}/ws/burst")).await.unwrap();
    let frames: Vec<String> = stream.filter_map(|item| async move { item.ok() }).collect().await;
    assert_eq!(frames, vec![frame_json(1), frame_json(2)]);
}

#[tokio::test]
async fn ws_transport_replaces_invalid_utf8_and_codec_rejects_it() {
    let addr = serve(observer()).await;
    let stream = WsTransport.connect(&format!("ws://{addr}/ws/garbled")).await.unwrap();
    let frames: Vec<String> = stream.filter_map(|item| async move { item.ok() }).collect().await;
    assert_eq!(frames, vec!["{\u{fffd}\u{fffd}}".to_owned()]);
    assert!(frames.iter().all(|raw| decode_frame(raw).is_err()));
}

#[tokio::test]
async fn ws_transport_reports_refused_connect() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    assert!(WsTransport.connect(&format!("ws://{addr}/ws/ticks")).await.is_err());
}

// ---------------------------------------------------------------------------
// Full pipeline
// ---------------------------------------------------------------------------

#[tokio::test]
async fn telemetry_client_syncs_end_to_end() {
    let addr = serve(observer()).await;
    let mut config = TelemetryConfig::default();
    config.observer.base_url = format!("http://{addr}");

    let client = TelemetryClient::connect(&config).unwrap();

    let synced = tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            {
                let state = client.sync().read().await;
                if state.world.is_some() && !state.milestones.is_empty() && state.events.is_some() {
                    break;
                }
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;
    assert!(synced.is_ok(), "pipeline never synced");

    assert_eq!(client.phase(), ConnectionPhase::Connected);
    assert!(client.latest().await.is_some());

    let milestones = client.sync().milestones().await;
    let belief = milestones.iter().find(|m| m.category == MilestoneCategory::Belief);
    assert_eq!(belief.map(|m| m.tick), Some(45));
    assert!(milestones.iter().any(|m| m.category == MilestoneCategory::Economy));

    let toasts = client.sync().live_toasts().await;
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts.first().map(|t| t.event_id.to_string()).as_deref(), Some(EVENT_ID));

    let connection = client.connection().clone();
    client.shutdown().await;
    assert_eq!(connection.phase(), ConnectionPhase::Disconnected);
}
