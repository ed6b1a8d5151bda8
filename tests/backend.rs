//! End-to-end checks against an in-process fake backend
//!
//! The fake serves the REST routes the console uses and a
//! `/ws/streams/:camera_id` socket that sends a status message, one frame
//! with plates, then closes. The first socket opened for `FLAKY_CAMERA`
//! is dropped without a closing handshake.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde_json::{json, Value};

use optiya_console::api::{ApiClient, ApiError, LogQuery, WatchlistCreate};
use optiya_console::export::{write_logs, ExportFormat};
use optiya_console::stream::{Credential, SessionEventKind, SessionStatus, WebSocketTransport};
use optiya_console::viewer::LiveViewer;
use optiya_console::SessionOptions;

const TOKEN: &str = "test-token";
const TOTAL_LOGS: u64 = 250;
const FLAKY_CAMERA: i64 = 7;

#[derive(Default)]
struct Backend {
    stream_connections: AtomicUsize,
    log_page_sizes: std::sync::Mutex<Vec<u32>>,
}

type Shared = State<Arc<Backend>>;

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"detail": "Could not validate credentials"})),
    )
        .into_response()
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {}", TOKEN))
        .unwrap_or(false)
}

fn camera(id: i64) -> Value {
    json!({
        "id": id,
        "name": "Main Gate",
        "rtsp_url": "rtsp://10.0.0.5/stream",
        "site": "HQ",
        "meta": null,
        "status": "online",
        "last_seen": null,
        "created_at": "2025-03-01T08:00:00"
    })
}

fn plate_log(id: u64) -> Value {
    json!({
        "id": id,
        "plate_text": format!("KA01AB{:04}", id),
        "confidence": 90,
        "camera_id": 1,
        "image_snapshot_ref": null,
        "extra_metadata": null,
        "timestamp": "2025-03-01T08:00:00.123456"
    })
}

async fn token(Form(form): Form<HashMap<String, String>>) -> Response {
    let ok = form.get("username").map(String::as_str) == Some("ops@example.com")
        && form.get("password").map(String::as_str) == Some("secret");
    if !ok {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Incorrect email or password"})),
        )
            .into_response();
    }
    Json(json!({"access_token": TOKEN, "token_type": "bearer", "expires_in": 1800})).into_response()
}

async fn me(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!({"id": 1, "email": "ops@example.com", "name": "Ops", "role": "admin"})).into_response()
}

async fn list_cameras(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!([camera(1)])).into_response()
}

async fn get_camera(headers: HeaderMap, Path(id): Path<i64>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    if id != 1 {
        return (StatusCode::NOT_FOUND, Json(json!({"detail": "Camera not found"}))).into_response();
    }
    Json(camera(id)).into_response()
}

async fn delete_camera(headers: HeaderMap, Path(_id): Path<i64>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn logs(
    State(backend): Shared,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let page: u64 = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let per_page: u64 = params.get("per_page").and_then(|p| p.parse().ok()).unwrap_or(10);
    backend.log_page_sizes.lock().unwrap().push(per_page as u32);

    let start = (page - 1) * per_page;
    let end = (start + per_page).min(TOTAL_LOGS);
    let items: Vec<Value> = (start..end).map(|i| plate_log(i + 1)).collect();
    Json(json!({"items": items, "total": TOTAL_LOGS})).into_response()
}

async fn add_watchlist(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!({
        "id": 7,
        "plate_text": body["plate_text"],
        "description": body.get("description").cloned().unwrap_or(Value::Null),
        "notify_sms": body["notify_sms"],
        "notify_email": body["notify_email"],
        "created_at": "2025-03-01T08:00:00Z",
        "created_by": "ops@example.com"
    }))
    .into_response()
}

async fn dashboard_kpis() -> Json<Value> {
    Json(json!({
        "activeCameras": 1,
        "totalCameras": 2,
        "detectionsToday": 42,
        "watchlistHits": 3,
        "avgLatency": 120
    }))
}

async fn dashboard_recent() -> Json<Value> {
    Json(json!([{
        "id": 9,
        "plate_text": "ABC123",
        "camera_name": "Main Gate",
        "timestamp": "2025-03-01T08:00:00",
        "confidence": 97,
        "is_watchlist_hit": true
    }]))
}

async fn dashboard_camera_status() -> Json<Value> {
    Json(json!([{"id": 1, "name": "Main Gate", "site": "HQ", "status": "online", "latency": 120}]))
}

async fn dashboard_trends() -> Json<Value> {
    Json(json!([{"date": "2025-03-01T00:00:00", "detections": 42}]))
}

async fn dashboard_types() -> Json<Value> {
    Json(json!([{"name": "Regular", "value": 39, "color": "#3b82f6"}]))
}

async fn stream(
    ws: WebSocketUpgrade,
    State(backend): Shared,
    Path(camera_id): Path<i64>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let connection = backend.stream_connections.fetch_add(1, Ordering::SeqCst);
    let token = params.get("token").cloned();
    ws.on_upgrade(move |socket| serve_stream(socket, camera_id, token, connection))
}

async fn serve_stream(
    mut socket: WebSocket,
    camera_id: i64,
    token: Option<String>,
    connection: usize,
) {
    if camera_id == FLAKY_CAMERA && connection == 0 {
        let status = json!({"status": "connected", "camera_id": camera_id});
        let _ = socket.send(Message::Text(status.to_string())).await;
        // Dropped without a Close frame
        return;
    }

    if token.as_deref() != Some(TOKEN) {
        let _ = socket
            .send(Message::Close(Some(CloseFrame {
                code: 1008,
                reason: "Invalid token".into(),
            })))
            .await;
        return;
    }

    let messages = [
        json!({"status": "connected", "camera_id": camera_id}),
        json!({
            "image": "aGVsbG8=",
            "plates": [
                {"plate_text": "ABC123", "confidence": 0.972, "is_watchlist_hit": true},
                {"plate_text": "XYZ789", "confidence": 0.64, "is_watchlist_hit": false}
            ]
        }),
    ];
    for message in messages {
        if socket.send(Message::Text(message.to_string())).await.is_err() {
            return;
        }
    }

    let _ = socket
        .send(Message::Close(Some(CloseFrame {
            code: 1000,
            reason: "stream ended".into(),
        })))
        .await;
}

async fn spawn_backend() -> (SocketAddr, Arc<Backend>) {
    let backend = Arc::new(Backend::default());

    let app = Router::new()
        .route("/auth/token", post(token))
        .route("/auth/me", get(me))
        .route("/cameras/", get(list_cameras))
        .route("/cameras/:id", get(get_camera).delete(delete_camera))
        .route("/logs/", get(logs))
        .route("/watchlist/", post(add_watchlist))
        .route("/dashboard/kpis", get(dashboard_kpis))
        .route("/dashboard/recent-detections", get(dashboard_recent))
        .route("/dashboard/camera-status", get(dashboard_camera_status))
        .route("/dashboard/detection-trends", get(dashboard_trends))
        .route("/dashboard/detection-types", get(dashboard_types))
        .route("/ws/streams/:camera_id", get(stream))
        .with_state(backend.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, backend)
}

async fn logged_in(addr: SocketAddr) -> Result<ApiClient> {
    let api = ApiClient::new(&format!("http://{}", addr))?;
    let token = api.login("ops@example.com", "secret").await?;
    Ok(api.with_token(token.access_token))
}

#[tokio::test]
async fn test_login_and_profile() -> Result<()> {
    let (addr, _backend) = spawn_backend().await;
    let anonymous = ApiClient::new(&format!("http://{}", addr))?;

    let err = anonymous.login("ops@example.com", "wrong").await.unwrap_err();
    assert_eq!(err, ApiError::Unauthorized("Incorrect email or password".to_string()));

    assert!(anonymous.me().await.unwrap_err().is_unauthorized());

    let api = logged_in(addr).await?;
    let user = api.me().await?;
    assert_eq!(user.email, "ops@example.com");
    assert_eq!(user.role, "admin");
    Ok(())
}

#[tokio::test]
async fn test_cameras() -> Result<()> {
    let (addr, _backend) = spawn_backend().await;
    let api = logged_in(addr).await?;

    let cameras = api.list_cameras(0, 100).await?;
    assert_eq!(cameras.len(), 1);
    assert_eq!(cameras[0].site.as_deref(), Some("HQ"));
    assert_eq!(cameras[0].last_seen, None);

    assert_eq!(
        api.get_camera(99).await.unwrap_err(),
        ApiError::NotFound("Camera not found".to_string())
    );

    api.delete_camera(1).await?;
    Ok(())
}

#[tokio::test]
async fn test_fetch_all_logs_pages_through_results() -> Result<()> {
    let (addr, backend) = spawn_backend().await;
    let api = logged_in(addr).await?;

    let logs = api.fetch_all_logs(&LogQuery::new()).await?;
    assert_eq!(logs.len() as u64, TOTAL_LOGS);
    assert_eq!(logs[0].plate_text, "KA01AB0001");
    assert_eq!(logs[249].id, 250);
    assert_eq!(*backend.log_page_sizes.lock().unwrap(), vec![100, 100, 100]);

    let mut out = Vec::new();
    assert_eq!(write_logs(&mut out, &logs, ExportFormat::Csv)?, 250);
    assert_eq!(String::from_utf8(out)?.lines().count(), 251);
    Ok(())
}

#[tokio::test]
async fn test_watchlist_plate_is_normalized() -> Result<()> {
    let (addr, _backend) = spawn_backend().await;
    let api = logged_in(addr).await?;

    let entry = api.add_watchlist(&WatchlistCreate::new("  ka01  ab1234 ")).await?;
    assert_eq!(entry.id, 7);
    assert_eq!(entry.plate_text, "KA01 AB1234");
    assert_eq!(entry.notify_email, 1);

    let invalid = api.add_watchlist(&WatchlistCreate::new("!!")).await;
    assert!(matches!(invalid, Err(ApiError::Validation(_))));
    Ok(())
}

#[tokio::test]
async fn test_dashboard_overview() -> Result<()> {
    let (addr, _backend) = spawn_backend().await;
    let api = logged_in(addr).await?;

    let overview = api.dashboard().await?;
    assert_eq!(overview.kpis.detections_today, 42);
    assert_eq!(overview.kpis.total_cameras, 2);
    assert!(overview.recent_detections[0].is_watchlist_hit);
    assert_eq!(overview.camera_status[0].latency, 120);
    assert_eq!(overview.detection_trends[0].detections, 42);
    assert_eq!(overview.detection_types[0].name, "Regular");
    Ok(())
}

#[tokio::test]
async fn test_live_stream_until_clean_close() -> Result<()> {
    let (addr, backend) = spawn_backend().await;
    let transport = Arc::new(WebSocketTransport::new(&format!("ws://{}", addr)));
    let mut viewer = LiveViewer::new(transport, SessionOptions::default());

    viewer.select_camera(1, Some(Credential::new(TOKEN))).await?;

    let mut statuses = Vec::new();
    let mut alerts = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(event) = viewer.next_event().await {
            match event.kind {
                SessionEventKind::Status(status) => {
                    statuses.push(status);
                    if status == SessionStatus::Terminated {
                        break;
                    }
                }
                SessionEventKind::WatchlistAlert(hit) => alerts.push(hit.plate_text),
                _ => {}
            }
        }
    })
    .await?;

    assert!(statuses.contains(&SessionStatus::Live));
    assert_eq!(statuses.last(), Some(&SessionStatus::Terminated));
    assert_eq!(alerts, vec!["ABC123".to_string()]);

    let state = viewer.state();
    assert_eq!(state.latest_frame.as_ref().map(|f| f.image_bytes.clone()), Some(b"hello".to_vec()));
    assert_eq!(state.active_detections(), 2);
    assert_eq!(state.high_confidence_count(), 1);
    assert_eq!(state.watchlist_hit_count(), 1);

    // A clean close is final
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(backend.stream_connections.load(Ordering::SeqCst), 1);

    viewer.close().await;
    Ok(())
}

#[tokio::test]
async fn test_rejected_token_terminates_without_retry() -> Result<()> {
    let (addr, backend) = spawn_backend().await;
    let transport = Arc::new(WebSocketTransport::new(&format!("ws://{}", addr)));
    let mut viewer = LiveViewer::new(transport, SessionOptions::default());

    viewer.select_camera(1, Some(Credential::new("stale"))).await?;

    let mut statuses = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(event) = viewer.next_event().await {
            if let SessionEventKind::Status(status) = event.kind {
                statuses.push(status);
                if status == SessionStatus::Terminated {
                    break;
                }
            }
        }
    })
    .await?;

    // The handshake succeeds; the policy close comes right after
    assert_eq!(statuses.last(), Some(&SessionStatus::Terminated));
    assert_eq!(viewer.state().status, Some(SessionStatus::Terminated));
    assert!(!statuses.contains(&SessionStatus::Disconnected));
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(backend.stream_connections.load(Ordering::SeqCst), 1);

    viewer.close().await;
    Ok(())
}

#[tokio::test]
async fn test_dropped_socket_reconnects() -> Result<()> {
    let (addr, backend) = spawn_backend().await;
    let transport = Arc::new(WebSocketTransport::new(&format!("ws://{}", addr)));
    let mut viewer = LiveViewer::new(transport, SessionOptions::default());

    viewer
        .select_camera(FLAKY_CAMERA, Some(Credential::new(TOKEN)))
        .await?;

    let mut statuses = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(event) = viewer.next_event().await {
            if let SessionEventKind::Status(status) = event.kind {
                statuses.push(status);
                if status == SessionStatus::Terminated {
                    break;
                }
            }
        }
    })
    .await?;

    let disconnected = statuses
        .iter()
        .position(|s| *s == SessionStatus::Disconnected)
        .expect("dropped socket was not reported");
    assert!(statuses[..disconnected].contains(&SessionStatus::Live));
    assert!(statuses[disconnected..].contains(&SessionStatus::Live));
    assert_eq!(statuses.last(), Some(&SessionStatus::Terminated));
    assert_eq!(backend.stream_connections.load(Ordering::SeqCst), 2);
    assert_eq!(viewer.state().active_detections(), 2);

    viewer.close().await;
    Ok(())
}
