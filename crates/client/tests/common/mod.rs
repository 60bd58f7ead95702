use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use image::{ImageFormat, Rgb, RgbImage};
use tokio::sync::Mutex;

/// One multipart field as the mock service received it.
#[derive(Debug, Clone)]
pub struct CapturedField {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl CapturedField {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }
}

/// Every request body received by the mock, in arrival order.
pub type Captured = Arc<Mutex<Vec<Vec<CapturedField>>>>;

/// Encode a small solid PNG.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([12, 34, 56]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

async fn capture(state: &Captured, mut multipart: Multipart) -> Result<(), Response> {
    let mut fields = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()).into_response())?
    {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()).into_response())?
            .to_vec();
        fields.push(CapturedField {
            name,
            file_name,
            content_type,
            data,
        });
    }
    state.lock().await.push(fields);
    Ok(())
}

async fn process_ok(State(state): State<Captured>, multipart: Multipart) -> Response {
    if let Err(resp) = capture(&state, multipart).await {
        return resp;
    }
    ([(header::CONTENT_TYPE, "image/png")], png_bytes(5, 4)).into_response()
}

async fn process_detail(State(state): State<Captured>, multipart: Multipart) -> Response {
    if let Err(resp) = capture(&state, multipart).await {
        return resp;
    }
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "detail": "bad image" })),
    )
        .into_response()
}

async fn process_html(State(state): State<Captured>, multipart: Multipart) -> Response {
    if let Err(resp) = capture(&state, multipart).await {
        return resp;
    }
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "<html><body>Internal Server Error</body></html>",
    )
        .into_response()
}

async fn process_not_image(State(state): State<Captured>, multipart: Multipart) -> Response {
    if let Err(resp) = capture(&state, multipart).await {
        return resp;
    }
    ([(header::CONTENT_TYPE, "image/png")], "definitely not a png").into_response()
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy" }))
}

async fn health_plain() -> &'static str {
    "OK"
}

/// Start the mock conversion service on an ephemeral port.
///
/// Routes:
/// - `POST /process`      → 200 with a 5x4 PNG
/// - `POST /api/process`  → same as `/process`
/// - `POST /fail`         → 500 `{"detail":"bad image"}`
/// - `POST /broken`       → 500 with an HTML body
/// - `POST /garbage`      → 200 with a non-image body
/// - `GET  /health`       → `{"status":"healthy"}`
/// - `GET  /plain/health` → 200 with a plain-text body
pub async fn spawn_mock_service() -> (SocketAddr, Captured) {
    let captured: Captured = Arc::default();

    let app = Router::new()
        .route("/process", post(process_ok))
        .route("/api/process", post(process_ok))
        .route("/fail", post(process_detail))
        .route("/broken", post(process_html))
        .route("/garbage", post(process_not_image))
        .route("/health", get(health))
        .route("/plain/health", get(health_plain))
        .with_state(captured.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, captured)
}
