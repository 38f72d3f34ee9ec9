// HTTP Server Module - Web UI and API endpoints
use anyhow::{Context, Result};
use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::PanelConfig;
use crate::error::StoreError;
use crate::mode::ModeStore;
use crate::pages;
use crate::params::ParamStore;
use crate::types::{HsvParams, Mode, Preset};

/// Shared handles passed to every handler
#[derive(Clone)]
pub struct AppState {
    pub params: Arc<ParamStore>,
    pub mode: Arc<ModeStore>,
    pub config: Arc<PanelConfig>,
}

impl AppState {
    /// Prepare the data directory and open both stores.
    pub fn open(config: PanelConfig) -> Result<Self> {
        let params = ParamStore::new(&config.data_dir);
        params
            .ensure_defaults()
            .context("Failed to prepare parameter files")?;

        let mode = ModeStore::open(config.mode_path()).context("Failed to open mode file")?;
        tracing::info!(
            "Data directory {} (mode file {}, mode = {})",
            config.data_dir.display(),
            mode.path().display(),
            mode.get()
        );

        Ok(Self {
            params: Arc::new(params),
            mode: Arc::new(mode),
            config: Arc::new(config),
        })
    }
}

pub enum ApiError {
    Invalid(String),
    NotFound(String),
    Store(StoreError),
    // Store failure while rendering an HTML page
    Page(StoreError),
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::Store(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Page(e) => {
                tracing::error!("{}", e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html(pages::render_error(&e.to_string())),
                )
                    .into_response();
            }
            ApiError::Invalid(msg) => {
                tracing::warn!("Rejected request: {}", msg);
                (StatusCode::BAD_REQUEST, msg)
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Store(e) => {
                tracing::error!("{}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        };
        (status, Json(json!({ "did": false, "error": message }))).into_response()
    }
}

fn did() -> Json<serde_json::Value> {
    Json(json!({ "did": true }))
}

async fn serve_index(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    state.mode.set(Mode::Run).map_err(ApiError::Page)?;
    Ok(Html(pages::render_index(
        state.mode.get(),
        &state.config.device_address,
    )))
}

async fn serve_tune(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    state.mode.set(Mode::Tune).map_err(ApiError::Page)?;
    Ok(Html(pages::render_tune()))
}

async fn serve_preset(
    State(state): State<AppState>,
    Path(page): Path<String>,
) -> Result<Response, ApiError> {
    let preset: Preset = match page.parse() {
        Ok(p) => p,
        Err(e) => {
            tracing::debug!("{}; redirecting home", e);
            return Ok(Redirect::to("/").into_response());
        }
    };

    state.mode.set(Mode::Tune).map_err(ApiError::Page)?;
    let params = state.params.load(preset).map_err(ApiError::Page)?;
    Ok(Html(pages::render_preset(preset, &params)).into_response())
}

fn save_params(
    state: &AppState,
    preset: Preset,
    body: serde_json::Value,
) -> Result<Json<serde_json::Value>, ApiError> {
    let params: HsvParams =
        serde_json::from_value(body).map_err(|e| ApiError::Invalid(e.to_string()))?;
    params
        .validate()
        .map_err(|e| ApiError::Invalid(e.to_string()))?;

    state.params.save(preset, &params)?;
    Ok(did())
}

async fn send_cones(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, ApiError> {
    save_params(&state, Preset::Cone, body)
}

async fn send_cubes(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, ApiError> {
    save_params(&state, Preset::Cube, body)
}

async fn restart_vision(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.mode.restart(state.config.restart_delay())?;
    Ok(did())
}

async fn run_vision(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.mode.set(Mode::Run)?;
    Ok(did())
}

async fn get_mode(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({ "mode": state.mode.get() }))
}

async fn get_params(
    State(state): State<AppState>,
    Path(page): Path<String>,
) -> Result<Json<HsvParams>, ApiError> {
    let preset: Preset = page.parse().map_err(ApiError::NotFound)?;
    Ok(Json(state.params.load_or_default(preset)?))
}

async fn fallback() -> Redirect {
    Redirect::to("/")
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(serve_index))
        .route("/tune", get(serve_tune))
        .route("/tune/:page", get(serve_preset))
        .route("/send-cones", post(send_cones))
        .route("/send-cubes", post(send_cubes))
        .route("/restart", post(restart_vision))
        .route("/runvision", post(run_vision))
        .route("/api/mode", get(get_mode))
        .route("/api/params/:page", get(get_params))
        .fallback(fallback)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_http_server(state: AppState) -> Result<()> {
    let addr = state.config.bind_addr();
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("HTTP server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request};
    use std::time::Duration;
    use tower::ServiceExt;

    fn test_state(dir: &std::path::Path) -> AppState {
        let config = PanelConfig {
            data_dir: dir.to_path_buf(),
            device_address: "10.9.71.11".to_string(),
            restart_delay_ms: 50,
            ..PanelConfig::default()
        };
        AppState::open(config).expect("state")
    }

    async fn send(
        state: &AppState,
        req: Request<Body>,
    ) -> (StatusCode, Option<String>, String) {
        let response = router(state.clone()).oneshot(req).await.unwrap();
        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .map(|v| v.to_str().unwrap().to_string());
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, location, String::from_utf8(body.to_vec()).unwrap())
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn read(dir: &std::path::Path, name: &str) -> String {
        std::fs::read_to_string(dir.join(name)).unwrap()
    }

    #[tokio::test]
    async fn index_sets_run_and_shows_device() {
        let temp = tempfile::tempdir().expect("tempdir");
        let state = test_state(temp.path());
        state.mode.set(Mode::Tune).unwrap();

        let (status, _, body) = send(&state, get_req("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("10.9.71.11"));
        assert_eq!(state.mode.get(), Mode::Run);
        assert_eq!(read(temp.path(), "mode"), "run\n");
    }

    #[tokio::test]
    async fn tune_pages_set_tune_mode() {
        let temp = tempfile::tempdir().expect("tempdir");
        let state = test_state(temp.path());

        let (status, _, _) = send(&state, get_req("/tune")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(state.mode.get(), Mode::Tune);

        state.mode.set(Mode::Run).unwrap();
        state
            .params
            .save(Preset::Cone, &HsvParams::from_values([3, 33, 44, 222, 55, 211]))
            .unwrap();

        let (status, _, body) = send(&state, get_req("/tune/cone")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(r#"id="sat_max" min="0" max="255" value="222""#));
        assert_eq!(state.mode.get(), Mode::Tune);
    }

    #[tokio::test]
    async fn invalid_preset_redirects_without_touching_files() {
        let temp = tempfile::tempdir().expect("tempdir");
        let state = test_state(temp.path());
        let cone_before = read(temp.path(), "cone-params.txt");
        let cube_before = read(temp.path(), "cube-params.txt");

        let (status, location, _) = send(&state, get_req("/tune/sphere")).await;
        assert!(status.is_redirection());
        assert_eq!(location.as_deref(), Some("/"));
        assert_eq!(read(temp.path(), "cone-params.txt"), cone_before);
        assert_eq!(read(temp.path(), "cube-params.txt"), cube_before);
        assert_eq!(state.mode.get(), Mode::Run);
    }

    #[tokio::test]
    async fn send_cones_writes_six_lines() {
        let temp = tempfile::tempdir().expect("tempdir");
        let state = test_state(temp.path());

        // Keys deliberately out of canonical order
        let body = json!({
            "val_max": "250", "hue_min": "10", "sat_max": "255",
            "hue_max": "35", "val_min": "70", "sat_min": "120"
        });
        let (status, _, response) = send(&state, post_json("/send-cones", body)).await;

        assert_eq!(status, StatusCode::OK);
        let response: serde_json::Value = serde_json::from_str(&response).unwrap();
        assert_eq!(response, json!({ "did": true }));
        assert_eq!(read(temp.path(), "cone-params.txt"), "10\n35\n120\n255\n70\n250\n");
        assert_eq!(read(temp.path(), "cube-params.txt"), "0\n180\n0\n255\n0\n255\n");
    }

    #[tokio::test]
    async fn send_cubes_rejects_invalid_bounds() {
        let temp = tempfile::tempdir().expect("tempdir");
        let state = test_state(temp.path());
        let before = read(temp.path(), "cube-params.txt");

        let inverted = json!({
            "hue_min": 90, "hue_max": 20, "sat_min": 0,
            "sat_max": 255, "val_min": 0, "val_max": 255
        });
        let (status, _, response) = send(&state, post_json("/send-cubes", inverted)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let response: serde_json::Value = serde_json::from_str(&response).unwrap();
        assert_eq!(response["did"], json!(false));

        let missing = json!({ "hue_min": 1, "hue_max": 2 });
        let (status, _, _) = send(&state, post_json("/send-cubes", missing)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        assert_eq!(read(temp.path(), "cube-params.txt"), before);
    }

    #[tokio::test]
    async fn malformed_body_is_a_client_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let state = test_state(temp.path());

        let req = Request::builder()
            .method("POST")
            .uri("/send-cones")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, _, _) = send(&state, req).await;
        assert!(status.is_client_error());
    }

    #[tokio::test(start_paused = true)]
    async fn restart_returns_immediately_then_settles_on_run() {
        let temp = tempfile::tempdir().expect("tempdir");
        let state = test_state(temp.path());
        state.mode.set(Mode::Tune).unwrap();

        let (status, _, body) = send(&state, post_json("/restart", json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&body).unwrap(),
            json!({ "did": true })
        );
        assert_eq!(state.mode.get(), Mode::Restart);
        assert_eq!(read(temp.path(), "mode"), "restart\n");

        let (_, _, body) = send(&state, get_req("/api/mode")).await;
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&body).unwrap(),
            json!({ "mode": "restart" })
        );

        // Paused clock: the sleep auto-advances past the 50ms restart delay
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(state.mode.get(), Mode::Run);
        assert_eq!(read(temp.path(), "mode"), "run\n");
    }

    #[tokio::test]
    async fn runvision_sets_run() {
        let temp = tempfile::tempdir().expect("tempdir");
        let state = test_state(temp.path());
        state.mode.set(Mode::Tune).unwrap();

        let (status, _, _) = send(&state, post_json("/runvision", json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(state.mode.get(), Mode::Run);
    }

    #[tokio::test]
    async fn unmatched_paths_redirect_home() {
        let temp = tempfile::tempdir().expect("tempdir");
        let state = test_state(temp.path());

        let requests = [
            get_req("/nope"),
            get_req("/tune/cone/extra"),
            post_json("/send-spheres", json!({})),
        ];
        for req in requests {
            let (status, location, _) = send(&state, req).await;
            assert!(status.is_redirection());
            assert_eq!(location.as_deref(), Some("/"));
        }
    }

    #[tokio::test]
    async fn params_api_reports_values() {
        let temp = tempfile::tempdir().expect("tempdir");
        let state = test_state(temp.path());

        let (status, _, body) = send(&state, get_req("/api/params/cube")).await;
        assert_eq!(status, StatusCode::OK);
        let params: HsvParams = serde_json::from_str(&body).unwrap();
        assert_eq!(params, HsvParams::full_range());

        let (status, _, _) = send(&state, get_req("/api/params/sphere")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn short_parameter_file_is_a_server_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let state = test_state(temp.path());
        std::fs::write(temp.path().join("cone-params.txt"), "1\n2\n3\n").unwrap();

        let (status, _, body) = send(&state, get_req("/tune/cone")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.starts_with("<!DOCTYPE html>"));
        assert!(body.contains("has 3 lines, expected at least 6"));
        assert!(serde_json::from_str::<serde_json::Value>(&body).is_err());
    }
}
