use std::sync::Arc;

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{
        DefaultBodyLimit, FromRequest, Path, Query, Request, State, rejection::JsonRejection,
    },
    http::{HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use macrolog_core::Error;
use macrolog_core::models::{
    DailySummary, EntryType, NewEntry, NewPreset, NutrientEstimate, NutritionEntry, Nutrients,
    PresetFood, SettingsUpdate, UserSettings,
};
use macrolog_core::service::NutritionService;

const BODY_LIMIT: usize = 64 * 1024;

#[derive(Clone)]
struct AppState {
    service: Arc<NutritionService>,
}

// --- Request / Response types ---

#[derive(Deserialize)]
struct DateQuery {
    date: Option<String>,
}

impl DateQuery {
    /// `?date=` with an empty value means "today", same as leaving it out.
    fn date(&self) -> Option<&str> {
        self.date.as_deref().filter(|d| !d.trim().is_empty())
    }
}

#[derive(Deserialize)]
struct CreateEntryRequest {
    description: Option<String>,
    calories: Option<Value>,
    protein: Option<Value>,
    fiber: Option<Value>,
    #[serde(rename = "type")]
    entry_type: Option<String>,
}

impl CreateEntryRequest {
    fn has_nutrients(&self) -> bool {
        self.calories.is_some() || self.protein.is_some() || self.fiber.is_some()
    }
}

#[derive(Deserialize)]
struct CreatePresetRequest {
    name: Option<String>,
    calories: Option<Value>,
    protein: Option<Value>,
    fiber: Option<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateSettingsRequest {
    daily_calorie_target: Option<Value>,
    daily_protein_target: Option<Value>,
    daily_fiber_target: Option<Value>,
}

#[derive(Deserialize)]
struct ParseRequest {
    description: Option<String>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct SuccessResponse {
    success: bool,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

// --- Error handling ---

#[derive(Debug)]
enum ApiError {
    BadRequest(String),
    BadGateway(String),
    Rejected(StatusCode, String),
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
            Self::Rejected(status, msg) => (status, msg),
            Self::Internal(err) => {
                error!("Internal server error: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::Validation(msg) => Self::BadRequest(msg),
            e @ Error::InvalidDateFormat(_) => Self::BadRequest(e.to_string()),
            Error::Estimation(msg) => Self::BadGateway(msg),
            Error::Storage(e) => Self::Internal(anyhow::Error::new(e).context("database error")),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Rejected(rejection.status(), rejection.body_text())
    }
}

/// `Json` whose rejections use the `{error}` body like every other failure.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
struct ApiJson<T>(T);

// --- Middleware ---

async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "content-security-policy",
        HeaderValue::from_static("default-src 'none'"),
    );
    response
}

// --- Handlers ---

async fn list_entries(
    State(state): State<AppState>,
    Query(query): Query<DateQuery>,
) -> Result<Json<Vec<NutritionEntry>>, ApiError> {
    Ok(Json(state.service.list_entries_for_day(query.date())?))
}

async fn create_entry(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateEntryRequest>,
) -> Result<(StatusCode, Json<NutritionEntry>), ApiError> {
    let entry_type = match req.entry_type.as_deref().filter(|t| !t.trim().is_empty()) {
        Some(t) => t.parse::<EntryType>()?,
        None => EntryType::default(),
    };
    let description = req.description.as_deref().unwrap_or_default();

    let entry = if entry_type == EntryType::Ai && !req.has_nutrients() {
        state.service.add_estimated_entry(description).await?
    } else {
        let nutrients = Nutrients::from_json(
            req.calories.as_ref(),
            req.protein.as_ref(),
            req.fiber.as_ref(),
        );
        let new_entry = NewEntry::new(description, nutrients, entry_type)?;
        state.service.add_entry(&new_entry)?
    };
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn delete_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    // A non-numeric id can't match a row, so it's treated like any missing id.
    if let Ok(id) = id.trim().parse::<i64>() {
        state.service.delete_entry(id)?;
    }
    Ok(Json(SuccessResponse { success: true }))
}

async fn list_presets(State(state): State<AppState>) -> Result<Json<Vec<PresetFood>>, ApiError> {
    Ok(Json(state.service.list_presets()?))
}

async fn create_preset(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreatePresetRequest>,
) -> Result<(StatusCode, Json<PresetFood>), ApiError> {
    let nutrients = Nutrients::from_json(
        req.calories.as_ref(),
        req.protein.as_ref(),
        req.fiber.as_ref(),
    );
    let preset = NewPreset::new(req.name.as_deref().unwrap_or_default(), nutrients)?;
    let created = state.service.add_preset(&preset)?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn delete_preset(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    if let Ok(id) = id.trim().parse::<i64>() {
        state.service.delete_preset(id)?;
    }
    Ok(Json(SuccessResponse { success: true }))
}

async fn get_settings(State(state): State<AppState>) -> Result<Json<UserSettings>, ApiError> {
    Ok(Json(state.service.get_settings()?))
}

async fn update_settings(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<UpdateSettingsRequest>,
) -> Result<Json<UserSettings>, ApiError> {
    let update = SettingsUpdate::from_json(
        req.daily_calorie_target.as_ref(),
        req.daily_protein_target.as_ref(),
        req.daily_fiber_target.as_ref(),
    );
    Ok(Json(state.service.update_settings(&update)?))
}

async fn parse_food(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ParseRequest>,
) -> Result<Json<NutrientEstimate>, ApiError> {
    let description = req.description.as_deref().unwrap_or_default();
    Ok(Json(state.service.estimate(description).await?))
}

async fn get_summary(
    State(state): State<AppState>,
    Query(query): Query<DateQuery>,
) -> Result<Json<DailySummary>, ApiError> {
    Ok(Json(state.service.daily_summary(query.date())?))
}

async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    state.service.ping()?;
    Ok(Json(HealthResponse { status: "ok" }))
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/entries", get(list_entries).post(create_entry))
        .route("/api/entries/{id}", delete(delete_entry))
        .route("/api/presets", get(list_presets).post(create_preset))
        .route("/api/presets/{id}", delete(delete_preset))
        .route("/api/settings", get(get_settings).put(update_settings))
        .route("/api/parse", post(parse_food))
        .route("/api/summary", get(get_summary))
        .route("/api/health", get(health))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(middleware::from_fn(security_headers))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// --- Server startup ---

pub async fn start_server(service: NutritionService, port: u16, bind: &str) -> anyhow::Result<()> {
    for (table, rows) in service.table_counts().context("failed to read table counts")? {
        info!(table, rows, "table ready");
    }

    let state = AppState {
        service: Arc::new(service),
    };
    let app = build_router(state);

    let addr = format!("{bind}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received, draining connections");
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use http_body_util::BodyExt;
    use macrolog_core::db::Database;
    use macrolog_core::estimator::FoodEstimator;
    use serde_json::json;
    use tower::ServiceExt;

    struct StubEstimator(Option<NutrientEstimate>);

    #[async_trait]
    impl FoodEstimator for StubEstimator {
        async fn estimate(&self, _description: &str) -> macrolog_core::Result<NutrientEstimate> {
            self.0.ok_or_else(|| Error::estimation("provider unavailable"))
        }
    }

    const BAGEL: NutrientEstimate = NutrientEstimate {
        calories: 277,
        protein: 11,
        fiber: 2,
    };

    fn test_app_with(estimate: Option<NutrientEstimate>) -> Router {
        let service = NutritionService::new(
            Database::open_in_memory().unwrap(),
            chrono_tz::America::New_York,
            Arc::new(StubEstimator(estimate)),
        );
        build_router(AppState {
            service: Arc::new(service),
        })
    }

    fn test_app() -> Router {
        test_app_with(Some(BAGEL))
    }

    async fn send(app: &Router, request: axum::http::Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, json)
    }

    fn get_req(uri: &str) -> axum::http::Request<Body> {
        axum::http::Request::get(uri).body(Body::empty()).unwrap()
    }

    fn json_req(method: &str, uri: &str, body: &Value) -> axum::http::Request<Body> {
        axum::http::Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn delete_req(uri: &str) -> axum::http::Request<Body> {
        axum::http::Request::delete(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn entries_empty_by_default() {
        let app = test_app();
        let (status, body) = send(&app, get_req("/api/entries")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn create_entry_then_list_today() {
        let app = test_app();
        let (status, created) = send(
            &app,
            json_req(
                "POST",
                "/api/entries",
                &json!({"description": "toast", "calories": 120, "protein": 3, "fiber": 1}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["description"], "toast");
        assert_eq!(created["calories"], 120.0);
        assert_eq!(created["type"], "manual");
        assert!(created["id"].is_i64());
        assert!(created["createdAt"].is_string());

        let (_, listed) = send(&app, get_req("/api/entries")).await;
        assert_eq!(listed, json!([created]));
    }

    #[tokio::test]
    async fn create_entry_coerces_loose_numbers() {
        let app = test_app();
        let (status, created) = send(
            &app,
            json_req(
                "POST",
                "/api/entries",
                &json!({
                    "description": "  soup ",
                    "calories": "150.5",
                    "protein": -4,
                    "fiber": "lots",
                    "type": "preset"
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["description"], "soup");
        assert_eq!(created["calories"], 150.5);
        assert_eq!(created["protein"], 0.0);
        assert_eq!(created["fiber"], 0.0);
        assert_eq!(created["type"], "preset");
    }

    #[tokio::test]
    async fn create_entry_requires_description() {
        let app = test_app();
        for body in [json!({"calories": 100}), json!({"description": "   "})] {
            let (status, err) = send(&app, json_req("POST", "/api/entries", &body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(err["error"], "Description is required");
        }
        let (_, listed) = send(&app, get_req("/api/entries")).await;
        assert_eq!(listed, json!([]));
    }

    #[tokio::test]
    async fn create_entry_rejects_unknown_type() {
        let app = test_app();
        let (status, err) = send(
            &app,
            json_req(
                "POST",
                "/api/entries",
                &json!({"description": "x", "type": "guess"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(err["error"].as_str().unwrap().contains("guess"));
    }

    #[tokio::test]
    async fn create_entry_blank_type_is_manual() {
        let app = test_app();
        for blank in ["", "  "] {
            let (status, entry) = send(
                &app,
                json_req(
                    "POST",
                    "/api/entries",
                    &json!({"description": "rice", "calories": 200, "type": blank}),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
            assert_eq!(entry["type"], "manual");
            assert_eq!(entry["calories"], 200);
        }
    }

    #[tokio::test]
    async fn malformed_json_returns_error_body() {
        let app = test_app();
        let request = axum::http::Request::post("/api/entries")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, err) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(err["error"].is_string());
    }

    #[tokio::test]
    async fn ai_entry_without_numbers_is_estimated() {
        let app = test_app();
        let (status, created) = send(
            &app,
            json_req(
                "POST",
                "/api/entries",
                &json!({"description": "a bagel", "type": "ai"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["type"], "ai");
        assert_eq!(created["calories"], 277.0);
        assert_eq!(created["protein"], 11.0);
    }

    #[tokio::test]
    async fn ai_entry_with_numbers_is_stored_as_given() {
        let app = test_app_with(None);
        let (status, created) = send(
            &app,
            json_req(
                "POST",
                "/api/entries",
                &json!({"description": "a bagel", "type": "ai", "calories": 250, "protein": 9, "fiber": 2}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["calories"], 250.0);
    }

    #[tokio::test]
    async fn failed_ai_entry_writes_nothing() {
        let app = test_app_with(None);
        let (status, err) = send(
            &app,
            json_req(
                "POST",
                "/api/entries",
                &json!({"description": "a bagel", "type": "ai"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(err["error"], "provider unavailable");

        let (_, listed) = send(&app, get_req("/api/entries")).await;
        assert_eq!(listed, json!([]));
    }

    #[tokio::test]
    async fn entries_bad_date_is_400() {
        let app = test_app();
        let (status, err) = send(&app, get_req("/api/entries?date=2024-02-30")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["error"], "Invalid date '2024-02-30'. Use YYYY-MM-DD");
    }

    #[tokio::test]
    async fn entries_for_other_day_excludes_today() {
        let app = test_app();
        send(
            &app,
            json_req("POST", "/api/entries", &json!({"description": "toast"})),
        )
        .await;
        let (status, listed) = send(&app, get_req("/api/entries?date=2000-01-01")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed, json!([]));
        let (_, today) = send(&app, get_req("/api/entries?date=")).await;
        assert_eq!(today.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_entry_is_idempotent() {
        let app = test_app();
        let (_, created) = send(
            &app,
            json_req("POST", "/api/entries", &json!({"description": "toast"})),
        )
        .await;
        let uri = format!("/api/entries/{}", created["id"]);

        for _ in 0..2 {
            let (status, body) = send(&app, delete_req(&uri)).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, json!({"success": true}));
        }
        let (status, body) = send(&app, delete_req("/api/entries/not-a-number")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true}));

        let (_, listed) = send(&app, get_req("/api/entries")).await;
        assert_eq!(listed, json!([]));
    }

    #[tokio::test]
    async fn presets_create_list_delete() {
        let app = test_app();
        for name in ["Oatmeal", "Banana", "apple"] {
            let (status, created) = send(
                &app,
                json_req(
                    "POST",
                    "/api/presets",
                    &json!({"name": name, "calories": 100, "protein": "2", "fiber": 3}),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
            assert_eq!(created["name"], name);
            assert_eq!(created["protein"], 2.0);
        }

        let (_, listed) = send(&app, get_req("/api/presets")).await;
        let names: Vec<&str> = listed
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["Banana", "Oatmeal", "apple"]);

        let uri = format!("/api/presets/{}", listed[0]["id"]);
        let (status, body) = send(&app, delete_req(&uri)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true}));
        let (_, listed) = send(&app, get_req("/api/presets")).await;
        assert_eq!(listed.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn preset_requires_name() {
        let app = test_app();
        let (status, err) = send(
            &app,
            json_req("POST", "/api/presets", &json!({"name": " ", "calories": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["error"], "Name is required");
    }

    #[tokio::test]
    async fn settings_default_then_update() {
        let app = test_app();
        let (status, first) = send(&app, get_req("/api/settings")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["dailyCalorieTarget"], 2000);
        assert_eq!(first["dailyProteinTarget"], 150);
        assert_eq!(first["dailyFiberTarget"], 30);

        let (status, updated) = send(
            &app,
            json_req(
                "PUT",
                "/api/settings",
                &json!({"dailyCalorieTarget": 1800.6, "dailyProteinTarget": "120", "dailyFiberTarget": -1}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["id"], first["id"]);
        assert_eq!(updated["dailyCalorieTarget"], 1801);
        assert_eq!(updated["dailyProteinTarget"], 120);
        assert_eq!(updated["dailyFiberTarget"], 30);

        let (_, again) = send(&app, get_req("/api/settings")).await;
        assert_eq!(again, updated);
    }

    #[tokio::test]
    async fn update_settings_before_any_read_creates_row() {
        let app = test_app();
        let (status, updated) = send(
            &app,
            json_req("PUT", "/api/settings", &json!({"dailyCalorieTarget": 2200})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["dailyCalorieTarget"], 2200);
        assert_eq!(updated["dailyProteinTarget"], 150);
    }

    #[tokio::test]
    async fn parse_returns_estimate() {
        let app = test_app();
        let (status, body) = send(
            &app,
            json_req("POST", "/api/parse", &json!({"description": "a bagel"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"calories": 277, "protein": 11, "fiber": 2}));
    }

    #[tokio::test]
    async fn parse_failures_map_to_status() {
        let app = test_app_with(None);
        let (status, err) = send(
            &app,
            json_req("POST", "/api/parse", &json!({"description": "a bagel"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(err["error"], "provider unavailable");

        let (status, err) = send(&app, json_req("POST", "/api/parse", &json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["error"], "Description is required");
    }

    #[tokio::test]
    async fn summary_totals_today() {
        let app = test_app();
        for (d, c) in [("eggs", 155), ("pear", 100)] {
            send(
                &app,
                json_req(
                    "POST",
                    "/api/entries",
                    &json!({"description": d, "calories": c, "protein": 5, "fiber": 1}),
                ),
            )
            .await;
        }
        let (status, summary) = send(&app, get_req("/api/summary")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(summary["entryCount"], 2);
        assert_eq!(summary["totals"]["calories"], 255.0);
        assert_eq!(summary["remaining"]["calories"], 1745.0);
        assert_eq!(summary["targets"]["dailyFiberTarget"], 30);
    }

    #[tokio::test]
    async fn health_ok() {
        let app = test_app();
        let (status, body) = send(&app, get_req("/api/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn security_headers_present() {
        let app = test_app();
        let response = app.oneshot(get_req("/api/settings")).await.unwrap();
        assert_eq!(
            response.headers().get("x-content-type-options").unwrap(),
            "nosniff"
        );
        assert_eq!(response.headers().get("x-frame-options").unwrap(), "DENY");
        assert_eq!(
            response.headers().get("content-security-policy").unwrap(),
            "default-src 'none'"
        );
    }

    #[tokio::test]
    async fn cors_allows_any_origin() {
        let app = test_app();
        let request = axum::http::Request::get("/api/presets")
            .header("origin", "http://localhost:5173")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn body_size_limit_rejects_oversized() {
        let app = test_app();
        let big_body = vec![b' '; BODY_LIMIT + 1];
        let (status, body) = send(
            &app,
            axum::http::Request::post("/api/entries")
                .header("content-type", "application/json")
                .header("content-length", big_body.len().to_string())
                .body(Body::from(big_body))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert!(body["error"].is_string());

        let (status, _) = send(
            &app,
            json_req("POST", "/api/entries", &json!({"description": "toast"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn internal_error_does_not_leak_details() {
        let error = ApiError::Internal(anyhow::anyhow!("secret database path /home/user/db"));
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Internal server error");
    }
}
