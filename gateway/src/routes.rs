use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use link_budget::{
    compute_from_params, report,
    units::{convert_power, parse_unit, PowerUnit},
    EngineError, LinkBudgetOutput, LinkBudgetParams,
};
use serde::{Deserialize, Serialize};

use crate::storage::{CalculationStore, CalculationSummary, SaveRequest, SavedCalculation, StoreError};

#[derive(Clone)]
pub struct AppState {
    pub store: CalculationStore,
}

type ApiResult<T> = Result<T, (StatusCode, String)>;

fn engine_error(e: EngineError) -> (StatusCode, String) {
    tracing::debug!("Rejected link parameters: {}", e);
    (StatusCode::BAD_REQUEST, e.to_string())
}

fn store_error(e: StoreError) -> (StatusCode, String) {
    let status = match &e {
        StoreError::NotFound(_) => StatusCode::NOT_FOUND,
        StoreError::InvalidId(_) | StoreError::InvalidRequest(_) | StoreError::Engine(_) => {
            StatusCode::BAD_REQUEST
        }
        StoreError::Io(_) | StoreError::Json(_) => {
            tracing::error!("Calculation store failure: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, e.to_string())
}

#[derive(Serialize)]
pub struct CalculateResponse {
    pub success: bool,
    pub timestamp: String,
    pub inputs: LinkBudgetParams,
    pub outputs: LinkBudgetOutput,
}

#[derive(Deserialize)]
pub struct ConvertPowerRequest {
    pub value: f64,
    pub from_unit: String,
    pub to_unit: String,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct PowerValue {
    pub value: f64,
    pub unit: String,
}

#[derive(Serialize)]
pub struct ConvertPowerResponse {
    pub success: bool,
    pub input: PowerValue,
    pub output: PowerValue,
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub id: String,
}

pub async fn index() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "service": "link-gateway",
        "description": "Free-space optical link budget calculator",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "GET /health",
            "calculate": "POST /api/v1/calculate",
            "convert_power": "POST /api/v1/convert/power",
            "report": "POST /api/v1/report",
            "save": "POST /api/v1/calculations",
            "list": "GET /api/v1/calculations",
            "load": "GET /api/v1/calculations/:id",
            "delete": "DELETE /api/v1/calculations/:id"
        }
    }))
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "link-gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

pub async fn calculate(Json(params): Json<LinkBudgetParams>) -> ApiResult<Json<CalculateResponse>> {
    let outputs = compute_from_params(&params).map_err(engine_error)?;

    Ok(Json(CalculateResponse {
        success: true,
        timestamp: chrono::Utc::now().to_rfc3339(),
        inputs: params,
        outputs,
    }))
}

pub async fn convert(Json(req): Json<ConvertPowerRequest>) -> ApiResult<Json<ConvertPowerResponse>> {
    let from: PowerUnit = parse_unit(Some(&req.from_unit)).map_err(engine_error)?;
    let to: PowerUnit = parse_unit(Some(&req.to_unit)).map_err(engine_error)?;

    let value = convert_power(req.value, from, to);
    if !value.is_finite() {
        return Err((
            StatusCode::BAD_REQUEST,
            format!(
                "{} {} has no finite value in {}",
                req.value,
                <&'static str>::from(from),
                <&'static str>::from(to)
            ),
        ));
    }

    Ok(Json(ConvertPowerResponse {
        success: true,
        input: PowerValue {
            value: req.value,
            unit: <&'static str>::from(from).to_string(),
        },
        output: PowerValue {
            value,
            unit: <&'static str>::from(to).to_string(),
        },
    }))
}

pub async fn render_report(Json(params): Json<LinkBudgetParams>) -> ApiResult<String> {
    let output = compute_from_params(&params).map_err(engine_error)?;
    Ok(report::render(&output))
}

pub async fn save_calculation(
    State(state): State<AppState>,
    Json(req): Json<SaveRequest>,
) -> ApiResult<(StatusCode, Json<SavedCalculation>)> {
    let saved = state.store.save(req).await.map_err(store_error)?;
    Ok((StatusCode::CREATED, Json(saved)))
}

pub async fn list_calculations(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<CalculationSummary>>> {
    let list = state.store.list().await.map_err(store_error)?;
    Ok(Json(list))
}

pub async fn load_calculation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SavedCalculation>> {
    let saved = state.store.load(&id).await.map_err(store_error)?;
    Ok(Json(saved))
}

pub async fn delete_calculation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    state.store.delete(&id).await.map_err(store_error)?;
    Ok(Json(DeleteResponse { success: true, id }))
}

/// Routes mounted under `/api/v1`
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/calculate", post(calculate))
        .route("/convert/power", post(convert))
        .route("/report", post(render_report))
        .route(
            "/calculations",
            get(list_calculations).post(save_calculation),
        )
        .route(
            "/calculations/:id",
            get(load_calculation).delete(delete_calculation),
        )
        .with_state(state)
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .nest("/api/v1", api_routes(state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn app(dir: &TempDir) -> Router {
        let store = CalculationStore::open(dir.path()).unwrap();
        router(AppState { store })
    }

    async fn send(app: Router, method: Method, uri: &str, body: Option<serde_json::Value>) -> (StatusCode, Vec<u8>) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    fn reference_json() -> serde_json::Value {
        serde_json::to_value(LinkBudgetParams::reference()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let dir = TempDir::new().unwrap();
        let (status, body) = send(app(&dir), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "healthy");
    }

    #[tokio::test]
    async fn test_calculate_reference() {
        let dir = TempDir::new().unwrap();
        let (status, body) = send(
            app(&dir),
            Method::POST,
            "/api/v1/calculate",
            Some(reference_json()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["outputs"]["margin_status"], "excellent");
        assert_eq!(json["outputs"]["link_viable"], true);
    }

    #[tokio::test]
    async fn test_calculate_rejects_bad_geometry() {
        let dir = TempDir::new().unwrap();
        let mut params = reference_json();
        params["distance"] = serde_json::json!(-5.0);
        let (status, body) =
            send(app(&dir), Method::POST, "/api/v1/calculate", Some(params)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(String::from_utf8(body).unwrap().contains("distance_m"));
    }

    #[tokio::test]
    async fn test_convert_power() {
        let dir = TempDir::new().unwrap();
        let req = serde_json::json!({ "value": 1.0, "from_unit": "W", "to_unit": "dBm" });
        let (status, body) =
            send(app(&dir), Method::POST, "/api/v1/convert/power", Some(req)).await;
        assert_eq!(status, StatusCode::OK);

        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        let output: PowerValue = serde_json::from_value(json["output"].clone()).unwrap();
        assert_eq!(output.unit, "dBm");
        assert!((output.value - 30.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_convert_power_rejects_bad_input() {
        let dir = TempDir::new().unwrap();
        let unknown = serde_json::json!({ "value": 1.0, "from_unit": "hp", "to_unit": "dBm" });
        let (status, _) =
            send(app(&dir), Method::POST, "/api/v1/convert/power", Some(unknown)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let zero = serde_json::json!({ "value": 0.0, "from_unit": "mW", "to_unit": "dBm" });
        let (status, _) = send(app(&dir), Method::POST, "/api/v1/convert/power", Some(zero)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_report_is_text() {
        let dir = TempDir::new().unwrap();
        let (status, body) =
            send(app(&dir), Method::POST, "/api/v1/report", Some(reference_json())).await;
        assert_eq!(status, StatusCode::OK);
        let text = String::from_utf8(body).unwrap();
        assert!(text.contains("Link Margin"));
    }

    #[tokio::test]
    async fn test_calculation_lifecycle() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir);

        let req = serde_json::json!({
            "calculation_name": "ground link",
            "inputs": reference_json(),
            "notes": "baseline"
        });
        let (status, body) =
            send(app.clone(), Method::POST, "/api/v1/calculations", Some(req)).await;
        assert_eq!(status, StatusCode::CREATED);
        let saved: serde_json::Value = serde_json::from_slice(&body).unwrap();
        let id = saved["id"].as_str().unwrap().to_string();
        assert!(id.starts_with("ground_link_"));

        let (status, body) = send(app.clone(), Method::GET, "/api/v1/calculations", None).await;
        assert_eq!(status, StatusCode::OK);
        let list: Vec<serde_json::Value> = serde_json::from_slice(&body).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["id"], id.as_str());

        let uri = format!("/api/v1/calculations/{}", id);
        let (status, body) = send(app.clone(), Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        let loaded: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(loaded["notes"], "baseline");

        let (status, _) = send(app.clone(), Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_load_rejects_bad_id() {
        let dir = TempDir::new().unwrap();
        let (status, _) = send(
            app(&dir),
            Method::GET,
            "/api/v1/calculations/bad.id",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
