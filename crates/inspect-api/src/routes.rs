use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use http::HeaderValue;
use inspect_core::{
    DashboardStats, InspectionId, InspectionPatch, InspectionRecord, InspectionService,
    NewInspection, SyncOutcome, SyncRequest,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::error::AppError;

const SERVICE_NAME: &str = "logistics-inspection-api";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    service: InspectionService,
}

impl AppState {
    pub const fn new(config: Arc<AppConfig>, service: InspectionService) -> Self {
        Self { config, service }
    }
}

pub fn app_router(state: AppState) -> Router {
    let records = record_routes();

    let api = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest("/records", records.clone())
        // Deprecated alias kept for clients still on the old path
        .nest("/cargo-inspections", records);

    Router::new()
        // A nested "/" only matches "/api", so the trailing-slash form is routed here
        .route("/api/", get(root))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config))
        .with_state(state)
}

fn record_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_records).post(create_record))
        .route("/bulk-sync", post(bulk_sync))
        .route("/stats/dashboard", get(dashboard_stats))
        .route(
            "/{id}",
            get(get_record).put(update_record).delete(delete_record),
        )
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let layer = CorsLayer::new().allow_headers(Any).allow_methods(Any);
    if config.cors_allowed_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring CORS origin that is not a valid header value");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

#[derive(Debug, Serialize)]
struct RootResponse {
    message: &'static str,
    version: &'static str,
}

async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Logistics Inspection API",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: DateTime<Utc>,
    service: &'static str,
    store: &'static str,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let store = match state.service.ping().await {
        Ok(()) => "ok",
        Err(error) => {
            tracing::warn!(%error, "Inspection store ping failed");
            "unreachable"
        }
    };
    Json(HealthResponse {
        status: "healthy",
        timestamp: Utc::now(),
        service: SERVICE_NAME,
        store,
    })
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    #[serde(default)]
    skip: usize,
    limit: Option<usize>,
}

async fn list_records(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Vec<InspectionRecord>>, AppError> {
    let Query(query) = query?;
    let limit = query.limit.unwrap_or(state.config.default_page_size);
    let records = state.service.list(query.skip, limit).await?;
    Ok(Json(records))
}

async fn create_record(
    State(state): State<AppState>,
    payload: Result<Json<NewInspection>, JsonRejection>,
) -> Result<Json<InspectionRecord>, AppError> {
    let Json(input) = payload?;
    let record = state.service.create(input).await?;
    Ok(Json(record))
}

async fn get_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<InspectionRecord>, AppError> {
    let record = state.service.get(&InspectionId::from(id)).await?;
    Ok(Json(record))
}

async fn update_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<InspectionPatch>, JsonRejection>,
) -> Result<Json<InspectionRecord>, AppError> {
    let Json(patch) = payload?;
    let record = state.service.update(&InspectionId::from(id), patch).await?;
    Ok(Json(record))
}

#[derive(Debug, Serialize)]
struct MessageResponse {
    message: String,
}

async fn delete_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    state.service.delete(&InspectionId::from(id)).await?;
    Ok(Json(MessageResponse {
        message: "Inspection record deleted successfully".to_string(),
    }))
}

#[derive(Debug, Serialize)]
struct BulkSyncResponse {
    message: String,
    #[serde(flatten)]
    outcome: SyncOutcome,
}

async fn bulk_sync(
    State(state): State<AppState>,
    payload: Result<Json<SyncRequest>, JsonRejection>,
) -> Result<Json<BulkSyncResponse>, AppError> {
    let Json(request) = payload?;
    let outcome = state.service.bulk_sync(request).await?;
    tracing::info!(
        endpoint = "bulk_sync",
        synced = outcome.synced_count,
        "Bulk sync request completed"
    );
    Ok(Json(BulkSyncResponse {
        message: format!(
            "Successfully synced {} inspection records",
            outcome.synced_count
        ),
        outcome,
    }))
}

async fn dashboard_stats(State(state): State<AppState>) -> Result<Json<DashboardStats>, AppError> {
    let stats = state.service.dashboard_stats().await?;
    Ok(Json(stats))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::test_config;

    fn app() -> Router {
        let service = InspectionService::open_in_memory().expect("in-memory store");
        app_router(AppState::new(Arc::new(test_config()), service))
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, value)
    }

    fn valid_body(invoice: &str) -> Value {
        json!({
            "invoiceNumber": invoice,
            "materialType": "Steel beams",
            "qualityInspector": "D. Okafor",
            "quantityReceived": "12 units",
            "receiveDate": "03/14/2024"
        })
    }

    #[tokio::test]
    async fn health_reports_healthy() {
        let app = app();
        let (status, body) = send(&app, Method::GET, "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], SERVICE_NAME);
        assert_eq!(body["store"], "ok");
    }

    #[tokio::test]
    async fn root_reports_banner() {
        let app = app();
        for uri in ["/api/", "/api"] {
            let (status, body) = send(&app, Method::GET, uri, None).await;
            assert_eq!(status, StatusCode::OK, "{uri}");
            assert_eq!(body["message"], "Logistics Inspection API");
        }
    }

    #[tokio::test]
    async fn create_then_fetch_record() {
        let app = app();
        let (status, created) =
            send(&app, Method::POST, "/api/records", Some(valid_body("INV-100"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(created["invoiceNumber"], "INV-100");
        assert_eq!(created["receiveDate"], "03/14/2024");
        assert_eq!(created["nonConforming"], false);

        let id = created["id"].as_str().expect("id");
        let (status, fetched) = send(&app, Method::GET, &format!("/api/records/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn create_without_required_field_is_unprocessable() {
        let app = app();
        for field in ["invoiceNumber", "materialType", "qualityInspector"] {
            let mut body = valid_body("INV-1");
            body.as_object_mut().expect("object").remove(field);

            let (status, error) = send(&app, Method::POST, "/api/records", Some(body)).await;
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
            assert!(error["error"].as_str().expect("message").contains(field));
        }

        let (_, list) = send(&app, Method::GET, "/api/records", None).await;
        assert_eq!(list, json!([]));
    }

    #[tokio::test]
    async fn unknown_record_is_not_found() {
        let app = app();
        let (status, _) = send(&app, Method::GET, "/api/records/missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            &app,
            Method::PUT,
            "/api/records/missing",
            Some(json!({"notes": "x"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn update_changes_only_sent_fields() {
        let app = app();
        let (_, created) =
            send(&app, Method::POST, "/api/records", Some(valid_body("INV-200"))).await;
        let id = created["id"].as_str().expect("id");

        let (status, updated) = send(
            &app,
            Method::PUT,
            &format!("/api/records/{id}"),
            Some(json!({"notes": "x"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["notes"], "x");
        assert_ne!(updated["lastModified"], created["lastModified"]);

        let mut expected = created.clone();
        expected["notes"] = json!("x");
        expected["lastModified"] = updated["lastModified"].clone();
        assert_eq!(updated, expected);
    }

    #[tokio::test]
    async fn delete_twice_reports_not_found() {
        let app = app();
        let (_, created) =
            send(&app, Method::POST, "/api/records", Some(valid_body("INV-300"))).await;
        let uri = format!("/api/records/{}", created["id"].as_str().expect("id"));

        let (status, body) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["message"].as_str().expect("message").contains("deleted"));

        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn list_respects_limit_and_order() {
        let app = app();
        for invoice in ["INV-1", "INV-2", "INV-3"] {
            send(&app, Method::POST, "/api/records", Some(valid_body(invoice))).await;
        }

        let (status, page) = send(&app, Method::GET, "/api/records?skip=0&limit=1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page.as_array().expect("array").len(), 1);

        let (_, all) = send(&app, Method::GET, "/api/records", None).await;
        let dates: Vec<DateTime<Utc>> = all
            .as_array()
            .expect("array")
            .iter()
            .map(|record| {
                record["inspectionDate"]
                    .as_str()
                    .expect("date")
                    .parse()
                    .expect("rfc3339")
            })
            .collect();
        assert_eq!(dates.len(), 3);
        assert!(dates.windows(2).all(|pair| pair[0] >= pair[1]));

        let (status, _) = send(&app, Method::GET, "/api/records?skip=-1", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let uri = format!("/api/records?skip={}", usize::MAX);
        let (status, page) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page, json!([]));
    }

    #[tokio::test]
    async fn bulk_sync_inserts_then_overwrites() {
        let app = app();
        let records = |notes: &str| {
            let batch: Vec<Value> = ["m-1", "m-2", "m-3"]
                .iter()
                .map(|id| {
                    json!({
                        "id": id,
                        "invoiceNumber": format!("INV-{id}"),
                        "materialType": "Plywood",
                        "qualityInspector": "S. Haddad",
                        "notes": notes,
                        "inspectionDate": "2024-05-01T12:00:00Z",
                        "lastModified": "2024-05-01T12:00:00Z"
                    })
                })
                .collect();
            json!({
                "records": batch,
                "lastSyncTimestamp": "2024-05-01T11:00:00Z"
            })
        };

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/records/bulk-sync",
            Some(records("first")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["synced_count"], 3);
        assert!(body["sync_timestamp"].is_string());

        send(
            &app,
            Method::POST,
            "/api/records/bulk-sync",
            Some(records("second")),
        )
        .await;

        let (_, stats) = send(&app, Method::GET, "/api/records/stats/dashboard", None).await;
        assert_eq!(stats["totalInspections"], 3);

        let (status, record) = send(&app, Method::GET, "/api/records/m-2", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(record["notes"], "second");
        assert_eq!(record["inspectionDate"], "2024-05-01T12:00:00Z");
    }

    #[tokio::test]
    async fn dashboard_reports_compliance() {
        let app = app();
        let (_, stats) = send(&app, Method::GET, "/api/records/stats/dashboard", None).await;
        assert_eq!(stats["totalInspections"], 0);
        assert_eq!(stats["complianceRate"], 0.0);

        send(&app, Method::POST, "/api/records", Some(valid_body("INV-A"))).await;
        let mut damaged = valid_body("INV-B");
        damaged["nonConforming"] = json!(true);
        damaged["nonConformanceType"] = json!("Physical Damage");
        send(&app, Method::POST, "/api/records", Some(damaged)).await;

        let (status, stats) = send(&app, Method::GET, "/api/records/stats/dashboard", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stats["totalInspections"], 2);
        assert_eq!(stats["compliantCount"], 1);
        assert_eq!(stats["nonCompliantCount"], 1);
        assert_eq!(stats["complianceRate"], 50.0);
        assert_eq!(
            stats["nonConformanceTypes"],
            json!([{"_id": "Physical Damage", "count": 1}])
        );
    }

    #[tokio::test]
    async fn legacy_prefix_serves_same_records() {
        let app = app();
        let (status, created) = send(
            &app,
            Method::POST,
            "/api/cargo-inspections",
            Some(valid_body("INV-legacy")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let id = created["id"].as_str().expect("id");
        let (status, fetched) = send(&app, Method::GET, &format!("/api/records/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["invoiceNumber"], "INV-legacy");

        let (status, stats) = send(
            &app,
            Method::GET,
            "/api/cargo-inspections/stats/dashboard",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stats["totalInspections"], 1);
    }
}
