//! HTTP routes for patient records.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, Request, State,
    },
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use patient_records_core::{Patient, PatientRegistry, PatientUpdate, PatientView, RecordResult};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<PatientRegistry>,
}

impl AppState {
    pub fn new(registry: PatientRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/about", get(about))
        .route("/health", get(health))
        .route("/patients", get(list_patients))
        .route("/patients/:patient_id", get(view_patient))
        .route("/sort", get(sort_patients))
        .route("/create", post(create_patient))
        .route("/update/:patient_id", put(update_patient))
        .route("/delete/:patient_id", delete(delete_patient))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                tracing::info_span!(
                    "http_request",
                    request_id = %Uuid::new_v4(),
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .with_state(state)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: &str) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PatientResponse {
    pub message: String,
    pub patient: PatientView,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub patients: u64,
}

#[derive(Debug, Deserialize)]
pub struct SortParams {
    pub sort_by: Option<String>,
    pub order: Option<String>,
}

async fn home() -> Json<MessageResponse> {
    MessageResponse::new("Patient Management API")
}

async fn about() -> Json<MessageResponse> {
    MessageResponse::new("A fully functional API to manage patient data")
}

/// Run a registry call on the blocking pool. SQLite I/O happens under a
/// `std::sync::Mutex`, which must not stall the async workers.
async fn with_registry<T, F>(state: &AppState, f: F) -> ApiResult<T>
where
    F: FnOnce(&PatientRegistry) -> RecordResult<T> + Send + 'static,
    T: Send + 'static,
{
    let registry = Arc::clone(&state.registry);
    let result = tokio::task::spawn_blocking(move || f(&registry))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "registry task failed");
            ApiError::internal()
        })?;
    Ok(result?)
}

async fn health(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let patients = with_registry(&state, |registry| registry.count()).await?;
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        patients,
    }))
}

async fn list_patients(State(state): State<AppState>) -> ApiResult<Json<Vec<PatientView>>> {
    Ok(Json(with_registry(&state, |registry| registry.list()).await?))
}

async fn view_patient(
    State(state): State<AppState>,
    Path(patient_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let (view, etag) =
        with_registry(&state, move |registry| registry.view_with_etag(&patient_id)).await?;
    Ok(([(header::ETAG, format!("\"{}\"", etag))], Json(view)))
}

async fn sort_patients(
    State(state): State<AppState>,
    params: Result<Query<SortParams>, QueryRejection>,
) -> ApiResult<Json<Vec<PatientView>>> {
    let Query(params) = params?;
    let sort_by = params
        .sort_by
        .ok_or_else(|| ApiError::bad_request("Missing required query parameter 'sort_by'"))?;

    let order = params.order;
    let sorted = with_registry(&state, move |registry| {
        registry.sort(&sort_by, order.as_deref())
    })
    .await?;
    Ok(Json(sorted))
}

async fn create_patient(
    State(state): State<AppState>,
    payload: Result<Json<Patient>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<PatientResponse>)> {
    let Json(patient) = payload?;
    let view = with_registry(&state, move |registry| registry.create(patient)).await?;
    Ok((
        StatusCode::CREATED,
        Json(PatientResponse {
            message: "Patient created successfully".to_string(),
            patient: view,
        }),
    ))
}

async fn update_patient(
    State(state): State<AppState>,
    Path(patient_id): Path<String>,
    headers: HeaderMap,
    payload: Result<Json<PatientUpdate>, JsonRejection>,
) -> ApiResult<Json<PatientResponse>> {
    let Json(update) = payload?;
    let if_match = if_match_tag(&headers);
    let view = with_registry(&state, move |registry| {
        registry.update(&patient_id, &update, if_match.as_deref())
    })
    .await?;
    Ok(Json(PatientResponse {
        message: "Patient record updated successfully".to_string(),
        patient: view,
    }))
}

async fn delete_patient(
    State(state): State<AppState>,
    Path(patient_id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    with_registry(&state, move |registry| registry.delete(&patient_id)).await?;
    Ok(MessageResponse::new("Patient record deleted successfully"))
}

/// Entity tag from `If-Match`, unquoted. `*` and a missing header both mean
/// "no precondition".
fn if_match_tag(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::IF_MATCH)?.to_str().ok()?.trim();
    if raw == "*" {
        return None;
    }
    let tag = raw.strip_prefix("W/").unwrap_or(raw);
    Some(tag.trim_matches('"').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_if_match_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(if_match_tag(&headers), None);

        headers.insert(header::IF_MATCH, HeaderValue::from_static("\"abc123\""));
        assert_eq!(if_match_tag(&headers), Some("abc123".to_string()));

        headers.insert(header::IF_MATCH, HeaderValue::from_static("W/\"abc123\""));
        assert_eq!(if_match_tag(&headers), Some("abc123".to_string()));

        headers.insert(header::IF_MATCH, HeaderValue::from_static("*"));
        assert_eq!(if_match_tag(&headers), None);
    }
}
