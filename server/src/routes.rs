use axum::Json;
use axum::Router;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::routing::get;
use contact_protocol::COUNT_PATH;
use contact_protocol::PATIENTS_PATH;
use contact_protocol::Patient;
use contact_protocol::UpdatePatient;
use serde::Deserialize;

use crate::AppState;
use crate::error::ApiError;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route(PATIENTS_PATH, get(find))
        .route(&format!("{PATIENTS_PATH}/{COUNT_PATH}"), get(count))
        .route(
            &format!("{PATIENTS_PATH}/{{id}}"),
            get(find_one).patch(update),
        )
        .route("/healthz", get(healthz))
}

#[derive(Debug, Deserialize)]
pub(crate) struct ContactedQuery {
    contacted: Option<String>,
}

/// `GET /api/v1/patients?contacted=` (the filter is required).
async fn find(
    State(state): State<AppState>,
    Query(query): Query<ContactedQuery>,
) -> Result<Json<Vec<Patient>>, ApiError> {
    let contacted = match query.contacted.as_deref() {
        Some("true") => true,
        Some("false") => false,
        Some(other) => {
            return Err(ApiError::BadRequest(format!(
                "contacted must be true or false, got `{other}`"
            )));
        }
        None => {
            return Err(ApiError::BadRequest(
                "contacted query parameter is required".to_string(),
            ));
        }
    };

    let store = state.store.lock().await;
    Ok(Json(store.find(contacted)?))
}

/// `GET /api/v1/patients/stats/count[?contacted=]`.
///
/// Only the literal `true` counts contacted patients; any other value
/// counts uncontacted ones.
async fn count(
    State(state): State<AppState>,
    Query(query): Query<ContactedQuery>,
) -> Result<Json<u64>, ApiError> {
    let contacted = query.contacted.map(|value| value == "true");
    let store = state.store.lock().await;
    Ok(Json(store.count(contacted)?))
}

async fn find_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Patient>, ApiError> {
    let store = state.store.lock().await;
    store
        .find_one(&id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("patient {id} not found")))
}

/// `PATCH /api/v1/patients/{id}`; only the provided fields change.
async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<UpdatePatient>, JsonRejection>,
) -> Result<Json<Patient>, ApiError> {
    let Json(update) = body.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    let store = state.store.lock().await;
    let patient = store
        .update(&id, &update)?
        .ok_or_else(|| ApiError::NotFound(format!("patient {id} not found")))?;
    tracing::info!(patient_id = %id, contacted = patient.contacted, "Patient updated");
    Ok(Json(patient))
}

async fn healthz() -> &'static str {
    "ok"
}
