// src/routes/patient_routes.rs

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use axum_extra::extract::WithRejection;

use crate::{
    error::ApiError,
    models::{ActionResponse, ApiOk, AppState, PatientInput, PatientRow},
    store::patients,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/patients", get(list_patients).post(create_patient))
        .route(
            "/patients/{patient_id}",
            get(get_patient).put(update_patient).delete(delete_patient),
        )
}

pub async fn list_patients(
    State(state): State<AppState>,
) -> Result<Json<ApiOk<Vec<PatientRow>>>, ApiError> {
    let rows = patients::list(&state.db).await?;
    Ok(Json(ApiOk { data: rows }))
}

pub async fn get_patient(
    State(state): State<AppState>,
    WithRejection(Path(patient_id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<Json<ApiOk<PatientRow>>, ApiError> {
    let row = patients::get(&state.db, patient_id).await?;
    Ok(Json(ApiOk { data: row }))
}

pub async fn create_patient(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<PatientInput>, ApiError>,
) -> Result<Json<ActionResponse<PatientRow>>, ApiError> {
    let row = patients::create(&state.db, &req).await?;
    Ok(Json(ActionResponse::ok("patient added", row)))
}

pub async fn update_patient(
    State(state): State<AppState>,
    WithRejection(Path(patient_id), _): WithRejection<Path<i64>, ApiError>,
    WithRejection(Json(req), _): WithRejection<Json<PatientInput>, ApiError>,
) -> Result<Json<ActionResponse<PatientRow>>, ApiError> {
    let row = patients::update(&state.db, patient_id, &req).await?;
    Ok(Json(ActionResponse::ok("patient updated", row)))
}

pub async fn delete_patient(
    State(state): State<AppState>,
    WithRejection(Path(patient_id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<Json<ActionResponse<()>>, ApiError> {
    patients::delete(&state.db, patient_id).await?;
    Ok(Json(ActionResponse::done(
        "patient deleted together with their appointments and prescriptions",
    )))
}
