// src/routes/prescription_routes.rs

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use axum_extra::extract::WithRejection;

use crate::{
    error::ApiError,
    ledger,
    models::{ActionResponse, ApiOk, AppState, PrescribeRequest, PrescriptionListRow, PrescriptionRow},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/prescriptions", get(list_prescriptions).post(prescribe))
        .route("/prescriptions/{prescription_id}", get(get_prescription))
        .route(
            "/appointments/{appointment_id}/prescriptions",
            get(list_appointment_prescriptions),
        )
}

pub async fn prescribe(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<PrescribeRequest>, ApiError>,
) -> Result<Json<ActionResponse<PrescriptionRow>>, ApiError> {
    let row = ledger::prescribe(&state.db, &req).await?;
    Ok(Json(ActionResponse::ok(
        "prescription written and stock deducted",
        row,
    )))
}

pub async fn list_prescriptions(
    State(state): State<AppState>,
) -> Result<Json<ApiOk<Vec<PrescriptionListRow>>>, ApiError> {
    let rows = ledger::list_prescriptions(&state.db).await?;
    Ok(Json(ApiOk { data: rows }))
}

pub async fn get_prescription(
    State(state): State<AppState>,
    WithRejection(Path(prescription_id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<Json<ApiOk<PrescriptionRow>>, ApiError> {
    let row = ledger::get_prescription(&state.db, prescription_id).await?;
    Ok(Json(ApiOk { data: row }))
}

pub async fn list_appointment_prescriptions(
    State(state): State<AppState>,
    WithRejection(Path(appointment_id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<Json<ApiOk<Vec<PrescriptionListRow>>>, ApiError> {
    let rows = ledger::list_for_appointment(&state.db, appointment_id).await?;
    Ok(Json(ApiOk { data: rows }))
}
