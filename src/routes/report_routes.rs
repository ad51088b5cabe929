// src/routes/report_routes.rs

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use axum_extra::extract::WithRejection;

use crate::{
    aggregation,
    error::ApiError,
    models::{ApiOk, AppState},
    reports::{self, AppointmentReport, MedicineReport, PatientReport},
    routes::appointment_routes::AppointmentSearchQuery,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/medicines", get(medicine_report))
        .route("/appointments", get(appointment_report))
        .route("/patients", get(patient_report))
}

pub async fn medicine_report(
    State(state): State<AppState>,
) -> Result<Json<ApiOk<MedicineReport>>, ApiError> {
    let sales = aggregation::medicine_sales_summary(&state.db).await?;
    Ok(Json(ApiOk {
        data: reports::medicine_report(sales),
    }))
}

/// Same filters as the appointment search (`patient_name`, `start_date`, `end_date`).
pub async fn appointment_report(
    State(state): State<AppState>,
    WithRejection(Query(q), _): WithRejection<Query<AppointmentSearchQuery>, ApiError>,
) -> Result<Json<ApiOk<AppointmentReport>>, ApiError> {
    let rows = aggregation::appointment_summary(&state.db, &q.into_filter()?).await?;
    Ok(Json(ApiOk {
        data: reports::appointment_report(rows),
    }))
}

pub async fn patient_report(
    State(state): State<AppState>,
) -> Result<Json<ApiOk<PatientReport>>, ApiError> {
    let rows = aggregation::patient_summary(&state.db).await?;
    Ok(Json(ApiOk {
        data: reports::patient_report(rows),
    }))
}
