// src/routes/appointment_routes.rs

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;

use crate::{
    aggregation::{self, AppointmentFilter, AppointmentSummaryRow},
    error::ApiError,
    models::{
        ActionResponse, ApiOk, AppState, AppointmentInput, AppointmentRow, AppointmentUpdate,
        StatusUpdate,
    },
    routes::parse_date_param,
    store::appointments,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/appointments", get(list_appointments).post(create_appointment))
        .route("/appointments/search", get(search_appointments))
        .route(
            "/appointments/{appointment_id}",
            get(get_appointment).put(update_appointment).delete(delete_appointment),
        )
        .route("/appointments/{appointment_id}/status", post(set_status))
}

pub async fn list_appointments(
    State(state): State<AppState>,
) -> Result<Json<ApiOk<Vec<AppointmentRow>>>, ApiError> {
    let rows = appointments::list(&state.db).await?;
    Ok(Json(ApiOk { data: rows }))
}

pub async fn get_appointment(
    State(state): State<AppState>,
    WithRejection(Path(appointment_id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<Json<ApiOk<AppointmentRow>>, ApiError> {
    let row = appointments::get(&state.db, appointment_id).await?;
    Ok(Json(ApiOk { data: row }))
}

pub async fn create_appointment(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<AppointmentInput>, ApiError>,
) -> Result<Json<ActionResponse<AppointmentRow>>, ApiError> {
    let row = appointments::create(&state.db, &req).await?;
    Ok(Json(ActionResponse::ok("appointment booked", row)))
}

pub async fn update_appointment(
    State(state): State<AppState>,
    WithRejection(Path(appointment_id), _): WithRejection<Path<i64>, ApiError>,
    WithRejection(Json(req), _): WithRejection<Json<AppointmentUpdate>, ApiError>,
) -> Result<Json<ActionResponse<AppointmentRow>>, ApiError> {
    let row = appointments::update(&state.db, appointment_id, &req).await?;
    Ok(Json(ActionResponse::ok("appointment updated", row)))
}

/// Any status may be set regardless of the current one.
pub async fn set_status(
    State(state): State<AppState>,
    WithRejection(Path(appointment_id), _): WithRejection<Path<i64>, ApiError>,
    WithRejection(Json(req), _): WithRejection<Json<StatusUpdate>, ApiError>,
) -> Result<Json<ActionResponse<AppointmentRow>>, ApiError> {
    let row = appointments::set_status(&state.db, appointment_id, req.status).await?;
    Ok(Json(ActionResponse::ok(
        format!("appointment status set to {}", row.status.as_str()),
        row,
    )))
}

pub async fn delete_appointment(
    State(state): State<AppState>,
    WithRejection(Path(appointment_id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<Json<ActionResponse<()>>, ApiError> {
    appointments::delete(&state.db, appointment_id).await?;
    Ok(Json(ActionResponse::done(
        "appointment deleted together with its prescriptions",
    )))
}

#[derive(Debug, Deserialize)]
pub struct AppointmentSearchQuery {
    pub patient_name: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl AppointmentSearchQuery {
    pub fn into_filter(self) -> Result<AppointmentFilter, ApiError> {
        Ok(AppointmentFilter {
            from: parse_date_param("start_date", self.start_date.as_deref())?,
            to: parse_date_param("end_date", self.end_date.as_deref())?,
            patient_name_contains: self.patient_name,
        })
    }
}

pub async fn search_appointments(
    State(state): State<AppState>,
    WithRejection(Query(q), _): WithRejection<Query<AppointmentSearchQuery>, ApiError>,
) -> Result<Json<ApiOk<Vec<AppointmentSummaryRow>>>, ApiError> {
    let rows = aggregation::appointment_summary(&state.db, &q.into_filter()?).await?;
    Ok(Json(ApiOk { data: rows }))
}
