// src/routes/doctor_routes.rs

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;

use crate::{
    aggregation::{self, DoctorFilter},
    error::ApiError,
    models::{ActionResponse, ApiOk, AppState, DoctorInput, DoctorRow},
    routes::parse_date_param,
    store::doctors,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/doctors", get(list_doctors).post(create_doctor))
        .route("/doctors/search", get(search_doctors))
        .route(
            "/doctors/{doctor_id}",
            get(get_doctor).put(update_doctor).delete(delete_doctor),
        )
        .route("/doctors/{doctor_id}/toggle", post(toggle_doctor))
}

pub async fn list_doctors(
    State(state): State<AppState>,
) -> Result<Json<ApiOk<Vec<DoctorRow>>>, ApiError> {
    let rows = doctors::list(&state.db).await?;
    Ok(Json(ApiOk { data: rows }))
}

pub async fn get_doctor(
    State(state): State<AppState>,
    WithRejection(Path(doctor_id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<Json<ApiOk<DoctorRow>>, ApiError> {
    let row = doctors::get(&state.db, doctor_id).await?;
    Ok(Json(ApiOk { data: row }))
}

pub async fn create_doctor(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<DoctorInput>, ApiError>,
) -> Result<Json<ActionResponse<DoctorRow>>, ApiError> {
    let row = doctors::create(&state.db, &req).await?;
    Ok(Json(ActionResponse::ok("doctor added", row)))
}

pub async fn update_doctor(
    State(state): State<AppState>,
    WithRejection(Path(doctor_id), _): WithRejection<Path<i64>, ApiError>,
    WithRejection(Json(req), _): WithRejection<Json<DoctorInput>, ApiError>,
) -> Result<Json<ActionResponse<DoctorRow>>, ApiError> {
    let row = doctors::update(&state.db, doctor_id, &req).await?;
    Ok(Json(ActionResponse::ok("doctor updated", row)))
}

pub async fn toggle_doctor(
    State(state): State<AppState>,
    WithRejection(Path(doctor_id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<Json<ActionResponse<DoctorRow>>, ApiError> {
    let row = doctors::toggle_availability(&state.db, doctor_id).await?;
    let message = if row.available {
        "doctor is now available"
    } else {
        "doctor is now unavailable"
    };
    Ok(Json(ActionResponse::ok(message, row)))
}

pub async fn delete_doctor(
    State(state): State<AppState>,
    WithRejection(Path(doctor_id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<Json<ActionResponse<()>>, ApiError> {
    doctors::delete(&state.db, doctor_id).await?;
    Ok(Json(ActionResponse::done(
        "doctor deleted together with their appointments and prescriptions",
    )))
}

#[derive(Debug, Deserialize)]
pub struct DoctorSearchQuery {
    pub name: Option<String>,
    pub department: Option<String>,
    pub date: Option<String>,
}

pub async fn search_doctors(
    State(state): State<AppState>,
    WithRejection(Query(q), _): WithRejection<Query<DoctorSearchQuery>, ApiError>,
) -> Result<Json<ApiOk<Vec<DoctorRow>>>, ApiError> {
    let filter = DoctorFilter {
        name_contains: q.name,
        department: q.department,
        has_appointment_on: parse_date_param("date", q.date.as_deref())?,
    };
    let rows = aggregation::search_doctors(&state.db, &filter).await?;
    Ok(Json(ApiOk { data: rows }))
}
