// src/routes/dashboard_routes.rs

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;

use crate::{
    aggregation::{self, DashboardCounts, DepartmentCount, MedicineUsage},
    error::ApiError,
    models::{ApiOk, AppState},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/statistics", get(statistics))
        .route("/department_distribution", get(department_distribution))
        .route("/medicine_top", get(medicine_top))
}

pub async fn statistics(
    State(state): State<AppState>,
) -> Result<Json<ApiOk<DashboardCounts>>, ApiError> {
    let today = chrono::Local::now().date_naive();
    let counts = aggregation::dashboard_counts(&state.db, today).await?;
    Ok(Json(ApiOk { data: counts }))
}

pub async fn department_distribution(
    State(state): State<AppState>,
) -> Result<Json<ApiOk<Vec<DepartmentCount>>>, ApiError> {
    let rows = aggregation::department_distribution(&state.db).await?;
    Ok(Json(ApiOk { data: rows }))
}

#[derive(Debug, Deserialize)]
pub struct TopQuery {
    pub limit: Option<i64>,
}

pub async fn medicine_top(
    State(state): State<AppState>,
    WithRejection(Query(q), _): WithRejection<Query<TopQuery>, ApiError>,
) -> Result<Json<ApiOk<Vec<MedicineUsage>>>, ApiError> {
    let limit = q.limit.unwrap_or(10);
    if !(1..=100).contains(&limit) {
        return Err(ApiError::BadRequest(
            "VALIDATION_ERROR",
            "limit must be between 1 and 100".into(),
        ));
    }
    let rows = aggregation::medicine_top_n(&state.db, limit).await?;
    Ok(Json(ApiOk { data: rows }))
}
