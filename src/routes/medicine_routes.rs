// src/routes/medicine_routes.rs

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;

use crate::{
    aggregation::{self, MedicineFilter},
    error::ApiError,
    ledger,
    models::{ActionResponse, ApiOk, AppState, MedicineInput, MedicineRow, StockAdjustment},
    store::medicines,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/medicines", get(list_medicines).post(create_medicine))
        .route("/medicines/search", get(search_medicines))
        .route(
            "/medicines/{medicine_id}",
            get(get_medicine).put(update_medicine).delete(delete_medicine),
        )
        .route("/medicines/{medicine_id}/stock", post(adjust_stock))
}

pub async fn list_medicines(
    State(state): State<AppState>,
) -> Result<Json<ApiOk<Vec<MedicineRow>>>, ApiError> {
    let rows = medicines::list(&state.db).await?;
    Ok(Json(ApiOk { data: rows }))
}

pub async fn get_medicine(
    State(state): State<AppState>,
    WithRejection(Path(medicine_id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<Json<ApiOk<MedicineRow>>, ApiError> {
    let row = medicines::get(&state.db, medicine_id).await?;
    Ok(Json(ApiOk { data: row }))
}

pub async fn create_medicine(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<MedicineInput>, ApiError>,
) -> Result<Json<ActionResponse<MedicineRow>>, ApiError> {
    let row = medicines::create(&state.db, &req).await?;
    Ok(Json(ActionResponse::ok("medicine added", row)))
}

pub async fn update_medicine(
    State(state): State<AppState>,
    WithRejection(Path(medicine_id), _): WithRejection<Path<i64>, ApiError>,
    WithRejection(Json(req), _): WithRejection<Json<MedicineInput>, ApiError>,
) -> Result<Json<ActionResponse<MedicineRow>>, ApiError> {
    let row = medicines::update(&state.db, medicine_id, &req).await?;
    Ok(Json(ActionResponse::ok("medicine updated", row)))
}

pub async fn delete_medicine(
    State(state): State<AppState>,
    WithRejection(Path(medicine_id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<Json<ActionResponse<()>>, ApiError> {
    medicines::delete(&state.db, medicine_id).await?;
    Ok(Json(ActionResponse::done("medicine deleted")))
}

pub async fn adjust_stock(
    State(state): State<AppState>,
    WithRejection(Path(medicine_id), _): WithRejection<Path<i64>, ApiError>,
    WithRejection(Json(req), _): WithRejection<Json<StockAdjustment>, ApiError>,
) -> Result<Json<ActionResponse<MedicineRow>>, ApiError> {
    let row = ledger::adjust_stock(&state.db, medicine_id, req.stock).await?;
    Ok(Json(ActionResponse::ok(format!("stock set to {}", row.stock), row)))
}

#[derive(Debug, Deserialize)]
pub struct MedicineSearchQuery {
    pub category: Option<String>,
    pub min_stock: Option<i64>,
}

pub async fn search_medicines(
    State(state): State<AppState>,
    WithRejection(Query(q), _): WithRejection<Query<MedicineSearchQuery>, ApiError>,
) -> Result<Json<ApiOk<Vec<MedicineRow>>>, ApiError> {
    let filter = MedicineFilter {
        category: q.category,
        min_stock: q.min_stock,
    };
    let rows = aggregation::search_medicines(&state.db, &filter).await?;
    Ok(Json(ApiOk { data: rows }))
}
