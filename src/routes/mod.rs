use crate::models::AppState;
use axum::Router;

use chrono::NaiveDate;

use crate::error::ApiError;

pub mod appointment_routes;
pub mod dashboard_routes;
pub mod doctor_routes;
pub mod home_routes;
pub mod medicine_routes;
pub mod patient_routes;
pub mod prescription_routes;
pub mod report_routes;
pub mod user_routes;

pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1/users", user_routes::router())
        .nest("/api/v1/reports", report_routes::router())
        .nest("/api/v1/dashboard", dashboard_routes::router())
        .nest("/api/v1", patient_routes::router())
        .nest("/api/v1", doctor_routes::router())
        .nest("/api/v1", medicine_routes::router())
        .nest("/api/v1", appointment_routes::router())
        .nest("/api/v1", prescription_routes::router())
        .merge(home_routes::router())
        .with_state(state)
}

/// Query-string date (`YYYY-MM-DD`). Missing or blank means "no bound".
pub(crate) fn parse_date_param(name: &str, value: Option<&str>) -> Result<Option<NaiveDate>, ApiError> {
    match value.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ApiError::BadRequest("VALIDATION_ERROR", format!("{name} must be YYYY-MM-DD"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::db::testing;
    use crate::models::AppointmentStatus;
    use crate::store::appointments;

    async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn unknown_status_answers_validation_error_envelope() {
        let db = testing::pool().await;
        let patient = testing::patient(&db, "Zhang San").await;
        let doctor = testing::doctor(&db, "Dr. Li", "Internal Medicine").await;
        let appt = testing::appointment(&db, patient, doctor, "2024-11-01 09:00").await;
        let app = router(AppState { db: db.pool.clone() });

        let (status, body) = send(
            app,
            post_json(&format!("/api/v1/appointments/{appt}/status"), r#"{"status":"arrived"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert!(body["message"].as_str().unwrap().contains("status"));
        assert_eq!(
            appointments::get(&db, appt).await.unwrap().status,
            AppointmentStatus::Scheduled
        );
    }

    #[tokio::test]
    async fn malformed_path_query_and_body_use_the_same_envelope() {
        let db = testing::pool().await;
        let app = router(AppState { db: db.pool.clone() });

        for req in [
            get("/api/v1/patients/abc"),
            get("/api/v1/medicines/search?min_stock=lots"),
            post_json("/api/v1/prescriptions", "{not json"),
        ] {
            let (status, body) = send(app.clone(), req).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["success"], false);
            assert_eq!(body["code"], "VALIDATION_ERROR");
        }
    }

    #[tokio::test]
    async fn overdrawn_prescription_is_a_conflict() {
        let db = testing::pool().await;
        let patient = testing::patient(&db, "Li Si").await;
        let doctor = testing::doctor(&db, "Dr. Wang", "Surgery").await;
        let appt = testing::appointment(&db, patient, doctor, "2024-11-02 10:00").await;
        let medicine = testing::medicine(&db, "Ibuprofen", 2200, 2).await;
        let app = router(AppState { db: db.pool.clone() });

        let (status, body) = send(
            app,
            post_json(
                "/api/v1/prescriptions",
                &format!(r#"{{"appointment_id":{appt},"medicine_id":{medicine},"quantity":5}}"#),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "INSUFFICIENT_STOCK");
    }

    #[test]
    fn blank_date_param_is_no_bound() {
        assert_eq!(parse_date_param("start_date", None).unwrap(), None);
        assert_eq!(parse_date_param("start_date", Some("  ")).unwrap(), None);
        assert_eq!(
            parse_date_param("start_date", Some("2024-03-01")).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
        assert!(parse_date_param("start_date", Some("03/01/2024")).is_err());
    }
}
