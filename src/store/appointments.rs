use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::ClinicError;
use crate::models::{clean_opt, AppointmentInput, AppointmentRow, AppointmentStatus, AppointmentUpdate};

const APPOINTMENT_COLUMNS: &str =
    "id, patient_id, doctor_id, scheduled_at, status, notes, created_at";

async fn ensure_exists(pool: &SqlitePool, table: &str, entity: &'static str, id: i64) -> Result<(), ClinicError> {
    let found: Option<i64> = sqlx::query_scalar(&format!("SELECT id FROM {table} WHERE id = ?1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    found.map(|_| ()).ok_or_else(|| ClinicError::not_found(entity, id))
}

/// Book an appointment. A patient or doctor deleted between the existence
/// check and the insert is caught by the foreign key and reported as a conflict.
pub async fn create(pool: &SqlitePool, input: &AppointmentInput) -> Result<AppointmentRow, ClinicError> {
    ensure_exists(pool, "patients", "patient", input.patient_id).await?;
    ensure_exists(pool, "doctors", "doctor", input.doctor_id).await?;

    let row = sqlx::query_as::<_, AppointmentRow>(&format!(
        r#"
        INSERT INTO appointments (patient_id, doctor_id, scheduled_at, status, notes, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        RETURNING {APPOINTMENT_COLUMNS}
        "#
    ))
    .bind(input.patient_id)
    .bind(input.doctor_id)
    .bind(input.scheduled_at)
    .bind(input.status.unwrap_or_default())
    .bind(clean_opt(input.notes.as_deref()))
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    tracing::info!(
        appointment_id = row.id,
        patient_id = row.patient_id,
        doctor_id = row.doctor_id,
        "appointment booked"
    );
    Ok(row)
}

pub async fn get(pool: &SqlitePool, id: i64) -> Result<AppointmentRow, ClinicError> {
    sqlx::query_as::<_, AppointmentRow>(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ClinicError::not_found("appointment", id))
}

pub async fn list(pool: &SqlitePool) -> Result<Vec<AppointmentRow>, ClinicError> {
    let rows = sqlx::query_as::<_, AppointmentRow>(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments ORDER BY scheduled_at ASC, id ASC"
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Reschedule / annotate. The patient and doctor of an appointment never change.
pub async fn update(
    pool: &SqlitePool,
    id: i64,
    input: &AppointmentUpdate,
) -> Result<AppointmentRow, ClinicError> {
    sqlx::query_as::<_, AppointmentRow>(&format!(
        r#"
        UPDATE appointments
        SET scheduled_at = ?1,
            status = ?2,
            notes = ?3
        WHERE id = ?4
        RETURNING {APPOINTMENT_COLUMNS}
        "#
    ))
    .bind(input.scheduled_at)
    .bind(input.status)
    .bind(clean_opt(input.notes.as_deref()))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ClinicError::not_found("appointment", id))
}

/// Status lifecycle. Any status can be set from any other, including
/// re-opening a completed or cancelled appointment.
pub async fn set_status(
    pool: &SqlitePool,
    id: i64,
    status: AppointmentStatus,
) -> Result<AppointmentRow, ClinicError> {
    let row = sqlx::query_as::<_, AppointmentRow>(&format!(
        r#"
        UPDATE appointments
        SET status = ?1
        WHERE id = ?2
        RETURNING {APPOINTMENT_COLUMNS}
        "#
    ))
    .bind(status)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ClinicError::not_found("appointment", id))?;

    tracing::info!(appointment_id = id, status = status.as_str(), "appointment status set");
    Ok(row)
}

/// Hard delete; the appointment's prescriptions cascade.
pub async fn delete(pool: &SqlitePool, id: i64) -> Result<(), ClinicError> {
    let result = sqlx::query("DELETE FROM appointments WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ClinicError::not_found("appointment", id));
    }
    tracing::info!(appointment_id = id, "appointment deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing;
    use crate::ledger;
    use crate::models::PrescribeRequest;

    #[tokio::test]
    async fn booking_requires_existing_patient_and_doctor() {
        let pool = testing::pool().await;
        let patient = testing::patient(&pool, "Zhou Ba").await;
        let doctor = testing::doctor(&pool, "Dr. Chen", "Ophthalmology").await;

        let missing_doctor = create(
            &pool,
            &AppointmentInput {
                patient_id: patient,
                doctor_id: doctor + 100,
                scheduled_at: testing::at("2024-08-01 09:00"),
                status: None,
                notes: None,
            },
        )
        .await;
        assert!(matches!(
            missing_doctor,
            Err(ClinicError::NotFound { entity: "doctor", .. })
        ));

        let missing_patient = create(
            &pool,
            &AppointmentInput {
                patient_id: patient + 100,
                doctor_id: doctor,
                scheduled_at: testing::at("2024-08-01 09:00"),
                status: None,
                notes: None,
            },
        )
        .await;
        assert!(matches!(
            missing_patient,
            Err(ClinicError::NotFound { entity: "patient", .. })
        ));
        assert!(list(&pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn new_appointment_starts_scheduled() {
        let pool = testing::pool().await;
        let patient = testing::patient(&pool, "Wu Jiu").await;
        let doctor = testing::doctor(&pool, "Dr. Wang", "Surgery").await;
        let id = testing::appointment(&pool, patient, doctor, "2024-08-02 15:30").await;

        let row = get(&pool, id).await.unwrap();
        assert_eq!(row.status, AppointmentStatus::Scheduled);
        assert_eq!(row.scheduled_at, testing::at("2024-08-02 15:30"));
    }

    #[tokio::test]
    async fn any_status_can_follow_any_other() {
        let pool = testing::pool().await;
        let patient = testing::patient(&pool, "Zheng Shi").await;
        let doctor = testing::doctor(&pool, "Dr. Liu", "Gynecology").await;
        let id = testing::appointment(&pool, patient, doctor, "2024-08-03 10:00").await;

        let path = [
            AppointmentStatus::Completed,
            AppointmentStatus::Scheduled,
            AppointmentStatus::Cancelled,
            AppointmentStatus::Confirmed,
            AppointmentStatus::Cancelled,
            AppointmentStatus::Completed,
        ];
        for status in path {
            assert_eq!(set_status(&pool, id, status).await.unwrap().status, status);
        }
        assert!(matches!(
            set_status(&pool, id + 1, AppointmentStatus::Confirmed).await,
            Err(ClinicError::NotFound { entity: "appointment", .. })
        ));
    }

    #[tokio::test]
    async fn update_reschedules_without_touching_participants() {
        let pool = testing::pool().await;
        let patient = testing::patient(&pool, "Zhang San").await;
        let doctor = testing::doctor(&pool, "Dr. Li", "Internal Medicine").await;
        let id = testing::appointment(&pool, patient, doctor, "2024-08-04 09:00").await;

        let row = update(
            &pool,
            id,
            &AppointmentUpdate {
                scheduled_at: testing::at("2024-08-05 11:15"),
                status: AppointmentStatus::Confirmed,
                notes: Some("follow-up".into()),
            },
        )
        .await
        .unwrap();
        assert_eq!(row.scheduled_at, testing::at("2024-08-05 11:15"));
        assert_eq!(row.status, AppointmentStatus::Confirmed);
        assert_eq!(row.patient_id, patient);
        assert_eq!(row.doctor_id, doctor);
    }

    #[tokio::test]
    async fn delete_removes_prescriptions() {
        let pool = testing::pool().await;
        let patient = testing::patient(&pool, "Li Si").await;
        let doctor = testing::doctor(&pool, "Dr. Zhang", "Pediatrics").await;
        let medicine = testing::medicine(&pool, "Cold Relief Granules", 1800, 3).await;
        let id = testing::appointment(&pool, patient, doctor, "2024-08-06 16:00").await;

        ledger::prescribe(
            &pool,
            &PrescribeRequest {
                appointment_id: id,
                medicine_id: medicine,
                quantity: 3,
                dosage: "1 sachet".into(),
                instructions: Some("after meals".into()),
            },
        )
        .await
        .unwrap();

        delete(&pool, id).await.unwrap();
        assert!(ledger::list_for_appointment(&pool, id).await.unwrap().is_empty());
        assert!(matches!(delete(&pool, id).await, Err(ClinicError::NotFound { .. })));
    }
}
