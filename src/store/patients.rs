use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::ClinicError;
use crate::models::{clean_opt, PatientInput, PatientRow};

const PATIENT_COLUMNS: &str =
    "id, name, contact, age, gender, registered_at, address, emergency_contact";

pub async fn create(pool: &SqlitePool, input: &PatientInput) -> Result<PatientRow, ClinicError> {
    input.validate()?;

    let row = sqlx::query_as::<_, PatientRow>(&format!(
        r#"
        INSERT INTO patients (name, contact, age, gender, registered_at, address, emergency_contact)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        RETURNING {PATIENT_COLUMNS}
        "#
    ))
    .bind(input.name.trim())
    .bind(input.contact.trim())
    .bind(input.age)
    .bind(input.gender.trim())
    .bind(Utc::now())
    .bind(clean_opt(input.address.as_deref()))
    .bind(clean_opt(input.emergency_contact.as_deref()))
    .fetch_one(pool)
    .await?;

    tracing::info!(patient_id = row.id, "patient registered");
    Ok(row)
}

pub async fn get(pool: &SqlitePool, id: i64) -> Result<PatientRow, ClinicError> {
    sqlx::query_as::<_, PatientRow>(&format!(
        "SELECT {PATIENT_COLUMNS} FROM patients WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ClinicError::not_found("patient", id))
}

pub async fn list(pool: &SqlitePool) -> Result<Vec<PatientRow>, ClinicError> {
    let rows = sqlx::query_as::<_, PatientRow>(&format!(
        "SELECT {PATIENT_COLUMNS} FROM patients ORDER BY id ASC"
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Full replacement of the editable fields. registered_at is kept.
pub async fn update(
    pool: &SqlitePool,
    id: i64,
    input: &PatientInput,
) -> Result<PatientRow, ClinicError> {
    input.validate()?;

    sqlx::query_as::<_, PatientRow>(&format!(
        r#"
        UPDATE patients
        SET name = ?1,
            contact = ?2,
            age = ?3,
            gender = ?4,
            address = ?5,
            emergency_contact = ?6
        WHERE id = ?7
        RETURNING {PATIENT_COLUMNS}
        "#
    ))
    .bind(input.name.trim())
    .bind(input.contact.trim())
    .bind(input.age)
    .bind(input.gender.trim())
    .bind(clean_opt(input.address.as_deref()))
    .bind(clean_opt(input.emergency_contact.as_deref()))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ClinicError::not_found("patient", id))
}

/// Hard delete. Appointments and their prescriptions go with it (ON DELETE CASCADE).
pub async fn delete(pool: &SqlitePool, id: i64) -> Result<(), ClinicError> {
    let result = sqlx::query("DELETE FROM patients WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ClinicError::not_found("patient", id));
    }
    tracing::info!(patient_id = id, "patient deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing;
    use crate::ledger;
    use crate::models::PrescribeRequest;

    fn input(name: &str) -> PatientInput {
        PatientInput {
            name: name.to_string(),
            contact: "13800138002".to_string(),
            age: 28,
            gender: "female".to_string(),
            address: Some("  ".to_string()),
            emergency_contact: None,
        }
    }

    #[tokio::test]
    async fn create_update_and_fetch() {
        let pool = testing::pool().await;

        let created = create(&pool, &input("Li Si")).await.unwrap();
        assert_eq!(created.name, "Li Si");
        assert_eq!(created.address, None);

        let mut edit = input("Li Si");
        edit.age = 29;
        edit.address = Some("Haidian".to_string());
        let updated = update(&pool, created.id, &edit).await.unwrap();
        assert_eq!(updated.age, 29);
        assert_eq!(updated.address.as_deref(), Some("Haidian"));
        assert_eq!(updated.registered_at, created.registered_at);

        let fetched = get(&pool, created.id).await.unwrap();
        assert_eq!(fetched.age, 29);
    }

    #[tokio::test]
    async fn unknown_patient_is_not_found() {
        let pool = testing::pool().await;
        assert!(matches!(
            get(&pool, 99).await,
            Err(ClinicError::NotFound { entity: "patient", id: 99 })
        ));
        assert!(matches!(
            update(&pool, 99, &input("Nobody")).await,
            Err(ClinicError::NotFound { .. })
        ));
        assert!(matches!(delete(&pool, 99).await, Err(ClinicError::NotFound { .. })));
    }

    #[tokio::test]
    async fn delete_cascades_to_appointments_and_prescriptions() {
        let pool = testing::pool().await;
        let patient = testing::patient(&pool, "Zhang San").await;
        let other = testing::patient(&pool, "Wang Wu").await;
        let doctor = testing::doctor(&pool, "Dr. Li", "Internal Medicine").await;
        let medicine = testing::medicine(&pool, "Aspirin", 1500, 10).await;
        let appt = testing::appointment(&pool, patient, doctor, "2024-05-01 09:00").await;
        let kept = testing::appointment(&pool, other, doctor, "2024-05-01 10:00").await;

        ledger::prescribe(
            &pool,
            &PrescribeRequest {
                appointment_id: appt,
                medicine_id: medicine,
                quantity: 2,
                dosage: "1 tablet twice daily".to_string(),
                instructions: None,
            },
        )
        .await
        .unwrap();

        delete(&pool, patient).await.unwrap();

        let appointments: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM appointments")
            .fetch_one(&*pool)
            .await
            .unwrap();
        let prescriptions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM prescriptions")
            .fetch_one(&*pool)
            .await
            .unwrap();
        assert_eq!(appointments, 1);
        assert_eq!(prescriptions, 0);
        assert!(crate::store::appointments::get(&pool, kept).await.is_ok());

        // stock is not restored by the cascade
        let stock: i64 = sqlx::query_scalar("SELECT stock FROM medicines WHERE id = ?1")
            .bind(medicine)
            .fetch_one(&*pool)
            .await
            .unwrap();
        assert_eq!(stock, 8);
    }
}
