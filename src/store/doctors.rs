use sqlx::SqlitePool;

use crate::error::ClinicError;
use crate::models::{clean_opt, DoctorInput, DoctorRow};

const DOCTOR_COLUMNS: &str = "id, name, department, title, available, phone, email, specialization";

pub async fn create(pool: &SqlitePool, input: &DoctorInput) -> Result<DoctorRow, ClinicError> {
    input.validate()?;

    let row = sqlx::query_as::<_, DoctorRow>(&format!(
        r#"
        INSERT INTO doctors (name, department, title, available, phone, email, specialization)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        RETURNING {DOCTOR_COLUMNS}
        "#
    ))
    .bind(input.name.trim())
    .bind(input.department.trim())
    .bind(input.title.trim())
    .bind(input.available.unwrap_or(true))
    .bind(clean_opt(input.phone.as_deref()))
    .bind(clean_opt(input.email.as_deref()))
    .bind(clean_opt(input.specialization.as_deref()))
    .fetch_one(pool)
    .await?;

    tracing::info!(doctor_id = row.id, department = %row.department, "doctor added");
    Ok(row)
}

pub async fn get(pool: &SqlitePool, id: i64) -> Result<DoctorRow, ClinicError> {
    sqlx::query_as::<_, DoctorRow>(&format!("SELECT {DOCTOR_COLUMNS} FROM doctors WHERE id = ?1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ClinicError::not_found("doctor", id))
}

pub async fn list(pool: &SqlitePool) -> Result<Vec<DoctorRow>, ClinicError> {
    let rows =
        sqlx::query_as::<_, DoctorRow>(&format!("SELECT {DOCTOR_COLUMNS} FROM doctors ORDER BY id ASC"))
            .fetch_all(pool)
            .await?;
    Ok(rows)
}

pub async fn update(
    pool: &SqlitePool,
    id: i64,
    input: &DoctorInput,
) -> Result<DoctorRow, ClinicError> {
    input.validate()?;

    sqlx::query_as::<_, DoctorRow>(&format!(
        r#"
        UPDATE doctors
        SET name = ?1,
            department = ?2,
            title = ?3,
            available = COALESCE(?4, available),
            phone = ?5,
            email = ?6,
            specialization = ?7
        WHERE id = ?8
        RETURNING {DOCTOR_COLUMNS}
        "#
    ))
    .bind(input.name.trim())
    .bind(input.department.trim())
    .bind(input.title.trim())
    .bind(input.available)
    .bind(clean_opt(input.phone.as_deref()))
    .bind(clean_opt(input.email.as_deref()))
    .bind(clean_opt(input.specialization.as_deref()))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ClinicError::not_found("doctor", id))
}

/// Flip the availability flag and return the new state.
pub async fn toggle_availability(pool: &SqlitePool, id: i64) -> Result<DoctorRow, ClinicError> {
    sqlx::query_as::<_, DoctorRow>(&format!(
        r#"
        UPDATE doctors
        SET available = NOT available
        WHERE id = ?1
        RETURNING {DOCTOR_COLUMNS}
        "#
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ClinicError::not_found("doctor", id))
}

/// Hard delete. The doctor's appointments and their prescriptions cascade.
pub async fn delete(pool: &SqlitePool, id: i64) -> Result<(), ClinicError> {
    let result = sqlx::query("DELETE FROM doctors WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ClinicError::not_found("doctor", id));
    }
    tracing::info!(doctor_id = id, "doctor deleted");
    Ok(())
}
