//! Inventory ledger: the only code that decrements medicine stock.
//!
//! Stock never goes below zero. A prescription and its stock decrement are
//! committed together or not at all, and concurrent prescriptions against
//! the same medicine cannot over-draw it.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::ClinicError;
use crate::models::{MedicineRow, PrescribeRequest, PrescriptionListRow, PrescriptionRow};
use crate::store::medicines::MEDICINE_COLUMNS;

const PRESCRIPTION_COLUMNS: &str =
    "id, appointment_id, medicine_id, dosage, quantity, instructions, created_at";

/// Write a prescription and take its quantity out of stock, atomically.
///
/// The conditional decrement is the first statement of the transaction, so
/// the writer lock is taken before any stock value is looked at and the
/// `stock >= quantity` guard is evaluated against committed state. A caller
/// that loses the race sees `InsufficientStock`, never a negative balance.
pub async fn prescribe(
    pool: &SqlitePool,
    req: &PrescribeRequest,
) -> Result<PrescriptionRow, ClinicError> {
    req.validate()?;

    let mut tx = pool.begin().await?;

    let remaining: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE medicines
        SET stock = stock - ?1
        WHERE id = ?2
          AND stock >= ?1
        RETURNING stock
        "#,
    )
    .bind(req.quantity)
    .bind(req.medicine_id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(remaining) = remaining else {
        let available: Option<i64> = sqlx::query_scalar("SELECT stock FROM medicines WHERE id = ?1")
            .bind(req.medicine_id)
            .fetch_optional(&mut *tx)
            .await?;

        // dropping tx rolls back
        return Err(match available {
            None => ClinicError::not_found("medicine", req.medicine_id),
            Some(available) => {
                tracing::warn!(
                    medicine_id = req.medicine_id,
                    requested = req.quantity,
                    available,
                    "prescription refused: insufficient stock"
                );
                ClinicError::InsufficientStock {
                    medicine_id: req.medicine_id,
                    requested: req.quantity,
                    available,
                }
            }
        });
    };

    let appointment: Option<i64> = sqlx::query_scalar("SELECT id FROM appointments WHERE id = ?1")
        .bind(req.appointment_id)
        .fetch_optional(&mut *tx)
        .await?;
    if appointment.is_none() {
        return Err(ClinicError::not_found("appointment", req.appointment_id));
    }

    let row = sqlx::query_as::<_, PrescriptionRow>(&format!(
        r#"
        INSERT INTO prescriptions (appointment_id, medicine_id, dosage, quantity, instructions, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        RETURNING {PRESCRIPTION_COLUMNS}
        "#
    ))
    .bind(req.appointment_id)
    .bind(req.medicine_id)
    .bind(req.dosage.trim())
    .bind(req.quantity)
    .bind(crate::models::clean_opt(req.instructions.as_deref()))
    .bind(Utc::now())
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(
        prescription_id = row.id,
        medicine_id = row.medicine_id,
        quantity = row.quantity,
        remaining,
        "prescription written"
    );
    Ok(row)
}

/// Administrative stock override. Sets the value as given; past prescriptions
/// are not touched.
pub async fn adjust_stock(
    pool: &SqlitePool,
    medicine_id: i64,
    new_stock: i64,
) -> Result<MedicineRow, ClinicError> {
    if new_stock < 0 {
        return Err(ClinicError::InvalidStock(new_stock));
    }

    let row = sqlx::query_as::<_, MedicineRow>(&format!(
        r#"
        UPDATE medicines
        SET stock = ?1
        WHERE id = ?2
        RETURNING {MEDICINE_COLUMNS}
        "#
    ))
    .bind(new_stock)
    .bind(medicine_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ClinicError::not_found("medicine", medicine_id))?;

    tracing::info!(medicine_id, stock = new_stock, "stock adjusted");
    Ok(row)
}

pub async fn get_prescription(pool: &SqlitePool, id: i64) -> Result<PrescriptionRow, ClinicError> {
    sqlx::query_as::<_, PrescriptionRow>(&format!(
        "SELECT {PRESCRIPTION_COLUMNS} FROM prescriptions WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ClinicError::not_found("prescription", id))
}

const LIST_SELECT: &str = r#"
    SELECT
      rx.id,
      rx.appointment_id,
      rx.medicine_id,
      m.name AS medicine_name,
      p.name AS patient_name,
      rx.dosage,
      rx.quantity,
      rx.instructions,
      rx.created_at
    FROM prescriptions rx
    JOIN medicines m ON m.id = rx.medicine_id
    JOIN appointments a ON a.id = rx.appointment_id
    JOIN patients p ON p.id = a.patient_id
"#;

pub async fn list_prescriptions(pool: &SqlitePool) -> Result<Vec<PrescriptionListRow>, ClinicError> {
    let rows = sqlx::query_as::<_, PrescriptionListRow>(&format!("{LIST_SELECT} ORDER BY rx.id ASC"))
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn list_for_appointment(
    pool: &SqlitePool,
    appointment_id: i64,
) -> Result<Vec<PrescriptionListRow>, ClinicError> {
    let rows = sqlx::query_as::<_, PrescriptionListRow>(&format!(
        "{LIST_SELECT} WHERE rx.appointment_id = ?1 ORDER BY rx.id ASC"
    ))
    .bind(appointment_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
