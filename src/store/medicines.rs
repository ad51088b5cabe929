use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::ClinicError;
use crate::models::{clean_opt, MedicineInput, MedicineRow};

pub(crate) const MEDICINE_COLUMNS: &str =
    "id, name, description, price_cents, stock, category, manufacturer, expiry_date, created_at";

pub async fn create(pool: &SqlitePool, input: &MedicineInput) -> Result<MedicineRow, ClinicError> {
    input.validate()?;

    let row = sqlx::query_as::<_, MedicineRow>(&format!(
        r#"
        INSERT INTO medicines (name, description, price_cents, stock, category, manufacturer, expiry_date, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        RETURNING {MEDICINE_COLUMNS}
        "#
    ))
    .bind(input.name.trim())
    .bind(clean_opt(input.description.as_deref()))
    .bind(input.price_cents)
    .bind(input.stock)
    .bind(input.category.trim())
    .bind(clean_opt(input.manufacturer.as_deref()))
    .bind(input.expiry_date)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    tracing::info!(medicine_id = row.id, stock = row.stock, "medicine added");
    Ok(row)
}

pub async fn get(pool: &SqlitePool, id: i64) -> Result<MedicineRow, ClinicError> {
    sqlx::query_as::<_, MedicineRow>(&format!(
        "SELECT {MEDICINE_COLUMNS} FROM medicines WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ClinicError::not_found("medicine", id))
}

pub async fn list(pool: &SqlitePool) -> Result<Vec<MedicineRow>, ClinicError> {
    let rows = sqlx::query_as::<_, MedicineRow>(&format!(
        "SELECT {MEDICINE_COLUMNS} FROM medicines ORDER BY id ASC"
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Edit form save. Stock is part of the form and is set as given (never below zero);
/// a blank expiry date keeps the stored one.
pub async fn update(
    pool: &SqlitePool,
    id: i64,
    input: &MedicineInput,
) -> Result<MedicineRow, ClinicError> {
    input.validate()?;

    sqlx::query_as::<_, MedicineRow>(&format!(
        r#"
        UPDATE medicines
        SET name = ?1,
            description = ?2,
            price_cents = ?3,
            stock = ?4,
            category = ?5,
            manufacturer = ?6,
            expiry_date = COALESCE(?7, expiry_date)
        WHERE id = ?8
        RETURNING {MEDICINE_COLUMNS}
        "#
    ))
    .bind(input.name.trim())
    .bind(clean_opt(input.description.as_deref()))
    .bind(input.price_cents)
    .bind(input.stock)
    .bind(input.category.trim())
    .bind(clean_opt(input.manufacturer.as_deref()))
    .bind(input.expiry_date)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ClinicError::not_found("medicine", id))
}

/// Hard delete. Refused while any prescription still references the medicine;
/// prescriptions are owned by appointments, not by the medicine.
pub async fn delete(pool: &SqlitePool, id: i64) -> Result<(), ClinicError> {
    let mut tx = pool.begin().await?;

    let references: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM prescriptions WHERE medicine_id = ?1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

    if references > 0 {
        return Err(ClinicError::IntegrityConflict(format!(
            "medicine {id} is referenced by {references} prescription(s) and cannot be deleted"
        )));
    }

    let result = sqlx::query("DELETE FROM medicines WHERE id = ?1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ClinicError::not_found("medicine", id));
    }

    tx.commit().await?;
    tracing::info!(medicine_id = id, "medicine deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing;
    use crate::ledger;
    use crate::models::PrescribeRequest;

    fn input(stock: i64) -> MedicineInput {
        MedicineInput {
            name: "Vitamin C Tablets".into(),
            description: Some("100 tablets".into()),
            price_cents: 850,
            stock,
            category: "OTC".into(),
            manufacturer: Some("North Pharma".into()),
            expiry_date: chrono::NaiveDate::from_ymd_opt(2027, 1, 31),
        }
    }

    #[tokio::test]
    async fn create_rejects_negative_stock() {
        let pool = testing::pool().await;
        assert!(matches!(
            create(&pool, &input(-1)).await,
            Err(ClinicError::InvalidStock(-1))
        ));
        assert!(list(&pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_keeps_expiry_when_blank() {
        let pool = testing::pool().await;
        let created = create(&pool, &input(40)).await.unwrap();

        let mut edit = input(35);
        edit.expiry_date = None;
        edit.price_cents = 900;
        let updated = update(&pool, created.id, &edit).await.unwrap();
        assert_eq!(updated.stock, 35);
        assert_eq!(updated.price_cents, 900);
        assert_eq!(updated.expiry_date, created.expiry_date);
    }

    #[tokio::test]
    async fn delete_refuses_referenced_medicine_and_keeps_prescription() {
        let pool = testing::pool().await;
        let patient = testing::patient(&pool, "Sun Qi").await;
        let doctor = testing::doctor(&pool, "Dr. Li", "Internal Medicine").await;
        let appt = testing::appointment(&pool, patient, doctor, "2024-07-01 14:00").await;
        let referenced = testing::medicine(&pool, "Aspirin", 1500, 10).await;
        let unused = testing::medicine(&pool, "Isatis Root Granules", 1200, 10).await;

        let prescription = ledger::prescribe(
            &pool,
            &PrescribeRequest {
                appointment_id: appt,
                medicine_id: referenced,
                quantity: 1,
                dosage: "100mg".into(),
                instructions: None,
            },
        )
        .await
        .unwrap();

        assert!(matches!(
            delete(&pool, referenced).await,
            Err(ClinicError::IntegrityConflict(_))
        ));
        assert!(get(&pool, referenced).await.is_ok());
        assert!(ledger::get_prescription(&pool, prescription.id).await.is_ok());

        delete(&pool, unused).await.unwrap();
        assert!(matches!(
            delete(&pool, unused).await,
            Err(ClinicError::NotFound { entity: "medicine", .. })
        ));
    }
}
