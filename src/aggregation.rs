//! Read-only statistics for the dashboard and the report exports.
//!
//! Every function here is a single SELECT against the pool, so each result
//! comes from one consistent snapshot and never holds the writer lock.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

use crate::error::ClinicError;
use crate::models::{serialize_minutes, AppointmentStatus, DoctorRow, MedicineRow};
use crate::store::medicines::MEDICINE_COLUMNS;

/// Departments shown on the distribution chart when nothing has been booked yet.
pub const DEFAULT_DEPARTMENTS: [&str; 6] = [
    "Internal Medicine",
    "Surgery",
    "Pediatrics",
    "Gynecology",
    "Ophthalmology",
    "Stomatology",
];

/// Bars shown on the top-medicines chart when the formulary is empty.
pub const PLACEHOLDER_MEDICINES: [&str; 5] = [
    "Aspirin",
    "Ibuprofen",
    "Cold Relief Granules",
    "Isatis Root Granules",
    "Vitamin C Tablets",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct DepartmentCount {
    pub department: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct MedicineUsage {
    pub name: String,
    pub total_quantity: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MedicineSales {
    pub medicine_id: i64,
    pub name: String,
    pub category: String,
    pub price_cents: i64,
    pub stock: i64,
    pub total_sold: i64,
    pub revenue_cents: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AppointmentSummaryRow {
    pub id: i64,
    pub patient_name: String,
    pub doctor_name: String,
    pub department: String,
    #[serde(serialize_with = "serialize_minutes")]
    pub scheduled_at: NaiveDateTime,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PatientSummaryRow {
    pub id: i64,
    pub name: String,
    pub age: i64,
    pub gender: String,
    pub registered_at: DateTime<Utc>,
    pub appointment_count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardCounts {
    pub total_patients: i64,
    pub total_doctors: i64,
    pub total_medicines: i64,
    pub today_appointments: i64,
}

#[derive(Debug, Clone, Default)]
pub struct AppointmentFilter {
    pub patient_name_contains: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default)]
pub struct DoctorFilter {
    pub name_contains: Option<String>,
    pub department: Option<String>,
    pub has_appointment_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default)]
pub struct MedicineFilter {
    pub category: Option<String>,
    pub min_stock: Option<i64>,
}

fn day_start(d: NaiveDate) -> NaiveDateTime {
    d.and_time(NaiveTime::MIN)
}

fn non_blank(s: &Option<String>) -> Option<&str> {
    s.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Appointment counts per department of the attending doctor.
pub async fn department_distribution(pool: &SqlitePool) -> Result<Vec<DepartmentCount>, ClinicError> {
    let rows = sqlx::query_as::<_, DepartmentCount>(
        r#"
        SELECT d.department AS department, COUNT(a.id) AS count
        FROM doctors d
        JOIN appointments a ON a.doctor_id = d.id
        GROUP BY d.department
        ORDER BY d.department ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    if rows.is_empty() {
        return Ok(DEFAULT_DEPARTMENTS
            .iter()
            .map(|d| DepartmentCount {
                department: d.to_string(),
                count: 0,
            })
            .collect());
    }
    Ok(rows)
}

/// Most-prescribed medicines. Medicines never prescribed are ranked with zero.
pub async fn medicine_top_n(pool: &SqlitePool, n: i64) -> Result<Vec<MedicineUsage>, ClinicError> {
    if n < 1 {
        return Err(ClinicError::invalid("n must be at least 1"));
    }

    let rows = sqlx::query_as::<_, MedicineUsage>(
        r#"
        SELECT m.name AS name, COALESCE(SUM(rx.quantity), 0) AS total_quantity
        FROM medicines m
        LEFT JOIN prescriptions rx ON rx.medicine_id = m.id
        GROUP BY m.id, m.name
        ORDER BY total_quantity DESC, m.id ASC
        LIMIT ?1
        "#,
    )
    .bind(n)
    .fetch_all(pool)
    .await?;

    if rows.is_empty() {
        return Ok(PLACEHOLDER_MEDICINES
            .iter()
            .take(n as usize)
            .map(|name| MedicineUsage {
                name: name.to_string(),
                total_quantity: 0,
            })
            .collect());
    }
    Ok(rows)
}

/// Units sold and revenue per medicine. Revenue is priced at today's unit
/// price, not the price on the day of each prescription.
pub async fn medicine_sales_summary(pool: &SqlitePool) -> Result<Vec<MedicineSales>, ClinicError> {
    let rows = sqlx::query_as::<_, MedicineSales>(
        r#"
        SELECT
          m.id AS medicine_id,
          m.name,
          m.category,
          m.price_cents,
          m.stock,
          COALESCE(SUM(rx.quantity), 0) AS total_sold,
          COALESCE(SUM(rx.quantity), 0) * m.price_cents AS revenue_cents
        FROM medicines m
        LEFT JOIN prescriptions rx ON rx.medicine_id = m.id
        GROUP BY m.id, m.name, m.category, m.price_cents, m.stock
        ORDER BY m.id ASC
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Appointment listing with participant names. Date bounds are whole days,
/// both inclusive.
pub async fn appointment_summary(
    pool: &SqlitePool,
    filter: &AppointmentFilter,
) -> Result<Vec<AppointmentSummaryRow>, ClinicError> {
    if let (Some(from), Some(to)) = (filter.from, filter.to) {
        if from > to {
            return Err(ClinicError::invalid("start date must not be after end date"));
        }
    }

    let name = non_blank(&filter.patient_name_contains).map(str::to_lowercase);
    let from = filter.from.map(day_start);
    let until = filter.to.map(|d| day_start(d) + Duration::days(1));

    let rows = sqlx::query_as::<_, AppointmentSummaryRow>(
        r#"
        SELECT
          a.id,
          p.name AS patient_name,
          d.name AS doctor_name,
          d.department,
          a.scheduled_at,
          a.status,
          a.notes
        FROM appointments a
        JOIN patients p ON p.id = a.patient_id
        JOIN doctors d ON d.id = a.doctor_id
        WHERE (?1 IS NULL OR instr(lower(p.name), ?1) > 0)
          AND (?2 IS NULL OR a.scheduled_at >= ?2)
          AND (?3 IS NULL OR a.scheduled_at < ?3)
        ORDER BY a.scheduled_at ASC, a.id ASC
        "#,
    )
    .bind(name)
    .bind(from)
    .bind(until)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Every patient with their number of appointments, zero included.
pub async fn patient_summary(pool: &SqlitePool) -> Result<Vec<PatientSummaryRow>, ClinicError> {
    let rows = sqlx::query_as::<_, PatientSummaryRow>(
        r#"
        SELECT
          p.id,
          p.name,
          p.age,
          p.gender,
          p.registered_at,
          COUNT(a.id) AS appointment_count
        FROM patients p
        LEFT JOIN appointments a ON a.patient_id = p.id
        GROUP BY p.id, p.name, p.age, p.gender, p.registered_at
        ORDER BY p.id ASC
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn dashboard_counts(pool: &SqlitePool, today: NaiveDate) -> Result<DashboardCounts, ClinicError> {
    let (total_patients, total_doctors, total_medicines, today_appointments): (i64, i64, i64, i64) =
        sqlx::query_as(
            r#"
            SELECT
              (SELECT COUNT(*) FROM patients),
              (SELECT COUNT(*) FROM doctors),
              (SELECT COUNT(*) FROM medicines),
              (SELECT COUNT(*) FROM appointments WHERE scheduled_at >= ?1 AND scheduled_at < ?2)
            "#,
        )
        .bind(day_start(today))
        .bind(day_start(today) + Duration::days(1))
        .fetch_one(pool)
        .await?;

    Ok(DashboardCounts {
        total_patients,
        total_doctors,
        total_medicines,
        today_appointments,
    })
}

pub async fn search_doctors(pool: &SqlitePool, filter: &DoctorFilter) -> Result<Vec<DoctorRow>, ClinicError> {
    let name = non_blank(&filter.name_contains).map(str::to_lowercase);
    let department = non_blank(&filter.department);
    let from = filter.has_appointment_on.map(day_start);
    let until = filter.has_appointment_on.map(|d| day_start(d) + Duration::days(1));

    let rows = sqlx::query_as::<_, DoctorRow>(
        r#"
        SELECT d.id, d.name, d.department, d.title, d.available, d.phone, d.email, d.specialization
        FROM doctors d
        WHERE (?1 IS NULL OR instr(lower(d.name), ?1) > 0)
          AND (?2 IS NULL OR d.department = ?2)
          AND (?3 IS NULL OR EXISTS (
                SELECT 1 FROM appointments a
                WHERE a.doctor_id = d.id
                  AND a.scheduled_at >= ?3
                  AND a.scheduled_at < ?4
              ))
        ORDER BY d.id ASC
        "#,
    )
    .bind(name)
    .bind(department)
    .bind(from)
    .bind(until)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn search_medicines(
    pool: &SqlitePool,
    filter: &MedicineFilter,
) -> Result<Vec<MedicineRow>, ClinicError> {
    let category = non_blank(&filter.category);

    let rows = sqlx::query_as::<_, MedicineRow>(&format!(
        r#"
        SELECT {MEDICINE_COLUMNS}
        FROM medicines
        WHERE (?1 IS NULL OR category = ?1)
          AND (?2 IS NULL OR stock >= ?2)
        ORDER BY id ASC
        "#
    ))
    .bind(category)
    .bind(filter.min_stock)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
