use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::ClinicError;

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::SqlitePool,
}

/* -------------------------
   Response envelopes
--------------------------*/

#[derive(Debug, Serialize)]
pub struct ApiOk<T> {
    pub data: T,
}

/// Reply to a mutation: `{success, message}` plus the affected record when there is one.
#[derive(Debug, Serialize)]
pub struct ActionResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ActionResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}

impl ActionResponse<()> {
    pub fn done(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }
}

/* -------------------------
   Enums
--------------------------*/

/// Appointment status. Any status may be set from any other; there is no
/// transition table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum AppointmentStatus {
    #[default]
    Scheduled,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Doctor,
    Staff,
}

/* -------------------------
   DB Row Models
--------------------------*/

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PatientRow {
    pub id: i64,
    pub name: String,
    pub contact: String,
    pub age: i64,
    pub gender: String,
    pub registered_at: DateTime<Utc>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DoctorRow {
    pub id: i64,
    pub name: String,
    pub department: String,
    pub title: String,
    pub available: bool,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub specialization: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AppointmentRow {
    pub id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    #[serde(serialize_with = "serialize_minutes")]
    pub scheduled_at: NaiveDateTime,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MedicineRow {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub stock: i64,
    pub category: String,
    pub manufacturer: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PrescriptionRow {
    pub id: i64,
    pub appointment_id: i64,
    pub medicine_id: i64,
    pub dosage: String,
    pub quantity: i64,
    pub instructions: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Prescription joined with the names a listing screen shows.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PrescriptionListRow {
    pub id: i64,
    pub appointment_id: i64,
    pub medicine_id: i64,
    pub medicine_name: String,
    pub patient_name: String,
    pub dosage: String,
    pub quantity: i64,
    pub instructions: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl From<UserRow> for UserProfile {
    fn from(u: UserRow) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            role: u.role,
            created_at: u.created_at,
        }
    }
}

/* -------------------------
   Input DTOs
--------------------------*/

#[derive(Debug, Clone, Deserialize)]
pub struct PatientInput {
    pub name: String,
    pub contact: String,
    pub age: i64,
    pub gender: String,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
}

impl PatientInput {
    pub fn validate(&self) -> Result<(), ClinicError> {
        require("name", &self.name)?;
        require("contact", &self.contact)?;
        require("gender", &self.gender)?;
        if !(0..=150).contains(&self.age) {
            return Err(ClinicError::invalid("age must be between 0 and 150"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DoctorInput {
    pub name: String,
    pub department: String,
    pub title: String,
    pub available: Option<bool>, // default true
    pub phone: Option<String>,
    pub email: Option<String>,
    pub specialization: Option<String>,
}

impl DoctorInput {
    pub fn validate(&self) -> Result<(), ClinicError> {
        require("name", &self.name)?;
        require("department", &self.department)?;
        require("title", &self.title)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MedicineInput {
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub stock: i64,
    pub category: String,
    pub manufacturer: Option<String>,
    pub expiry_date: Option<NaiveDate>,
}

impl MedicineInput {
    pub fn validate(&self) -> Result<(), ClinicError> {
        require("name", &self.name)?;
        require("category", &self.category)?;
        if self.price_cents < 0 {
            return Err(ClinicError::invalid("price_cents cannot be negative"));
        }
        if self.stock < 0 {
            return Err(ClinicError::InvalidStock(self.stock));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppointmentInput {
    pub patient_id: i64,
    pub doctor_id: i64,
    #[serde(deserialize_with = "deserialize_minutes")]
    pub scheduled_at: NaiveDateTime,
    pub status: Option<AppointmentStatus>, // default scheduled
    pub notes: Option<String>,
}

/// Edit of an existing appointment. Patient and doctor stay fixed.
#[derive(Debug, Clone, Deserialize)]
pub struct AppointmentUpdate {
    #[serde(deserialize_with = "deserialize_minutes")]
    pub scheduled_at: NaiveDateTime,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusUpdate {
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrescribeRequest {
    pub appointment_id: i64,
    pub medicine_id: i64,
    pub quantity: i64,
    #[serde(default)]
    pub dosage: String,
    pub instructions: Option<String>,
}

impl PrescribeRequest {
    pub fn validate(&self) -> Result<(), ClinicError> {
        if self.quantity <= 0 {
            return Err(ClinicError::InvalidQuantity(self.quantity));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StockAdjustment {
    pub stock: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Option<UserRole>, // default staff
}

impl NewUserRequest {
    pub fn validate(&self) -> Result<(), ClinicError> {
        require("username", &self.username)?;
        require("email", &self.email)?;
        if !self.email.contains('@') {
            return Err(ClinicError::invalid("email must contain '@'"));
        }
        if self.password.len() < 8 {
            return Err(ClinicError::invalid("password must be at least 8 characters"));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

/* -------------------------
   Helpers
--------------------------*/

fn require(field: &str, value: &str) -> Result<(), ClinicError> {
    if value.trim().is_empty() {
        Err(ClinicError::invalid(format!("{field} is required")))
    } else {
        Ok(())
    }
}

/// Trim and turn blank optional text into `None`.
pub fn clean_opt(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub const MINUTE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Accepts `YYYY-MM-DD HH:MM` (what the booking form sends) or ISO `YYYY-MM-DDTHH:MM:SS`.
pub fn parse_minutes(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, MINUTE_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
        .ok()
}

fn deserialize_minutes<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_minutes(&raw).ok_or_else(|| {
        serde::de::Error::custom(format!("invalid date-time '{raw}', expected YYYY-MM-DD HH:MM"))
    })
}

pub fn serialize_minutes<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&value.format(MINUTE_FORMAT).to_string())
}
