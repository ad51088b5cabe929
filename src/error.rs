use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use sqlx::error::ErrorKind;

/// Failure of a clinic operation. Every mutation that returns one of these
/// has left the database exactly as it found it.
#[derive(Debug, thiserror::Error)]
pub enum ClinicError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("{0}")]
    InvalidInput(String),

    #[error("quantity must be a positive integer (got {0})")]
    InvalidQuantity(i64),

    #[error("stock cannot be negative (got {0})")]
    InvalidStock(i64),

    #[error("insufficient stock for medicine {medicine_id}: requested {requested}, available {available}")]
    InsufficientStock {
        medicine_id: i64,
        requested: i64,
        available: i64,
    },

    #[error("{0}")]
    IntegrityConflict(String),

    #[error("username or password is incorrect")]
    InvalidCredentials,

    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl ClinicError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        ClinicError::NotFound { entity, id }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        ClinicError::InvalidInput(message.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            ClinicError::NotFound { .. } => "NOT_FOUND",
            ClinicError::InvalidInput(_) => "VALIDATION_ERROR",
            ClinicError::InvalidQuantity(_) => "INVALID_QUANTITY",
            ClinicError::InvalidStock(_) => "INVALID_STOCK",
            ClinicError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            ClinicError::IntegrityConflict(_) => "INTEGRITY_CONFLICT",
            ClinicError::InvalidCredentials => "INVALID_CREDENTIALS",
            ClinicError::Database(_) => "INTERNAL",
        }
    }
}

// SQLite primary result codes for a contended database.
const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

impl From<sqlx::Error> for ClinicError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            match db.kind() {
                ErrorKind::UniqueViolation
                | ErrorKind::ForeignKeyViolation
                | ErrorKind::CheckViolation
                | ErrorKind::NotNullViolation => {
                    return ClinicError::IntegrityConflict(db.message().to_string());
                }
                _ => {}
            }
            // extended codes carry the primary code in the low byte
            let primary = db
                .code()
                .and_then(|c| c.parse::<i32>().ok())
                .map(|c| c & 0xff);
            if matches!(primary, Some(SQLITE_BUSY) | Some(SQLITE_LOCKED)) {
                return ClinicError::IntegrityConflict(format!(
                    "concurrent write conflict, retry the request: {}",
                    db.message()
                ));
            }
        }
        ClinicError::Database(e)
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub code: String,
    pub message: String,
}

#[derive(Debug)]
pub enum ApiError {
    Unauthorized(&'static str, String),
    BadRequest(&'static str, String),
    NotFound(&'static str, String),
    Conflict(&'static str, String),
    Internal(String),
}

impl ApiError {
    fn to_error_response(code: &str, message: &str) -> Json<ErrorResponse> {
        Json(ErrorResponse {
            success: false,
            code: code.to_string(),
            message: message.to_string(),
        })
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(..) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(..) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(..) => StatusCode::NOT_FOUND,
            ApiError::Conflict(..) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ClinicError> for ApiError {
    fn from(e: ClinicError) -> Self {
        let code = e.code();
        match e {
            ClinicError::NotFound { .. } => ApiError::NotFound(code, e.to_string()),
            ClinicError::InvalidInput(_)
            | ClinicError::InvalidQuantity(_)
            | ClinicError::InvalidStock(_) => ApiError::BadRequest(code, e.to_string()),
            ClinicError::InsufficientStock { .. } | ClinicError::IntegrityConflict(_) => {
                ApiError::Conflict(code, e.to_string())
            }
            ClinicError::InvalidCredentials => ApiError::Unauthorized(code, e.to_string()),
            ClinicError::Database(err) => {
                tracing::error!(error = %err, "database failure");
                ApiError::Internal(format!("db error: {err}"))
            }
        }
    }
}

// Malformed bodies, paths and query strings answer with the same envelope
// as validation failures.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest("VALIDATION_ERROR", rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest("VALIDATION_ERROR", rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest("VALIDATION_ERROR", rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::Unauthorized(code, msg)
            | ApiError::BadRequest(code, msg)
            | ApiError::NotFound(code, msg)
            | ApiError::Conflict(code, msg) => {
                (status, ApiError::to_error_response(code, &msg)).into_response()
            }
            ApiError::Internal(msg) => {
                (status, ApiError::to_error_response("INTERNAL", &msg)).into_response()
            }
        }
    }
}
