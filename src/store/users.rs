use chrono::Utc;
use sqlx::SqlitePool;

use crate::auth::{hash_password, verify_password};
use crate::config::BootstrapAdmin;
use crate::error::ClinicError;
use crate::models::{NewUserRequest, UserProfile, UserRole, UserRow};

const USER_COLUMNS: &str = "id, username, email, password_hash, role, created_at";

pub async fn create(pool: &SqlitePool, req: &NewUserRequest) -> Result<UserProfile, ClinicError> {
    req.validate()?;
    let password_hash = hash_password(&req.password)?;

    let row = sqlx::query_as::<_, UserRow>(&format!(
        r#"
        INSERT INTO users (username, email, password_hash, role, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(req.username.trim())
    .bind(req.email.trim())
    .bind(password_hash)
    .bind(req.role.unwrap_or(UserRole::Staff))
    .bind(Utc::now())
    .fetch_one(pool)
    .await
    .map_err(|e| match ClinicError::from(e) {
        ClinicError::IntegrityConflict(_) => {
            ClinicError::IntegrityConflict("username or email already exists".into())
        }
        other => other,
    })?;

    tracing::info!(user_id = row.id, username = %row.username, "user created");
    Ok(row.into())
}

pub async fn list(pool: &SqlitePool) -> Result<Vec<UserProfile>, ClinicError> {
    let rows = sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id ASC"))
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(UserProfile::from).collect())
}

pub async fn delete(pool: &SqlitePool, id: i64) -> Result<(), ClinicError> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ClinicError::not_found("user", id));
    }
    Ok(())
}

/// Check a username/password pair. Unknown users and wrong passwords are
/// indistinguishable to the caller.
pub async fn verify_credentials(
    pool: &SqlitePool,
    username: &str,
    password: &str,
) -> Result<UserProfile, ClinicError> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE username = ?1"
    ))
    .bind(username.trim())
    .fetch_optional(pool)
    .await?
    .ok_or(ClinicError::InvalidCredentials)?;

    if !verify_password(password, &row.password_hash) {
        return Err(ClinicError::InvalidCredentials);
    }
    Ok(row.into())
}

/// Create the configured admin account unless the username is already taken.
pub async fn ensure_admin(pool: &SqlitePool, admin: &BootstrapAdmin) -> Result<(), ClinicError> {
    let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE username = ?1")
        .bind(&admin.username)
        .fetch_optional(pool)
        .await?;
    if existing.is_some() {
        return Ok(());
    }

    create(
        pool,
        &NewUserRequest {
            username: admin.username.clone(),
            email: admin.email.clone(),
            password: admin.password.clone(),
            role: Some(UserRole::Admin),
        },
    )
    .await?;
    tracing::info!(username = %admin.username, "bootstrap admin user created");
    Ok(())
}
