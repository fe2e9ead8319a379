use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::RngCore;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::db::schema::{AccessToken, User};
use crate::error::{AppError, AppResult};

const ACCESS_TOKEN_BYTES: usize = 64;

fn map_user(r: &PgRow) -> User {
    User {
        id: r.get("id"),
        username: r.get("username"),
        password_hash: r.get("password"),
    }
}

pub async fn register(conn: &PgPool, username: &str, password: &str) -> AppResult<User> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("password hashing failed: {}", e)))?
        .to_string();

    let r = sqlx::query(
        "INSERT INTO users (id, username, password)
         VALUES ($1, $2, $3)
         RETURNING id, username, password",
    )
    .bind(Uuid::new_v4())
    .bind(username)
    .bind(&hash)
    .fetch_one(conn)
    .await;

    match r {
        Ok(row) => Ok(map_user(&row)),
        Err(sqlx::Error::Database(e)) if e.constraint() == Some("users_username_key") => {
            Err(AppError::Conflict("Username is taken".to_owned()))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn login(conn: &PgPool, username: &str, password: &str) -> AppResult<User> {
    let row = sqlx::query("SELECT id, username, password FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(conn)
        .await?;

    // An unknown username and a wrong password collapse into the same error
    // so usernames cannot be enumerated through this endpoint.
    let user = match row {
        None => return Err(AppError::InvalidCredentials),
        Some(r) => map_user(&r),
    };

    let parsed = PasswordHash::new(&user.password_hash)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("stored password hash is malformed: {}", e)))?;

    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_err()
    {
        return Err(AppError::InvalidCredentials);
    }

    Ok(user)
}

pub async fn from_uuid(conn: &PgPool, id: Uuid) -> AppResult<User> {
    let row = sqlx::query("SELECT id, username, password FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(conn)
        .await?;

    match row {
        None => Err(AppError::NotFound("user")),
        Some(r) => Ok(map_user(&r)),
    }
}

pub async fn from_token(conn: &PgPool, token: &str) -> AppResult<User> {
    let row = sqlx::query(
        "SELECT id, username, password
         FROM users JOIN access_tokens ON id = user_id
         WHERE token = $1",
    )
    .bind(token)
    .fetch_optional(conn)
    .await?;

    let user = match row {
        None => return Err(AppError::Unauthenticated),
        Some(r) => map_user(&r),
    };

    // Best-effort bookkeeping; a failed timestamp update must not fail the
    // caller's request.
    let touched = sqlx::query("UPDATE access_tokens SET last_used = NOW() WHERE token = $1")
        .bind(token)
        .execute(conn)
        .await;

    if let Err(e) = touched {
        tracing::warn!(username = %user.username, error = %e, "Failed to update access token timestamp.");
    }

    Ok(user)
}

pub async fn issue_token(conn: &PgPool, user: &User) -> AppResult<AccessToken> {
    let mut bytes = [0u8; ACCESS_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    let token = STANDARD.encode(bytes);

    // The token is the primary key; a collision is a fatal storage error and
    // surfaces as such.
    let row = sqlx::query(
        "INSERT INTO access_tokens (user_id, token)
         VALUES ($1, $2)
         RETURNING token, user_id, last_used",
    )
    .bind(user.id)
    .bind(&token)
    .fetch_one(conn)
    .await?;

    Ok(AccessToken {
        token: row.get("token"),
        user_id: row.get("user_id"),
        last_used: row.get("last_used"),
    })
}

pub async fn logout(conn: &PgPool, user: &User, token: Option<&str>) -> AppResult<()> {
    match token {
        Some(t) => {
            sqlx::query("DELETE FROM access_tokens WHERE user_id = $1 AND token = $2")
                .bind(user.id)
                .bind(t)
                .execute(conn)
                .await?;
        }
        None => {
            sqlx::query("DELETE FROM access_tokens WHERE user_id = $1")
                .bind(user.id)
                .execute(conn)
                .await?;
        }
    }

    Ok(())
}
