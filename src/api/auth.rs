use axum::extract::{Extension, State};
use axum::Json;

use crate::api::models::{CredentialsRequest, TokenResponse, UserResponse};
use crate::api::{AppState, Identity};
use crate::db::users;
use crate::error::AppResult;

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<CredentialsRequest>,
) -> AppResult<Json<UserResponse>> {
    let user = users::register(state.db_client.conn(), &body.username, &body.password).await?;

    tracing::info!(username = %user.username, "User registered.");

    Ok(Json(UserResponse {
        id: user.id,
        username: user.username,
    }))
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<CredentialsRequest>,
) -> AppResult<Json<TokenResponse>> {
    let conn = state.db_client.conn();

    let user = users::login(conn, &body.username, &body.password).await?;
    let token = users::issue_token(conn, &user).await?;

    tracing::info!(username = %user.username, "User logged in.");

    Ok(Json(TokenResponse { token: token.token }))
}

/// Revokes exactly the token the request was authenticated with; other
/// sessions of the same user stay valid.
pub async fn logout(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> AppResult<Json<bool>> {
    users::logout(state.db_client.conn(), &identity.user, Some(&identity.token)).await?;

    Ok(Json(true))
}
