use axum::extract::{Extension, Path, State};
use axum::Json;
use uuid::Uuid;

use crate::api::models::{
    CreateVotingRequest, TokenResponse, VotingResponse, VotingSummaryResponse,
};
use crate::api::{AppState, Identity};
use crate::db::schema::AccessScope;
use crate::db::votings;
use crate::error::AppResult;

pub async fn create_voting(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(body): Json<CreateVotingRequest>,
) -> AppResult<Json<VotingResponse>> {
    let voting = votings::create(
        state.db_client.conn(),
        &identity.user,
        &body.title,
        &body.options,
    )
    .await?;

    Ok(Json(voting.into()))
}

pub async fn get_voting(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<VotingResponse>> {
    let voting = votings::from_uuid(
        state.db_client.conn(),
        id,
        AccessScope::OwnedBy(identity.user.id),
    )
    .await?;

    Ok(Json(voting.into()))
}

pub async fn delete_voting(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<bool>> {
    let conn = state.db_client.conn();

    let voting = votings::from_uuid(conn, id, AccessScope::OwnedBy(identity.user.id)).await?;
    votings::remove(conn, &voting).await?;

    Ok(Json(true))
}

pub async fn list_votings(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> AppResult<Json<Vec<VotingSummaryResponse>>> {
    let result = votings::owned_by(state.db_client.conn(), identity.user.id)
        .await?
        .into_iter()
        .map(|v| VotingSummaryResponse {
            id: v.id,
            title: v.title,
        })
        .collect();

    Ok(Json(result))
}

pub async fn issue_ballot(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<TokenResponse>> {
    let conn = state.db_client.conn();

    // Minting is owner-only; the scoped fetch is the gate.
    let voting = votings::from_uuid(conn, id, AccessScope::OwnedBy(identity.user.id)).await?;
    let ballot = votings::issue_ballot(conn, &voting).await?;

    Ok(Json(TokenResponse { token: ballot.token }))
}
