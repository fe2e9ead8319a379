//! Anonymous voter endpoints: everything here is reachable without a login,
//! authorized solely by a (voting id, ballot token) pair.

use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use crate::api::models::{BallotViewResponse, CastVoteRequest};
use crate::api::AppState;
use crate::db::schema::AccessScope;
use crate::db::votings;
use crate::error::AppResult;

pub async fn voting_by_ballot(
    State(state): State<AppState>,
    Path((voteid, token)): Path<(Uuid, String)>,
) -> AppResult<Json<BallotViewResponse>> {
    let conn = state.db_client.conn();

    let voting = votings::from_uuid(conn, voteid, AccessScope::Public).await?;
    votings::check_ballot(conn, &voting, &token).await?;

    Ok(Json(BallotViewResponse {
        title: voting.title,
        options: voting.options.into_iter().map(|o| o.name).collect(),
    }))
}

pub async fn cast_vote(
    State(state): State<AppState>,
    Path((voteid, token)): Path<(Uuid, String)>,
    Json(body): Json<CastVoteRequest>,
) -> AppResult<Json<bool>> {
    let conn = state.db_client.conn();

    let voting = votings::from_uuid(conn, voteid, AccessScope::Public).await?;
    votings::cast_vote(conn, &voting, &token, &body.name).await?;

    Ok(Json(true))
}
