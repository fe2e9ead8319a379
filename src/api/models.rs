use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::schema::Voting;

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateVotingRequest {
    pub title: String,
    pub options: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct VotingOptionResponse {
    pub name: String,
    pub votes: i32,
}

#[derive(Debug, Serialize)]
pub struct VotingResponse {
    pub id: Uuid,
    pub title: String,
    pub options: Vec<VotingOptionResponse>,
}

#[derive(Debug, Serialize)]
pub struct VotingSummaryResponse {
    pub id: Uuid,
    pub title: String,
}

/// What an anonymous ballot holder gets to see: the title and the option
/// names, without any counts.
#[derive(Debug, Serialize)]
pub struct BallotViewResponse {
    pub title: String,
    pub options: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CastVoteRequest {
    pub name: String,
}

impl From<Voting> for VotingResponse {
    fn from(v: Voting) -> Self {
        Self {
            id: v.id,
            title: v.title,
            options: v
                .options
                .into_iter()
                .map(|o| VotingOptionResponse {
                    name: o.name,
                    votes: o.votes,
                })
                .collect(),
        }
    }
}
