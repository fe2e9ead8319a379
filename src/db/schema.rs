use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
}

#[derive(Debug)]
pub struct AccessToken {
    pub token: String,
    pub user_id: Uuid,
    pub last_used: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Voting {
    pub id: Uuid,
    pub owner: Uuid,
    pub title: String,
    pub options: Vec<VotingOption>,
}

#[derive(Debug, Clone)]
pub struct VotingOption {
    pub voting_id: Uuid,
    pub name: String,
    pub votes: i32,
}

/// Single-use token entitling its bearer to cast one vote in one voting.
#[derive(Debug)]
pub struct Ballot {
    pub token: String,
    pub voting_id: Uuid,
}

/// How a voting lookup is authorized: anyone may resolve a `Public` fetch,
/// `OwnedBy` additionally requires the stored owner to match.
#[derive(Debug, Clone, Copy)]
pub enum AccessScope {
    Public,
    OwnedBy(Uuid),
}
