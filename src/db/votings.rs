use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use itertools::Itertools;
use rand::RngCore;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tokio_stream::StreamExt;
use uuid::Uuid;

use crate::db::schema::{AccessScope, Ballot, User, Voting, VotingOption};
use crate::error::{AppError, AppResult};

// Ballot tokens travel in URL paths, so they use the url-safe alphabet.
const BALLOT_TOKEN_BYTES: usize = 32;

pub fn validate_options(options: &[String]) -> AppResult<()> {
    if options.is_empty() {
        return Err(AppError::InvalidInput("options cannot be empty".to_owned()));
    }

    if options.iter().duplicates().next().is_some() {
        return Err(AppError::InvalidInput("options must be unique".to_owned()));
    }

    Ok(())
}

pub async fn create(
    conn: &PgPool,
    owner: &User,
    title: &str,
    options: &[String],
) -> AppResult<Voting> {
    validate_options(options)?;

    let mut tx = conn.begin().await?;

    let id: Uuid = sqlx::query(
        "INSERT INTO votings (id, owner, title)
         VALUES ($1, $2, $3)
         RETURNING id",
    )
    .bind(Uuid::new_v4())
    .bind(owner.id)
    .bind(title)
    .fetch_one(&mut *tx)
    .await?
    .get("id");

    let mut opt_result = Vec::new();

    for option in options {
        sqlx::query(
            "INSERT INTO voting_options (voting_id, name, votes)
             VALUES ($1, $2, 0)",
        )
        .bind(id)
        .bind(option)
        .execute(&mut *tx)
        .await?;

        opt_result.push(VotingOption {
            voting_id: id,
            name: option.clone(),
            votes: 0,
        });
    }

    tx.commit().await?;

    tracing::info!(voting_id = %id, owner = %owner.username, "Voting created.");

    Ok(Voting {
        id,
        owner: owner.id,
        title: title.to_owned(),
        options: opt_result,
    })
}

pub async fn from_uuid(conn: &PgPool, id: Uuid, scope: AccessScope) -> AppResult<Voting> {
    let row = sqlx::query("SELECT id, owner, title FROM votings WHERE id = $1")
        .bind(id)
        .fetch_optional(conn)
        .await?;

    let row = match row {
        None => return Err(AppError::NotFound("voting")),
        Some(v) => v,
    };

    let mut voting = Voting {
        id: row.get("id"),
        owner: row.get("owner"),
        title: row.get("title"),
        options: Vec::new(),
    };

    if let AccessScope::OwnedBy(user_id) = scope {
        if voting.owner != user_id {
            return Err(AppError::Forbidden);
        }
    }

    let mut stream = sqlx::query("SELECT voting_id, name, votes FROM voting_options WHERE voting_id = $1")
        .bind(voting.id)
        .map(|r: PgRow| VotingOption {
            voting_id: r.get("voting_id"),
            name: r.get("name"),
            votes: r.get("votes"),
        })
        .fetch(conn);

    while let Some(opt) = stream.try_next().await? {
        voting.options.push(opt);
    }

    Ok(voting)
}

/// Header-only records; options are not loaded.
pub async fn owned_by(conn: &PgPool, user_id: Uuid) -> AppResult<Vec<Voting>> {
    let mut stream = sqlx::query("SELECT id, title FROM votings WHERE owner = $1")
        .bind(user_id)
        .map(|r: PgRow| Voting {
            id: r.get("id"),
            owner: user_id,
            title: r.get("title"),
            options: Vec::new(),
        })
        .fetch(conn);

    let mut result = Vec::new();
    while let Some(v) = stream.try_next().await? {
        result.push(v);
    }

    Ok(result)
}

/// Mints a new single-use ballot for `voting`. No ownership check happens at
/// this layer; callers decide who may mint.
pub async fn issue_ballot(conn: &PgPool, voting: &Voting) -> AppResult<Ballot> {
    let mut bytes = [0u8; BALLOT_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    let token = URL_SAFE_NO_PAD.encode(bytes);

    let row = sqlx::query(
        "INSERT INTO voting_tokens (token, voting_id)
         VALUES ($1, $2)
         RETURNING token, voting_id",
    )
    .bind(&token)
    .bind(voting.id)
    .fetch_one(conn)
    .await?;

    tracing::info!(voting_id = %voting.id, "Ballot issued.");

    Ok(Ballot {
        token: row.get("token"),
        voting_id: row.get("voting_id"),
    })
}

/// Pure check, no mutation: the ballot must exist, unconsumed, for exactly
/// this voting.
pub async fn check_ballot(conn: &PgPool, voting: &Voting, token: &str) -> AppResult<Ballot> {
    let row = sqlx::query("SELECT token, voting_id FROM voting_tokens WHERE voting_id = $1 AND token = $2")
        .bind(voting.id)
        .bind(token)
        .fetch_optional(conn)
        .await?;

    match row {
        None => Err(AppError::InvalidToken),
        Some(r) => Ok(Ballot {
            token: r.get("token"),
            voting_id: r.get("voting_id"),
        }),
    }
}

pub async fn cast_vote(conn: &PgPool, voting: &Voting, token: &str, option: &str) -> AppResult<()> {
    // Unknown options are rejected before the ballot is touched, so a typo
    // never burns a valid token.
    if !voting.options.iter().any(|o| o.name == option) {
        return Err(AppError::InvalidOption);
    }

    let ballot = check_ballot(conn, voting, token).await?;

    let mut tx = conn.begin().await?;

    // The row delete decides the winner when two casts race on the same
    // token: exactly one transaction removes the row, the loser sees zero
    // rows affected. An early return drops the transaction and rolls back.
    let deleted = sqlx::query("DELETE FROM voting_tokens WHERE voting_id = $1 AND token = $2")
        .bind(voting.id)
        .bind(&ballot.token)
        .execute(&mut *tx)
        .await?;

    if deleted.rows_affected() == 0 {
        return Err(AppError::InvalidToken);
    }

    let updated = sqlx::query("UPDATE voting_options SET votes = votes + 1 WHERE voting_id = $1 AND name = $2")
        .bind(voting.id)
        .bind(option)
        .execute(&mut *tx)
        .await?;

    if updated.rows_affected() == 0 {
        return Err(AppError::Internal(anyhow::anyhow!(
            "option row vanished mid-transaction: voting {} option {:?}",
            voting.id,
            option
        )));
    }

    tx.commit().await?;

    tracing::info!(voting_id = %voting.id, option = %option, "Vote cast.");

    Ok(())
}

/// Deletes the voting; options and outstanding ballots cascade with it.
pub async fn remove(conn: &PgPool, voting: &Voting) -> AppResult<()> {
    sqlx::query("DELETE FROM votings WHERE id = $1")
        .bind(voting.id)
        .execute(conn)
        .await?;

    tracing::info!(voting_id = %voting.id, "Voting removed.");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_options_rejected() {
        let err = validate_options(&[]).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert_eq!(err.to_string(), "options cannot be empty");
    }

    #[test]
    fn duplicate_options_rejected() {
        let err = validate_options(&opts(&["A", "B", "A"])).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert_eq!(err.to_string(), "options must be unique");
    }

    #[test]
    fn duplicate_check_is_case_sensitive() {
        // "a" and "A" are distinct option names.
        assert!(validate_options(&opts(&["a", "A"])).is_ok());
    }

    #[test]
    fn single_option_accepted() {
        assert!(validate_options(&opts(&["only"])).is_ok());
    }
}
