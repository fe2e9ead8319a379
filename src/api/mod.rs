use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;

use crate::db::dbclient::DBClient;
use crate::db::schema::User;
use crate::db::users;
use crate::error::{AppError, AppResult};

pub mod auth;
pub mod models;
pub mod votes;
pub mod votings;

#[derive(Clone)]
pub struct AppState {
    pub db_client: Arc<DBClient>,
}

/// Caller identity attached to requests that passed `require_login`. The
/// presented token is kept so logout can revoke exactly the session it was
/// called with.
#[derive(Clone)]
pub struct Identity {
    pub user: User,
    pub token: String,
}

pub async fn require_login(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> AppResult<Response> {
    let token = bearer_token(&req).ok_or(AppError::Unauthenticated)?;
    let user = users::from_token(state.db_client.conn(), &token).await?;

    req.extensions_mut().insert(Identity { user, token });

    Ok(next.run(req).await)
}

fn bearer_token(req: &Request) -> Option<String> {
    let header = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?;

    if token.is_empty() {
        None
    } else {
        Some(token.to_owned())
    }
}

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/voting", post(votings::create_voting))
        .route("/voting/:id", get(votings::get_voting).delete(votings::delete_voting))
        .route("/votings", get(votings::list_votings))
        .route("/issue/:id", post(votings::issue_ballot))
        .route("/logout", post(auth::logout))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_login));

    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/options/:voteid/:token", get(votes::voting_by_ballot))
        .route("/vote/:voteid/:token", post(votes::cast_vote))
        .merge(protected)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_with_auth(value: Option<&str>) -> Request {
        let mut builder = axum::http::Request::builder().uri("/votings");
        if let Some(v) = value {
            builder = builder.header(AUTHORIZATION, v);
        }
        builder.body(axum::body::Body::empty()).unwrap()
    }

    #[test]
    fn bearer_token_extracts_value() {
        let req = request_with_auth(Some("Bearer abc123"));
        assert_eq!(bearer_token(&req).as_deref(), Some("abc123"));
    }

    #[test]
    fn missing_header_yields_none() {
        assert!(bearer_token(&request_with_auth(None)).is_none());
    }

    #[test]
    fn non_bearer_scheme_yields_none() {
        assert!(bearer_token(&request_with_auth(Some("Basic abc123"))).is_none());
    }

    #[test]
    fn empty_bearer_value_yields_none() {
        assert!(bearer_token(&request_with_auth(Some("Bearer "))).is_none());
    }
}
