use std::env;
use std::sync::Arc;

use ballotbox::api::{self, AppState};
use ballotbox::db::dbclient::DBClient;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ballotbox=info".into()),
        )
        .init();

    let db_url = env::var("DB_URL").expect("expected DB_URL");
    let listen_addr = env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_owned());

    let db_client = DBClient::new(&db_url)
        .await
        .expect("failed to connect to database");

    let state = AppState {
        db_client: Arc::new(db_client),
    };

    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .expect("failed to bind listen address");

    tracing::info!(addr = %listen_addr, "Listening.");

    axum::serve(listener, api::router(state))
        .await
        .expect("server error");
}
