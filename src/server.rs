use axum::{Extension, Router, routing::get};
use std::{net::SocketAddr, str::FromStr, sync::Arc};
use tokio::sync::Mutex;

use crate::{Res, api, types::CycleSummary};

/// Summary of the most recent cycle, shared between the scheduler and the API.
pub type SharedSummary = Arc<Mutex<Option<CycleSummary>>>;

pub fn router(state: SharedSummary) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .layer(Extension(state))
}

pub async fn start_api_server(address: &str, state: SharedSummary) -> Res<()> {
    let addr = SocketAddr::from_str(address)?;
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router(state)).await?;
    Ok(())
}
