use axum::{Extension, response::Json};
use serde_json::{Value, json};

use crate::server::SharedSummary;

pub async fn health(Extension(last_cycle): Extension<SharedSummary>) -> Json<Value> {
    let last_cycle = last_cycle.lock().await.clone();
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "last_cycle": last_cycle,
    }))
}
