use std::sync::Arc;

use ampsassist::{
    server::{SharedSummary, router},
    types::CycleSummary,
};
use serde_json::Value;
use tokio::sync::Mutex;

async fn serve(state: SharedSummary) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });
    format!("http://{}/health", addr)
}

#[tokio::test]
async fn test_health_before_first_cycle() {
    let url = serve(Arc::new(Mutex::new(None))).await;

    let body: Value = reqwest::get(&url).await.unwrap().json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(body["last_cycle"].is_null());
}

#[tokio::test]
async fn test_health_reports_last_cycle() {
    let state: SharedSummary = Arc::new(Mutex::new(None));
    let url = serve(Arc::clone(&state)).await;

    *state.lock().await = Some(CycleSummary {
        playlists: 2,
        materialized: 5,
        evicted_files: 1,
        ..Default::default()
    });

    let body: Value = reqwest::get(&url).await.unwrap().json().await.unwrap();
    assert_eq!(body["last_cycle"]["playlists"], 2);
    assert_eq!(body["last_cycle"]["materialized"], 5);
    assert_eq!(body["last_cycle"]["evicted_files"], 1);
}
