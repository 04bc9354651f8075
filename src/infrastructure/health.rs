//! Liveness endpoint for uptime pings.

use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tracing::info;

/// Body of `GET /ping`.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct PingResponse {
    /// Always true while the process is up.
    pub ok: bool,
    /// Current time in Unix milliseconds.
    pub ts: i64,
}

async fn alive() -> &'static str {
    "Bot Alive"
}

async fn ping() -> Json<PingResponse> {
    Json(PingResponse {
        ok: true,
        ts: chrono::Utc::now().timestamp_millis(),
    })
}

/// Routes `/` and `/ping`.
#[must_use]
pub fn router() -> Router {
    Router::new()
        .route("/", get(alive))
        .route("/ping", get(ping))
}

/// Serves the liveness routes on `0.0.0.0:port` until the task is dropped.
///
/// # Errors
/// Returns an I/O error if the port cannot be bound or the server fails.
pub async fn serve(port: u16) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!(port, "Liveness server listening");
    axum::serve(listener, router()).await
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn spawn() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router()).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_root_reports_alive() {
        let base = spawn().await;
        let body = reqwest::get(format!("{base}/"))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "Bot Alive");
    }

    #[tokio::test]
    async fn test_ping_returns_timestamp() {
        let before = chrono::Utc::now().timestamp_millis();
        let base = spawn().await;
        let value: serde_json::Value = reqwest::get(format!("{base}/ping"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(value["ok"], true);
        assert!(value["ts"].as_i64().unwrap() >= before);
    }
}
