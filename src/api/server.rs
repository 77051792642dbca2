//! Read-only HTTP endpoints over the persisted discovery report.

use crate::api::DiscoveryIndex;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

/// HTTP server exposing top-N, by-gene and by-disease lookups.
pub struct ApiServer {
    index: Arc<DiscoveryIndex>,
    port: u16,
}

impl ApiServer {
    pub fn new(index: DiscoveryIndex, port: u16) -> Self {
        Self {
            index: Arc::new(index),
            port,
        }
    }

    /// Start serving; runs until the process is stopped.
    pub async fn start(&self) -> anyhow::Result<()> {
        let app = Router::new()
            .route("/api/targets/top", get(top_handler))
            .route("/api/search", get(search_handler))
            .layer(CorsLayer::permissive())
            .with_state(Arc::clone(&self.index));

        let addr = format!("0.0.0.0:{}", self.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        info!("Lookup API available at http://localhost:{}", self.port);

        axum::serve(listener, app).await?;
        Ok(())
    }
}

#[derive(Deserialize)]
struct TopParams {
    n: Option<usize>,
}

async fn top_handler(
    State(index): State<Arc<DiscoveryIndex>>,
    Query(params): Query<TopParams>,
) -> impl IntoResponse {
    let n = params.n.unwrap_or(10);
    Json(json!(index.top(n)))
}

#[derive(Deserialize)]
struct SearchParams {
    gene: Option<String>,
    disease: Option<String>,
}

async fn search_handler(
    State(index): State<Arc<DiscoveryIndex>>,
    Query(params): Query<SearchParams>,
) -> impl IntoResponse {
    if let Some(gene) = params.gene {
        return match index.by_gene(&gene) {
            Some(record) => (StatusCode::OK, Json(json!(record))),
            None => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Gene not found" })),
            ),
        };
    }

    if let Some(disease) = params.disease {
        return match index.by_disease(&disease) {
            Some(hit) => (StatusCode::OK, Json(json!(hit))),
            None => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Disease not found" })),
            ),
        };
    }

    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "No query provided" })),
    )
}
